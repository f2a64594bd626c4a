//! Payment allocation model.
//!
//! An order can be settled by several methods at once (part cash, part
//! Nequi, ...). Raw allocations coming from the register are normalized
//! with [`sanitize_allocations`] and [`merge_allocations`]; whether an order
//! counts as paid is resolved from its [`PaymentState`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::money::{MAX_AMOUNT, format_cop, round_half_up};

/// Slack, in pesos, allowed between the allocated sum and the order total.
/// Percentage discounts round per line, so a fully paid order can be off by one.
pub const PAYMENT_TOLERANCE: i64 = 1;

pub const PENDING_SUMMARY: &str = "Pago pendiente";
pub const SUMMARY_SEPARATOR: &str = " · ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Efectivo,
    Tarjeta,
    Nequi,
    ProvisionCaja,
    CreditoEmpleados,
}

impl PaymentMethod {
    /// Methods accepted at the cash register.
    pub const REGISTER: [PaymentMethod; 3] = [
        PaymentMethod::Efectivo,
        PaymentMethod::Tarjeta,
        PaymentMethod::Nequi,
    ];

    /// Every method, including the ones only the accounting views use.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Efectivo,
        PaymentMethod::Tarjeta,
        PaymentMethod::Nequi,
        PaymentMethod::ProvisionCaja,
        PaymentMethod::CreditoEmpleados,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "efectivo",
            PaymentMethod::Tarjeta => "tarjeta",
            PaymentMethod::Nequi => "nequi",
            PaymentMethod::ProvisionCaja => "provision_caja",
            PaymentMethod::CreditoEmpleados => "credito_empleados",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "Efectivo",
            PaymentMethod::Tarjeta => "Tarjeta",
            PaymentMethod::Nequi => "Nequi",
            PaymentMethod::ProvisionCaja => "Provisión caja",
            PaymentMethod::CreditoEmpleados => "Crédito empleados",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(tag))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaymentAllocation {
    pub metodo: PaymentMethod,
    pub monto: i64,
}

impl PaymentAllocation {
    pub fn new(metodo: PaymentMethod, monto: i64) -> Self {
        Self { metodo, monto }
    }
}

/// Keeps only entries whose `metodo` is in `permitted` and whose `monto`,
/// rounded to whole pesos, is positive and at most [`MAX_AMOUNT`]. Anything
/// that is not a JSON array yields an empty list. Never fails.
pub fn sanitize_allocations(
    raw: &Value,
    permitted: &[PaymentMethod],
) -> Vec<PaymentAllocation> {
    let Some(entries) = raw.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let metodo = entry
                .get("metodo")?
                .as_str()
                .and_then(PaymentMethod::from_tag)?;
            if !permitted.contains(&metodo) {
                return None;
            }
            let monto = round_half_up(amount_from_value(entry.get("monto")?)?);
            (1..=MAX_AMOUNT)
                .contains(&monto)
                .then_some(PaymentAllocation { metodo, monto })
        })
        .collect()
}

fn amount_from_value(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    amount.is_finite().then_some(amount)
}

/// One entry per method with the amounts summed, in first-seen order.
/// Sums saturate at `i64::MAX`.
pub fn merge_allocations<I>(allocations: I) -> Vec<PaymentAllocation>
where
    I: IntoIterator<Item = PaymentAllocation>,
{
    let mut merged: Vec<PaymentAllocation> = Vec::new();
    for allocation in allocations {
        match merged.iter_mut().find(|m| m.metodo == allocation.metodo) {
            Some(existing) => existing.monto = existing.monto.saturating_add(allocation.monto),
            None => merged.push(allocation),
        }
    }
    merged
}

/// `merge_allocations(sanitize_allocations(raw, permitted))`.
pub fn normalize_allocations(raw: &Value, permitted: &[PaymentMethod]) -> Vec<PaymentAllocation> {
    merge_allocations(sanitize_allocations(raw, permitted))
}

pub fn allocations_total(allocations: &[PaymentAllocation]) -> i64 {
    allocations
        .iter()
        .fold(0i64, |sum, allocation| sum.saturating_add(allocation.monto))
}

/// True when the allocations are non-empty and add up to `total` within
/// [`PAYMENT_TOLERANCE`].
pub fn covers_total(allocations: &[PaymentAllocation], total: i64) -> bool {
    !allocations.is_empty()
        && allocations_total(allocations).abs_diff(total) <= PAYMENT_TOLERANCE.unsigned_abs()
}

/// `"Efectivo: $20.000 · Nequi: $5.000"`, or [`PENDING_SUMMARY`] when empty.
pub fn payment_summary<F>(allocations: &[PaymentAllocation], format_amount: F) -> String
where
    F: Fn(i64) -> String,
{
    if allocations.is_empty() {
        return PENDING_SUMMARY.to_string();
    }

    allocations
        .iter()
        .map(|allocation| {
            format!("{}: {}", allocation.metodo.label(), format_amount(allocation.monto))
        })
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR)
}

/// Deferred payment charged to an employee's running balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreditInfo {
    pub empleado_id: String,
    pub empleado_nombre: String,
    pub monto: i64,
    pub asignado_en: DateTime<Utc>,
    pub liquidado_en: Option<DateTime<Utc>>,
}

impl CreditInfo {
    pub fn is_settled(&self) -> bool {
        self.liquidado_en.is_some()
    }
}

/// Normalized payment state of an order.
///
/// Older orders carry a single `metodo_pago` plus a free-text
/// `payment_status`; [`PaymentState::from_stored`] folds those into this
/// enum once, when the row is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "tipo", content = "detalle", rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Allocated(Vec<PaymentAllocation>),
    Legacy { paid: bool },
    Credit(CreditInfo),
}

impl PaymentState {
    pub fn from_stored(
        allocations: Option<&Value>,
        metodo_pago: Option<&str>,
        payment_status: Option<&str>,
        credit: Option<CreditInfo>,
        total: i64,
    ) -> Self {
        let allocations = allocations
            .map(|raw| normalize_allocations(raw, &PaymentMethod::ALL))
            .unwrap_or_default();
        if !allocations.is_empty() {
            return PaymentState::Allocated(allocations);
        }

        if let Some(credit) = credit {
            return PaymentState::Credit(credit);
        }

        match payment_status.map(str::trim).filter(|status| !status.is_empty()) {
            Some(status) => {
                let paid = is_paid_status(status);
                let method = metodo_pago.and_then(PaymentMethod::from_tag);
                match method {
                    Some(metodo) if paid && total > 0 => {
                        PaymentState::Allocated(vec![PaymentAllocation::new(metodo, total)])
                    }
                    _ => PaymentState::Legacy { paid },
                }
            }
            None => PaymentState::Pending,
        }
    }

    pub fn is_paid(&self, total: i64) -> bool {
        match self {
            PaymentState::Pending => false,
            PaymentState::Allocated(allocations) => covers_total(allocations, total),
            PaymentState::Legacy { paid } => *paid,
            PaymentState::Credit(credit) => credit.is_settled(),
        }
    }

    /// Whether a new payment or credit may still be attached.
    pub fn is_open(&self) -> bool {
        matches!(self, PaymentState::Pending | PaymentState::Legacy { paid: false })
    }

    pub fn allocations(&self) -> &[PaymentAllocation] {
        match self {
            PaymentState::Allocated(allocations) => allocations,
            _ => &[],
        }
    }

    pub fn credit(&self) -> Option<&CreditInfo> {
        match self {
            PaymentState::Credit(credit) => Some(credit),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            PaymentState::Pending | PaymentState::Legacy { paid: false } => {
                PENDING_SUMMARY.to_string()
            }
            PaymentState::Legacy { paid: true } => "Pagado".to_string(),
            PaymentState::Allocated(allocations) => payment_summary(allocations, format_cop),
            PaymentState::Credit(credit) => {
                let mut text = format!(
                    "{}: {} ({})",
                    PaymentMethod::CreditoEmpleados.label(),
                    format_cop(credit.monto),
                    credit.empleado_nombre
                );
                if credit.is_settled() {
                    text.push_str(SUMMARY_SEPARATOR);
                    text.push_str("liquidado");
                }
                text
            }
        }
    }
}

fn is_paid_status(status: &str) -> bool {
    ["paid", "pagado", "pagada"]
        .iter()
        .any(|tag| status.eq_ignore_ascii_case(tag))
}
