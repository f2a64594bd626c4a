//! Register close-out figures over a set of orders.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::payments::{
    PaymentAllocation, PaymentMethod, PaymentState, allocations_total, merge_allocations,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct SalesSummary {
    /// Collected amount per method, register methods first.
    pub por_metodo: Vec<PaymentAllocation>,
    pub total_cobrado: i64,
    pub total_vendido: i64,
    pub pedidos: i64,
    pub pedidos_pagados: i64,
    pub pedidos_pendientes: i64,
    pub credito_pendiente: i64,
}

/// Folds `(order total, payment state)` pairs into a summary.
///
/// Orders paid through legacy status-only records count as paid but add
/// nothing to `por_metodo`, since the method is unknown. Settled employee
/// credit is reported under `credito_empleados`.
pub fn summarize_sales<I>(orders: I) -> SalesSummary
where
    I: IntoIterator<Item = (i64, PaymentState)>,
{
    let mut summary = SalesSummary::default();
    let mut collected: Vec<PaymentAllocation> = PaymentMethod::REGISTER
        .into_iter()
        .map(|metodo| PaymentAllocation::new(metodo, 0))
        .collect();

    for (total, pago) in orders {
        summary.pedidos += 1;
        summary.total_vendido = summary.total_vendido.saturating_add(total);

        if pago.is_paid(total) {
            summary.pedidos_pagados += 1;
        } else {
            summary.pedidos_pendientes += 1;
        }

        match &pago {
            PaymentState::Allocated(allocations) if pago.is_paid(total) => {
                collected.extend(allocations.iter().copied());
            }
            PaymentState::Credit(credit) if credit.is_settled() => {
                let settled = PaymentAllocation::new(PaymentMethod::CreditoEmpleados, credit.monto);
                collected.push(settled);
            }
            PaymentState::Credit(credit) => {
                summary.credito_pendiente = summary.credito_pendiente.saturating_add(credit.monto);
            }
            _ => {}
        }
    }

    summary.por_metodo = merge_allocations(collected);
    summary.total_cobrado = allocations_total(&summary.por_metodo);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payments::CreditInfo;
    use chrono::Utc;

    fn credit(monto: i64, settled: bool) -> PaymentState {
        PaymentState::Credit(CreditInfo {
            empleado_id: "emp-1".into(),
            empleado_nombre: "Andrés".into(),
            monto,
            asignado_en: Utc::now(),
            liquidado_en: settled.then(Utc::now),
        })
    }

    fn allocated(metodo: PaymentMethod, monto: i64) -> PaymentState {
        PaymentState::Allocated(vec![PaymentAllocation::new(metodo, monto)])
    }

    #[test]
    fn groups_collected_amounts_by_method() {
        let summary = summarize_sales(vec![
            (
                25000,
                PaymentState::Allocated(vec![
                    PaymentAllocation::new(PaymentMethod::Efectivo, 20000),
                    PaymentAllocation::new(PaymentMethod::Nequi, 5000),
                ]),
            ),
            (10000, allocated(PaymentMethod::Efectivo, 10000)),
            (8000, PaymentState::Pending),
            (12000, credit(12000, false)),
            (6000, credit(6000, true)),
            (3000, PaymentState::Legacy { paid: true }),
        ]);

        assert_eq!(
            summary.por_metodo,
            vec![
                PaymentAllocation::new(PaymentMethod::Efectivo, 30000),
                PaymentAllocation::new(PaymentMethod::Tarjeta, 0),
                PaymentAllocation::new(PaymentMethod::Nequi, 5000),
                PaymentAllocation::new(PaymentMethod::CreditoEmpleados, 6000),
            ]
        );
        assert_eq!(summary.total_cobrado, 41000);
        assert_eq!(summary.total_vendido, 64000);
        assert_eq!(summary.pedidos, 6);
        assert_eq!(summary.pedidos_pagados, 4);
        assert_eq!(summary.pedidos_pendientes, 2);
        assert_eq!(summary.credito_pendiente, 12000);
    }

    #[test]
    fn underpaid_allocations_are_not_collected() {
        let summary = summarize_sales(vec![(
            25000,
            PaymentState::Allocated(vec![PaymentAllocation::new(PaymentMethod::Tarjeta, 24000)]),
        )]);
        assert_eq!(summary.total_cobrado, 0);
        assert_eq!(summary.pedidos_pendientes, 1);
    }
}
