use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::cart::CartItem;
use crate::domain::payments::PaymentState;

/// Kitchen lifecycle. Orders only ever move one step forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pendiente,
    Preparando,
    Listo,
    Entregado,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("order is already delivered")]
    Terminal,
    #[error("cannot move order from '{from}' to '{to}'")]
    Invalid {
        from: &'static str,
        to: &'static str,
    },
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pendiente => "pendiente",
            OrderStatus::Preparando => "preparando",
            OrderStatus::Listo => "listo",
            OrderStatus::Entregado => "entregado",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "pendiente" => Some(OrderStatus::Pendiente),
            "preparando" => Some(OrderStatus::Preparando),
            "listo" => Some(OrderStatus::Listo),
            "entregado" => Some(OrderStatus::Entregado),
            _ => None,
        }
    }

    pub fn next(&self) -> Option<Self> {
        match self {
            OrderStatus::Pendiente => Some(OrderStatus::Preparando),
            OrderStatus::Preparando => Some(OrderStatus::Listo),
            OrderStatus::Listo => Some(OrderStatus::Entregado),
            OrderStatus::Entregado => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.next() == Some(next)
    }

    pub fn transition_to(&self, next: OrderStatus) -> Result<OrderStatus, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::Terminal);
        }
        if !self.can_transition_to(next) {
            return Err(TransitionError::Invalid {
                from: self.as_str(),
                to: next.as_str(),
            });
        }
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub numero: i64,
    pub cliente: Option<String>,
    pub items: Vec<CartItem>,
    pub total: i64,
    pub estado: OrderStatus,
    pub pago: PaymentState,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.pago.is_paid(self.total)
    }

    pub fn payment_summary(&self) -> String {
        self.pago.describe()
    }

    /// Items can only be edited before the kitchen starts and while no
    /// payment or credit is attached.
    pub fn is_editable(&self) -> bool {
        self.estado == OrderStatus::Pendiente && self.pago.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payments::{PaymentAllocation, PaymentMethod};

    fn order(total: i64, pago: PaymentState) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            numero: 1,
            cliente: None,
            items: Vec::new(),
            total,
            estado: OrderStatus::Entregado,
            pago,
            paid_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn lifecycle_moves_one_step_at_a_time() {
        assert_eq!(
            OrderStatus::Pendiente.transition_to(OrderStatus::Preparando),
            Ok(OrderStatus::Preparando)
        );
        assert!(matches!(
            OrderStatus::Pendiente.transition_to(OrderStatus::Listo),
            Err(TransitionError::Invalid { .. })
        ));
        assert!(matches!(
            OrderStatus::Listo.transition_to(OrderStatus::Preparando),
            Err(TransitionError::Invalid { .. })
        ));
        assert_eq!(
            OrderStatus::Entregado.transition_to(OrderStatus::Entregado),
            Err(TransitionError::Terminal)
        );
    }

    #[test]
    fn status_tags_round_trip() {
        for status in [
            OrderStatus::Pendiente,
            OrderStatus::Preparando,
            OrderStatus::Listo,
            OrderStatus::Entregado,
        ] {
            assert_eq!(OrderStatus::from_tag(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::from_tag("cancelado"), None);
    }

    #[test]
    fn split_payment_marks_order_paid() {
        let paid = order(
            25000,
            PaymentState::Allocated(vec![
                PaymentAllocation::new(PaymentMethod::Efectivo, 20000),
                PaymentAllocation::new(PaymentMethod::Nequi, 5000),
            ]),
        );
        assert!(paid.is_paid());
        assert_eq!(paid.payment_summary(), "Efectivo: $20.000 · Nequi: $5.000");

        let short = order(
            25000,
            PaymentState::Allocated(vec![PaymentAllocation::new(PaymentMethod::Tarjeta, 24000)]),
        );
        assert!(!short.is_paid());

        let within = order(
            25000,
            PaymentState::Allocated(vec![PaymentAllocation::new(PaymentMethod::Tarjeta, 24999)]),
        );
        assert!(within.is_paid());
    }

    #[test]
    fn only_fresh_unpaid_orders_are_editable() {
        let mut o = order(1000, PaymentState::Pending);
        o.estado = OrderStatus::Pendiente;
        assert!(o.is_editable());
        o.pago = PaymentState::Legacy { paid: true };
        assert!(!o.is_editable());
        o.pago = PaymentState::Pending;
        o.estado = OrderStatus::Preparando;
        assert!(!o.is_editable());
    }
}
