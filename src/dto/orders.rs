use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    domain::{
        bowl::BowlCustomization,
        order::{Order, OrderStatus},
        payments::PaymentAllocation,
    },
    models::AuditEntry,
};

/// A line as typed at the register; prices are resolved server-side.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct OrderLineRequest {
    pub menu_item_id: Uuid,
    #[schema(minimum = 1, maximum = 999)]
    pub cantidad: i32,
    #[serde(default)]
    pub student_discount: bool,
    pub notas: Option<String>,
    pub bowl: Option<BowlCustomization>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub cliente: Option<String>,
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub estado: Option<OrderStatus>,
    pub cliente: Option<String>,
    pub items: Option<Vec<OrderLineRequest>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordPaymentRequest {
    /// Raw `{ metodo, monto }` entries; malformed ones are dropped.
    #[schema(value_type = Vec<PaymentAllocation>)]
    pub allocations: Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignCreditRequest {
    pub empleado_id: String,
    pub empleado_nombre: String,
}

/// An order plus its derived payment fields.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub pagado: bool,
    pub resumen_pago: String,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            pagado: order.is_paid(),
            resumen_pago: order.payment_summary(),
            order,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderHistory {
    pub items: Vec<AuditEntry>,
}
