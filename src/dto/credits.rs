use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema)]
pub struct CreditOrderRef {
    pub order_id: Uuid,
    pub numero: i64,
    pub monto: i64,
    pub asignado_en: DateTime<Utc>,
}

/// Outstanding employee credit.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreditBalance {
    pub empleado_id: String,
    pub empleado_nombre: Option<String>,
    pub pendiente: i64,
    pub pedidos: Vec<CreditOrderRef>,
}
