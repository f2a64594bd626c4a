use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{domain::cart::CartItem, dto::orders::OrderLineRequest};

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuoteRequest {
    pub items: Vec<OrderLineRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuotedLine {
    #[serde(flatten)]
    pub line: CartItem,
    pub precio_efectivo: i64,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartQuote {
    pub items: Vec<QuotedLine>,
    /// Sum of line subtotals before cash rounding.
    pub subtotal: i64,
    pub total: i64,
}
