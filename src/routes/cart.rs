use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::cart::{CartQuote, QuoteRequest},
    error::AppResult,
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/quote", post(quote_cart))
}

#[utoipa::path(
    post,
    path = "/api/cart/quote",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "Priced cart", body = ApiResponse<CartQuote>),
        (status = 400, description = "Empty cart, unknown or unavailable item, invalid bowl"),
    ),
    tag = "Cart"
)]
pub async fn quote_cart(
    State(state): State<AppState>,
    Json(payload): Json<QuoteRequest>,
) -> AppResult<Json<ApiResponse<CartQuote>>> {
    let resp = cart_service::quote_cart(&state, payload).await?;
    Ok(Json(resp))
}
