use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::credits::CreditBalance, error::AppResult, response::ApiResponse,
    services::credit_service, state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{empleado_id}", get(employee_balance))
}

#[utoipa::path(
    get,
    path = "/api/credits/{empleado_id}",
    params(("empleado_id" = String, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Open credit", body = ApiResponse<CreditBalance>),
    ),
    tag = "Payments"
)]
pub async fn employee_balance(
    State(state): State<AppState>,
    Path(empleado_id): Path<String>,
) -> AppResult<Json<ApiResponse<CreditBalance>>> {
    let resp = credit_service::employee_balance(&state, &empleado_id).await?;
    Ok(Json(resp))
}
