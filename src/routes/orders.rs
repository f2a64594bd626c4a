use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    domain::summary::SalesSummary,
    dto::orders::{
        AssignCreditRequest, CreateOrderRequest, OrderHistory, OrderList, OrderView,
        RecordPaymentRequest, UpdateOrderRequest,
    },
    error::AppResult,
    response::ApiResponse,
    routes::params::{DateRange, OrderListQuery},
    services::{credit_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/summary", get(sales_summary))
        .route("/{id}", get(get_order).patch(update_order))
        .route("/{id}/history", get(order_history))
        .route("/{id}/payment", post(record_payment))
        .route("/{id}/credit", post(assign_credit))
        .route("/{id}/credit/settle", post(settle_credit))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders, newest first", body = ApiResponse<OrderList>),
        (status = 400, description = "Invalid date range"),
    ),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created in pendiente", body = ApiResponse<OrderView>),
        (status = 400, description = "Empty order, unknown or unavailable item, invalid bowl"),
    ),
    tag = "Orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let resp = order_service::create_order(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/summary",
    params(DateRange),
    responses(
        (status = 200, description = "Collected per method", body = ApiResponse<SalesSummary>),
        (status = 400, description = "Invalid date range"),
    ),
    tag = "Orders"
)]
pub async fn sales_summary(
    State(state): State<AppState>,
    Query(range): Query<DateRange>,
) -> AppResult<Json<ApiResponse<SalesSummary>>> {
    let resp = order_service::sales_summary(&state, range).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with items", body = ApiResponse<OrderView>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let resp = order_service::get_order(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/orders/{id}",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<OrderView>),
        (status = 400, description = "Invalid transition or order no longer editable"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let resp = order_service::update_order(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}/history",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Audit trail of the order", body = ApiResponse<OrderHistory>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn order_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderHistory>>> {
    let resp = order_service::order_history(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/payment",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = RecordPaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<OrderView>),
        (status = 400, description = "Total mismatch or already settled"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Payments"
)]
pub async fn record_payment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RecordPaymentRequest>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let resp = order_service::record_order_payment(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/credit",
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = AssignCreditRequest,
    responses(
        (status = 200, description = "Charged to credit", body = ApiResponse<OrderView>),
        (status = 400, description = "Order already paid or on credit"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Payments"
)]
pub async fn assign_credit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignCreditRequest>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let resp = credit_service::assign_order_credit(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{id}/credit/settle",
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Employee credit settled", body = ApiResponse<OrderView>),
        (status = 400, description = "Order not on credit or already settled"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Payments"
)]
pub async fn settle_credit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderView>>> {
    let resp = credit_service::settle_order_employee_credit(&state, id).await?;
    Ok(Json(resp))
}
