use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::menu::{CreateMenuItemRequest, MenuList, UpdateMenuItemRequest},
    error::AppResult,
    models::MenuItem,
    response::ApiResponse,
    routes::params::MenuQuery,
    services::menu_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_menu).post(create_menu_item))
        .route("/{id}", get(get_menu_item).patch(update_menu_item))
}

#[utoipa::path(
    get,
    path = "/api/menu",
    params(MenuQuery),
    responses(
        (status = 200, description = "Menu items", body = ApiResponse<MenuList>),
    ),
    tag = "Menu"
)]
pub async fn list_menu(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
) -> AppResult<Json<ApiResponse<MenuList>>> {
    let resp = menu_service::list_menu(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/menu",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item created", body = ApiResponse<MenuItem>),
        (status = 400, description = "Bad request"),
    ),
    tag = "Menu"
)]
pub async fn create_menu_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::create_menu_item(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    responses(
        (status = 200, description = "Menu item", body = ApiResponse<MenuItem>),
        (status = 404, description = "Menu item not found"),
    ),
    tag = "Menu"
)]
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::get_menu_item(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/menu/{id}",
    params(("id" = Uuid, Path, description = "Menu item ID")),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = ApiResponse<MenuItem>),
        (status = 400, description = "Bad request"),
        (status = 404, description = "Menu item not found"),
    ),
    tag = "Menu"
)]
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> AppResult<Json<ApiResponse<MenuItem>>> {
    let resp = menu_service::update_menu_item(&state, id, payload).await?;
    Ok(Json(resp))
}
