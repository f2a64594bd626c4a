use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::money::{MAX_AMOUNT, format_cop},
    dto::menu::{CreateMenuItemRequest, MenuList, UpdateMenuItemRequest},
    entity::menu_items::{ActiveModel, Column, Entity as MenuItems, Model as MenuItemModel},
    error::{AppError, AppResult},
    models::MenuItem,
    response::{ApiResponse, Meta},
    routes::params::MenuQuery,
    state::AppState,
};

pub async fn list_menu(state: &AppState, query: MenuQuery) -> AppResult<ApiResponse<MenuList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Nombre).ilike(format!("%{}%", search)));
    }
    if let Some(categoria) = query.categoria.as_ref().filter(|c| !c.is_empty()) {
        condition = condition.add(Column::Categoria.eq(categoria.clone()));
    }
    if let Some(disponible) = query.disponible {
        condition = condition.add(Column::Disponible.eq(disponible));
    }

    let finder = MenuItems::find()
        .filter(condition)
        .order_by_asc(Column::Categoria)
        .order_by_asc(Column::Nombre);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(menu_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Menu",
        MenuList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_menu_item(state: &AppState, id: Uuid) -> AppResult<ApiResponse<MenuItem>> {
    let item = MenuItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(menu_item_from_entity)
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Menu item", item, None))
}

pub async fn create_menu_item(
    state: &AppState,
    payload: CreateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    let nombre = required_text(&payload.nombre, "nombre")?;
    let categoria = required_text(&payload.categoria, "categoria")?;
    validate_price(payload.precio)?;

    let item = ActiveModel {
        id: Set(Uuid::new_v4()),
        nombre: Set(nombre),
        categoria: Set(categoria),
        precio: Set(payload.precio),
        disponible: Set(payload.disponible.unwrap_or(true)),
        es_bowl: Set(payload.es_bowl),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(menu_item_id = %item.id, nombre = %item.nombre, "menu item created");
    audit::record(
        state,
        "menu_item_create",
        "menu_items",
        item.id,
        serde_json::json!({ "precio": item.precio }),
    )
    .await;

    Ok(ApiResponse::success(
        "Menu item created",
        menu_item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn update_menu_item(
    state: &AppState,
    id: Uuid,
    payload: UpdateMenuItemRequest,
) -> AppResult<ApiResponse<MenuItem>> {
    let existing = MenuItems::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    if let Some(nombre) = payload.nombre {
        active.nombre = Set(required_text(&nombre, "nombre")?);
    }
    if let Some(categoria) = payload.categoria {
        active.categoria = Set(required_text(&categoria, "categoria")?);
    }
    if let Some(precio) = payload.precio {
        validate_price(precio)?;
        active.precio = Set(precio);
    }
    if let Some(disponible) = payload.disponible {
        active.disponible = Set(disponible);
    }
    if let Some(es_bowl) = payload.es_bowl {
        active.es_bowl = Set(es_bowl);
    }

    let item = active.update(&state.orm).await?;

    audit::record(
        state,
        "menu_item_update",
        "menu_items",
        item.id,
        serde_json::json!({ "precio": item.precio, "disponible": item.disponible }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        menu_item_from_entity(item),
        Some(Meta::empty()),
    ))
}

fn required_text(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(value.to_string())
}

fn validate_price(precio: i64) -> AppResult<()> {
    if !(0..=MAX_AMOUNT).contains(&precio) {
        return Err(AppError::BadRequest(format!(
            "precio must be between 0 and {}",
            format_cop(MAX_AMOUNT)
        )));
    }
    Ok(())
}

pub(crate) fn menu_item_from_entity(model: MenuItemModel) -> MenuItem {
    MenuItem {
        id: model.id,
        nombre: model.nombre,
        categoria: model.categoria,
        precio: model.precio,
        disponible: model.disponible,
        es_bowl: model.es_bowl,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_must_stay_within_bounds() {
        assert!(validate_price(0).is_ok());
        assert!(validate_price(MAX_AMOUNT).is_ok());
        assert!(matches!(validate_price(-1), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_price(MAX_AMOUNT + 1), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_price(i64::MAX), Err(AppError::BadRequest(_))));
    }
}
