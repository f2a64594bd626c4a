use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    domain::{
        bowl::bowl_unit_price,
        cart::{
            CartError, CartItem, MAX_LINE_QUANTITY, add_to_cart, cart_total, effective_unit_price,
            line_subtotal,
        },
    },
    dto::{
        cart::{CartQuote, QuoteRequest, QuotedLine},
        orders::OrderLineRequest,
    },
    entity::menu_items::{Column as MenuCol, Entity as MenuItems},
    error::{AppError, AppResult},
    models::MenuItem,
    response::{ApiResponse, Meta},
    services::menu_service::menu_item_from_entity,
    state::AppState,
};

/// Prices a cart without persisting anything.
pub async fn quote_cart(
    state: &AppState,
    payload: QuoteRequest,
) -> AppResult<ApiResponse<CartQuote>> {
    let cart = resolve_lines(&state.orm, &payload.items).await?;

    let total = cart_total(&cart);
    let items: Vec<QuotedLine> = cart
        .into_iter()
        .map(|line| QuotedLine {
            precio_efectivo: effective_unit_price(&line),
            subtotal: line_subtotal(&line),
            line,
        })
        .collect();
    let subtotal = items
        .iter()
        .fold(0i64, |sum, line| sum.saturating_add(line.subtotal));

    Ok(ApiResponse::success(
        "Quote",
        CartQuote {
            items,
            subtotal,
            total,
        },
        Some(Meta::empty()),
    ))
}

/// Turns register lines into priced cart items, looking prices up in the
/// menu. Lines that resolve to the same cart key are stacked, up to
/// [`MAX_LINE_QUANTITY`] per line.
pub async fn resolve_lines<C>(conn: &C, lines: &[OrderLineRequest]) -> AppResult<Vec<CartItem>>
where
    C: ConnectionTrait,
{
    if lines.is_empty() {
        return Err(AppError::BadRequest("Order must have at least one item".into()));
    }

    let ids: Vec<Uuid> = lines.iter().map(|line| line.menu_item_id).collect();
    let menu: HashMap<Uuid, MenuItem> = MenuItems::find()
        .filter(MenuCol::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|model| (model.id, menu_item_from_entity(model)))
        .collect();

    let mut cart = Vec::with_capacity(lines.len());
    for line in lines {
        let item = menu.get(&line.menu_item_id).ok_or_else(|| {
            AppError::BadRequest(format!("menu item {} not found", line.menu_item_id))
        })?;
        add_to_cart(&mut cart, price_line(item, line)?)?;
    }

    Ok(cart)
}

fn price_line(item: &MenuItem, line: &OrderLineRequest) -> AppResult<CartItem> {
    if !(1..=MAX_LINE_QUANTITY).contains(&line.cantidad) {
        return Err(CartError::QuantityOutOfRange {
            max: MAX_LINE_QUANTITY,
        }
        .into());
    }
    if !item.disponible {
        return Err(AppError::BadRequest(format!("{} is not available", item.nombre)));
    }

    let (precio_unitario, custom_key) = match &line.bowl {
        Some(custom) => (bowl_unit_price(item, custom)?, Some(custom.custom_key(item.id))),
        None if item.es_bowl => {
            return Err(AppError::BadRequest(format!("{} needs a bowl selection", item.nombre)));
        }
        None => (item.precio, None),
    };

    Ok(CartItem {
        item: item.clone(),
        cantidad: line.cantidad,
        precio_unitario: Some(precio_unitario),
        student_discount: line.student_discount,
        notas: line
            .notas
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        custom_key,
        bowl_customization: line.bowl.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bowl::BowlCustomization;

    fn item(es_bowl: bool) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            nombre: "Bowl de la casa".into(),
            categoria: "bowls".into(),
            precio: 20000,
            disponible: true,
            es_bowl,
        }
    }

    fn request(item: &MenuItem, bowl: Option<BowlCustomization>) -> OrderLineRequest {
        OrderLineRequest {
            menu_item_id: item.id,
            cantidad: 2,
            student_discount: true,
            notas: Some("  sin cebolla ".into()),
            bowl,
        }
    }

    #[test]
    fn bowl_lines_carry_surcharge_and_key() {
        let bowl = item(true);
        let custom = BowlCustomization {
            base: "quinoa".into(),
            toppings: vec![],
            proteina: "camaron".into(),
            extras: vec![],
        };
        let line = price_line(&bowl, &request(&bowl, Some(custom.clone()))).expect("priced");
        assert_eq!(line.precio_unitario, Some(24000));
        assert_eq!(line.custom_key, Some(custom.custom_key(bowl.id)));
        assert_eq!(line.notas.as_deref(), Some("sin cebolla"));
        assert_eq!(line_subtotal(&line), 2 * 21600);
    }

    #[test]
    fn rejects_bad_lines() {
        let bowl = item(true);
        let missing_bowl = price_line(&bowl, &request(&bowl, None));
        assert!(matches!(missing_bowl, Err(AppError::BadRequest(_))));

        let mut wrap = item(false);
        let mut req = request(&wrap, None);
        req.cantidad = 0;
        assert!(matches!(price_line(&wrap, &req), Err(AppError::BadRequest(_))));

        req.cantidad = i32::MAX;
        assert!(matches!(price_line(&wrap, &req), Err(AppError::BadRequest(_))));

        wrap.disponible = false;
        let unavailable = price_line(&wrap, &request(&wrap, None));
        assert!(matches!(unavailable, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn stacked_lines_past_the_limit_are_a_bad_request() {
        let wrap = item(false);
        let mut req = request(&wrap, None);
        req.student_discount = false;
        req.cantidad = MAX_LINE_QUANTITY;

        let mut cart = Vec::new();
        add_to_cart(&mut cart, price_line(&wrap, &req).expect("priced")).expect("added");
        req.cantidad = 1;
        let extra = price_line(&wrap, &req).expect("priced");
        let stacked: AppResult<()> = add_to_cart(&mut cart, extra).map_err(AppError::from);
        assert!(matches!(stacked, Err(AppError::BadRequest(_))));
        assert_eq!(cart[0].cantidad, MAX_LINE_QUANTITY);
    }
}
