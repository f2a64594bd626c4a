//! Cart pricing and cart-line editing for the register.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::bowl::BowlCustomization;
use crate::domain::money::round_half_up;
use crate::models::MenuItem;

/// Students pay 90% of the unit price.
pub const STUDENT_PRICE_FACTOR: f64 = 0.9;

/// Upper bound for the quantity of a single cart line, stacked or not.
pub const MAX_LINE_QUANTITY: i32 = 999;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    #[error("cantidad must be between 1 and {max}")]
    QuantityOutOfRange { max: i32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub item: MenuItem,
    pub cantidad: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precio_unitario: Option<i64>,
    #[serde(default)]
    pub student_discount: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bowl_customization: Option<BowlCustomization>,
}

impl CartItem {
    pub fn new(item: MenuItem, cantidad: i32) -> Self {
        Self {
            item,
            cantidad,
            precio_unitario: None,
            student_discount: false,
            notas: None,
            custom_key: None,
            bowl_customization: None,
        }
    }
}

/// Stored unit price, falling back to the catalog price.
pub fn unit_price(line: &CartItem) -> i64 {
    line.precio_unitario.unwrap_or(line.item.precio)
}

pub fn effective_unit_price(line: &CartItem) -> i64 {
    let base = unit_price(line);
    if line.student_discount {
        round_half_up(base as f64 * STUDENT_PRICE_FACTOR)
    } else {
        base
    }
}

/// Saturates at `i64::MAX` instead of overflowing.
pub fn line_subtotal(line: &CartItem) -> i64 {
    effective_unit_price(line).saturating_mul(i64::from(line.cantidad))
}

pub fn cart_total(cart: &[CartItem]) -> i64 {
    let raw = cart
        .iter()
        .fold(0i64, |sum, line| sum.saturating_add(line_subtotal(line)));
    normalize_total(raw)
}

/// Cash rounding: a total ending in 50 is bumped to the next hundred.
pub fn normalize_total(total: i64) -> i64 {
    if total.rem_euclid(100) == 50 {
        total.saturating_add(50)
    } else {
        total
    }
}

/// Identity of a cart line: the customization key when present, else the
/// menu item. Student-priced lines never stack with full-price ones.
pub fn line_key(line: &CartItem) -> String {
    let base = line
        .custom_key
        .clone()
        .unwrap_or_else(|| line.item.id.to_string());
    if line.student_discount {
        format!("{base}#estudiante")
    } else {
        base
    }
}

/// Adds a line, stacking its quantity onto an existing line with the same
/// [`line_key`]. The key is the bowl customization or the menu item plus an
/// `#estudiante` marker for student-priced lines, so a student line never
/// merges into a full-price one. Lines with a non-positive quantity are
/// ignored. Fails when the stacked quantity would pass [`MAX_LINE_QUANTITY`];
/// the cart is left unchanged in that case.
pub fn add_to_cart(cart: &mut Vec<CartItem>, line: CartItem) -> Result<(), CartError> {
    if line.cantidad <= 0 {
        return Ok(());
    }
    let out_of_range = CartError::QuantityOutOfRange {
        max: MAX_LINE_QUANTITY,
    };
    let key = line_key(&line);
    match cart.iter_mut().find(|existing| line_key(existing) == key) {
        Some(existing) => {
            let stacked = existing
                .cantidad
                .checked_add(line.cantidad)
                .filter(|cantidad| *cantidad <= MAX_LINE_QUANTITY)
                .ok_or(out_of_range)?;
            existing.cantidad = stacked;
        }
        None if line.cantidad > MAX_LINE_QUANTITY => return Err(out_of_range),
        None => cart.push(line),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn menu_item(precio: i64) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            nombre: "Wrap".into(),
            categoria: "wraps".into(),
            precio,
            disponible: true,
            es_bowl: false,
        }
    }

    #[test]
    fn student_discount_rounds_to_nearest_peso() {
        let mut line = CartItem::new(menu_item(13333), 1);
        line.student_discount = true;
        assert_eq!(unit_price(&line), 13333);
        assert_eq!(effective_unit_price(&line), 12000);
        assert_eq!(cart_total(&[line]), 12000);
    }

    #[test]
    fn stored_unit_price_overrides_catalog() {
        let mut line = CartItem::new(menu_item(10000), 3);
        line.precio_unitario = Some(12500);
        assert_eq!(line_subtotal(&line), 37500);
    }

    #[test]
    fn totals_ending_in_fifty_are_bumped() {
        assert_eq!(normalize_total(12050), 12100);
        assert_eq!(normalize_total(50), 100);
        assert_eq!(normalize_total(12000), 12000);
        assert_eq!(normalize_total(12051), 12051);

        let line = CartItem::new(menu_item(4350), 1);
        assert_eq!(cart_total(&[line]), 4400);
    }

    #[test]
    fn empty_cart_costs_nothing() {
        assert_eq!(cart_total(&[]), 0);
    }

    #[test]
    fn adding_the_same_item_stacks_quantity() {
        let item = menu_item(8000);
        let mut cart = Vec::new();
        add_to_cart(&mut cart, CartItem::new(item.clone(), 1)).expect("added");
        add_to_cart(&mut cart, CartItem::new(item.clone(), 2)).expect("stacked");

        let mut student = CartItem::new(item.clone(), 1);
        student.student_discount = true;
        add_to_cart(&mut cart, student).expect("student line");
        add_to_cart(&mut cart, CartItem::new(item, 0)).expect("ignored");

        assert_eq!(cart.len(), 2);
        assert_eq!(cart[0].cantidad, 3);
        assert_eq!(cart[1].cantidad, 1);
    }

    #[test]
    fn stacking_past_the_line_limit_is_rejected() {
        let item = menu_item(8000);
        let out_of_range = Err(CartError::QuantityOutOfRange {
            max: MAX_LINE_QUANTITY,
        });

        let mut cart = Vec::new();
        assert_eq!(add_to_cart(&mut cart, CartItem::new(item.clone(), i32::MAX)), out_of_range);
        assert!(cart.is_empty());

        add_to_cart(&mut cart, CartItem::new(item.clone(), MAX_LINE_QUANTITY)).expect("at limit");
        assert_eq!(add_to_cart(&mut cart, CartItem::new(item.clone(), 1)), out_of_range);
        assert_eq!(cart[0].cantidad, MAX_LINE_QUANTITY);

        let mut overflowing = vec![CartItem::new(item.clone(), i32::MAX)];
        assert_eq!(add_to_cart(&mut overflowing, CartItem::new(item, 1)), out_of_range);
    }

    #[test]
    fn huge_prices_saturate_instead_of_overflowing() {
        let line = CartItem::new(menu_item(i64::MAX / 2), i32::MAX);
        assert_eq!(line_subtotal(&line), i64::MAX);
        assert_eq!(cart_total(&[line.clone(), line]), i64::MAX);
    }
}
