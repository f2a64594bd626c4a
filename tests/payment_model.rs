use chrono::Utc;
use pos_orders_api::{
    domain::{
        cart::{
            CartError, CartItem, MAX_LINE_QUANTITY, add_to_cart, cart_total, effective_unit_price,
            normalize_total,
        },
        money::format_cop,
        order::{Order, OrderStatus},
        payments::{
            PaymentAllocation, PaymentMethod, PaymentState, allocations_total, merge_allocations,
            normalize_allocations, payment_summary, sanitize_allocations,
        },
    },
    dto::orders::OrderView,
    models::MenuItem,
};
use serde_json::json;
use uuid::Uuid;

fn order_with(total: i64, allocations: serde_json::Value) -> Order {
    let now = Utc::now();
    Order {
        id: Uuid::new_v4(),
        numero: 7,
        cliente: Some("Mesa 2".into()),
        items: Vec::new(),
        total,
        estado: OrderStatus::Entregado,
        pago: PaymentState::from_stored(Some(&allocations), None, None, None, total),
        paid_at: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn split_payment_example() {
    let order = order_with(
        25000,
        json!([{ "metodo": "efectivo", "monto": 20000 }, { "metodo": "nequi", "monto": 5000 }]),
    );
    assert!(order.is_paid());
    assert_eq!(
        payment_summary(order.pago.allocations(), format_cop),
        "Efectivo: $20.000 · Nequi: $5.000"
    );
}

#[test]
fn one_peso_short_is_still_paid() {
    assert!(order_with(25000, json!([{ "metodo": "tarjeta", "monto": 24999 }])).is_paid());
    assert!(!order_with(25000, json!([{ "metodo": "tarjeta", "monto": 24000 }])).is_paid());
}

#[test]
fn order_without_allocations_is_pending() {
    let order = order_with(25000, json!([]));
    assert_eq!(order.pago, PaymentState::Pending);
    assert!(!order.is_paid());

    let view = OrderView::from(order);
    assert!(!view.pagado);
    assert_eq!(view.resumen_pago, "Pago pendiente");
}

#[test]
fn sanitize_example_from_the_register() {
    let raw = json!([
        { "metodo": "bogus", "monto": 100 },
        { "metodo": "efectivo", "monto": -5 },
        { "metodo": "nequi", "monto": 300.4 }
    ]);
    assert_eq!(
        sanitize_allocations(&raw, &PaymentMethod::REGISTER),
        vec![PaymentAllocation::new(PaymentMethod::Nequi, 300)]
    );
}

#[test]
fn merge_is_idempotent_and_preserves_sum() {
    let raw = json!([
        { "metodo": "efectivo", "monto": 1000 },
        { "metodo": "tarjeta", "monto": 2000.6 },
        { "metodo": "efectivo", "monto": "500" },
        { "metodo": "nequi", "monto": 0 },
        { "metodo": "provision_caja", "monto": 900 }
    ]);
    for permitted in [&PaymentMethod::REGISTER[..], &PaymentMethod::ALL[..]] {
        let sanitized = sanitize_allocations(&raw, permitted);
        assert!(sanitized.iter().all(|a| a.monto > 0 && permitted.contains(&a.metodo)));

        let merged = merge_allocations(sanitized.clone());
        assert_eq!(merge_allocations(merged.clone()), merged);
        assert_eq!(allocations_total(&merged), allocations_total(&sanitized));
        assert_eq!(normalize_allocations(&raw, permitted), merged);
    }
}

#[test]
fn student_price_and_cash_rounding() {
    let item = MenuItem {
        id: Uuid::new_v4(),
        nombre: "Almuerzo ejecutivo".into(),
        categoria: "almuerzos".into(),
        precio: 13333,
        disponible: true,
        es_bowl: false,
    };
    let mut line = CartItem::new(item, 1);
    line.student_discount = true;
    assert_eq!(effective_unit_price(&line), 12000);
    assert_eq!(cart_total(&[line]), 12000);

    for raw in [0, 50, 150, 12_049, 12_050, 99_950] {
        let normalized = normalize_total(raw);
        if raw % 100 == 50 {
            assert_eq!(normalized, raw + 50);
        } else {
            assert_eq!(normalized, raw);
        }
    }
}

#[test]
fn overpayment_past_tolerance_is_unpaid() {
    let order = order_with(25000, json!([{ "metodo": "tarjeta", "monto": 25002 }]));
    assert!(!order.is_paid());
}

#[test]
fn absurd_register_amounts_do_not_overflow() {
    let raw = json!([
        { "metodo": "efectivo", "monto": 9e18 },
        { "metodo": "efectivo", "monto": 9e18 }
    ]);
    assert!(normalize_allocations(&raw, &PaymentMethod::REGISTER).is_empty());

    let order = order_with(25000, raw);
    assert!(!order.is_paid());
    assert_eq!(order.payment_summary(), "Pago pendiente");
}

#[test]
fn stacking_a_line_past_the_limit_fails() {
    let item = MenuItem {
        id: Uuid::new_v4(),
        nombre: "Jugo natural".into(),
        categoria: "bebidas".into(),
        precio: 6000,
        disponible: true,
        es_bowl: false,
    };
    let mut cart = Vec::new();
    add_to_cart(&mut cart, CartItem::new(item.clone(), MAX_LINE_QUANTITY)).expect("at limit");

    let result = add_to_cart(&mut cart, CartItem::new(item, 1));
    assert_eq!(
        result,
        Err(CartError::QuantityOutOfRange {
            max: MAX_LINE_QUANTITY
        })
    );
    assert_eq!(cart_total(&cart), 6000 * i64::from(MAX_LINE_QUANTITY));
}
