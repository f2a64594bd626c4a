use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::{
        bowl::BowlCustomization,
        cart::{CartItem, cart_total},
        money::format_cop,
        order::{Order, OrderStatus},
        payments::{
            CreditInfo, PaymentMethod, PaymentState, allocations_total, covers_total,
            normalize_allocations,
        },
        summary::{SalesSummary, summarize_sales},
    },
    dto::orders::{
        CreateOrderRequest, OrderHistory, OrderList, OrderView, RecordPaymentRequest,
        UpdateOrderRequest,
    },
    entity::{
        audit_logs::{Column as AuditCol, Entity as AuditLogs},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
    },
    error::{AppError, AppResult},
    models::{AuditEntry, MenuItem},
    response::{ApiResponse, Meta},
    routes::params::{DateRange, OrderListQuery, SortOrder},
    services::cart_service::resolve_lines,
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = date_condition(&query.range())?;
    if let Some(estado) = query.estado {
        condition = condition.add(OrderCol::Estado.eq(estado.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut items = load_items(&state.orm, &ids).await?;

    let orders = models
        .into_iter()
        .map(|model| {
            let lines = items.remove(&model.id).unwrap_or_default();
            OrderView::from(order_from_entity(model, lines))
        })
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items: orders },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_order(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderView>> {
    let model = Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let order = with_items(&state.orm, model).await?;

    Ok(ApiResponse::success("OK", order.into(), Some(Meta::empty())))
}

pub async fn create_order(
    state: &AppState,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderView>> {
    let txn = state.orm.begin().await?;

    let cart = resolve_lines(&txn, &payload.items).await?;
    let total = cart_total(&cart);
    let now = Utc::now();

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        numero: NotSet,
        cliente: Set(payload.cliente.and_then(clean_text)),
        estado: Set(OrderStatus::Pendiente.as_str().into()),
        total: Set(total),
        payment_allocations: Set(None),
        metodo_pago: Set(None),
        payment_status: Set(None),
        paid_at: Set(None),
        credit_empleado_id: Set(None),
        credit_empleado_nombre: Set(None),
        credit_monto: Set(None),
        credit_asignado_en: Set(None),
        credit_liquidado_en: Set(None),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    insert_items(&txn, order.id, &cart).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, numero = order.numero, total, "order created");
    audit::record(
        state,
        "order_create",
        "orders",
        order.id,
        serde_json::json!({ "numero": order.numero, "total": total }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        order_from_entity(order, cart).into(),
        Some(Meta::empty()),
    ))
}

pub async fn update_order(
    state: &AppState,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<OrderView>> {
    if payload.estado.is_none() && payload.items.is_none() && payload.cliente.is_none() {
        return Err(AppError::BadRequest("Nothing to update".into()));
    }

    let txn = state.orm.begin().await?;
    let model = lock_order(&txn, id).await?;
    let current = with_items(&txn, model.clone()).await?;

    let mut active: OrderActive = model.into();
    let mut changes = serde_json::Map::new();

    if let Some(lines) = payload.items.as_deref() {
        if !current.is_editable() {
            return Err(AppError::BadRequest(
                "Items can only change while the order is pendiente and unpaid".into(),
            ));
        }
        let cart = resolve_lines(&txn, lines).await?;
        OrderItems::delete_many()
            .filter(OrderItemCol::OrderId.eq(id))
            .exec(&txn)
            .await?;
        insert_items(&txn, id, &cart).await?;

        let total = cart_total(&cart);
        active.total = Set(total);
        changes.insert("total".into(), total.into());
    }

    if let Some(estado) = payload.estado {
        let next = current.estado.transition_to(estado)?;
        active.estado = Set(next.as_str().into());
        changes.insert("estado".into(), next.as_str().into());
    }

    if let Some(cliente) = payload.cliente {
        active.cliente = Set(clean_text(cliente));
        changes.insert("cliente".into(), true.into());
    }

    active.updated_at = Set(Utc::now().into());
    let model = active.update(&txn).await?;
    let order = with_items(&txn, model).await?;

    txn.commit().await?;

    tracing::debug!(order_id = %id, ?changes, "order updated");
    audit::record(state, "order_update", "orders", id, serde_json::Value::Object(changes)).await;

    Ok(ApiResponse::success("Order updated", order.into(), Some(Meta::empty())))
}

/// Records the register payment of an order. The allocations must add up to
/// the order total within the one-peso tolerance.
pub async fn record_order_payment(
    state: &AppState,
    id: Uuid,
    payload: RecordPaymentRequest,
) -> AppResult<ApiResponse<OrderView>> {
    let txn = state.orm.begin().await?;
    let model = lock_order(&txn, id).await?;

    match payment_from_entity(&model) {
        PaymentState::Credit(_) => {
            return Err(AppError::BadRequest("Order is charged to employee credit".into()));
        }
        pago if !pago.is_open() => return Err(AppError::BadRequest("Order already paid".into())),
        _ => {}
    }

    let allocations = normalize_allocations(&payload.allocations, &PaymentMethod::REGISTER);
    if allocations.is_empty() {
        return Err(AppError::BadRequest(
            "Payment needs at least one allocation with a valid method and amount".into(),
        ));
    }
    if !covers_total(&allocations, model.total) {
        return Err(AppError::BadRequest(format!(
            "Payment of {} does not match order total {}",
            format_cop(allocations_total(&allocations)),
            format_cop(model.total)
        )));
    }

    let now = Utc::now();
    let stored = serde_json::to_value(&allocations).map_err(anyhow::Error::from)?;
    let mut active: OrderActive = model.into();
    active.payment_allocations = Set(Some(stored.clone()));
    active.metodo_pago = Set(None);
    active.payment_status = Set(None);
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let model = active.update(&txn).await?;
    let order = with_items(&txn, model).await?;

    txn.commit().await?;

    tracing::info!(order_id = %id, total = order.total, "payment recorded");
    let metadata = serde_json::json!({ "allocations": stored });
    audit::record(state, "order_paid", "orders", id, metadata).await;

    Ok(ApiResponse::success("Payment recorded", order.into(), Some(Meta::empty())))
}

pub async fn sales_summary(
    state: &AppState,
    range: DateRange,
) -> AppResult<ApiResponse<SalesSummary>> {
    let condition = date_condition(&range)?;
    let orders = Orders::find()
        .filter(condition)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|model| {
            let pago = payment_from_entity(&model);
            (model.total, pago)
        });

    let summary = summarize_sales(orders);
    let count = summary.pedidos;
    Ok(ApiResponse::success("Sales summary", summary, Some(Meta::total(count))))
}

pub async fn order_history(state: &AppState, id: Uuid) -> AppResult<ApiResponse<OrderHistory>> {
    Orders::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let items: Vec<AuditEntry> = AuditLogs::find()
        .filter(AuditCol::ResourceId.eq(id))
        .order_by_asc(AuditCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|entry| AuditEntry {
            id: entry.id,
            action: entry.action,
            resource: entry.resource,
            resource_id: entry.resource_id,
            metadata: entry.metadata,
            created_at: entry.created_at.with_timezone(&Utc),
        })
        .collect();

    let count = items.len() as i64;
    Ok(ApiResponse::success("Order history", OrderHistory { items }, Some(Meta::total(count))))
}

pub(crate) async fn lock_order(txn: &DatabaseTransaction, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)
}

pub(crate) async fn with_items<C>(conn: &C, model: OrderModel) -> AppResult<Order>
where
    C: ConnectionTrait,
{
    let lines = load_items(conn, &[model.id])
        .await?
        .remove(&model.id)
        .unwrap_or_default();
    Ok(order_from_entity(model, lines))
}

async fn load_items<C>(conn: &C, order_ids: &[Uuid]) -> AppResult<HashMap<Uuid, Vec<CartItem>>>
where
    C: ConnectionTrait,
{
    let mut grouped: HashMap<Uuid, Vec<CartItem>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }

    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids.to_vec()))
        .order_by_asc(OrderItemCol::OrderId)
        .order_by_asc(OrderItemCol::Posicion)
        .all(conn)
        .await?;

    for row in rows {
        grouped
            .entry(row.order_id)
            .or_default()
            .push(cart_item_from_entity(row));
    }
    Ok(grouped)
}

async fn insert_items<C>(conn: &C, order_id: Uuid, cart: &[CartItem]) -> AppResult<()>
where
    C: ConnectionTrait,
{
    for (posicion, line) in cart.iter().enumerate() {
        let bowl = line
            .bowl_customization
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(anyhow::Error::from)?;

        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            posicion: Set(posicion as i32),
            menu_item_id: Set(line.item.id),
            nombre: Set(line.item.nombre.clone()),
            categoria: Set(line.item.categoria.clone()),
            precio_catalogo: Set(line.item.precio),
            es_bowl: Set(line.item.es_bowl),
            cantidad: Set(line.cantidad),
            precio_unitario: Set(line.precio_unitario),
            student_discount: Set(line.student_discount),
            notas: Set(line.notas.clone()),
            custom_key: Set(line.custom_key.clone()),
            bowl_customization: Set(bowl),
            created_at: NotSet,
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

fn date_condition(range: &DateRange) -> AppResult<Condition> {
    let (start, end) = range.bounds()?;
    let mut condition = Condition::all();
    if let Some(start) = start {
        condition = condition.add(OrderCol::CreatedAt.gte(start));
    }
    if let Some(end) = end {
        condition = condition.add(OrderCol::CreatedAt.lt(end));
    }
    Ok(condition)
}

fn clean_text(value: String) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Folds the stored payment columns, legacy ones included, into a
/// [`PaymentState`].
pub(crate) fn payment_from_entity(model: &OrderModel) -> PaymentState {
    let credit = model.credit_empleado_id.clone().map(|empleado_id| CreditInfo {
        empleado_nombre: model
            .credit_empleado_nombre
            .clone()
            .unwrap_or_else(|| empleado_id.clone()),
        empleado_id,
        monto: model.credit_monto.unwrap_or(model.total),
        asignado_en: model
            .credit_asignado_en
            .unwrap_or(model.created_at)
            .with_timezone(&Utc),
        liquidado_en: model.credit_liquidado_en.map(|dt| dt.with_timezone(&Utc)),
    });

    PaymentState::from_stored(
        model.payment_allocations.as_ref(),
        model.metodo_pago.as_deref(),
        model.payment_status.as_deref(),
        credit,
        model.total,
    )
}

pub(crate) fn order_from_entity(model: OrderModel, items: Vec<CartItem>) -> Order {
    let pago = payment_from_entity(&model);
    let estado = OrderStatus::from_tag(&model.estado).unwrap_or_else(|| {
        tracing::warn!(order_id = %model.id, estado = %model.estado, "unknown order state");
        OrderStatus::Pendiente
    });

    Order {
        id: model.id,
        numero: model.numero,
        cliente: model.cliente,
        items,
        total: model.total,
        estado,
        pago,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn cart_item_from_entity(model: OrderItemModel) -> CartItem {
    let bowl_customization = model.bowl_customization.and_then(|raw| {
        serde_json::from_value::<BowlCustomization>(raw)
            .map_err(|err| {
                tracing::warn!(
                    order_item_id = %model.id,
                    error = %err,
                    "unreadable bowl customization"
                )
            })
            .ok()
    });

    CartItem {
        item: MenuItem {
            id: model.menu_item_id,
            nombre: model.nombre,
            categoria: model.categoria,
            precio: model.precio_catalogo,
            disponible: true,
            es_bowl: model.es_bowl,
        },
        cantidad: model.cantidad,
        precio_unitario: model.precio_unitario,
        student_discount: model.student_discount,
        notas: model.notas,
        custom_key: model.custom_key,
        bowl_customization,
    }
}
