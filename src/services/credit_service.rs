use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    domain::payments::PaymentState,
    dto::{
        credits::{CreditBalance, CreditOrderRef},
        orders::{AssignCreditRequest, OrderView},
    },
    entity::orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    services::order_service::{lock_order, payment_from_entity, with_items},
    state::AppState,
};

/// Diverts an unpaid order to the employee's running credit instead of
/// collecting at the register.
pub async fn assign_order_credit(
    state: &AppState,
    id: Uuid,
    payload: AssignCreditRequest,
) -> AppResult<ApiResponse<OrderView>> {
    let empleado_id = payload.empleado_id.trim().to_string();
    let empleado_nombre = payload.empleado_nombre.trim().to_string();
    if empleado_id.is_empty() || empleado_nombre.is_empty() {
        return Err(AppError::BadRequest("empleado_id and empleado_nombre are required".into()));
    }

    let txn = state.orm.begin().await?;
    let model = lock_order(&txn, id).await?;

    match payment_from_entity(&model) {
        PaymentState::Credit(_) => {
            return Err(AppError::BadRequest("Order is already charged to employee credit".into()));
        }
        pago if !pago.is_open() => return Err(AppError::BadRequest("Order already paid".into())),
        _ => {}
    }
    if model.total <= 0 {
        return Err(AppError::BadRequest("Order has nothing to charge".into()));
    }

    let now = Utc::now();
    let monto = model.total;
    let mut active: OrderActive = model.into();
    active.credit_empleado_id = Set(Some(empleado_id.clone()));
    active.credit_empleado_nombre = Set(Some(empleado_nombre));
    active.credit_monto = Set(Some(monto));
    active.credit_asignado_en = Set(Some(now.into()));
    active.credit_liquidado_en = Set(None);
    active.updated_at = Set(now.into());
    let model = active.update(&txn).await?;
    let order = with_items(&txn, model).await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %id,
        empleado_id = %empleado_id,
        monto,
        "order charged to employee credit"
    );
    audit::record(
        state,
        "order_credit_assign",
        "orders",
        id,
        serde_json::json!({ "empleado_id": empleado_id, "monto": monto }),
    )
    .await;

    Ok(ApiResponse::success("Credit assigned", order.into(), Some(Meta::empty())))
}

/// Marks the employee credit of an order as paid back.
pub async fn settle_order_employee_credit(
    state: &AppState,
    id: Uuid,
) -> AppResult<ApiResponse<OrderView>> {
    let txn = state.orm.begin().await?;
    let model = lock_order(&txn, id).await?;

    let credit = match payment_from_entity(&model) {
        PaymentState::Credit(credit) => credit,
        _ => return Err(AppError::BadRequest("Order is not charged to employee credit".into())),
    };
    if credit.is_settled() {
        return Err(AppError::BadRequest("Employee credit already settled".into()));
    }

    let now = Utc::now();
    let mut active: OrderActive = model.into();
    active.credit_liquidado_en = Set(Some(now.into()));
    active.paid_at = Set(Some(now.into()));
    active.updated_at = Set(now.into());
    let model = active.update(&txn).await?;
    let order = with_items(&txn, model).await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %id,
        empleado_id = %credit.empleado_id,
        monto = credit.monto,
        "employee credit settled"
    );
    audit::record(
        state,
        "order_credit_settle",
        "orders",
        id,
        serde_json::json!({ "empleado_id": credit.empleado_id, "monto": credit.monto }),
    )
    .await;

    Ok(ApiResponse::success("Credit settled", order.into(), Some(Meta::empty())))
}

/// Outstanding credit of one employee, oldest charge first.
pub async fn employee_balance(
    state: &AppState,
    empleado_id: &str,
) -> AppResult<ApiResponse<CreditBalance>> {
    let empleado_id = empleado_id.trim();
    let rows = Orders::find()
        .filter(OrderCol::CreditEmpleadoId.eq(empleado_id))
        .filter(OrderCol::CreditLiquidadoEn.is_null())
        .order_by_asc(OrderCol::CreditAsignadoEn)
        .all(&state.orm)
        .await?;

    let mut empleado_nombre = None;
    let pedidos: Vec<CreditOrderRef> = rows
        .iter()
        .filter_map(|model| match payment_from_entity(model) {
            PaymentState::Credit(credit) if !credit.is_settled() => {
                empleado_nombre.get_or_insert(credit.empleado_nombre);
                Some(CreditOrderRef {
                    order_id: model.id,
                    numero: model.numero,
                    monto: credit.monto,
                    asignado_en: credit.asignado_en,
                })
            }
            _ => None,
        })
        .collect();

    let pendiente = pedidos
        .iter()
        .fold(0i64, |sum, pedido| sum.saturating_add(pedido.monto));
    let count = pedidos.len() as i64;

    Ok(ApiResponse::success(
        "Employee credit",
        CreditBalance {
            empleado_id: empleado_id.to_string(),
            empleado_nombre,
            pendiente,
            pedidos,
        },
        Some(Meta::total(count)),
    ))
}
