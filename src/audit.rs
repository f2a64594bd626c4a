use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult, state::AppState};

pub async fn log_audit(
    pool: &DbPool,
    action: &str,
    resource: Option<&str>,
    resource_id: Option<Uuid>,
    metadata: Option<Value>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, action, resource, resource_id, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(action)
    .bind(resource)
    .bind(resource_id)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Best-effort audit: a failed write is logged and never fails the request.
pub async fn record(
    state: &AppState,
    action: &str,
    resource: &str,
    resource_id: Uuid,
    metadata: Value,
) {
    let written = log_audit(
        &state.pool,
        action,
        Some(resource),
        Some(resource_id),
        Some(metadata),
    )
    .await;
    if let Err(err) = written {
        tracing::warn!(error = %err, action, %resource_id, "audit log failed");
    }
}
