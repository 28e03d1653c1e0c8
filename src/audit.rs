use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Best-effort audit entry for an order event; failures are only logged.
pub async fn audit_order(pool: &DbPool, actor: Uuid, action: &str, order_id: Uuid, extra: Value) {
    let mut metadata = serde_json::json!({ "order_id": order_id });
    if let (Some(target), Value::Object(fields)) = (metadata.as_object_mut(), extra) {
        target.extend(fields);
    }

    if let Err(err) = log_audit(pool, Some(actor), action, Some("orders"), Some(metadata)).await {
        tracing::warn!(error = %err, action, order_id = %order_id, "audit log failed");
    }
}
