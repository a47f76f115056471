use crate::domain::{models::audit_log::AuditLog, ports::AuditLogRepository};
use crate::error::AppError;
use async_trait::async_trait;
use sqlx::SqlitePool;

pub struct SqliteAuditRepo {
    pool: SqlitePool,
}

impl SqliteAuditRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditLogRepository for SqliteAuditRepo {
    async fn append(&self, entry: &AuditLog) -> Result<(), AppError> {
        sqlx::query("INSERT INTO audit_logs (id, table_name, record_id, action, actor_id, old_data, new_data, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)")
            .bind(&entry.id).bind(&entry.table_name).bind(&entry.record_id).bind(entry.action)
            .bind(&entry.actor_id).bind(&entry.old_data).bind(&entry.new_data).bind(entry.created_at)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
    async fn list_for_record(&self, table_name: &str, record_id: &str) -> Result<Vec<AuditLog>, AppError> {
        sqlx::query_as::<_, AuditLog>("SELECT * FROM audit_logs WHERE table_name = ? AND record_id = ? ORDER BY created_at ASC").bind(table_name).bind(record_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
}
