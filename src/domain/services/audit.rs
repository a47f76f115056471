use std::sync::Arc;
use serde::Serialize;
use tracing::warn;

use crate::domain::models::audit_log::{AuditAction, AuditLog};
use crate::domain::ports::AuditLogRepository;

/// Best-effort audit trail. Write failures are logged and never surface.
pub struct AuditLogger {
    repo: Arc<dyn AuditLogRepository>,
}

impl AuditLogger {
    pub fn new(repo: Arc<dyn AuditLogRepository>) -> Self {
        Self { repo }
    }

    pub async fn record<T: Serialize>(
        &self,
        table_name: &str,
        record_id: &str,
        action: AuditAction,
        actor_id: Option<&str>,
        old_data: Option<&T>,
        new_data: Option<&T>,
    ) {
        let mut entry = AuditLog::new(table_name, record_id, action, actor_id);
        entry.old_data = old_data.and_then(|d| serde_json::to_string(d).ok());
        entry.new_data = new_data.and_then(|d| serde_json::to_string(d).ok());

        if let Err(e) = self.repo.append(&entry).await {
            warn!(table = table_name, record_id, "Failed to write audit log: {}", e);
        }
    }
}
