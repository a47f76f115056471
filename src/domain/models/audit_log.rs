use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AuditLog {
    pub id: String,
    pub table_name: String,
    pub record_id: String,
    pub action: AuditAction,
    pub actor_id: Option<String>,
    pub old_data: Option<String>,
    pub new_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(table_name: &str, record_id: &str, action: AuditAction, actor_id: Option<&str>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            table_name: table_name.to_string(),
            record_id: record_id.to_string(),
            action,
            actor_id: actor_id.map(str::to_string),
            old_data: None,
            new_data: None,
            created_at: Utc::now(),
        }
    }
}
