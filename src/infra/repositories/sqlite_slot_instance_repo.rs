use crate::domain::{
    models::slot_instance::{SlotActionType, SlotInstance, SlotModalContent, SlotPricing},
    ports::SlotInstanceRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{types::Json, FromRow, QueryBuilder, Sqlite, SqlitePool};

pub struct SqliteSlotInstanceRepo {
    pool: SqlitePool,
}

impl SqliteSlotInstanceRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ModalContentRow {
    action_type: SlotActionType,
    title: String,
    body: String,
    bullet_points: Json<Vec<String>>,
    cta_label: Option<String>,
}

impl From<ModalContentRow> for SlotModalContent {
    fn from(row: ModalContentRow) -> Self {
        Self {
            action_type: row.action_type,
            title: row.title,
            body: row.body,
            bullet_points: row.bullet_points.0,
            cta_label: row.cta_label,
        }
    }
}

#[async_trait]
impl SlotInstanceRepository for SqliteSlotInstanceRepo {
    async fn create(&self, instance: &SlotInstance) -> Result<SlotInstance, AppError> {
        sqlx::query_as::<_, SlotInstance>(
            "INSERT INTO slot_instances (id, venue_id, date, start_time, end_time, action_type, is_active, blocks_inventory, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&instance.id).bind(&instance.venue_id).bind(instance.date).bind(instance.start_time)
            .bind(instance.end_time).bind(instance.action_type).bind(instance.is_active)
            .bind(instance.blocks_inventory).bind(instance.created_at)
            .fetch_one(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_active_by_type(&self, venue_id: &str, from: NaiveDate, to: NaiveDate, action_type: SlotActionType) -> Result<Vec<SlotInstance>, AppError> {
        sqlx::query_as::<_, SlotInstance>("SELECT * FROM slot_instances WHERE venue_id = ? AND date >= ? AND date <= ? AND action_type = ? AND is_active = 1 ORDER BY date ASC, start_time ASC").bind(venue_id).bind(from).bind(to).bind(action_type).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn find_exact_active(
        &self,
        venue_id: &str,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        action_type: SlotActionType,
    ) -> Result<Option<SlotInstance>, AppError> {
        sqlx::query_as::<_, SlotInstance>("SELECT * FROM slot_instances WHERE venue_id = ? AND date = ? AND start_time = ? AND end_time = ? AND action_type = ? AND is_active = 1 LIMIT 1")
            .bind(venue_id).bind(date).bind(start_time).bind(end_time).bind(action_type)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn upsert_pricing(&self, pricing: &SlotPricing) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO slot_pricing (slot_instance_id, amount, currency, unit, payment_method) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(slot_instance_id) DO UPDATE SET amount = excluded.amount, currency = excluded.currency, unit = excluded.unit, payment_method = excluded.payment_method"
        )
            .bind(&pricing.slot_instance_id).bind(pricing.amount).bind(&pricing.currency).bind(pricing.unit).bind(pricing.payment_method)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
    async fn list_pricing(&self, slot_instance_ids: &[String]) -> Result<Vec<SlotPricing>, AppError> {
        if slot_instance_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM slot_pricing WHERE slot_instance_id IN (");
        let mut ids = qb.separated(", ");
        for id in slot_instance_ids {
            ids.push_bind(id.clone());
        }
        ids.push_unseparated(")");
        qb.build_query_as::<SlotPricing>().fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn upsert_modal_content(&self, content: &SlotModalContent) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO slot_modal_content (action_type, title, body, bullet_points, cta_label) VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(action_type) DO UPDATE SET title = excluded.title, body = excluded.body, bullet_points = excluded.bullet_points, cta_label = excluded.cta_label"
        )
            .bind(content.action_type).bind(&content.title).bind(&content.body)
            .bind(Json(&content.bullet_points)).bind(&content.cta_label)
            .execute(&self.pool).await.map_err(AppError::Database)?;
        Ok(())
    }
    async fn find_modal_content(&self, action_type: SlotActionType) -> Result<Option<SlotModalContent>, AppError> {
        let row = sqlx::query_as::<_, ModalContentRow>("SELECT * FROM slot_modal_content WHERE action_type = ?")
            .bind(action_type)
            .fetch_optional(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.map(SlotModalContent::from))
    }
}
