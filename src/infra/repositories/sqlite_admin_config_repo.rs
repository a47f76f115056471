use crate::domain::{models::venue::{OperatingHoursWindow, VenueAdminConfig}, ports::AdminConfigRepository};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::{types::Json, FromRow, SqlitePool};

pub struct SqliteAdminConfigRepo {
    pool: SqlitePool,
}

impl SqliteAdminConfigRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct AdminConfigRow {
    venue_id: String,
    min_advance_lead_time_hours: i32,
    same_day_cutoff_time: Option<NaiveTime>,
    blackout_dates: Json<Vec<NaiveDate>>,
    holiday_dates: Json<Vec<NaiveDate>>,
    operating_hours: Json<Vec<OperatingHoursWindow>>,
    drop_in_enabled: bool,
    drop_in_price: Option<f64>,
}

impl From<AdminConfigRow> for VenueAdminConfig {
    fn from(row: AdminConfigRow) -> Self {
        Self {
            venue_id: row.venue_id,
            min_advance_lead_time_hours: row.min_advance_lead_time_hours,
            same_day_cutoff_time: row.same_day_cutoff_time,
            blackout_dates: row.blackout_dates.0,
            holiday_dates: row.holiday_dates.0,
            operating_hours: row.operating_hours.0,
            drop_in_enabled: row.drop_in_enabled,
            drop_in_price: row.drop_in_price,
        }
    }
}

#[async_trait]
impl AdminConfigRepository for SqliteAdminConfigRepo {
    async fn find_by_venue(&self, venue_id: &str) -> Result<Option<VenueAdminConfig>, AppError> {
        let row = sqlx::query_as::<_, AdminConfigRow>("SELECT * FROM venue_admin_configs WHERE venue_id = ?")
            .bind(venue_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;
        Ok(row.map(VenueAdminConfig::from))
    }

    async fn upsert(&self, config: &VenueAdminConfig) -> Result<VenueAdminConfig, AppError> {
        let row = sqlx::query_as::<_, AdminConfigRow>(
            "INSERT INTO venue_admin_configs (venue_id, min_advance_lead_time_hours, same_day_cutoff_time, blackout_dates, holiday_dates, operating_hours, drop_in_enabled, drop_in_price)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(venue_id) DO UPDATE SET
                min_advance_lead_time_hours = excluded.min_advance_lead_time_hours,
                same_day_cutoff_time = excluded.same_day_cutoff_time,
                blackout_dates = excluded.blackout_dates,
                holiday_dates = excluded.holiday_dates,
                operating_hours = excluded.operating_hours,
                drop_in_enabled = excluded.drop_in_enabled,
                drop_in_price = excluded.drop_in_price
             RETURNING *"
        )
            .bind(&config.venue_id).bind(config.min_advance_lead_time_hours).bind(config.same_day_cutoff_time)
            .bind(Json(&config.blackout_dates)).bind(Json(&config.holiday_dates)).bind(Json(&config.operating_hours))
            .bind(config.drop_in_enabled).bind(config.drop_in_price)
            .fetch_one(&self.pool).await.map_err(AppError::Database)?;
        Ok(row.into())
    }
}
