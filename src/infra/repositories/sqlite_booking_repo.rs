use crate::domain::{
    models::booking::{Booking, BookingFilter, BookingStatus, RecurringBooking},
    ports::BookingRepository,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &Booking, occurrences: &[RecurringBooking]) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, venue_id, renter_id, date, start_time, end_time, status, total_amount, insurance_required, insurance_approved, recurring_type, recurring_end_date, notes, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&booking.id).bind(&booking.venue_id).bind(&booking.renter_id).bind(booking.date)
            .bind(booking.start_time).bind(booking.end_time).bind(booking.status).bind(booking.total_amount)
            .bind(booking.insurance_required).bind(booking.insurance_approved).bind(booking.recurring_type)
            .bind(booking.recurring_end_date).bind(&booking.notes).bind(booking.created_at).bind(booking.updated_at)
            .fetch_one(&mut *tx).await.map_err(AppError::Database)?;

        for occ in occurrences {
            sqlx::query(
                "INSERT INTO recurring_bookings (id, parent_booking_id, venue_id, renter_id, date, start_time, end_time, status, total_amount, insurance_required, insurance_approved, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
            )
                .bind(&occ.id).bind(&occ.parent_booking_id).bind(&occ.venue_id).bind(&occ.renter_id)
                .bind(occ.date).bind(occ.start_time).bind(occ.end_time).bind(occ.status)
                .bind(occ.total_amount).bind(occ.insurance_required).bind(occ.insurance_approved).bind(occ.created_at)
                .execute(&mut *tx).await.map_err(AppError::Database)?;
        }
        tx.commit().await.map_err(AppError::Database)?;
        Ok(created)
    }
    async fn find_by_id(&self, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?").bind(id).fetch_optional(&self.pool).await.map_err(AppError::Database)
    }
    async fn list(&self, filter: &BookingFilter) -> Result<Vec<Booking>, AppError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM bookings WHERE 1 = 1");
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(venue_id) = &filter.venue_id {
            qb.push(" AND venue_id = ").push_bind(venue_id.clone());
        }
        if let Some(renter_id) = &filter.renter_id {
            qb.push(" AND renter_id = ").push_bind(renter_id.clone());
        }
        if let Some(venue_ids) = &filter.venue_ids {
            // An owner without venues sees nothing.
            if venue_ids.is_empty() {
                return Ok(Vec::new());
            }
            qb.push(" AND venue_id IN (");
            let mut ids = qb.separated(", ");
            for id in venue_ids {
                ids.push_bind(id.clone());
            }
            ids.push_unseparated(")");
        }
        if let Some(from) = filter.date_from {
            qb.push(" AND date >= ").push_bind(from);
        }
        if let Some(to) = filter.date_to {
            qb.push(" AND date <= ").push_bind(to);
        }
        qb.push(" ORDER BY date ASC, start_time ASC");
        qb.build_query_as::<Booking>().fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_active_by_range(&self, venue_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE venue_id = ? AND date >= ? AND date <= ? AND status IN ('pending', 'confirmed') ORDER BY date ASC, start_time ASC").bind(venue_id).bind(from).bind(to).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_active_recurring_by_range(&self, venue_id: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<RecurringBooking>, AppError> {
        sqlx::query_as::<_, RecurringBooking>("SELECT * FROM recurring_bookings WHERE venue_id = ? AND date >= ? AND date <= ? AND status IN ('pending', 'confirmed') ORDER BY date ASC, start_time ASC").bind(venue_id).bind(from).bind(to).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    async fn list_recurring_by_parent(&self, parent_booking_id: &str) -> Result<Vec<RecurringBooking>, AppError> {
        sqlx::query_as::<_, RecurringBooking>("SELECT * FROM recurring_bookings WHERE parent_booking_id = ? ORDER BY date ASC").bind(parent_booking_id).fetch_all(&self.pool).await.map_err(AppError::Database)
    }
    /// Moves the booking and its still-active occurrences to `status`.
    async fn update_status(&self, id: &str, status: BookingStatus) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let updated = sqlx::query_as::<_, Booking>("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ? RETURNING *")
            .bind(status).bind(Utc::now()).bind(id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        sqlx::query("UPDATE recurring_bookings SET status = ? WHERE parent_booking_id = ? AND status IN ('pending', 'confirmed')")
            .bind(status).bind(id)
            .execute(&mut *tx).await.map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }
    async fn approve_insurance(&self, id: &str) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let updated = sqlx::query_as::<_, Booking>("UPDATE bookings SET insurance_approved = 1, updated_at = ? WHERE id = ? RETURNING *")
            .bind(Utc::now()).bind(id)
            .fetch_optional(&mut *tx).await.map_err(AppError::Database)?
            .ok_or(AppError::NotFound("Booking not found".into()))?;
        sqlx::query("UPDATE recurring_bookings SET insurance_approved = 1 WHERE parent_booking_id = ?").bind(id).execute(&mut *tx).await.map_err(AppError::Database)?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(updated)
    }
    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = ?").bind(id).execute(&self.pool).await.map_err(AppError::Database)?;
        if result.rows_affected() == 0 { return Err(AppError::NotFound("Booking not found".into())); }
        Ok(())
    }
}
