use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, Hash)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SlotActionType {
    InstantBook,
    RequestPrivate,
    InfoOnlyOpenGym,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct SlotInstance {
    pub id: String,
    pub venue_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub action_type: SlotActionType,
    pub is_active: bool,
    pub blocks_inventory: bool,
    pub created_at: DateTime<Utc>,
}

impl SlotInstance {
    pub fn new(
        venue_id: String,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        action_type: SlotActionType,
        blocks_inventory: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            venue_id,
            date,
            start_time,
            end_time,
            action_type,
            is_active: true,
            blocks_inventory,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PricingUnit {
    Hour,
    Person,
    Session,
}

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "TEXT", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PricingPaymentMethod {
    OnSite,
    InApp,
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone, PartialEq)]
pub struct SlotPricing {
    pub slot_instance_id: String,
    pub amount: f64,
    pub currency: String,
    pub unit: PricingUnit,
    pub payment_method: PricingPaymentMethod,
}

/// Explanatory content shown when an info-only slot is opened.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SlotModalContent {
    pub action_type: SlotActionType,
    pub title: String,
    pub body: String,
    pub bullet_points: Vec<String>,
    pub cta_label: Option<String>,
}

/// A slot as offered to renters, regular or info-only.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UnifiedSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue_id: String,
    pub availability_id: Option<String>,
    pub slot_instance_id: Option<String>,
    pub action_type: SlotActionType,
    pub modal_content: Option<SlotModalContent>,
    pub slot_pricing: Option<SlotPricing>,
}
