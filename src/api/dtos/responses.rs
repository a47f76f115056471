use serde::Serialize;

use crate::domain::models::{payment::RefundResult, slot_instance::SlotInstance};

#[derive(Serialize)]
pub struct GeneratedSlotsResponse {
    pub created: usize,
    pub slot_instances: Vec<SlotInstance>,
}

/// `refund` is null when there was nothing paid to refund.
#[derive(Serialize)]
pub struct RefundResponse {
    pub refund: Option<RefundResult>,
}

#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
    pub handled: bool,
}
