pub mod audit;
pub mod availability;
pub mod booking_service;
pub mod conflict;
pub mod payment_service;
pub mod policy;
pub mod time_range;
