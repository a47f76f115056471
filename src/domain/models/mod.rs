pub mod audit_log;
pub mod auth;
pub mod availability;
pub mod booking;
pub mod payment;
pub mod slot_instance;
pub mod venue;
