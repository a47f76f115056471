pub mod booking;
pub mod health;
pub mod payment;
pub mod slots;
pub mod webhook;
