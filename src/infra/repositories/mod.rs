pub mod sqlite_venue_repo;
pub mod sqlite_admin_config_repo;
pub mod sqlite_availability_repo;
pub mod sqlite_slot_instance_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_payment_repo;
pub mod sqlite_external_block_repo;
pub mod sqlite_audit_repo;
