//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod audit_repo;
pub mod item_repo;
pub mod permission_repo;
pub mod settings_repo;
pub mod trigger_repo;

pub use audit_repo::AuditLogRepo;
pub use item_repo::ItemRepo;
pub use permission_repo::PermissionRepo;
pub use settings_repo::SettingsRepo;
pub use trigger_repo::TriggerRepo;
