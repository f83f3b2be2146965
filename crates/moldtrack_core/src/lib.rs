//! Core domain logic for MoldTrack.
//! Inventory lookup and state changes for molds and cutters.

pub mod catalog;
pub mod config;
pub mod db;
pub mod events;
pub mod import;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;

pub use catalog::{AssetView, Catalog, JoinOptions};
pub use config::{ConfigError, CoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use events::{ChangeKind, EventBus, InventoryEvent};
pub use import::{import_dir, ImportError, ImportReport};
pub use logging::{
    default_log_level, init_logging, init_logging_with, logging_status, normalize_level,
    LogSettings,
};
pub use model::activity::{ActivityRecord, AssetStatus};
pub use model::asset::{AssetKey, AssetKind, TeflonStatus};
pub use model::tables::RawTables;
pub use repo::activity_repo::{ActivityRepository, SqliteActivityRepository};
pub use repo::table_repo::{SqliteTableRepository, TableRepository};
pub use repo::{RepoError, RepoResult};
pub use search::filter::{FieldFilter, FilterField, SearchQuery};
pub use service::action_service::{ActionError, ActionReceipt, ActionService, Actor};
pub use service::lookup_service::{LookupError, LookupService};

/// Returns the core crate version, reported by `moldtrack --version`.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
