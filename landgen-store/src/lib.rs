pub mod app_config;
pub mod database;
pub mod fixtures;
pub mod memory;
pub mod postgres;

pub use database::DbClient;
pub use fixtures::Dataset;
pub use memory::MemoryStore;
pub use postgres::PgStore;
