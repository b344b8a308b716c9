mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use schema::{latest_schema, WAREHOUSE_VERSIONED_SCHEMAS};
pub use store::{FileTransaction, Warehouse};
pub use trait_def::{SongLookup, WarehouseWriter};
