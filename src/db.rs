//! Local durable store: embedded SQLite.
//!
//! All schema lives in `migrate`, all SQL in `queries`, and the shared
//! connection handle in `store`.

pub mod initialize;
pub mod migrate;
pub mod queries;
pub mod store;

pub use store::Store;
