pub mod persistence;
pub mod remote_sync;
