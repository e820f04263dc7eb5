pub mod archive;
pub mod config;
pub mod confirm;
pub mod error;
pub mod retention;
pub mod snapshot;
pub mod types;
