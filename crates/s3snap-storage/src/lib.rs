pub mod error;
pub mod local;
pub mod provider;
pub mod s3;
