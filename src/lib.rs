pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod pipeline;
pub mod processor;
pub mod storage;

pub use error::{ReconcileError, ReconcileResult};
