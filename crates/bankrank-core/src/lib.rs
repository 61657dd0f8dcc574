pub mod commands;
pub mod config;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod query;
pub mod records;
pub mod runlog;
pub mod transform;

pub use envelope::{FailureEnvelope, SuccessEnvelope};
pub use error::{EtlError, EtlResult};

pub const API_VERSION: &str = env!("CARGO_PKG_VERSION");
