pub mod error;
pub mod types;

pub use error::{KubecheckError, Result};
pub use types::{CheckName, CheckResult, NodeResourceSample, Status};
