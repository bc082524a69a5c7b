use thiserror::Error;

#[derive(Error, Debug)]
pub enum KubecheckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Cluster unavailable: {0}")]
    Cluster(String),

    #[error("Exec in pod {pod} failed: {reason}")]
    Exec { pod: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Render error: {0}")]
    Render(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("System error: {0}")]
    System(String),
}

pub type Result<T> = std::result::Result<T, KubecheckError>;
