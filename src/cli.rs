use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::utils::CheckName;

#[derive(Parser)]
#[command(name = "kubecheck")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"))]
#[command(about = "Kubernetes cluster health checking and reporting tool", long_about = None)]
pub struct Cli {
    /// Path to a kubeconfig file (defaults to $KUBECONFIG, ~/.kube/config or in-cluster)
    #[arg(long, global = true)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use instead of the current one
    #[arg(long, global = true, env = "KUBECHECK_CONTEXT")]
    pub context: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every check once and write a report
    Check {
        #[command(flatten)]
        checks: CheckArgs,

        /// Report format
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Html)]
        format: ReportFormat,

        /// Directory the report file is written to
        #[arg(short, long, default_value = "reports", env = "KUBECHECK_OUTPUT_DIR")]
        output_dir: PathBuf,
    },

    /// Show a terminal dashboard refreshed on an interval
    Watch {
        #[command(flatten)]
        checks: CheckArgs,

        /// Seconds between refreshes
        #[arg(short, long, default_value_t = 30)]
        interval: u64,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Html,
    Json,
    Log,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Html => "html",
            ReportFormat::Json => "json",
            ReportFormat::Log => "log",
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct CheckArgs {
    /// External URL whose reachability is checked
    #[arg(short, long, env = "KUBECHECK_URL")]
    pub url: Option<String>,

    /// Run checks concurrently
    #[arg(short, long)]
    pub parallel: bool,

    /// Checks to leave out of the run (repeatable)
    #[arg(long, value_enum)]
    pub skip: Vec<CheckName>,

    /// Timeout in seconds for each Kubernetes API call
    #[arg(long, default_value_t = 15)]
    pub probe_timeout: u64,

    /// Timeout in seconds for commands executed inside pods
    #[arg(long, default_value_t = 20)]
    pub exec_timeout: u64,

    /// Accept invalid TLS certificates for the URL check
    #[arg(long)]
    pub insecure: bool,

    /// Service counted healthy without endpoints, as namespace/name (repeatable)
    #[arg(long = "endpoint-exception")]
    pub endpoint_exceptions: Vec<String>,

    /// CPU, memory and pod usage percent that flags a node
    #[arg(long, default_value_t = 80.0)]
    pub resource_threshold: f64,

    #[arg(long, default_value = "rook-ceph")]
    pub ceph_namespace: String,

    #[arg(long, default_value = "app=rook-ceph-tools")]
    pub ceph_selector: String,

    #[arg(long, default_value = "harbor")]
    pub harbor_namespace: String,

    #[arg(long, default_value = "component=registry")]
    pub harbor_selector: String,

    #[arg(long, default_value = "registry")]
    pub harbor_container: String,

    #[arg(long, default_value = "/storage")]
    pub harbor_path: String,

    #[arg(long, default_value = "minio")]
    pub minio_namespace: String,

    #[arg(long, default_value = "app=minio")]
    pub minio_selector: String,

    #[arg(long, default_value = "minio")]
    pub minio_container: String,

    #[arg(long, default_value = "/data")]
    pub minio_path: String,
}
