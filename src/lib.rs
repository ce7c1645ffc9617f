pub mod config;
pub mod inference;
pub mod models;
pub mod report;

use tracing_subscriber::EnvFilter;

pub use models::{AnalysisResult, ClassDistribution, ClassShare, Finding, ImageData, Severity};
pub use report::{classify, compose_report, compose_report_with, ReportArtifact, ReportError, ReportSettings};

/// Installs the global tracing subscriber. `RUST_LOG` wins over the default filter.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .try_init();

    tracing::debug!("{} v{}", config::APP_NAME, config::APP_VERSION);
}
