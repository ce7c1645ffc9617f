use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use dentimap_lib::config;
use dentimap_lib::inference::{DentimapClient, InferenceService, ScanUpload, DEFAULT_TIMEOUT_SECS};
use dentimap_lib::report::{classify_with, PdfSurface, ReportComposer, ReportSettings};

#[derive(Parser, Debug)]
#[command(
    name = "dentimap",
    about = "Analyze a dental scan and generate a PDF findings report",
    version
)]
struct Cli {
    /// Dental scan image (JPEG, PNG, ...)
    scan: Option<PathBuf>,

    /// Inference API base URL (defaults to $DENTIMAP_API_BASE_URL or the hosted service)
    #[arg(long = "api-url")]
    api_url: Option<String>,

    /// Directory to save the report in (defaults to ~/DentiMap/reports)
    #[arg(long = "out-dir", short = 'o')]
    out_dir: Option<PathBuf>,

    /// JSON file overriding report layout and thresholds
    #[arg(long = "settings", short = 's')]
    settings: Option<PathBuf>,

    /// Print findings without generating a report
    #[arg(long = "findings-only")]
    findings_only: bool,

    /// Check the inference service health and exit
    #[arg(long = "check-health")]
    check_health: bool,
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn Error>> {
    let client = match &cli.api_url {
        Some(url) => DentimapClient::new(url, DEFAULT_TIMEOUT_SECS)?,
        None => DentimapClient::from_config()?,
    };

    if cli.check_health {
        let healthy = client.is_healthy();
        println!(
            "{}: {}",
            client.base_url(),
            if healthy { "healthy" } else { "unavailable" }
        );
        return Ok(if healthy { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let Some(scan_path) = cli.scan else {
        return Err("No scan given. Pass an image path, or --check-health.".into());
    };

    let settings = match &cli.settings {
        Some(path) => config::load_settings(path)?,
        None => ReportSettings::default(),
    };

    let upload = ScanUpload::from_path(&scan_path)?;
    let result = client.analyze_scan(&upload)?;
    let findings = classify_with(&result.class_distribution, &settings.thresholds);

    println!("Analysis completed in {} seconds", result.inference_time_seconds);
    for (i, finding) in findings.iter().enumerate() {
        println!(
            "{}. {} [{}] {:.2}%",
            i + 1,
            finding.name,
            finding.severity,
            finding.confidence_percent
        );
    }

    if cli.findings_only {
        return Ok(ExitCode::SUCCESS);
    }

    let surface = PdfSurface::new("DentiMap Analysis Report", &settings.page)?;
    let artifact = ReportComposer::new(surface, settings, chrono::Local::now()).compose_with_findings(
        &result,
        &upload.to_image_data(),
        findings,
    )?;

    let out_dir = cli.out_dir.unwrap_or_else(config::reports_dir);
    let path = artifact.save_to(&out_dir)?;
    for failure in &artifact.degraded_blocks {
        eprintln!("Warning: {} could not be rendered: {}", failure.block, failure.reason);
    }
    println!("Report saved to {} ({} pages)", path.display(), artifact.page_count);
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    dentimap_lib::init_tracing();
    match run(Cli::parse()) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
