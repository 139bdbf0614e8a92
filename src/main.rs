//! Cardioscore: cardiac severity scoring.
//!
//! Reads one patient request (a JSON object of the 13 clinical inputs) from a
//! file argument or stdin and prints the assessment report as JSON.
//!
//! Exit codes: 0 success, 2 invalid request, 3 model offline.

use std::io::{IsTerminal, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardioscore::adapters::load_artifacts;
use cardioscore::adapters::sanitize::RedactingMakeWriter;
use cardioscore::config::Settings;
use cardioscore::{AssessmentService, RawInputs, RiskClassifier};

const EXIT_INVALID_REQUEST: u8 = 2;
const EXIT_MODEL_OFFLINE: u8 = 3;

fn usage() -> &'static str {
    "Usage: cardioscore [request.json | -]\n\nReads the request from stdin when no path (or `-`) is given."
}

fn read_request(path: Option<&str>) -> Result<String> {
    match path {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read request from stdin")?;
            Ok(buf)
        }
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("Failed to read {p}")),
    }
}

fn main() -> Result<ExitCode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") || args.len() > 1 {
        eprintln!("{}", usage());
        return Ok(ExitCode::from(EXIT_INVALID_REQUEST));
    }

    let settings = Settings::from_env();

    // Stdout carries the report; logs go to a file or stderr.
    let interactive = std::io::stdout().is_terminal();
    let (writer, _guard) = if settings.log_mode.use_file(interactive) {
        if let Some(parent) = settings.log_file.parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.log_file)
            .with_context(|| format!("Failed to open log file {:?}", settings.log_file))?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stderr())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(RedactingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting Cardioscore...");

    let classifier = RiskClassifier::from_artifacts(load_artifacts(&settings.artifacts));
    let service = AssessmentService::new(classifier);

    let body = read_request(args.first().map(String::as_str))?;
    let inputs: RawInputs = match serde_json::from_str(&body) {
        Ok(inputs) => inputs,
        Err(e) => {
            tracing::warn!("Rejected malformed request");
            eprintln!("Invalid request: {e}");
            return Ok(ExitCode::from(EXIT_INVALID_REQUEST));
        }
    };

    let code = match service.assess(&inputs) {
        Ok(report) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
            ExitCode::SUCCESS
        }
        Err(e) if e.is_validation() => {
            tracing::warn!("Rejected request: {}", e);
            eprintln!("{e}");
            ExitCode::from(EXIT_INVALID_REQUEST)
        }
        Err(e) if e.is_model_unavailable() => {
            eprintln!("System offline: {e}");
            ExitCode::from(EXIT_MODEL_OFFLINE)
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("Cardioscore shutdown complete.");
    Ok(code)
}
