use anyhow::Result;
use scribe::config::ScribeConfig;
use scribe::controller::SMOKE_TEST_DIR;
use scribe::payload::{SessionDocument, PAYLOAD_FILENAME};
use scribe::persist::atomic_write_json;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONFIG_PATH: &str = "scribe_config.json";
const LOG_FILENAME: &str = "scribe.log";

fn main() -> Result<ExitCode> {
    let config = ScribeConfig::load(Path::new(CONFIG_PATH));

    fs::create_dir_all(&config.logs_root)?;
    let file_appender = tracing_appender::rolling::never(&config.logs_root, LOG_FILENAME);
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);

    // Initialize tracing: console plus a log file under the logs root
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scribe=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    info!("Starting scribe session recorder");

    if std::env::args().any(|arg| arg == "--smoke") {
        let payload_path = run_smoke_test(&config)?;
        println!("OK: smoke test complete");
        println!("{}", payload_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    // Returning (rather than exiting) lets the log writer guard flush.
    println!("No action specified. Use --smoke to run the smoke test.");
    Ok(ExitCode::FAILURE)
}

/// Write a minimal payload under the reserved smoke-test session directory
fn run_smoke_test(config: &ScribeConfig) -> Result<PathBuf> {
    let session_dir = config.sessions_root.join(SMOKE_TEST_DIR);
    fs::create_dir_all(&session_dir)?;

    let document = SessionDocument::new(SMOKE_TEST_DIR);
    let payload_path = session_dir.join(PAYLOAD_FILENAME);
    atomic_write_json(&payload_path, &document)?;

    info!("Smoke test payload written: {}", payload_path.display());
    Ok(payload_path)
}
