use std::env;

use anyhow::{Context, Result, bail};
use tracing::info;

use dtp_ingest::batch::parse_batch_size;
use dtp_ingest::oracle::OracleProvider;
use dtp_ingest::queue::DateRange;
use dtp_ingest::source::read_identifiers_from_file;
use dtp_ingest::{IngestConfig, IngestRequest, QueueIngestor, telemetry};

fn main() -> Result<()> {
    telemetry::init_tracing();

    let config = load_config().context("failed to load configuration")?;
    let request = request_from_env().context("failed to build ingestion request")?;

    info!(
        location = %request.location,
        data_type = %request.data_type,
        tester_type = %request.tester_type,
        "submitting ingestion request"
    );

    let ingestor = QueueIngestor::new(config, OracleProvider);
    let outcome = ingestor.ingest(request)?;

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

/// Configuration comes from the first CLI argument (a YAML path) or, when
/// absent, from the `DTP_INGEST_CONFIG` environment variable.
fn load_config() -> Result<IngestConfig> {
    match env::args().nth(1) {
        Some(path) => Ok(IngestConfig::from_file(&path)?),
        None => Ok(IngestConfig::from_env()?),
    }
}

fn request_from_env() -> Result<IngestRequest> {
    let location = require_env("LOCATION")?;
    let data_type = require_env("DATA_TYPE")?;
    let tester_type = require_env("TESTER_TYPE")?;

    let mut request = IngestRequest {
        location,
        data_type,
        tester_type,
        ..Default::default()
    };

    // Exactly-one-mode validation itself lives in the ingestor; here we only
    // materialize whatever the caller supplied.
    if let Ok(ids_file) = env::var("IDS_FILE") {
        let identifiers = read_identifiers_from_file(&ids_file)
            .with_context(|| format!("failed to read identifiers from {ids_file}"))?;
        let batch_size = require_env("BATCH_SIZE")?;
        request.identifiers = Some(identifiers);
        request.batch_size = Some(parse_batch_size(&batch_size)?);
    }

    let start = env::var("START_DATE").ok();
    let end = env::var("END_DATE").ok();
    match (start, end) {
        (Some(start), Some(end)) => {
            request.date_range = Some(DateRange::parse(&start, &end)?);
        }
        (None, None) => {}
        _ => bail!("START_DATE and END_DATE must be provided together"),
    }

    Ok(request)
}

fn require_env(var: &str) -> Result<String> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("environment variable {var} must be set"),
    }
}
