use serde::Serialize;
use tracing::{info, warn};

use crate::batch;
use crate::config::IngestConfig;
use crate::db::{ConnectParams, ConnectionProvider, QueueConnection};
use crate::errors::{Result, ValidationError};
use crate::queue::{self, DateRange};
use crate::routing::{RoutingKey, RoutingTable};

/// One ingestion submission. Exactly one of `identifiers` and `date_range`
/// must be set; identifier mode additionally requires a batch size.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub location: String,
    pub data_type: String,
    pub tester_type: String,
    pub identifiers: Option<Vec<String>>,
    pub batch_size: Option<usize>,
    pub date_range: Option<DateRange>,
}

#[derive(Debug)]
enum IngestMode {
    Identifiers {
        identifiers: Vec<String>,
        batch_size: usize,
    },
    Range(DateRange),
}

impl IngestRequest {
    fn routing_key(&self) -> RoutingKey {
        RoutingKey::new(
            self.location.clone(),
            self.data_type.clone(),
            self.tester_type.clone(),
        )
    }

    fn mode(self) -> std::result::Result<IngestMode, ValidationError> {
        match (self.identifiers, self.date_range) {
            (Some(identifiers), None) => {
                let batch_size = self.batch_size.ok_or(ValidationError::BatchSize {
                    value: "<missing>".to_string(),
                })?;
                Ok(IngestMode::Identifiers {
                    identifiers,
                    batch_size,
                })
            }
            (None, Some(range)) => Ok(IngestMode::Range(range)),
            _ => Err(ValidationError::ModeSelection),
        }
    }
}

/// Aggregate result of one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub rows_inserted: u64,
    pub batches_completed: usize,
}

/// Top-level entry point. Owns the connection scope for each submission:
/// validate, acquire, resolve the sender once, insert, close unconditionally.
pub struct QueueIngestor<P: ConnectionProvider> {
    config: IngestConfig,
    routing: RoutingTable,
    provider: P,
}

impl<P: ConnectionProvider> QueueIngestor<P> {
    pub fn new(config: IngestConfig, provider: P) -> Self {
        let routing = config.routing_table();
        Self::with_routing_table(config, routing, provider)
    }

    /// Builds an ingestor around an explicitly constructed routing table
    /// instead of the one derived from `config`.
    pub fn with_routing_table(config: IngestConfig, routing: RoutingTable, provider: P) -> Self {
        Self {
            config,
            routing,
            provider,
        }
    }

    pub fn ingest(&self, request: IngestRequest) -> Result<IngestOutcome> {
        let key = request.routing_key();
        match request.mode()? {
            IngestMode::Identifiers {
                identifiers,
                batch_size,
            } => self.ingest_by_identifiers(identifiers, batch_size, &key),
            IngestMode::Range(range) => self.ingest_by_date_range(range, &key),
        }
    }

    /// Inserts queue rows for every identifier in the list, in order, one
    /// committed transaction per batch. Stops at the first failing batch;
    /// earlier batches stay committed.
    pub fn ingest_by_identifiers(
        &self,
        identifiers: Vec<String>,
        batch_size: usize,
        key: &RoutingKey,
    ) -> Result<IngestOutcome> {
        let batches = batch::plan(&identifiers, batch_size)?;
        if batches.is_empty() {
            info!(key = %key, "no identifiers to ingest");
            return Ok(IngestOutcome::default());
        }

        let params = self.connect_params(key)?;
        let total = batches.len();
        info!(key = %key, batches = total, batch_size, "starting identifier ingestion");

        self.with_connection(&params, |conn| {
            let sender_id = self.routing.resolve(key)?;
            let mut outcome = IngestOutcome::default();
            for batch in &batches {
                let rows = queue::insert_id_batch(conn, batch, sender_id, key)?;
                outcome.rows_inserted += rows;
                outcome.batches_completed += 1;
            }
            info!(
                key = %key,
                sender_id = %sender_id,
                rows = outcome.rows_inserted,
                batches = outcome.batches_completed,
                "identifier ingestion complete"
            );
            Ok(outcome)
        })
    }

    /// Inserts queue rows for every metadata record inside the range, as a
    /// single committed transaction.
    pub fn ingest_by_date_range(&self, range: DateRange, key: &RoutingKey) -> Result<IngestOutcome> {
        let params = self.connect_params(key)?;
        info!(
            key = %key,
            start = %range.start_bind(),
            end = %range.end_bind(),
            "starting date range ingestion"
        );

        self.with_connection(&params, |conn| {
            let sender_id = self.routing.resolve(key)?;
            let rows = queue::insert_date_range(conn, &range, sender_id, key)?;
            info!(key = %key, sender_id = %sender_id, rows, "date range ingestion complete");
            Ok(IngestOutcome {
                rows_inserted: rows,
                batches_completed: 1,
            })
        })
    }

    fn connect_params(&self, key: &RoutingKey) -> Result<ConnectParams> {
        let location = self.config.location(&key.location)?;
        Ok(location.connect_params(&key.location)?)
    }

    /// Runs `work` against a freshly acquired connection. The connection is
    /// closed exactly once on every exit path; a failed unit gets a
    /// best-effort rollback first. Close failures are logged, never masking
    /// the work's own result.
    fn with_connection<T>(
        &self,
        params: &ConnectParams,
        work: impl FnOnce(&mut P::Conn) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.provider.acquire(params)?;
        info!(connect_string = %params.connect_string(), "acquired database connection");

        let result = work(&mut conn);

        if result.is_err() {
            if let Err(e) = conn.rollback() {
                warn!(error = %e, "rollback after failure did not succeed");
            }
        }
        if let Err(e) = conn.close() {
            warn!(error = %e, "failed to close database connection");
        } else {
            info!("database connection closed");
        }

        result
    }
}
