use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::info;

use crate::batch::IdentifierBatch;
use crate::db::{BindValue, QueueConnection};
use crate::errors::{ConnectionError, ExecuteError, IngestError, ValidationError};
use crate::routing::{RoutingKey, SenderId};

pub const QUEUE_TABLE: &str = "DTP_SENDER_QUEUE_ITEM";
pub const QUEUE_SEQUENCE: &str = "DTP_SENDER_QUEUE_ITEM_SEQ";
pub const METADATA_VIEW: &str = "ALL_METADATA_VIEW";

const ORACLE_DATE_FORMAT: &str = "YYYY-MM-DD HH24:MI:SS";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Inclusive timestamp range over the metadata source's record timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    /// Fails when `start` is after `end`; the bounds are never reordered
    /// silently.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::DateRangeOrder {
                start: start.format(DATE_TIME_FORMAT).to_string(),
                end: end.format(DATE_TIME_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parses caller-supplied bounds. Accepts `YYYY-MM-DD HH:MM:SS` or a bare
    /// date, which pins to midnight.
    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_timestamp(start)?, parse_timestamp(end)?)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn start_bind(&self) -> String {
        self.start.format(DATE_TIME_FORMAT).to_string()
    }

    pub fn end_bind(&self) -> String {
        self.end.format(DATE_TIME_FORMAT).to_string()
    }
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, ValidationError> {
    let trimmed = value.trim();
    NaiveDateTime::parse_from_str(trimmed, DATE_TIME_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
                .map(|date| date.and_time(NaiveTime::MIN))
        })
        .map_err(|_| ValidationError::DateFormat {
            value: value.to_string(),
        })
}

fn insert_select(predicate: &str) -> String {
    format!(
        "INSERT INTO {table} (id, id_metadata, id_data, id_sender, record_created) \
         SELECT {sequence}.NEXTVAL, m.id, m.id_data, :sender_id, SYSDATE \
         FROM {view} m \
         WHERE m.location = :location \
           AND m.data_type = :data_type \
           AND m.tester_type = :tester_type \
           AND {predicate}",
        table = QUEUE_TABLE,
        sequence = QUEUE_SEQUENCE,
        view = METADATA_VIEW,
        predicate = predicate,
    )
}

fn routing_binds(key: &RoutingKey, sender_id: SenderId) -> Vec<(String, BindValue)> {
    vec![
        ("sender_id".to_string(), BindValue::Number(sender_id.0)),
        ("location".to_string(), BindValue::Text(key.location.clone())),
        (
            "data_type".to_string(),
            BindValue::Text(key.data_type.clone()),
        ),
        (
            "tester_type".to_string(),
            BindValue::Text(key.tester_type.clone()),
        ),
    ]
}

/// Statement and binds for one identifier batch. Each identifier gets its own
/// named placeholder; none of the values appear in the statement text.
pub fn id_batch_statement(
    batch: &IdentifierBatch,
    sender_id: SenderId,
    key: &RoutingKey,
) -> (String, Vec<(String, BindValue)>) {
    let placeholders = (0..batch.identifiers.len())
        .map(|i| format!(":id_data{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = insert_select(&format!("m.id_data IN ({placeholders})"));

    let mut binds = routing_binds(key, sender_id);
    for (i, id) in batch.identifiers.iter().enumerate() {
        binds.push((format!("id_data{i}"), BindValue::Text(id.clone())));
    }
    (sql, binds)
}

/// Statement and binds for a date-range submission.
pub fn date_range_statement(
    range: &DateRange,
    sender_id: SenderId,
    key: &RoutingKey,
) -> (String, Vec<(String, BindValue)>) {
    let sql = insert_select(&format!(
        "m.record_datetime BETWEEN TO_DATE(:start_date, '{fmt}') \
         AND TO_DATE(:end_date, '{fmt}')",
        fmt = ORACLE_DATE_FORMAT,
    ));

    let mut binds = routing_binds(key, sender_id);
    binds.push(("start_date".to_string(), BindValue::Text(range.start_bind())));
    binds.push(("end_date".to_string(), BindValue::Text(range.end_bind())));
    (sql, binds)
}

/// Copies metadata rows matching one identifier batch into the queue table
/// and commits. Each batch is its own transaction; a later failure never
/// rolls this batch back.
pub fn insert_id_batch<C: QueueConnection>(
    conn: &mut C,
    batch: &IdentifierBatch,
    sender_id: SenderId,
    key: &RoutingKey,
) -> Result<u64, IngestError> {
    let (sql, binds) = id_batch_statement(batch, sender_id, key);

    let rows = run_unit(conn, &sql, &binds).map_err(|source| ExecuteError::Batch {
        index: batch.index,
        identifiers: batch.identifiers.clone(),
        source,
    })?;

    info!(
        batch_index = batch.index,
        identifiers = batch.identifiers.len(),
        rows,
        "inserted identifier batch"
    );
    Ok(rows)
}

/// Copies metadata rows whose record timestamp falls within the range into
/// the queue table. Single statement, single commit.
pub fn insert_date_range<C: QueueConnection>(
    conn: &mut C,
    range: &DateRange,
    sender_id: SenderId,
    key: &RoutingKey,
) -> Result<u64, IngestError> {
    let (sql, binds) = date_range_statement(range, sender_id, key);

    let rows = run_unit(conn, &sql, &binds).map_err(|source| ExecuteError::Range {
        start: range.start_bind(),
        end: range.end_bind(),
        source,
    })?;

    info!(
        start = %range.start_bind(),
        end = %range.end_bind(),
        rows,
        "inserted date range"
    );
    Ok(rows)
}

fn run_unit<C: QueueConnection>(
    conn: &mut C,
    sql: &str,
    binds: &[(String, BindValue)],
) -> Result<u64, ConnectionError> {
    let rows = conn.execute(sql, binds)?;
    conn.commit()?;
    Ok(rows)
}
