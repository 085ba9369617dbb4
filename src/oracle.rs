use oracle::sql_type::ToSql;
use tracing::info;

use crate::db::{BindValue, ConnectParams, ConnectionProvider, QueueConnection};
use crate::errors::ConnectionError;

/// Connection provider backed by the `oracle` driver. The engine only sees
/// the [`ConnectionProvider`] / [`QueueConnection`] traits; all driver error
/// mapping happens here.
#[derive(Debug, Default)]
pub struct OracleProvider;

pub struct OracleQueueConnection {
    inner: oracle::Connection,
}

impl ConnectionProvider for OracleProvider {
    type Conn = OracleQueueConnection;

    fn acquire(&self, params: &ConnectParams) -> Result<Self::Conn, ConnectionError> {
        let connect_string = params.connect_string();
        let inner = oracle::Connection::connect(&params.username, &params.password, &connect_string)
            .map_err(|e| ConnectionError::Acquire {
                reason: e.to_string(),
            })?;
        info!(%connect_string, "connected to Oracle database");
        Ok(OracleQueueConnection { inner })
    }
}

impl QueueConnection for OracleQueueConnection {
    fn execute(&mut self, sql: &str, binds: &[(String, BindValue)]) -> Result<u64, ConnectionError> {
        let named: Vec<(&str, &dyn ToSql)> = binds
            .iter()
            .map(|(name, value)| (name.as_str(), bind_ref(value)))
            .collect();
        let statement =
            self.inner
                .execute_named(sql, &named)
                .map_err(|e| ConnectionError::Statement {
                    reason: e.to_string(),
                })?;
        statement.row_count().map_err(|e| ConnectionError::Statement {
            reason: e.to_string(),
        })
    }

    fn commit(&mut self) -> Result<(), ConnectionError> {
        self.inner.commit().map_err(|e| ConnectionError::Commit {
            reason: e.to_string(),
        })
    }

    fn rollback(&mut self) -> Result<(), ConnectionError> {
        self.inner.rollback().map_err(|e| ConnectionError::Rollback {
            reason: e.to_string(),
        })
    }

    fn close(&mut self) -> Result<(), ConnectionError> {
        self.inner.close().map_err(|e| ConnectionError::Close {
            reason: e.to_string(),
        })
    }
}

fn bind_ref(value: &BindValue) -> &dyn ToSql {
    match value {
        BindValue::Text(text) => text,
        BindValue::Number(number) => number,
    }
}
