use crate::errors::ConnectionError;

/// Parameters for opening one database session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub hostname: String,
    pub port: u16,
    pub service_name: String,
    pub username: String,
    pub password: String,
}

impl ConnectParams {
    /// EZConnect-style descriptor, `host:port/service`.
    pub fn connect_string(&self) -> String {
        format!("{}:{}/{}", self.hostname, self.port, self.service_name)
    }
}

/// A value bound to a named SQL parameter. Identifier values always travel
/// through binds, never through the statement text.
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Number(i64),
}

/// One live database session, exclusively owned by a single in-flight
/// ingestion request. Implementations wrap the concrete driver; the engine
/// only ever uses this trait.
pub trait QueueConnection {
    /// Executes a statement with named bind parameters and returns the
    /// number of affected rows.
    fn execute(&mut self, sql: &str, binds: &[(String, BindValue)]) -> Result<u64, ConnectionError>;

    fn commit(&mut self) -> Result<(), ConnectionError>;

    fn rollback(&mut self) -> Result<(), ConnectionError>;

    /// Releases the session. Called exactly once per request, on every exit
    /// path.
    fn close(&mut self) -> Result<(), ConnectionError>;
}

/// Acquires a session scoped to one ingestion request.
pub trait ConnectionProvider {
    type Conn: QueueConnection;

    fn acquire(&self, params: &ConnectParams) -> Result<Self::Conn, ConnectionError>;
}
