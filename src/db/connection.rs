//! Driver-agnostic connection traits.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::DataAccessError;

/// One result row keyed by column name. `None` is SQL `NULL`.
pub type Row = HashMap<String, Option<String>>;

/// Opens connections to a database.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a fresh, unpooled connection.
    async fn connect(
        &self,
        username: &str,
        password: &str,
        descriptor: &str,
    ) -> Result<Box<dyn Connection>, DataAccessError>;
}

/// A single open connection.
///
/// Dropping a connection without calling [`Connection::close`] must still
/// release it.
#[async_trait]
pub trait Connection: Send {
    /// Run a statement with positional binds and fetch every row.
    async fn execute(
        &mut self,
        sql: &str,
        params: &[Option<String>],
    ) -> Result<Vec<Row>, DataAccessError>;

    /// Close the connection.
    async fn close(self: Box<Self>) -> Result<(), DataAccessError>;
}
