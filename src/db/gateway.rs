//! Transaction-code lookup by access right.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use crate::config::DB_CONNECT_DESCRIPTOR;
use crate::error::DataAccessError;
use crate::secrets::Credentials;

use super::connection::{Connector, Row};

/// The one statement this service runs.
pub const TCODE_QUERY: &str = "SELECT LOW
         FROM V_CUSN_AGR_1251
         WHERE ARG_NAME = :accRight";

/// Column projected from every row.
pub const TCODE_COLUMN: &str = "LOW";

/// Runs the transaction-code query on a dedicated connection per call.
///
/// Connections are neither pooled nor reused.
#[derive(Clone)]
pub struct QueryGateway {
    connector: Arc<dyn Connector>,
    credentials: Arc<Credentials>,
    descriptor: String,
    timeout: Option<Duration>,
}

impl QueryGateway {
    /// Create a gateway against the configured database.
    pub fn new(
        connector: Arc<dyn Connector>,
        credentials: Arc<Credentials>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            connector,
            credentials,
            descriptor: DB_CONNECT_DESCRIPTOR.to_string(),
            timeout,
        }
    }

    /// Connect descriptor in use.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    /// Look up the `LOW` values granted by `access_right`.
    ///
    /// The filter is bound as given; `None` binds `NULL`.
    #[instrument(skip(self))]
    pub async fn lookup(
        &self,
        access_right: Option<&str>,
    ) -> Result<Vec<Option<String>>, DataAccessError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(access_right))
                .await
                .map_err(|_| DataAccessError::Timeout)?,
            None => self.run(access_right).await,
        }
    }

    async fn run(&self, access_right: Option<&str>) -> Result<Vec<Option<String>>, DataAccessError> {
        let mut conn = self
            .connector
            .connect(
                self.credentials.username(),
                self.credentials.password(),
                &self.descriptor,
            )
            .await?;

        let executed = conn
            .execute(TCODE_QUERY, &[access_right.map(str::to_string)])
            .await;
        let closed = conn.close().await;

        let rows = match (executed, closed) {
            (Ok(rows), Ok(())) => rows,
            (Ok(_), Err(close_err)) => return Err(close_err),
            (Err(query_err), closed) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "Failed to close connection after query error");
                }
                return Err(query_err);
            }
        };

        debug!(rows = rows.len(), "Lookup finished");
        Ok(project_column(rows, TCODE_COLUMN))
    }
}

/// Take one column from every row, keeping row order.
pub fn project_column(rows: Vec<Row>, column: &str) -> Vec<Option<String>> {
    rows.into_iter()
        .map(|mut row| row.remove(column).flatten())
        .collect()
}
