//! Oracle driver.
//!
//! The `oracle` crate is synchronous, so every driver call runs on the
//! blocking thread pool. The Oracle client libraries are loaded on first
//! connect, not at build time.

use std::sync::Arc;

use ::oracle::sql_type::ToSql;
use async_trait::async_trait;
use tokio::task::{spawn_blocking, JoinError};
use tracing::debug;

use crate::error::DataAccessError;

use super::connection::{Connection, Connector, Row};

fn worker_failed(err: JoinError) -> DataAccessError {
    DataAccessError::Worker(err.to_string())
}

/// Opens dedicated Oracle connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct OracleConnector;

#[async_trait]
impl Connector for OracleConnector {
    async fn connect(
        &self,
        username: &str,
        password: &str,
        descriptor: &str,
    ) -> Result<Box<dyn Connection>, DataAccessError> {
        let (username, password, descriptor) =
            (username.to_string(), password.to_string(), descriptor.to_string());

        let conn = spawn_blocking(move || ::oracle::Connection::connect(username, password, descriptor))
            .await
            .map_err(worker_failed)?
            .map_err(|e| DataAccessError::Connect(e.to_string()))?;

        debug!("Oracle connection opened");
        Ok(Box::new(OracleConnection {
            inner: Arc::new(conn),
        }))
    }
}

/// An open Oracle connection. The driver closes it on drop as well.
struct OracleConnection {
    inner: Arc<::oracle::Connection>,
}

fn fetch_rows(
    conn: &::oracle::Connection,
    sql: &str,
    params: &[Option<String>],
) -> Result<Vec<Row>, ::oracle::Error> {
    let binds: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
    let result_set = conn.query(sql, &binds)?;
    let columns: Vec<String> = result_set
        .column_info()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut rows = Vec::new();
    for row in result_set {
        let row = row?;
        let mut values = Row::with_capacity(columns.len());
        for (idx, name) in columns.iter().enumerate() {
            values.insert(name.clone(), row.get::<usize, Option<String>>(idx)?);
        }
        rows.push(values);
    }
    Ok(rows)
}

#[async_trait]
impl Connection for OracleConnection {
    async fn execute(
        &mut self,
        sql: &str,
        params: &[Option<String>],
    ) -> Result<Vec<Row>, DataAccessError> {
        let conn = Arc::clone(&self.inner);
        let sql = sql.to_string();
        let params = params.to_vec();

        spawn_blocking(move || fetch_rows(&conn, &sql, &params))
            .await
            .map_err(worker_failed)?
            .map_err(|e| DataAccessError::Query(e.to_string()))
    }

    async fn close(self: Box<Self>) -> Result<(), DataAccessError> {
        let conn = self.inner;
        spawn_blocking(move || conn.close())
            .await
            .map_err(worker_failed)?
            .map_err(|e| DataAccessError::Close(e.to_string()))?;

        debug!("Oracle connection closed");
        Ok(())
    }
}
