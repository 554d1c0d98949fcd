//! Mock database driver for unit testing.
//!
//! This module provides a connector that can be used in tests without a
//! database. It answers statements from canned rows keyed by the first bind
//! value and keeps track of every connection it hands out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::DataAccessError;

use super::connection::{Connection, Connector, Row};

/// Configuration for mock connector behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Whether to fail opening connections.
    pub fail_connect: bool,
    /// Whether to fail statement execution.
    pub fail_query: bool,
    /// Whether to fail closing connections.
    pub fail_close: bool,
    /// Simulated latency per statement in milliseconds.
    pub latency_ms: u64,
}

#[derive(Debug, Default)]
struct Stats {
    opened: AtomicUsize,
    closed: AtomicUsize,
}

/// Statement captured by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    /// SQL text.
    pub sql: String,
    /// Positional binds.
    pub params: Vec<Option<String>>,
    /// User the connection was opened with.
    pub username: String,
}

/// Mock connector for testing.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    /// Mock configuration.
    config: MockConfig,
    /// Canned rows by first bind value.
    rows: Arc<Mutex<HashMap<Option<String>, Vec<Row>>>>,
    /// Every statement executed so far.
    executed: Arc<Mutex<Vec<ExecutedStatement>>>,
    /// Connection accounting.
    stats: Arc<Stats>,
}

impl MockConnector {
    /// Create a new mock connector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock connector with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Answer statements bound to `filter` with a single-column result set.
    pub fn set_column(&self, filter: Option<&str>, column: &str, values: &[Option<&str>]) {
        let rows = values
            .iter()
            .map(|v| {
                let mut row = Row::new();
                row.insert(column.to_string(), v.map(str::to_string));
                row
            })
            .collect();
        self.set_rows(filter, rows);
    }

    /// Answer statements bound to `filter` with the given rows.
    pub fn set_rows(&self, filter: Option<&str>, rows: Vec<Row>) {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(filter.map(str::to_string), rows);
    }

    /// Statements executed so far.
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Connections opened so far.
    pub fn opened(&self) -> usize {
        self.stats.opened.load(Ordering::SeqCst)
    }

    /// Connections released so far, by close or drop.
    pub fn closed(&self) -> usize {
        self.stats.closed.load(Ordering::SeqCst)
    }

    /// Connections currently held open.
    pub fn open_connections(&self) -> usize {
        self.opened() - self.closed()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(
        &self,
        username: &str,
        _password: &str,
        _descriptor: &str,
    ) -> Result<Box<dyn Connection>, DataAccessError> {
        if self.config.fail_connect {
            return Err(DataAccessError::Connect(
                "ORA-12541: TNS:no listener".to_string(),
            ));
        }

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            owner: self.clone(),
            username: username.to_string(),
            released: false,
        }))
    }
}

struct MockConnection {
    owner: MockConnector,
    username: String,
    released: bool,
}

impl MockConnection {
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.owner.stats.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn execute(
        &mut self,
        sql: &str,
        params: &[Option<String>],
    ) -> Result<Vec<Row>, DataAccessError> {
        if self.owner.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.owner.config.latency_ms)).await;
        }

        self.owner
            .executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ExecutedStatement {
                sql: sql.to_string(),
                params: params.to_vec(),
                username: self.username.clone(),
            });

        if self.owner.config.fail_query {
            return Err(DataAccessError::Query(
                "ORA-00942: table or view does not exist".to_string(),
            ));
        }

        let key = params.first().cloned().flatten();
        let rows = self
            .owner
            .rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .unwrap_or_default();
        Ok(rows)
    }

    async fn close(self: Box<Self>) -> Result<(), DataAccessError> {
        let mut this = self;
        this.release();
        if this.owner.config.fail_close {
            return Err(DataAccessError::Close(
                "ORA-03113: end-of-file on communication channel".to_string(),
            ));
        }
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.release();
    }
}
