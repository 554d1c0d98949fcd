//! Database access for transaction-code lookups.
//!
//! This module handles:
//! - The driver seam (`Connector` / `Connection`)
//! - The Oracle driver
//! - The single lookup the service performs
//! - Mock driver for testing

pub mod connection;
pub mod gateway;
pub mod mock;
pub mod oracle;

pub use connection::{Connection, Connector, Row};
pub use gateway::QueryGateway;
pub use mock::{MockConfig, MockConnector};
pub use self::oracle::OracleConnector;
