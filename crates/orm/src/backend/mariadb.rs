//! MariaDB dialect: operator templates and connection configuration.
//!
//! The wire-level client is out of scope here; this module carries what
//! the rest of the crate needs from the dialect — the operator rendering
//! table and the connection-string assembly from environment
//! configuration.

use std::env;

use serde::Deserialize;

use crate::error::{OrmError, OrmResult};
use crate::query::Op;

/// Operator rendering table, MariaDB flavor.
pub fn op_template(op: Op) -> &'static str {
    match op {
        Op::Nop => "",
        Op::Eq => "{0} = {1}",
        Op::Ne => "{0} <> {1}",
        Op::Lt => "{0} < {1}",
        Op::Gt => "{0} > {1}",
        Op::Le => "{0} <= {1}",
        Op::Ge => "{0} >= {1}",
        Op::In => "{0} in ({1})",
        Op::NotIn => "{0} not in ({1})",
        Op::Between => "{0} between {1} and {2}",
        Op::Starts => "{0} like '{1}%'",
        Op::Ends => "{0} like '%{1}'",
        Op::Contains => "{0} like '%{1}%'",
        Op::Null => "{0} is null",
        Op::NotNull => "{0} is not null",
        Op::And => " AND ",
        Op::Or => " OR ",
    }
}

const CONNECTION_TEMPLATE: &str = "mysql:dbname={dbname};host={host};port={port};charset={charset}";

const ENV_DBNAME: &str = "KIROKU_DB_NAME";
const ENV_HOST: &str = "KIROKU_DB_HOST";
const ENV_PORT: &str = "KIROKU_DB_PORT";
const ENV_CHARSET: &str = "KIROKU_DB_CHARSET";

/// Connection settings for a MariaDB server.
#[derive(Debug, Clone, Deserialize)]
pub struct MariaDbConfig {
    pub dbname: String,
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_charset")]
    pub charset: String,
}

fn default_port() -> u16 {
    3306
}

fn default_charset() -> String {
    "utf8mb4".to_string()
}

impl MariaDbConfig {
    /// Read the configuration from `KIROKU_DB_*` environment variables.
    /// Name and host are required; port and charset fall back to
    /// defaults.
    pub fn from_env() -> OrmResult<Self> {
        let dbname = require_env(ENV_DBNAME)?;
        let host = require_env(ENV_HOST)?;
        let port = match env::var(ENV_PORT) {
            Ok(raw) => raw.parse().map_err(|_| {
                OrmError::Configuration(format!("{ENV_PORT} is not a valid port: '{raw}'"))
            })?,
            Err(_) => default_port(),
        };
        let charset = env::var(ENV_CHARSET).unwrap_or_else(|_| default_charset());
        Ok(Self {
            dbname,
            host,
            port,
            charset,
        })
    }

    /// Assemble the PDO-style connection string.
    pub fn connection_string(&self) -> String {
        CONNECTION_TEMPLATE
            .replace("{dbname}", &self.dbname)
            .replace("{host}", &self.host)
            .replace("{port}", &self.port.to_string())
            .replace("{charset}", &self.charset)
    }
}

fn require_env(key: &str) -> OrmResult<String> {
    env::var(key).map_err(|_| OrmError::Configuration(format!("missing environment variable {key}")))
}
