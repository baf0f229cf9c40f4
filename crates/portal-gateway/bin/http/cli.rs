use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, ValueEnum};
use portal_directory::EmptyRenamePolicy;
use portal_gateway::LookupMode;
use portal_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "PORTAL_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "PORTAL_STORAGE_BACKEND";
pub const DATABASE_URL_ENV: &str = "PORTAL_DATABASE_URL";
pub const MAX_CONNECTIONS_ENV: &str = "PORTAL_DB_MAX_CONNECTIONS";
pub const MIN_CONNECTIONS_ENV: &str = "PORTAL_DB_MIN_CONNECTIONS";
pub const ACQUIRE_TIMEOUT_MS_ENV: &str = "PORTAL_DB_ACQUIRE_TIMEOUT_MS";
pub const STORE_TIMEOUT_MS_ENV: &str = "PORTAL_STORE_TIMEOUT_MS";
pub const ALIAS_LENGTH_ENV: &str = "PORTAL_ALIAS_LENGTH";
pub const GENERATED_ALIAS_RETRIES_ENV: &str = "PORTAL_GENERATED_ALIAS_RETRIES";
pub const EMPTY_RENAME_ENV: &str = "PORTAL_EMPTY_RENAME";
pub const LOOKUP_MODE_ENV: &str = "PORTAL_LOOKUP_MODE";
pub const LOG_FORMAT_ENV: &str = "PORTAL_LOG_FORMAT";
pub const SKIP_MIGRATIONS_ENV: &str = "PORTAL_SKIP_MIGRATIONS";
pub const SHUTDOWN_GRACE_MS_ENV: &str = "PORTAL_SHUTDOWN_GRACE_MS";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://portal.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "postgres")]
    Postgres,
    #[value(name = "sqlite")]
    Sqlite,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::Postgres => write!(f, "postgres"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmptyRenameArg {
    #[value(name = "reject")]
    Reject,
    #[value(name = "generate")]
    Generate,
}

impl Display for EmptyRenameArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EmptyRenameArg::Reject => write!(f, "reject"),
            EmptyRenameArg::Generate => write!(f, "generate"),
        }
    }
}

impl From<EmptyRenameArg> for EmptyRenamePolicy {
    fn from(value: EmptyRenameArg) -> Self {
        match value {
            EmptyRenameArg::Reject => EmptyRenamePolicy::Reject,
            EmptyRenameArg::Generate => EmptyRenamePolicy::Generate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LookupModeArg {
    #[value(name = "json")]
    Json,
    #[value(name = "redirect")]
    Redirect,
}

impl Display for LookupModeArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupModeArg::Json => write!(f, "json"),
            LookupModeArg::Redirect => write!(f, "redirect"),
        }
    }
}

impl From<LookupModeArg> for LookupMode {
    fn from(value: LookupModeArg) -> Self {
        match value {
            LookupModeArg::Json => LookupMode::Json,
            LookupModeArg::Redirect => LookupMode::Redirect,
        }
    }
}

fn parse_positive_millis(raw: &str) -> Result<u64, String> {
    match raw.parse::<u64>() {
        Ok(0) => Err("must be greater than zero".to_string()),
        Ok(millis) => Ok(millis),
        Err(_) => Err(format!("'{raw}' is not a number of milliseconds")),
    }
}

fn parse_alias_length(raw: &str) -> Result<NonZeroUsize, String> {
    let length: NonZeroUsize = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a positive integer"))?;
    if length.get() > portal_core::alias::MAX_LENGTH {
        return Err(format!(
            "alias length must be at most {}",
            portal_core::alias::MAX_LENGTH
        ));
    }
    Ok(length)
}

#[derive(Debug, Parser)]
#[command(name = "portal", about = "URL alias directory over HTTP")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Sqlite
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = DATABASE_URL_ENV, default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    #[arg(long, env = MAX_CONNECTIONS_ENV, default_value_t = 10)]
    pub max_connections: u32,

    #[arg(long, env = MIN_CONNECTIONS_ENV, default_value_t = 0)]
    pub min_connections: u32,

    #[arg(
        long,
        env = ACQUIRE_TIMEOUT_MS_ENV,
        default_value_t = 3000,
        value_parser = parse_positive_millis
    )]
    pub acquire_timeout_ms: u64,

    /// Bound on a whole store call, connection acquisition included. Must
    /// be at least `--acquire-timeout-ms`.
    #[arg(
        long,
        env = STORE_TIMEOUT_MS_ENV,
        default_value_t = 5000,
        value_parser = parse_positive_millis
    )]
    pub store_timeout_ms: u64,

    #[arg(
        long,
        env = ALIAS_LENGTH_ENV,
        default_value = "6",
        value_parser = parse_alias_length
    )]
    pub alias_length: NonZeroUsize,

    #[arg(long, env = GENERATED_ALIAS_RETRIES_ENV, default_value_t = 0)]
    pub generated_alias_retries: usize,

    #[arg(
        long,
        env = EMPTY_RENAME_ENV,
        value_enum,
        default_value_t = EmptyRenameArg::Reject
    )]
    pub empty_rename: EmptyRenameArg,

    #[arg(
        long,
        env = LOOKUP_MODE_ENV,
        value_enum,
        default_value_t = LookupModeArg::Json
    )]
    pub lookup_mode: LookupModeArg,

    #[arg(long, env = LOG_FORMAT_ENV, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[arg(long, env = SKIP_MIGRATIONS_ENV)]
    pub skip_migrations: bool,

    #[arg(long, env = SHUTDOWN_GRACE_MS_ENV, default_value_t = 5000)]
    pub shutdown_grace_ms: u64,
}

impl CLI {
    /// Checks constraints spanning more than one argument.
    pub fn validate(&self) -> Result<(), clap::Error> {
        if self.store_timeout_ms < self.acquire_timeout_ms {
            return Err(CLI::command().error(
                ErrorKind::ArgumentConflict,
                format!(
                    "--store-timeout-ms ({}) must not be shorter than --acquire-timeout-ms ({})",
                    self.store_timeout_ms, self.acquire_timeout_ms
                ),
            ));
        }
        Ok(())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}
