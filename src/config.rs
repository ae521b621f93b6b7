//! Connection descriptor resolution.
//!
//! Layers are applied lowest precedence first: built-in defaults, the JSON
//! config file, `FSLOCATE_*` environment variables, then command-line flags.
//! Selecting a SQLite file at any layer switches the backend to SQLite.

use crate::error::{LocateError, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5432;
pub const DEFAULT_DBNAME: &str = "fslocate";
pub const DEFAULT_USER: &str = "postgres";
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

pub const ENV_CONFIG: &str = "FSLOCATE_CONFIG";
pub const ENV_HOST: &str = "FSLOCATE_DB_HOST";
pub const ENV_PORT: &str = "FSLOCATE_DB_PORT";
pub const ENV_DBNAME: &str = "FSLOCATE_DB_NAME";
pub const ENV_USER: &str = "FSLOCATE_DB_USER";
pub const ENV_PASSWORD: &str = "FSLOCATE_DB_PASSWORD";
pub const ENV_SSLMODE: &str = "FSLOCATE_DB_SSLMODE";
pub const ENV_CONNECT_TIMEOUT: &str = "FSLOCATE_DB_CONNECT_TIMEOUT";
pub const ENV_SQLITE_PATH: &str = "FSLOCATE_SQLITE_PATH";

/// Transport encryption setting. Only plaintext modes are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    #[default]
    Disable,
    Prefer,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Prefer => "prefer",
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SslMode {
    type Error = String;

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "prefer" => Ok(SslMode::Prefer),
            "require" | "verify-ca" | "verify-full" => {
                Err(format!("sslmode '{s}' needs TLS, which this client does not support"))
            }
            _ => Err(format!("Invalid sslmode: {s}")),
        }
    }
}

/// Settings that may appear in any layer. `None` means "not set here".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Layer {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub sslmode: Option<SslMode>,
    pub connect_timeout_secs: Option<u64>,
    pub sqlite_path: Option<PathBuf>,
}

impl Layer {
    /// Overlay `other` on top of `self`; fields set in `other` win
    fn merge(self, other: Layer) -> Layer {
        Layer {
            host: other.host.or(self.host),
            port: other.port.or(self.port),
            dbname: other.dbname.or(self.dbname),
            user: other.user.or(self.user),
            password: other.password.or(self.password),
            sslmode: other.sslmode.or(self.sslmode),
            connect_timeout_secs: other.connect_timeout_secs.or(self.connect_timeout_secs),
            sqlite_path: other.sqlite_path.or(self.sqlite_path),
        }
    }

    /// Read a JSON config file
    pub fn from_file(path: &Path) -> Result<Layer> {
        let text = fs::read_to_string(path).map_err(|source| LocateError::ConfigFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| LocateError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Collect the `FSLOCATE_*` variables. Empty values count as unset.
    pub fn from_env<F>(env: F) -> Result<Layer>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| env(name).filter(|v| !v.is_empty());

        let port = var(ENV_PORT)
            .map(|v| {
                v.parse::<u16>()
                    .map_err(|_| LocateError::Config(format!("{ENV_PORT}: invalid port '{v}'")))
            })
            .transpose()?;
        let sslmode = var(ENV_SSLMODE)
            .map(|v| {
                SslMode::try_from(v.as_str())
                    .map_err(|e| LocateError::Config(format!("{ENV_SSLMODE}: {e}")))
            })
            .transpose()?;
        let connect_timeout_secs = var(ENV_CONNECT_TIMEOUT)
            .map(|v| {
                v.parse::<u64>().map_err(|_| {
                    LocateError::Config(format!("{ENV_CONNECT_TIMEOUT}: invalid seconds '{v}'"))
                })
            })
            .transpose()?;

        Ok(Layer {
            host: var(ENV_HOST),
            port,
            dbname: var(ENV_DBNAME),
            user: var(ENV_USER),
            password: var(ENV_PASSWORD),
            sslmode,
            connect_timeout_secs,
            sqlite_path: var(ENV_SQLITE_PATH).map(PathBuf::from),
        })
    }
}

/// Command-line overrides, the highest precedence layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub config: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
    pub user: Option<String>,
    pub sqlite: Option<PathBuf>,
}

impl Overrides {
    fn as_layer(&self) -> Layer {
        Layer {
            host: self.host.clone(),
            port: self.port,
            dbname: self.dbname.clone(),
            user: self.user.clone(),
            sqlite_path: self.sqlite.clone(),
            ..Layer::default()
        }
    }
}

/// PostgreSQL connection parameters
#[derive(Clone, PartialEq, Eq)]
pub struct PgDescriptor {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: Option<String>,
    pub sslmode: SslMode,
    pub connect_timeout: Duration,
}

impl PgDescriptor {
    pub fn to_pg_config(&self) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .connect_timeout(self.connect_timeout)
            .ssl_mode(match self.sslmode {
                SslMode::Disable => postgres::config::SslMode::Disable,
                SslMode::Prefer => postgres::config::SslMode::Prefer,
            });
        if let Some(ref password) = self.password {
            config.password(password);
        }
        config
    }
}

// Hand-written so the password never reaches logs
impl fmt::Debug for PgDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("sslmode", &self.sslmode)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl fmt::Display for PgDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "postgres://{}@{}:{}/{}?sslmode={}",
            self.user, self.host, self.port, self.dbname, self.sslmode
        )
    }
}

/// Everything needed to open a session against the path index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    Postgres(PgDescriptor),
    Sqlite { path: PathBuf },
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Descriptor::Postgres(pg) => write!(f, "{pg}"),
            Descriptor::Sqlite { path } => write!(f, "sqlite://{}", path.display()),
        }
    }
}

impl Descriptor {
    /// Resolve the descriptor from every layer
    pub fn resolve<F>(overrides: &Overrides, env: F) -> Result<Descriptor>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config_path = overrides
            .config
            .clone()
            .or_else(|| env(ENV_CONFIG).filter(|v| !v.is_empty()).map(PathBuf::from));

        let file = match config_path {
            Some(ref path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                Layer::from_file(path)?
            }
            None => Layer::default(),
        };
        let env_layer = Layer::from_env(&env)?;
        let layer = file.merge(env_layer).merge(overrides.as_layer());

        if let Some(path) = layer.sqlite_path {
            return Ok(Descriptor::Sqlite { path });
        }

        let user = layer
            .user
            .or_else(|| env("USER").filter(|v| !v.is_empty()))
            .unwrap_or_else(|| DEFAULT_USER.to_string());

        Ok(Descriptor::Postgres(PgDescriptor {
            host: layer.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: layer.port.unwrap_or(DEFAULT_PORT),
            dbname: layer.dbname.unwrap_or_else(|| DEFAULT_DBNAME.to_string()),
            user,
            password: layer.password,
            sslmode: layer.sslmode.unwrap_or_default(),
            connect_timeout: Duration::from_secs(
                layer
                    .connect_timeout_secs
                    .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
            ),
        }))
    }
}
