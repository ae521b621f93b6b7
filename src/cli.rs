use crate::config::Overrides;
use crate::error::{LocateError, Result};
use crate::pattern::SearchPattern;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fslocate")]
#[command(about = "Print indexed paths containing a fragment, ignoring case")]
#[command(version)]
pub struct Cli {
    /// Substring to look for; may start with a hyphen, e.g. `-v`
    #[arg(value_name = "FRAGMENT", allow_hyphen_values = true)]
    pub fragment: Option<String>,

    /// Positionals past the fragment, collected only to report misuse.
    /// Single-valued `fragment` keeps flags after it parsing as flags.
    #[arg(hide = true, allow_hyphen_values = true)]
    pub extra: Vec<String>,

    /// JSON config file with connection settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database host or socket directory
    #[arg(long)]
    pub host: Option<String>,

    /// Database port
    #[arg(long)]
    pub port: Option<u16>,

    /// Database name
    #[arg(long)]
    pub dbname: Option<String>,

    /// Database user
    #[arg(long)]
    pub user: Option<String>,

    /// Query a local SQLite index instead of PostgreSQL
    #[arg(long, value_name = "FILE")]
    pub sqlite: Option<PathBuf>,

    /// Treat % and _ in the fragment as LIKE wildcards
    #[arg(long)]
    pub wildcards: bool,
}

impl Cli {
    /// The single search fragment, or a usage error
    pub fn fragment(&self) -> Result<&str> {
        match self.fragment {
            Some(ref fragment) if self.extra.is_empty() => Ok(fragment.as_str()),
            _ => Err(LocateError::Usage),
        }
    }

    pub fn pattern(&self) -> Result<SearchPattern> {
        let fragment = self.fragment()?;
        Ok(if self.wildcards {
            SearchPattern::wildcard(fragment)
        } else {
            SearchPattern::literal(fragment)
        })
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            config: self.config.clone(),
            host: self.host.clone(),
            port: self.port,
            dbname: self.dbname.clone(),
            user: self.user.clone(),
            sqlite: self.sqlite.clone(),
        }
    }
}
