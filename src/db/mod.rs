//! Backends that answer path lookups.

mod pg;
mod sqlite;

pub use pg::PgIndex;
pub use sqlite::SqliteIndex;

use crate::config::Descriptor;
use crate::error::Result;
use crate::pattern::SearchPattern;
use std::io;

/// A session against the `files` table
pub trait PathIndex {
    /// Stream every path matching `pattern` to `emit`, in database order.
    /// Returns the number of paths emitted.
    fn for_each_match(
        &mut self,
        pattern: &SearchPattern,
        emit: &mut dyn FnMut(&[u8]) -> io::Result<()>,
    ) -> Result<u64>;
}

/// Opens a [`PathIndex`] for a connection descriptor
pub trait Connector {
    fn connect(&self, descriptor: &Descriptor) -> Result<Box<dyn PathIndex>>;
}

/// Connects to the backend the descriptor names
#[derive(Debug, Default, Clone, Copy)]
pub struct DatabaseConnector;

impl Connector for DatabaseConnector {
    fn connect(&self, descriptor: &Descriptor) -> Result<Box<dyn PathIndex>> {
        match descriptor {
            Descriptor::Postgres(pg) => Ok(Box::new(PgIndex::connect(pg)?)),
            Descriptor::Sqlite { path } => Ok(Box::new(SqliteIndex::open(path)?)),
        }
    }
}
