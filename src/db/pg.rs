use super::PathIndex;
use crate::config::PgDescriptor;
use crate::error::{BackendError, LocateError, Result};
use crate::pattern::SearchPattern;
use postgres::fallible_iterator::FallibleIterator;
use postgres::types::{FromSql, Type};
use postgres::{Client, NoTls};
use std::error::Error;
use std::io;

const SEARCH_SQL: &str = r"SELECT path FROM files WHERE lower(path) LIKE $1 ESCAPE '\'";

/// A text column's bytes as sent by the server, without UTF-8 validation.
/// Paths are bytes on disk and databases with `SQL_ASCII` encoding keep them so.
struct RawText<'a>(&'a [u8]);

impl<'a> FromSql<'a> for RawText<'a> {
    fn from_sql(
        _: &Type,
        raw: &'a [u8],
    ) -> std::result::Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(RawText(raw))
    }

    fn accepts(ty: &Type) -> bool {
        <&str as FromSql>::accepts(ty)
    }
}

/// PostgreSQL session
pub struct PgIndex {
    client: Client,
}

impl PgIndex {
    /// Open a plaintext session
    pub fn connect(descriptor: &PgDescriptor) -> Result<Self> {
        tracing::debug!(server = %descriptor, "connecting to postgres");
        let client = descriptor
            .to_pg_config()
            .connect(NoTls)
            .map_err(|e| LocateError::Connect(BackendError::Postgres(e)))?;
        Ok(PgIndex { client })
    }
}

impl PathIndex for PgIndex {
    fn for_each_match(
        &mut self,
        pattern: &SearchPattern,
        emit: &mut dyn FnMut(&[u8]) -> io::Result<()>,
    ) -> Result<u64> {
        let query = |e: postgres::Error| LocateError::Query(BackendError::Postgres(e));

        // query_raw streams rows instead of buffering the full result
        let mut rows = self
            .client
            .query_raw(SEARCH_SQL, [pattern.as_like()])
            .map_err(query)?;

        let mut count = 0;
        while let Some(row) = rows.next().map_err(query)? {
            let RawText(path) = row
                .try_get(0)
                .map_err(|e| LocateError::Row(BackendError::Postgres(e)))?;
            emit(path)?;
            count += 1;
        }
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SslMode;
    use std::time::Duration;

    #[test]
    fn test_raw_text_keeps_invalid_utf8() {
        let RawText(bytes) = RawText::from_sql(&Type::TEXT, b"/ok/\xff").unwrap();
        assert_eq!(bytes, b"/ok/\xff");
        assert!(<RawText as FromSql>::accepts(&Type::TEXT));
        assert!(<RawText as FromSql>::accepts(&Type::VARCHAR));
        assert!(!<RawText as FromSql>::accepts(&Type::INT4));
    }

    #[test]
    fn test_unreachable_server_is_connect_error() {
        let descriptor = PgDescriptor {
            host: "127.0.0.1".into(),
            port: 1,
            dbname: "fslocate".into(),
            user: "nobody".into(),
            password: None,
            sslmode: SslMode::Disable,
            connect_timeout: Duration::from_secs(2),
        };
        let result = PgIndex::connect(&descriptor);
        assert!(matches!(result, Err(LocateError::Connect(_))));
    }
}
