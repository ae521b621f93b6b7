use super::PathIndex;
use crate::error::{BackendError, LocateError, Result};
use crate::pattern::SearchPattern;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::io;
use std::path::Path;

const SEARCH_SQL: &str = r"SELECT path FROM files WHERE lower(path) LIKE ?1 ESCAPE '\'";

/// Local SQLite index file, opened read-only
pub struct SqliteIndex {
    conn: Connection,
}

impl SqliteIndex {
    /// Open an existing index. A missing file is an error, never created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening sqlite index");

        let connect = |e: rusqlite::Error| LocateError::Connect(BackendError::Sqlite(e));
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(connect)?;

        // Opening is lazy; touch the header so a non-database file fails here
        conn.pragma_query_value(None, "schema_version", |row| row.get::<_, i64>(0))
            .map_err(connect)?;

        Ok(SqliteIndex { conn })
    }
}

impl PathIndex for SqliteIndex {
    fn for_each_match(
        &mut self,
        pattern: &SearchPattern,
        emit: &mut dyn FnMut(&[u8]) -> io::Result<()>,
    ) -> Result<u64> {
        let query = |e: rusqlite::Error| LocateError::Query(BackendError::Sqlite(e));

        let mut stmt = self.conn.prepare(SEARCH_SQL).map_err(query)?;
        let mut rows = stmt.query([pattern.as_like()]).map_err(query)?;

        let mut count = 0;
        while let Some(row) = rows.next().map_err(query)? {
            let row_error = |e: rusqlite::Error| LocateError::Row(BackendError::Sqlite(e));
            // TEXT bytes go out unchecked; paths need not be UTF-8
            let path = match row.get_ref(0).map_err(row_error)? {
                ValueRef::Text(bytes) => bytes,
                other => {
                    return Err(row_error(rusqlite::Error::InvalidColumnType(
                        0,
                        "path".to_string(),
                        other.data_type(),
                    )));
                }
            };
            emit(path)?;
            count += 1;
        }
        Ok(count)
    }
}
