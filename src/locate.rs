//! The lookup itself: validate arguments, connect, stream matches.

use crate::cli::Cli;
use crate::config::Descriptor;
use crate::db::Connector;
use crate::error::Result;
use std::io::Write;

/// Run one lookup, writing each matching path to `out` on its own line.
///
/// Argument validation happens before configuration is read or any
/// connection is attempted. The connection is dropped before returning,
/// on success and on every error path.
pub fn run<F, W>(cli: &Cli, env: F, connector: &dyn Connector, out: &mut W) -> Result<u64>
where
    F: Fn(&str) -> Option<String>,
    W: Write,
{
    let pattern = cli.pattern()?;
    let descriptor = Descriptor::resolve(&cli.overrides(), env)?;
    tracing::debug!(%descriptor, pattern = pattern.as_like(), "searching");

    let mut index = connector.connect(&descriptor)?;
    let count = index.for_each_match(&pattern, &mut |path| {
        out.write_all(path)?;
        out.write_all(b"\n")
    })?;
    out.flush()?;

    tracing::debug!(count, "search complete");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PathIndex;
    use crate::error::{BackendError, LocateError};
    use crate::pattern::SearchPattern;
    use clap::Parser;
    use std::cell::Cell;
    use std::io;

    /// Matches with plain `contains`, enough for literal fragments
    struct MemoryIndex {
        paths: Vec<String>,
    }

    impl PathIndex for MemoryIndex {
        fn for_each_match(
            &mut self,
            pattern: &SearchPattern,
            emit: &mut dyn FnMut(&[u8]) -> io::Result<()>,
        ) -> Result<u64> {
            let mut count = 0;
            for path in &self.paths {
                if path.to_lowercase().contains(pattern.fragment()) {
                    emit(path.as_bytes())?;
                    count += 1;
                }
            }
            Ok(count)
        }
    }

    struct FakeConnector {
        paths: Vec<&'static str>,
        reachable: bool,
        connects: Cell<u32>,
    }

    impl FakeConnector {
        fn new(paths: &[&'static str]) -> Self {
            FakeConnector {
                paths: paths.to_vec(),
                reachable: true,
                connects: Cell::new(0),
            }
        }

        fn unreachable() -> Self {
            FakeConnector {
                reachable: false,
                ..FakeConnector::new(&[])
            }
        }
    }

    impl Connector for FakeConnector {
        fn connect(&self, _descriptor: &Descriptor) -> Result<Box<dyn PathIndex>> {
            self.connects.set(self.connects.get() + 1);
            if !self.reachable {
                return Err(LocateError::Connect(BackendError::Sqlite(
                    rusqlite::Error::InvalidQuery,
                )));
            }
            Ok(Box::new(MemoryIndex {
                paths: self.paths.iter().map(|p| p.to_string()).collect(),
            }))
        }
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn run_with(args: &[&str], connector: &FakeConnector) -> (Result<u64>, String) {
        let cli =
            Cli::try_parse_from(std::iter::once("fslocate").chain(args.iter().copied())).unwrap();
        let mut out = Vec::new();
        let result = run(&cli, no_env, connector, &mut out);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_wrong_argument_count_never_connects() {
        let connector = FakeConnector::new(&["/a/bcd"]);

        let (result, out) = run_with(&[], &connector);
        assert!(matches!(result, Err(LocateError::Usage)));
        assert!(out.is_empty());

        let (result, out) = run_with(&["a", "b"], &connector);
        assert!(matches!(result, Err(LocateError::Usage)));
        assert!(out.is_empty());

        assert_eq!(connector.connects.get(), 0);
    }

    #[test]
    fn test_usage_checked_before_config() {
        let connector = FakeConnector::new(&[]);
        let (result, _) = run_with(&["--config", "/nonexistent.json"], &connector);
        assert!(matches!(result, Err(LocateError::Usage)));
    }

    #[test]
    fn test_prints_one_path_per_line() {
        let connector = FakeConnector::new(&["/Users/Foo/Bar.txt", "/etc/passwd", "/srv/foo"]);

        let (result, out) = run_with(&["FOO"], &connector);
        assert_eq!(result.unwrap(), 2);
        assert_eq!(out, "/Users/Foo/Bar.txt\n/srv/foo\n");
        assert_eq!(connector.connects.get(), 1);
    }

    #[test]
    fn test_no_matches_is_success() {
        let connector = FakeConnector::new(&["/a/bcd"]);

        let (result, out) = run_with(&["zzz"], &connector);
        assert_eq!(result.unwrap(), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_connection_failure_prints_nothing() {
        let connector = FakeConnector::unreachable();

        let (result, out) = run_with(&["foo"], &connector);
        let err = result.unwrap_err();
        assert_eq!(err.exit_code(), 4);
        assert!(out.is_empty());
        assert_eq!(connector.connects.get(), 1);
    }

    #[test]
    fn test_config_error_never_connects() {
        let connector = FakeConnector::new(&[]);
        let (result, _) = run_with(&["--config", "/nonexistent.json", "foo"], &connector);
        assert!(matches!(result, Err(LocateError::ConfigFile { .. })));
        assert_eq!(connector.connects.get(), 0);
    }
}
