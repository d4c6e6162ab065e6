use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{Result, TaggerError};
use crate::types::{Classification, LogItem};

/// Reads one item per non-blank line, trimmed, with ids starting at 1.
pub fn read_log_items(path: &Path) -> Result<Vec<LogItem>> {
    let content = std::fs::read_to_string(path).map_err(|e| TaggerError::io(path, e))?;
    let items = parse_log_lines(&content);

    if items.is_empty() {
        return Err(TaggerError::EmptyInput(path.display().to_string()));
    }
    Ok(items)
}

pub fn parse_log_lines(content: &str) -> Vec<LogItem> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .zip(1u64..)
        .map(|(text, id)| LogItem::new(id, text))
        .collect()
}

/// Writes the results as pretty JSON through a temporary file in the target
/// directory, so `path` either keeps its old content or gets the full output.
pub fn write_results(path: &Path, results: &[Classification]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| TaggerError::io(dir, e))?;
    serde_json::to_writer_pretty(&mut tmp, results)?;
    tmp.write_all(b"\n").map_err(|e| TaggerError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| TaggerError::io(tmp.path(), e))?;
    tmp.persist(path).map_err(|e| TaggerError::io(path, e.error))?;

    tracing::debug!(path = %path.display(), count = results.len(), "Results written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn skips_blank_lines_and_numbers_sequentially() {
        let items = parse_log_lines("  first  \n\n\t\nsecond\r\n   \nthird");
        assert_eq!(
            items,
            vec![
                LogItem::new(1, "first"),
                LogItem::new(2, "second"),
                LogItem::new(3, "third"),
            ]
        );
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs.txt");
        std::fs::write(&path, "\n   \n\n").unwrap();

        assert!(matches!(
            read_log_items(&path),
            Err(TaggerError::EmptyInput(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            read_log_items(&dir.path().join("absent.txt")),
            Err(TaggerError::Io { .. })
        ));
    }

    #[test]
    fn writes_pretty_json_with_unicode() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.json");
        let results = vec![Classification {
            log_id: 1,
            text: "conexión rechazada".into(),
            tags: vec!["database connectivity".into()],
        }];

        write_results(&path, &results).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("conexión rechazada"));
        assert!(written.contains("\n  {"));
        let parsed: Vec<Classification> = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, results);
        // No temporary files left behind.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn replaces_existing_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.json");
        std::fs::write(&path, "stale").unwrap();

        write_results(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]\n");
    }
}
