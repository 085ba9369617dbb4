use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::info;

use crate::errors::Result;

/// Reads record identifiers from a line-oriented source: one identifier per
/// line, whitespace trimmed, empty lines dropped. Order is preserved.
pub fn read_identifiers<R: BufRead>(reader: R) -> Result<Vec<String>> {
    let mut identifiers = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            identifiers.push(trimmed.to_string());
        }
    }
    Ok(identifiers)
}

pub fn read_identifiers_from_file(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let identifiers = read_identifiers(BufReader::new(file))?;
    info!(
        path = %path.display(),
        count = identifiers.len(),
        "read identifiers from file"
    );
    Ok(identifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_identifiers_trims_and_drops_empty_lines() {
        let input = "LOT001\n  LOT002  \n\n\t\nLOT003\n";
        let ids = read_identifiers(input.as_bytes()).unwrap();
        assert_eq!(ids, vec!["LOT001", "LOT002", "LOT003"]);
    }

    #[test]
    fn test_read_identifiers_preserves_order() {
        let input = "C\nA\nB\n";
        let ids = read_identifiers(input.as_bytes()).unwrap();
        assert_eq!(ids, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_read_identifiers_keeps_duplicates() {
        // The engine does not deduplicate.
        let input = "A\nA\n";
        let ids = read_identifiers(input.as_bytes()).unwrap();
        assert_eq!(ids, vec!["A", "A"]);
    }

    #[test]
    fn test_read_identifiers_empty_input() {
        let ids = read_identifiers("".as_bytes()).unwrap();
        assert!(ids.is_empty());
    }

    #[test]
    fn test_read_identifiers_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"LOT100\nLOT200\n").unwrap();

        let ids = read_identifiers_from_file(temp_file.path()).unwrap();
        assert_eq!(ids, vec!["LOT100", "LOT200"]);
    }

    #[test]
    fn test_read_identifiers_from_missing_file() {
        let result = read_identifiers_from_file("/nonexistent/ids.txt");
        assert!(result.is_err());
    }
}
