//! Merge command implementation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::output::{print_header, print_result, print_success};
use crate::results::write_json_atomic;

fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a JSON object", path.display()))
}

/// Merge the top-level keys of `first` into `second`.
///
/// Keys present in both files keep the value from `second`. Returns the
/// number of keys written.
pub fn run(first: &Path, second: &Path) -> Result<usize> {
    let mut merged = read_object(first)?;
    merged.extend(read_object(second)?);
    write_json_atomic(second, &merged)?;
    Ok(merged.len())
}

/// Execute the merge command.
pub fn execute(first: &Path, second: &Path) -> Result<()> {
    print_header(&format!(
        "Merging {} into {}",
        first.display(),
        second.display()
    ));
    let keys = run(first, second)?;
    print_result("Keys", keys);
    print_success(&format!("Results written to {}", second.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_second_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        fs::write(&first, json!({"4": {"x": 1}, "6": {"y": 2}}).to_string()).unwrap();
        fs::write(&second, json!({"4": {"z": 3}, "8": {}}).to_string()).unwrap();

        assert_eq!(run(&first, &second).unwrap(), 3);
        let merged: Value = serde_json::from_str(&fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(merged, json!({"4": {"z": 3}, "6": {"y": 2}, "8": {}}));
        // the first file is left alone
        let untouched: Value = serde_json::from_str(&fs::read_to_string(&first).unwrap()).unwrap();
        assert_eq!(untouched["4"], json!({"x": 1}));
    }

    #[test]
    fn test_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.json");
        let second = dir.path().join("b.json");
        fs::write(&first, "[1, 2]").unwrap();
        fs::write(&second, "{}").unwrap();
        assert!(run(&first, &second).is_err());
        assert!(run(&dir.path().join("missing.json"), &second).is_err());
    }
}
