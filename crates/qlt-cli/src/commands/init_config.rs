//! Init-config command implementation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::ExperimentConfig;
use crate::output::{print_header, print_success};

/// Write the default configuration to `path`, or to the default location.
///
/// Refuses to replace an existing file unless `force` is set.
pub fn run(path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => ExperimentConfig::default_path()
            .context("Could not determine the home directory; pass a path")?,
    };
    if path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    fs::write(&path, ExperimentConfig::default().to_yaml()?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Execute the init-config command.
pub fn execute(path: Option<&Path>, force: bool) -> Result<()> {
    print_header("Writing default configuration");
    let path = run(path, force)?;
    print_success(&format!("Configuration written to {}", path.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_loadable_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        run(Some(&path), false).unwrap();
        let config = ExperimentConfig::from_file(&path).unwrap();
        assert_eq!(config, ExperimentConfig::default());
    }

    #[test]
    fn test_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "trials: 3\n").unwrap();
        assert!(run(Some(&path), false).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "trials: 3\n");
        run(Some(&path), true).unwrap();
        assert_eq!(ExperimentConfig::from_file(&path).unwrap().trials, 10);
    }
}
