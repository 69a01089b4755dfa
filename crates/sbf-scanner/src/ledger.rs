//! Durable crawl state: the cached town link list and faulty links.

use crate::error::Result;
use sbf_core::{OutputConfig, TownLink};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Newline-delimited link files that survive restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressLedger {
    town_links: PathBuf,
    faulty_links: PathBuf,
}

impl ProgressLedger {
    #[must_use]
    pub fn new(town_links: impl Into<PathBuf>, faulty_links: impl Into<PathBuf>) -> Self {
        Self {
            town_links: town_links.into(),
            faulty_links: faulty_links.into(),
        }
    }

    #[must_use]
    pub fn from_config(output: &OutputConfig) -> Self {
        Self::new(&output.town_links_file, &output.faulty_links_file)
    }

    #[must_use]
    pub fn town_links_path(&self) -> &Path {
        &self.town_links
    }

    #[must_use]
    pub fn faulty_links_path(&self) -> &Path {
        &self.faulty_links
    }

    /// Cached town links, or `None` when discovery has to run.
    ///
    /// Lines that are not valid links are skipped, as are repeats of a link
    /// already read. A file with no valid links counts as absent.
    pub fn load_towns(&self) -> Result<Option<Vec<TownLink>>> {
        if !self.town_links.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.town_links)?;
        let mut links = Vec::new();
        let mut seen = HashSet::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match TownLink::parse(line) {
                Ok(link) if seen.insert(link.clone()) => links.push(link),
                Ok(link) => tracing::warn!(
                    "Skipping duplicate {} on line {} of {}",
                    link,
                    number + 1,
                    self.town_links.display()
                ),
                Err(e) => tracing::warn!(
                    "Skipping line {} of {}: {}",
                    number + 1,
                    self.town_links.display(),
                    e
                ),
            }
        }

        if links.is_empty() {
            tracing::warn!(
                "{} holds no town links, rediscovering",
                self.town_links.display()
            );
            return Ok(None);
        }

        tracing::info!("Loaded {} town links from {}", links.len(), self.town_links.display());
        Ok(Some(links))
    }

    pub fn save_towns(&self, links: &[TownLink]) -> Result<()> {
        write_links(&self.town_links, links)?;
        tracing::info!("Saved {} town links to {}", links.len(), self.town_links.display());
        Ok(())
    }

    pub fn write_faulty(&self, links: &[TownLink]) -> Result<()> {
        write_links(&self.faulty_links, links)?;
        tracing::warn!(
            "{} faulty links written to {}",
            links.len(),
            self.faulty_links.display()
        );
        Ok(())
    }

    /// Remove a faulty link file left by an earlier run.
    pub fn clear_faulty(&self) -> Result<()> {
        if self.faulty_links.exists() {
            fs::remove_file(&self.faulty_links)?;
            tracing::info!("Removed stale {}", self.faulty_links.display());
        }
        Ok(())
    }
}

fn write_links(path: &Path, links: &[TownLink]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = links
        .iter()
        .map(TownLink::as_str)
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn links(urls: &[&str]) -> Vec<TownLink> {
        urls.iter().map(|u| TownLink::parse(u).unwrap()).collect()
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let ledger = ProgressLedger::new(dir.path().join("towns.txt"), dir.path().join("faulty.txt"));
        assert_eq!(ledger.load_towns().unwrap(), None);
    }

    #[test]
    fn test_save_and_load_towns() {
        let dir = TempDir::new().unwrap();
        let ledger = ProgressLedger::new(
            dir.path().join("state/towns.txt"),
            dir.path().join("faulty.txt"),
        );
        let saved = links(&["https://example.com/a", "https://example.com/b"]);

        ledger.save_towns(&saved).unwrap();
        assert_eq!(ledger.load_towns().unwrap(), Some(saved));
    }

    #[test]
    fn test_invalid_lines_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("towns.txt");
        fs::write(&path, "https://example.com/a\nnot a link\n\nhttps://example.com/b\n").unwrap();

        let ledger = ProgressLedger::new(&path, dir.path().join("faulty.txt"));
        assert_eq!(
            ledger.load_towns().unwrap(),
            Some(links(&["https://example.com/a", "https://example.com/b"]))
        );
    }

    #[test]
    fn test_duplicate_lines_loaded_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("towns.txt");
        fs::write(
            &path,
            "https://example.com/a\nhttps://example.com/b\nhttps://example.com/a\nhttps://example.com/b\n",
        )
        .unwrap();

        let ledger = ProgressLedger::new(&path, dir.path().join("faulty.txt"));
        assert_eq!(
            ledger.load_towns().unwrap(),
            Some(links(&["https://example.com/a", "https://example.com/b"]))
        );
    }

    #[test]
    fn test_empty_file_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("towns.txt");
        fs::write(&path, "\n").unwrap();

        let ledger = ProgressLedger::new(&path, dir.path().join("faulty.txt"));
        assert_eq!(ledger.load_towns().unwrap(), None);
    }

    #[test]
    fn test_write_faulty() {
        let dir = TempDir::new().unwrap();
        let ledger = ProgressLedger::new(dir.path().join("towns.txt"), dir.path().join("faulty.txt"));

        ledger
            .write_faulty(&links(&["https://example.com/b", "https://example.com/c"]))
            .unwrap();
        let content = fs::read_to_string(ledger.faulty_links_path()).unwrap();
        assert_eq!(content, "https://example.com/b\nhttps://example.com/c");
    }

    #[test]
    fn test_clear_faulty() {
        let dir = TempDir::new().unwrap();
        let ledger = ProgressLedger::new(dir.path().join("towns.txt"), dir.path().join("faulty.txt"));

        // No file yet
        ledger.clear_faulty().unwrap();

        ledger.write_faulty(&links(&["https://example.com/b"])).unwrap();
        ledger.clear_faulty().unwrap();
        assert!(!ledger.faulty_links_path().exists());
    }
}
