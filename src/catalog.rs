use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::escape::{self, EscapeError};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Escape(#[from] EscapeError),
    #[error("tag block on line {line} appears before any file declaration")]
    TagsBeforeSong { line: usize },
}

// A line declaring a new file record, carrying its escaped path.
static SONG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<Song FilePath="(.+?)""#).unwrap());

// A line opening a tag block for the most recently declared file.
static TAGS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<Tags").unwrap());

// name="value" pairs inside a tag block.
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+?)="(.+?)""#).unwrap());

/// File path → attribute name → attribute value, built once from the
/// catalog and read-only afterwards.
///
/// A path missing here while present in the history means the catalog and
/// the history disagree about which files exist; lookups for such paths
/// fail loudly in the category resolver rather than defaulting to empty.
#[derive(Debug, Default)]
pub struct TagStore {
    tags: BTreeMap<String, BTreeMap<String, String>>,
}

impl TagStore {
    /// Scan catalog lines into a TagStore. Single pass, order-dependent:
    /// a tag block always applies to the most recent file declaration.
    pub fn parse(reader: impl BufRead) -> Result<Self, CatalogError> {
        let mut store = Self::default();
        let mut current: Option<String> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if let Some(caps) = SONG_RE.captures(&line) {
                let path = escape::decode(&caps[1])?;
                store.tags.entry(path.clone()).or_default();
                current = Some(path);
            } else if TAGS_RE.is_match(&line) {
                let path = current
                    .as_deref()
                    .ok_or(CatalogError::TagsBeforeSong { line: idx + 1 })?;
                let attrs = store
                    .tags
                    .get_mut(path)
                    .expect("current path was inserted on declaration");
                for caps in ATTR_RE.captures_iter(&line) {
                    attrs.insert(caps[1].to_string(), caps[2].to_string());
                }
            }
            // Anything else is structure we don't care about.
        }

        Ok(store)
    }

    /// Read and scan a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let file = std::fs::File::open(path)?;
        let store = Self::parse(std::io::BufReader::new(file))?;
        log::info!("Catalog: {} files described", store.len());
        Ok(store)
    }

    /// All attributes for a file path, if the catalog described it.
    pub fn get(&self, path: &str) -> Option<&BTreeMap<String, String>> {
        self.tags.get(path)
    }

    /// One attribute value for a file path.
    pub fn attr(&self, path: &str, name: &str) -> Option<&str> {
        self.tags.get(path).and_then(|m| m.get(name)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}
