use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::TagStore;
use crate::category::{self, ResolveError};
use crate::history::{FileSeries, SeriesMap};

/// Categories with at most this many total plays are pooled into the
/// combined rare chart instead of getting one of their own.
pub const RARE_THRESHOLD: usize = 2;

/// All series sharing one dance category, most-played recording first.
#[derive(Debug)]
pub struct CategoryGroup {
    pub name: String,
    /// Ordered descending by event count; the index is the color rank.
    pub series: Vec<FileSeries>,
}

impl CategoryGroup {
    /// Total plays across every recording of this dance.
    pub fn total(&self) -> usize {
        self.series.iter().map(Vec::len).sum()
    }
}

/// Merge per-file series into per-category groups and compute the Ranking.
///
/// Returned groups are ordered descending by total event count (stable:
/// equal-count categories stay in alphabetical order, since the input map
/// iterates sorted). Within each group, series are ordered descending by
/// their own event count, which downstream color assignment relies on.
pub fn aggregate(series: SeriesMap, tags: &TagStore) -> Result<Vec<CategoryGroup>, ResolveError> {
    let mut by_category: BTreeMap<String, Vec<FileSeries>> = BTreeMap::new();

    for (path, file_series) in series {
        let name = category::resolve(&path, tags)?;
        let basename = Path::new(&path)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        log::info!("{basename} => {name}");
        by_category.entry(name).or_default().push(file_series);
    }

    let mut groups: Vec<CategoryGroup> = by_category
        .into_iter()
        .map(|(name, series)| CategoryGroup { name, series })
        .collect();

    for group in &mut groups {
        group.series.sort_by(|a, b| b.len().cmp(&a.len()));
    }
    groups.sort_by(|a, b| b.total().cmp(&a.total()));

    Ok(groups)
}

/// Split ranked groups into (individually charted, rare pool).
///
/// Must run after the Ranking is computed on the full set: rare categories
/// keep their rank position in reporting, they just don't get their own
/// chart. Order is preserved in both halves.
pub fn split_rare(groups: Vec<CategoryGroup>) -> (Vec<CategoryGroup>, Vec<CategoryGroup>) {
    groups.into_iter().partition(|g| g.total() > RARE_THRESHOLD)
}
