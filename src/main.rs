use std::fs;

use anyhow::{Context, Result};
use rayon::prelude::*;

use danceplot::catalog::TagStore;
use danceplot::chart;
use danceplot::config::AppConfig;
use danceplot::history;
use danceplot::projection::Geometry;
use danceplot::series::{self, CategoryGroup};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load();
    let geom = Geometry::new(&config.chart);

    let catalog_path = config.catalog_path();
    log::info!("Catalog: {}", catalog_path.display());
    let tags = TagStore::load(&catalog_path)
        .with_context(|| format!("Failed to scan catalog {}", catalog_path.display()))?;

    let history_dir = config.history_dir();
    log::info!("History: {}", history_dir.display());
    let plays = history::load(&history_dir)
        .with_context(|| format!("Failed to read history under {}", history_dir.display()))?;

    let groups = series::aggregate(plays, &tags).context("Failed to group plays into dances")?;
    let grand_total: usize = groups.iter().map(CategoryGroup::total).sum();
    let mut all_names: Vec<String> = groups.iter().map(|g| g.name.clone()).collect();

    let (charted, rare) = series::split_rare(groups);

    // Rank report. Rare categories keep their rank position, they just
    // don't get a chart of their own.
    for (rank, group) in charted.iter().enumerate() {
        println!("{} {} {}", rank + 1, group.total(), group.name);
    }
    for group in &rare {
        println!("less than three {}", group.name);
    }

    // Charts share no state once ranking is final; render and write them
    // in parallel.
    let mut documents: Vec<(String, String)> = charted
        .par_iter()
        .enumerate()
        .map(|(i, group)| {
            chart::render_category(group, &geom).map(|doc| (format!("{}.svg", i + 1), doc))
        })
        .collect::<std::result::Result<_, _>>()
        .context("Failed to render charts")?;
    documents.push((
        chart::RARE_CHART_NAME.to_string(),
        chart::render_rare(&rare, &geom),
    ));
    documents.push((
        chart::INDEX_NAME.to_string(),
        chart::render_index(charted.len()),
    ));

    let output_dir = config.resolve_output_dir();
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    documents
        .par_iter()
        .try_for_each(|(name, doc)| fs::write(output_dir.join(name), doc))
        .context("Failed to write chart files")?;
    log::info!(
        "Wrote {} charts + index to {}",
        documents.len() - 1,
        output_dir.display()
    );

    // Every dance we know about, and how many plays in total.
    all_names.sort();
    for name in &all_names {
        println!("{name}");
    }
    println!("{grand_total}");

    Ok(())
}
