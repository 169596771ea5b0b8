//! `streakwatch scan`: one pattern scan over a blocks file.

use std::path::Path;

use streakwatch_core::{DisplayFilter, scan_patterns};

use super::{load_inputs, print_observations};

pub fn run(
    blocks_path: &Path,
    rules_path: &Path,
    watch_path: Option<&Path>,
    filter: DisplayFilter,
    json: bool,
) -> anyhow::Result<()> {
    let (blocks, rules, watched) = load_inputs(blocks_path, rules_path, watch_path)?;
    let report = scan_patterns(&blocks, &rules, filter, &watched);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let newest = blocks.iter().map(|b| b.height).max();
    println!(
        "Scanned {} blocks (newest: {}) against {} rules, filter: {filter}",
        blocks.len(),
        newest.map_or_else(|| "-".to_string(), |h| h.to_string()),
        rules.len()
    );
    println!();
    print_observations("Sequence streaks", &report.sequence);
    println!();
    print_observations("Row streaks", &report.rows);
    if !watched.is_empty() {
        println!();
        print_observations("Watched", &report.watched);
    }
    Ok(())
}
