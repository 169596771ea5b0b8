//! `streakwatch stats`: summarise stored streak records.

use streakwatch_core::time::format_iso8601;
use streakwatch_core::{StreakRecord, StreakStats, summarize};

use super::StoreArgs;

pub fn run(store_args: &StoreArgs, json: bool, top: usize) -> anyhow::Result<()> {
    let store = store_args.open()?;
    let rt = tokio::runtime::Runtime::new()?;
    let snapshot = rt.block_on(store.load())?;

    let Some(snapshot) = snapshot else {
        if json {
            println!("null");
        } else {
            println!("No streak records in {}", store_args.describe());
        }
        return Ok(());
    };

    let stats = summarize(&snapshot.records);
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Store:    {}", store_args.describe());
    println!("Saved:    {}", format_iso8601(snapshot.saved_at));
    println!(
        "Tracking: {}",
        if snapshot.tracking { "on" } else { "off" }
    );
    println!();
    match stats {
        Some(stats) => {
            print_stats(&stats);
            println!();
            print_longest(&snapshot.records, top);
        }
        None => println!("No streak records yet."),
    }
    Ok(())
}

/// Print the four aggregates.
pub fn print_stats(stats: &StreakStats) {
    println!("Streak kinds recorded: {}", stats.total);
    println!();

    let c = &stats.by_class;
    println!(
        "  By class:  odd {}  even {}  big {}  small {}",
        c.odd, c.even, c.big, c.small
    );
    println!(
        "  By mode:   sequence {}  row {}",
        stats.by_mode.sequence, stats.by_mode.row
    );
    let lengths: Vec<String> = stats
        .by_length
        .iter()
        .map(|(bucket, n)| format!("{bucket}: {n}"))
        .collect();
    println!("  By length: {}", lengths.join("  "));
    println!();

    println!(
        "  {:<20} {:>6} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}",
        "Rule", "Total", "Seq", "Row", "Odd", "Even", "Big", "Small"
    );
    println!("  {}", "-".repeat(64));
    for (id, rule) in &stats.by_rule {
        let label = if rule.rule_label.is_empty() {
            id.as_str()
        } else {
            rule.rule_label.as_str()
        };
        println!(
            "  {:<20} {:>6} {:>5} {:>5} {:>5} {:>5} {:>5} {:>5}",
            label,
            rule.total,
            rule.by_mode.sequence,
            rule.by_mode.row,
            rule.by_class.odd,
            rule.by_class.even,
            rule.by_class.big,
            rule.by_class.small
        );
    }
}

/// Longest records, newest first among equals.
pub fn longest(records: &[StreakRecord], top: usize) -> Vec<&StreakRecord> {
    let mut sorted: Vec<&StreakRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        b.max_streak_length
            .cmp(&a.max_streak_length)
            .then(b.created_at.cmp(&a.created_at))
    });
    sorted.truncate(top);
    sorted
}

fn print_longest(records: &[StreakRecord], top: usize) {
    if top == 0 {
        return;
    }
    println!("Longest streaks:");
    for record in longest(records, top) {
        let row = record
            .row_index
            .map(|r| format!(" row {r}"))
            .unwrap_or_default();
        println!(
            "  {:>4}x {:<6} {} {}{} (since {})",
            record.max_streak_length,
            record.class,
            record.rule_label,
            record.mode,
            row,
            format_iso8601(record.created_at)
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streakwatch_core::{DetectionMode, OutcomeClass, StreakObservation};

    fn record(length: usize, created_at: u64) -> StreakRecord {
        let obs = StreakObservation {
            rule_id: "r".to_string(),
            rule_label: "R".to_string(),
            dimension: OutcomeClass::Even.dimension(),
            mode: DetectionMode::Sequence,
            row_index: None,
            class: OutcomeClass::Even,
            length,
            predicted_next_height: 0,
        };
        StreakRecord::from_observation(&obs, created_at)
    }

    #[test]
    fn test_longest_orders_by_length_then_recency() {
        let records = vec![record(3, 10), record(7, 5), record(3, 20), record(1, 0)];
        let top = longest(&records, 3);
        let picked: Vec<(usize, u64)> = top
            .iter()
            .map(|r| (r.max_streak_length, r.created_at))
            .collect();
        assert_eq!(picked, vec![(7, 5), (3, 20), (3, 10)]);
    }

    #[test]
    fn test_longest_zero_is_empty() {
        assert!(longest(&[record(2, 0)], 0).is_empty());
    }

    #[test]
    fn test_missing_store_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let args = StoreArgs {
            store: Some(dir.path().join("absent.json")),
            remote: None,
        };
        run(&args, true, 5).unwrap();
    }
}
