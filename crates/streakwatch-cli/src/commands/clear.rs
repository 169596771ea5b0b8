//! `streakwatch clear`: wipe stored streak records.

use super::StoreArgs;

pub fn run(store_args: &StoreArgs) -> anyhow::Result<()> {
    let store = store_args.open()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(store.clear())?;
    println!("Cleared streak records in {}", store_args.describe());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use streakwatch_core::{FileStore, RecordStore, TrackerSnapshot};

    #[test]
    fn test_clear_removes_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("streaks.json");
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(FileStore::new(&path).save(&TrackerSnapshot::new(Vec::new(), true, 0)))
            .unwrap();
        drop(rt);

        let args = StoreArgs {
            store: Some(path.clone()),
            remote: None,
        };
        run(&args).unwrap();
        assert!(!path.exists());
        // clearing twice is fine
        run(&args).unwrap();
    }
}
