use std::path::Path;

use streakwatch_core::FileStore;

pub fn run(host: &str, port: u16, data: &Path) -> anyhow::Result<()> {
    let base = format!("http://{host}:{port}");

    println!("Streakwatch Server v{}", streakwatch_core::VERSION);
    println!("   {base}");
    println!("   data: {}", data.display());
    println!();
    println!("   Endpoints:");
    println!("     GET    /                      API index (try: curl {base})");
    println!("     GET    /api/v1/streaks        Last saved tracker snapshot");
    println!("     PUT    /api/v1/streaks        Replace the snapshot");
    println!("     DELETE /api/v1/streaks        Wipe stored records");
    println!("     GET    /api/v1/streaks/stats  Statistics over stored records");
    println!("     GET    /health                Health check");
    println!();
    println!("   Track against it:");
    println!("     streakwatch track --blocks blocks.json --rules rules.json --remote {base}");
    println!();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(streakwatch_server::run_server(
        FileStore::new(data),
        host,
        port,
    ))?;
    Ok(())
}
