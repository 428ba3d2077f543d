#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = drivetheory_rust::run_worker().await {
        eprintln!("drivetheory-worker fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
