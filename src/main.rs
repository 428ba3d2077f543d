#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = drivetheory_rust::run().await {
        eprintln!("drivetheory-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
