#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = sodlat_edu::run().await {
        eprintln!("sodlat-edu fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
