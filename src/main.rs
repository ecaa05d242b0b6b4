#[tokio::main]
async fn main() -> anyhow::Result<()> {
    valentine::bootstrapper::run().await
}
