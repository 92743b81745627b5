#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bike_parts::app::run().await
}
