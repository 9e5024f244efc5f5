use linkr::LinkrConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    linkr::init_tracing();

    let config = LinkrConfig::load("dev")?;
    let gateway = schedule_api::gateway(&config).await?;
    schedule_api::api(&config)?.with_gateway(gateway).serve().await
}
