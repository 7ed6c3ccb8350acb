use service_discovery::config::DiscoveryConfig;
use service_discovery::services::{DiscoveryClient, RegistryClient};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 优先读取配置文件，文件不存在时回退到环境变量
    let config = DiscoveryConfig::load_or_env()?;

    let mut client = DiscoveryClient::connect(&config).await?;

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None | Some("register") => run(&mut client).await?,
        Some("resolve") => {
            let name = args.next().unwrap_or_else(|| config.service_name.clone());
            for address in client.services_by_name(&name).await? {
                println!("{address}");
            }
        }
        Some(other) => return Err(format!("unknown command: {other}").into()),
    }

    Ok(())
}

// 注册后一直运行到 Ctrl-C，然后注销
async fn run(client: &mut DiscoveryClient) -> Result<(), Box<dyn std::error::Error>> {
    client.register().await?;
    println!("Registered, press Ctrl-C to unregister...");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    client.unregister().await?;
    Ok(())
}
