//! Outlet polling example

use std::time::Duration;

use selectpdu::{Device, PowerUnit};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> selectpdu::Result<()> {
    // RUST_LOG=selectpdu=trace shows every frame
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let ip = std::env::var("DEVICE_IP").unwrap_or_else(|_| "192.168.1.50".to_string());
    let login = std::env::var("DEVICE_LOGIN").unwrap_or_else(|_| "user".to_string());
    let password = std::env::var("DEVICE_PASSWORD").unwrap_or_else(|_| "12345".to_string());

    let device = Device::new(ip, 60000).with_credentials(login, password);
    let unit = PowerUnit::new(device);

    // The first poll only starts a scan
    unit.statistics().await?;

    for _ in 0..3 {
        sleep(Duration::from_secs(2)).await;

        let snapshot = unit.statistics().await?;
        for (name, value) in snapshot.statistics() {
            println!("{:<40} {}", name, value);
        }
        println!("{} controls", snapshot.controls().len());
        println!();
    }

    unit.shutdown().await;

    Ok(())
}
