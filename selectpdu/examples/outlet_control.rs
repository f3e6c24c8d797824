//! Outlet control example
//!
//! Reads `selectpdu.toml` / `SELECTPDU_*` for the connection settings.

use std::time::Duration;

use selectpdu::{DeviceConfig, PowerUnit};
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> selectpdu::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = DeviceConfig::load()?;
    println!("Using {:?}", config);

    let unit = PowerUnit::from_config(&config);

    // Switch the first outlet off and back on
    let outlet = std::env::var("OUTLET").unwrap_or_else(|_| "Outlet - 1".to_string());

    println!("Switching '{}' off...", outlet);
    let outcome = unit.control_property(&outlet, "0").await?;
    println!("{}", outcome);

    sleep(Duration::from_secs(3)).await;

    println!("Switching '{}' on...", outlet);
    let outcome = unit.control_property(&outlet, "1").await?;
    println!("{}", outcome);

    // Still in cooldown: served from memory
    let snapshot = unit.statistics().await?;
    println!("{:?}", snapshot.statistic(&format!("Controllable outlets#{}", outlet)));

    println!("Running sequence up...");
    let outcome = unit.control_property("Sequence up", "").await?;
    println!("{}", outcome);

    unit.shutdown().await;

    Ok(())
}
