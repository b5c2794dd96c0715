//! `quantlab strategies` - list strategies offered by the service

use anyhow::{Context, Result};

use crate::config::Config;

pub async fn list(config: &Config) -> Result<()> {
    let strategies = config
        .client()
        .list_strategies()
        .await
        .context("failed to fetch strategies")?;

    if strategies.is_empty() {
        println!("no strategies available");
        return Ok(());
    }

    for strategy in &strategies {
        println!("{:<20} {}", strategy.id, strategy.name);
        println!("{:<20} {}", "", strategy.description);
    }
    Ok(())
}
