use super::ui::{self, StyleType};
use crate::App;
use crate::core::{CachedPrice, Clock, PriceStore, Symbol};
use anyhow::{Result, bail};

/// Prints the durable cache entry for `symbol`, without refreshing it.
pub async fn run(app: &App, symbol: &str) -> Result<Option<CachedPrice>> {
    let Some(store) = &app.storage.durable else {
        bail!("No durable cache is configured");
    };

    let symbol = Symbol::normalize(symbol);
    let entry = store.load(&symbol).await?;
    let cache = app.resolver.cache();

    match &entry {
        Some(entry) => {
            let now = cache.clock().now();
            let state = if entry.is_fresh(now, cache.window()) {
                ui::style_text("fresh", StyleType::Live)
            } else {
                ui::style_text("stale", StyleType::Fallback)
            };
            println!(
                "{} {:.2} observed {} ({} ago, {state})",
                entry.symbol,
                entry.price,
                entry.observed_at.to_rfc3339(),
                ui::format_age(entry.age(now)),
            );
        }
        None => println!(
            "{}",
            ui::style_text(&format!("No cached price for {symbol}"), StyleType::Subtle)
        ),
    }
    Ok(entry)
}
