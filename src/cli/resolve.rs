use super::ui::{self, StyleType};
use crate::core::{PriceQuery, PriceResolver, ResolutionOutcome};
use anyhow::Result;

pub async fn run(
    resolver: &PriceResolver,
    kind: &str,
    symbol: &str,
    stored: f64,
    source: &str,
) -> Result<ResolutionOutcome> {
    let outcome = resolver
        .resolve(&PriceQuery::new(kind, symbol, stored, source))
        .await;
    println!("{}", render(symbol, &outcome));
    Ok(outcome)
}

fn render(symbol: &str, outcome: &ResolutionOutcome) -> String {
    let origin = if outcome.used_live {
        ui::style_text("live", StyleType::Live)
    } else {
        ui::style_text("stored", StyleType::Fallback)
    };
    format!("{} {:.2} ({origin})", symbol.trim(), outcome.price)
}
