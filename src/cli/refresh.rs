use super::ui::{self, StyleType};
use crate::core::{Holding, PriceResolver, ResolutionOutcome};
use anyhow::{Context, Result};
use comfy_table::Cell;

/// Resolves every market-priced holding and prints the result.
pub async fn run(resolver: &PriceResolver) -> Result<Vec<(Holding, ResolutionOutcome)>> {
    let results = resolver
        .refresh_holdings()
        .await
        .context("Failed to load holdings")?;

    if results.is_empty() {
        println!(
            "{}",
            ui::style_text("No market-priced holdings found", StyleType::Subtle)
        );
        return Ok(results);
    }

    println!("{}", ui::style_text("Holdings", StyleType::Title));
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Stored"),
        ui::header_cell("Resolved"),
        ui::header_cell("Origin"),
    ]);
    for (holding, outcome) in &results {
        table.add_row(vec![
            Cell::new(&holding.name),
            ui::price_cell(holding.current_value),
            ui::price_cell(outcome.price),
            ui::origin_cell(outcome.used_live),
        ]);
    }
    println!("{table}");
    Ok(results)
}
