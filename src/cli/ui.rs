use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;

pub enum StyleType {
    Title,
    Live,
    Fallback,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Live => style(text).green().bold(),
        StyleType::Fallback => style(text).yellow(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

pub fn price_cell(price: f64) -> Cell {
    Cell::new(format!("{price:.2}")).set_alignment(CellAlignment::Right)
}

/// Green "live" or yellow "stored" depending on where the price came from.
pub fn origin_cell(used_live: bool) -> Cell {
    if used_live {
        Cell::new("live").fg(Color::Green)
    } else {
        Cell::new("stored").fg(Color::Yellow)
    }
}

/// Formats a duration as a short human readable age, e.g. "1h 05m".
pub fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (hours, minutes) {
        (0, 0) => format!("{seconds}s"),
        (0, _) => format!("{minutes}m {seconds:02}s"),
        _ => format!("{hours}h {minutes:02}m"),
    }
}
