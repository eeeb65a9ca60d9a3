//! Table rendering using comfy-table

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, ContentArrangement, Table};

/// Format a table to a string, indented to sit under a result line
pub fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);

    // Terminal width minus indent, 120 when stdout is not a terminal
    let (_, cols) = console::Term::stdout().size_checked().unwrap_or((24, 120));
    table.set_width(cols.saturating_sub(4));
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let header_cells: Vec<Cell> = headers
        .iter()
        .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Cyan))
        .collect();
    table.set_header(header_cells);

    for row in rows {
        let cells: Vec<Cell> = row
            .iter()
            .map(|cell_text| {
                let mut cell = Cell::new(cell_text);
                if cell_text.contains("✓") {
                    cell = cell.fg(Color::Green);
                } else if cell_text.contains("✗") {
                    cell = cell.fg(Color::Red);
                }
                cell
            })
            .collect();
        table.add_row(cells);
    }

    let mut out = String::new();
    for line in table.to_string().lines() {
        out.push_str(&format!("    {}\n", line));
    }
    out
}
