use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use book_data_merge::pipeline::RunSummary;

pub fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Dataset"),
        header_cell("Path"),
        header_cell("Loaded"),
        header_cell("Degraded"),
        header_cell("Valid"),
        header_cell("Rejected"),
    ]);
    apply_table_style(&mut table);
    for index in 2..=5 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    for source in &summary.sources {
        table.add_row(vec![
            Cell::new(&source.name),
            dim_cell(source.path.display()),
            Cell::new(source.loaded),
            count_cell(source.degraded, Color::Yellow),
            Cell::new(source.valid),
            count_cell(source.rejected, Color::Red),
        ]);
    }
    let total_valid: usize = summary.sources.iter().map(|s| s.valid).sum();
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(summary.total_loaded()).add_attribute(Attribute::Bold),
        count_cell(summary.total_degraded(), Color::Yellow).add_attribute(Attribute::Bold),
        Cell::new(total_valid).add_attribute(Attribute::Bold),
        count_cell(summary.total_rejected(), Color::Red).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    let merge = &summary.merge;
    println!(
        "Merged {} records into {} ({} duplicates folded, {} without a merge key, {} conflicts resolved by priority, {} fields filled)",
        merge.input_records,
        merge.groups,
        merge.duplicates_merged(),
        merge.keyless_records,
        merge.conflicts.len(),
        merge.filled
    );
    if summary.written {
        println!(
            "Output: {} ({} records)",
            summary.output_path.display(),
            summary.output_rows
        );
    } else {
        println!(
            "Output: {} (dry run, {} records not written)",
            summary.output_path.display(),
            summary.output_rows
        );
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
