//! Table rendering of import summaries and discovered schemas.

use checklist_core::ImportSummary;
use checklist_ingest::{Schema, SchemaReader};
use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

pub fn print_summary(summary: &ImportSummary) {
    if let Some(metadata) = &summary.metadata {
        let title = metadata.title.as_deref().unwrap_or("-");
        match metadata.version.as_deref() {
            Some(version) => println!("Source: {title} ({version})"),
            None => println!("Source: {title}"),
        }
    }
    println!("{}", row_type_table(summary));
    println!("{}", totals_table(summary));
    if let Some(table) = issue_table(summary) {
        println!("{table}");
    }
    println!("Finished in {} ms", summary.duration_ms);
}

/// Records read and inserted per row type.
pub fn row_type_table(summary: &ImportSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Row type"),
        header_cell("Records"),
        header_cell("Inserted"),
        header_cell("Skipped lines"),
        header_cell("Bad taxon id"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..=4 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut records = 0usize;
    let mut inserted = 0usize;
    for (row_type, count) in &summary.counts.row_types {
        records += count.records;
        inserted += count.inserted;
        let bad = summary.counts.bad_taxon_fk.get(row_type).copied();
        table.add_row(vec![
            Cell::new(row_type),
            Cell::new(count.records),
            Cell::new(count.inserted),
            count_cell(Some(count.skipped_lines), Color::Yellow),
            count_cell(bad, Color::Red),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(records).add_attribute(Attribute::Bold),
        Cell::new(inserted).add_attribute(Attribute::Bold),
        dim_cell("-"),
        count_cell(Some(summary.bad_taxon_fk_total()), Color::Red).add_attribute(Attribute::Bold),
    ]);
    table
}

/// Node counts of the finished store.
pub fn totals_table(summary: &ImportSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Staged"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    let mut rows = vec![
        ("Names".to_string(), summary.names),
        ("Taxa".to_string(), summary.taxa),
        ("Synonyms".to_string(), summary.synonyms),
        ("Roots".to_string(), summary.roots),
        ("References".to_string(), summary.references),
        ("Verbatim records".to_string(), summary.verbatim_records),
        ("Completed names".to_string(), summary.resolver.completed_names),
        ("Removed usages".to_string(), summary.resolver.removed),
        ("Reference links".to_string(), summary.links.rows),
    ];
    rows.extend(
        summary
            .ranks
            .iter()
            .map(|(rank, count)| (format!("Rank {rank}"), *count)),
    );
    for (label, count) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(count)]);
    }
    table
}

/// Issue counts, most frequent first. `None` when no issue was recorded.
pub fn issue_table(summary: &ImportSummary) -> Option<Table> {
    if summary.issues.is_empty() {
        return None;
    }
    let mut issues: Vec<_> = summary.issues.iter().collect();
    issues.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    let mut table = Table::new();
    table.set_header(vec![header_cell("Issue"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (issue, count) in issues {
        table.add_row(vec![
            Cell::new(issue.as_str()),
            count_cell(Some(*count), Color::Yellow),
        ]);
    }
    Some(table)
}

/// One row per discovered data file.
pub fn schema_table(reader: &SchemaReader) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Row type"),
        header_cell("Encoding"),
        header_cell("Delimiter"),
        header_cell("Quote"),
        header_cell("Mapped"),
        header_cell("Unknown"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Right);
    for schema in reader.schemas() {
        table.add_row(schema_row(schema));
    }
    table
}

fn schema_row(schema: &Schema) -> Vec<Cell> {
    let unknown = schema.unknown_count();
    vec![
        Cell::new(schema.file_name()),
        Cell::new(&schema.row_type),
        Cell::new(schema.charset.as_str()),
        Cell::new(byte_label(schema.format.delimiter)),
        match schema.format.quote {
            Some(quote) => Cell::new(byte_label(quote)),
            None => dim_cell("none"),
        },
        Cell::new(schema.columns.len() - unknown),
        count_cell(Some(unknown), Color::Yellow),
    ]
}

fn byte_label(byte: u8) -> String {
    match byte {
        b'\t' => "\\t".to_string(),
        b' ' => "space".to_string(),
        other => char::from(other).to_string(),
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
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

fn count_cell(count: Option<usize>, color: Color) -> Cell {
    match count {
        Some(value) if value > 0 => Cell::new(value).fg(color).add_attribute(Attribute::Bold),
        Some(value) => dim_cell(value),
        None => dim_cell("-"),
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_model::{Issue, Rank};

    #[test]
    fn test_byte_label() {
        assert_eq!(byte_label(b'\t'), "\\t");
        assert_eq!(byte_label(b','), ",");
        assert_eq!(byte_label(b'"'), "\"");
    }

    #[test]
    fn test_issue_table_orders_by_count() {
        let mut summary = ImportSummary::default();
        assert!(issue_table(&summary).is_none());
        summary.issues.insert(Issue::TruncatedName, 1);
        summary.issues.insert(Issue::NotInterpreted, 5);
        let rendered = issue_table(&summary).unwrap().to_string();
        let not_interpreted = rendered.find(Issue::NotInterpreted.as_str()).unwrap();
        let truncated = rendered.find(Issue::TruncatedName.as_str()).unwrap();
        assert!(not_interpreted < truncated);
    }

    #[test]
    fn test_totals_list_ranks() {
        let mut summary = ImportSummary::default();
        summary.ranks.insert(Rank::Species, 2);
        let rendered = totals_table(&summary).to_string();
        assert!(rendered.contains(&format!("Rank {}", Rank::Species)));
    }
}
