use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use elr_catalog::{Catalog, CatalogReceiver};
use elr_core::{ReceiverOutcome, ReceiverTranslation};
use elr_model::{CustomerStatus, FilterType};

pub fn print_catalog_summary(catalog: &Catalog) {
    let summary = catalog.summary();
    let mut counts = Table::new();
    counts.set_header(vec![header_cell("Catalog"), header_cell("Count")]);
    apply_table_style(&mut counts);
    align_column(&mut counts, 1, CellAlignment::Right);
    for (label, count) in [
        ("Schemas", summary.schemas),
        ("Value sets", summary.value_sets),
        ("Lookup tables", summary.lookup_tables),
        ("Organizations", summary.organizations),
        ("Receivers", summary.receivers),
        ("Active receivers", summary.active_receivers),
    ] {
        counts.add_row(vec![Cell::new(label), Cell::new(count)]);
    }
    println!("{counts}");

    if catalog.receivers().is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Receiver"),
        header_cell("Topic"),
        header_cell("Status"),
        header_cell("Schema"),
        header_cell("Format"),
        header_cell("Jurisdictional"),
        header_cell("Quality"),
        header_cell("Routing"),
        header_cell("Processing"),
    ]);
    apply_summary_table_style(&mut table);
    for entry in catalog.receivers() {
        let receiver = entry.receiver();
        let mut row = vec![
            Cell::new(entry.full_name())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(&receiver.topic),
            status_cell(receiver.customer_status),
            Cell::new(entry.schema().name()),
            Cell::new(receiver.format().as_str()),
        ];
        row.extend(FilterType::ALL.into_iter().map(|kind| stage_cell(entry, kind)));
        table.add_row(row);
    }
    println!("{table}");
}

pub fn print_route_summary(translations: &[ReceiverTranslation]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Receiver"),
        header_cell("Outcome"),
        header_cell("Rows"),
        header_cell("Before quality"),
        header_cell("Detail"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    for translation in translations {
        let receiver = Cell::new(&translation.receiver)
            .fg(Color::Blue)
            .add_attribute(Attribute::Bold);
        let row = match &translation.outcome {
            ReceiverOutcome::Delivered(report) => vec![
                receiver,
                Cell::new("delivered").fg(Color::Green),
                Cell::new(report.item_count()),
                count_cell(report.item_count_before_quality_filter()),
                dim_cell("-"),
            ],
            ReceiverOutcome::Empty { report, stage } => vec![
                receiver,
                Cell::new("empty").fg(Color::Yellow),
                Cell::new(0),
                count_cell(report.item_count_before_quality_filter()),
                Cell::new(format!("no rows after {stage} filter")),
            ],
            ReceiverOutcome::Failed(error) => vec![
                receiver,
                Cell::new("failed").fg(Color::Red),
                dim_cell("-"),
                dim_cell("-"),
                Cell::new(error.to_string()).fg(Color::Red),
            ],
        };
        table.add_row(row);
    }
    println!("{table}");
}

pub fn print_names(title: &str, names: &[&str]) {
    let mut table = Table::new();
    table.set_header(vec![header_cell(title)]);
    apply_table_style(&mut table);
    for name in names {
        table.add_row(vec![*name]);
    }
    println!("{table}");
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
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(165);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn stage_cell(entry: &CatalogReceiver, kind: FilterType) -> Cell {
    match entry.stage(kind) {
        None => dim_cell("skipped"),
        Some(stage) => {
            let calls: Vec<String> = stage.list().calls().map(ToString::to_string).collect();
            let text = calls.join("\n");
            if stage.is_topic_default() {
                Cell::new(format!("{text}\n(topic default)")).fg(Color::DarkGrey)
            } else {
                Cell::new(text)
            }
        }
    }
}

fn status_cell(status: CustomerStatus) -> Cell {
    match status {
        CustomerStatus::Active => Cell::new("active").fg(Color::Green),
        CustomerStatus::Testing => Cell::new("testing").fg(Color::Yellow),
        CustomerStatus::Inactive => dim_cell("inactive"),
    }
}

fn count_cell(count: Option<usize>) -> Cell {
    match count {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
