use comfy_table::{modifiers, presets, Cell, CellAlignment, Table};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::calendar::YearHolidays;
use crate::report::{MetricSummary, ReportModel};

/// Whole units with thousands separators, e.g. `1,250`.
pub fn format_quantity(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.set_header(header);
    table
}

fn number(value: Decimal) -> Cell {
    Cell::new(format_quantity(value)).set_alignment(CellAlignment::Right)
}

fn metrics(summary: &MetricSummary) -> [(&'static str, Decimal); 4] {
    [
        ("Produced (Wh)", summary.produced),
        ("Consumed (Wh)", summary.consumed),
        ("Exported to Grid (Wh)", summary.export),
        ("Imported from Grid (Wh)", summary.import),
    ]
}

pub fn build_rate_table(report: &ReportModel) -> Table {
    let mut table = new_table(vec!["Metric", "On-Peak", "Off-Peak", "Total"]);
    let on_peak = metrics(&report.on_peak());
    let off_peak = metrics(&report.off_peak());
    let total = metrics(&report.grand_total);
    for ((label, on), ((_, off), (_, all))) in on_peak.into_iter().zip(off_peak.into_iter().zip(total)) {
        table.add_row(vec![Cell::new(label), number(on), number(off), number(all)]);
    }
    table
}

pub fn build_weekend_table(report: &ReportModel) -> Table {
    let mut table = new_table(vec!["Weekend Totals", "Total"]);
    for (label, value) in metrics(&report.weekend_total) {
        table.add_row(vec![Cell::new(label), number(value)]);
    }
    table
}

pub fn build_holiday_table(report: &ReportModel) -> Table {
    let mut table = new_table(vec!["Holiday", "Produced (Wh)", "Consumed (Wh)", "Export (Wh)", "Import (Wh)"]);
    for (date, holiday) in &report.holiday_summaries {
        let summary = &holiday.summary;
        table.add_row(vec![
            Cell::new(format!("{} ({})", holiday.name, date.format("%Y-%m-%d"))),
            number(summary.produced),
            number(summary.consumed),
            number(summary.export),
            number(summary.import),
        ]);
    }
    table
}

pub fn build_calendar_table(holidays: &YearHolidays) -> Table {
    let mut table = new_table(vec!["Date", "Weekday", "Holiday"]);
    for (date, name) in holidays {
        table.add_row(vec![
            Cell::new(date.format("%Y-%m-%d")),
            Cell::new(date.format("%A")),
            Cell::new(name),
        ]);
    }
    table
}

/// The full console report. The holiday table is left out when no record fell on a holiday.
pub fn render_report(report: &ReportModel) -> String {
    let mut out = format!("{}\n\n{}\n", build_rate_table(report), build_weekend_table(report));
    if !report.holiday_summaries.is_empty() {
        out.push_str(&format!("\nHoliday Breakdowns\n{}\n", build_holiday_table(report)));
    }
    out
}
