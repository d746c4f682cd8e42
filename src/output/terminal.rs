//! Terminal summary of a ranked shortlist.

use crate::models::{Family, RankedList};
use colored::Colorize;

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let quoted = format!("\"{}\"", value.to_string());
    format!("{quoted:>width$}")
}

/// One row per ranked address: rank, address, latency.
pub fn format_ranked_rows(list: &RankedList) -> Vec<String> {
    list.entries()
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "{rank},{addr},{latency}",
                rank = format_field(i + 1, 5),
                addr = format_field(result.candidate.addr, 42),
                latency = format_field(result.latency, 14),
            )
        })
        .collect()
}

/// Print the shortlist of one family to stdout.
pub fn print_ranked(family: Family, list: &RankedList) {
    if list.is_empty() {
        println!("#{}# no reachable {family} addresses", "NOTE".on_red());
        return;
    }
    println!("# {family} top {}", list.len());
    println!(
        "{},{},{}",
        format_field("rank", 5),
        format_field("address", 42),
        format_field("latency", 14)
    );
    for row in format_ranked_rows(list) {
        println!("{row}");
    }
}
