//! Terminal rendering for maps, merge summaries, and routes.

use storymap_core::{PlaceMap, ReconcileSummary};
use storymap_geo::Route;

const MAX_CONTEXTS: usize = 3;

/// Print a map as a vertical card, one section per place.
pub fn print_map_card(map: &PlaceMap) {
    println!("=== {} ===", map.name);
    println!(
        "{} places   created {}   updated {}",
        map.places.len(),
        map.created_at.format("%Y-%m-%d"),
        map.updated_at.format("%Y-%m-%d"),
    );
    println!();

    for place in &map.places {
        println!("{}  [{}]", place.name, place.id);
        println!("  {:<12} {:.5}, {:.5}", "coords", place.lat, place.lng);
        println!("  {:<12} {}", "tag", place.tag);
        println!("  {:<12} {}", "sentiment", place.sentiment.as_str());
        if !place.note.is_empty() {
            println!("  {:<12} {}", "note", place.note);
        }
        let shown = place.source_contexts.len().min(MAX_CONTEXTS);
        for context in &place.source_contexts[..shown] {
            println!("  {:<12} {}", "seen in", context);
        }
        if place.source_contexts.len() > MAX_CONTEXTS {
            println!(
                "  {:<12} ... and {} more",
                "",
                place.source_contexts.len() - MAX_CONTEXTS
            );
        }
        println!();
    }
}

/// One-line outcome of an extract cycle.
pub fn print_summary(map_name: &str, summary: &ReconcileSummary) {
    println!(
        "'{}': {} extracted, {} resolved, {} new, {} duplicate, {} failed",
        map_name,
        summary.extracted,
        summary.resolved,
        summary.merged_new,
        summary.merged_duplicate,
        summary.failed,
    );
}

/// Print a route with its step list.
pub fn print_route(route: &Route) {
    println!("{} ({})", route.distance, route.duration);
    println!("from  {}", route.start_address);
    println!("to    {}", route.end_address);
    println!();
    for (i, step) in route.steps.iter().enumerate() {
        println!(
            "  {:>2}. {} ({}, {})",
            i + 1,
            strip_instruction_tags(&step.instruction),
            step.distance,
            step.duration,
        );
    }
}

/// Directions steps arrive as HTML fragments; show them as plain text.
fn strip_instruction_tags(instruction: &str) -> String {
    let mut out = String::with_capacity(instruction.len());
    let mut in_tag = false;
    for c in instruction.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
