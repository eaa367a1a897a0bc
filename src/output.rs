//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **information-centric, not file-centric**. Each manifest item
//! leads with its positional index and resolved title; the media URL it came
//! from is an indented `Source:` context line. This makes `vitrine check`
//! readable as a content inventory while still letting users trace a title
//! back to the entry that produced it.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Manifest
//! 001 fotografias (3 items: 2 horizontal, 1 vertical)
//!     001 Praia
//!         Source: /Fotografias/Praia_Beach_Playa.jpg
//! 002 videos (0 items)
//!
//! Carousel: 2 slides
//! Covers: 3
//!
//! Skipped
//!     designs[2]: empty url
//!
//! Includes (includes/)
//!     pt cabecalho.html: ok
//!     es cabecera.html: missing
//!     Unreferenced: nav-old.html
//!
//! Config
//!     config.toml
//! ```
//!
//! ## Preview
//!
//! ```text
//! designs → preview.html
//!     Revealed 24 of 57 items in 2 batches
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::gallery::GalleryStatus;
use crate::i18n::LanguageContext;
use crate::includes::FragmentAudit;
use crate::manifest::Manifest;
use crate::types::{Category, Orientation};

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

/// Category header with an orientation breakdown when any item has one.
///
/// ```text
/// 001 fotografias (3 items: 2 horizontal, 1 vertical)
/// 004 apresentacoes (1 item)
/// ```
fn category_header(index: usize, category: Category, manifest: &Manifest) -> String {
    let items = manifest.items(category);
    let count = plural(items.len(), "item", "items");
    let horizontal = manifest.filter(category, Some(Orientation::Horizontal)).len();
    let vertical = manifest.filter(category, Some(Orientation::Vertical)).len();
    if horizontal + vertical == 0 {
        format!("{} {} ({count})", format_index(index), category)
    } else {
        format!(
            "{} {} ({count}: {horizontal} horizontal, {vertical} vertical)",
            format_index(index),
            category
        )
    }
}

// ============================================================================
// check
// ============================================================================

/// Format the site inventory reported by `vitrine check`.
pub fn format_check_output(
    manifest: &Manifest,
    audit: &FragmentAudit,
    lang: &LanguageContext,
    has_config_file: bool,
) -> Vec<String> {
    let mut lines = vec!["Manifest".to_string()];
    for (i, category) in Category::ALL.into_iter().enumerate() {
        lines.push(category_header(i + 1, category, manifest));
        for (j, item) in manifest.items(category).iter().enumerate() {
            let title = item.title(lang.current(), lang.fallback());
            let shown = if title.is_empty() { "(untitled)" } else { &title };
            lines.push(format!("{}{} {}", indent(1), format_index(j + 1), shown));
            lines.push(format!("{}Source: {}", indent(2), item.url));
        }
    }

    lines.push(String::new());
    lines.push(format!("Carousel: {}", plural(manifest.carousel.len(), "slide", "slides")));
    lines.push(format!("Covers: {}", manifest.covers.len()));

    if !manifest.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped".to_string());
        for skipped in &manifest.skipped {
            lines.push(format!("{}{}: {}", indent(1), skipped.location, skipped.reason));
        }
    }

    lines.push(String::new());
    lines.push(format!("Includes ({}/)", audit.directory));
    for fragment in &audit.expected {
        let status = if fragment.present { "ok" } else { "missing" };
        lines.push(format!(
            "{}{} {}: {status}",
            indent(1),
            fragment.locale,
            fragment.file
        ));
    }
    if !audit.unreferenced.is_empty() {
        lines.push(format!("{}Unreferenced: {}", indent(1), audit.unreferenced.join(", ")));
    }

    lines.push(String::new());
    lines.push("Config".to_string());
    if has_config_file {
        lines.push(format!("{}config.toml", indent(1)));
    } else {
        lines.push(format!("{}(stock defaults)", indent(1)));
    }
    lines
}

/// Print check output to stdout.
pub fn print_check_output(
    manifest: &Manifest,
    audit: &FragmentAudit,
    lang: &LanguageContext,
    has_config_file: bool,
) {
    for line in format_check_output(manifest, audit, lang, has_config_file) {
        println!("{}", line);
    }
}

// ============================================================================
// preview
// ============================================================================

/// Format the summary of a `vitrine preview` run.
pub fn format_preview_output(status: &GalleryStatus, out: &str) -> Vec<String> {
    let heading = match status.orientation {
        Some(o) => format!("{} ({o})", status.category),
        None => status.category.to_string(),
    };
    let mut lines = vec![format!("{heading} \u{2192} {out}")];
    if status.failed {
        lines.push(format!("{}Manifest could not be loaded", indent(1)));
    } else {
        lines.push(format!(
            "{}Revealed {} of {} in {}",
            indent(1),
            status.shown,
            plural(status.total, "item", "items"),
            plural(status.batches, "batch", "batches")
        ));
    }
    lines
}

/// Print preview output to stdout.
pub fn print_preview_output(status: &GalleryStatus, out: &str) {
    for line in format_preview_output(status, out) {
        println!("{}", line);
    }
}
