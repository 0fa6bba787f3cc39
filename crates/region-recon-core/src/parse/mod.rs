//! Documentation page parsers.
//!
//! Each tracked service publishes its regions on one documentation page. Two
//! page layouts exist:
//!
//! - **[`table`]**: a two-column table whose first column is a row-spanned
//!   geographic grouping (AMER/APJ/EMEA). Used by the boolean services.
//! - **[`tiered`]**: nested bullet lists grouped by provider, pricing tier,
//!   and edition. Used by the tiered service.
//!
//! Parsers never fail. Markup that does not have the expected shape yields
//! zero facts, which shows up as a low `scrapedCount` in the report.

pub mod table;
pub mod tiered;

pub use table::parse_availability_table;
pub use tiered::parse_tiered_availability;

use scraper::ElementRef;

/// Concatenated text of an element with whitespace runs collapsed to one
/// space. Non-breaking spaces count as whitespace.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Child elements of `element` whose tag is one of `names`.
pub(crate) fn child_elements<'a>(
    element: ElementRef<'a>,
    names: &'a [&'a str],
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| names.contains(&child.value().name()))
}
