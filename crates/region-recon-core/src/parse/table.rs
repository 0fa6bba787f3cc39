//! Row-spanned region table parser.
//!
//! The boolean services list their regions in a table like:
//!
//! ```text
//! | Global Region | Region          |
//! |---------------|-----------------|
//! | AMER          | East US         |   <- first cell spans 3 rows
//! |               | Canada Central  |
//! |               | Brazil South    |
//! ```
//!
//! Because of the row span most `<tr>`s contain only the region cell, so the
//! region is always taken as the last cell that is not a grouping token.

use scraper::{ElementRef, Html};

use super::{child_elements, element_text};
use crate::models::{AvailabilityFact, Provider};

/// Cell values naming a multi-region geographic bucket rather than a region.
pub const GROUPING_TOKENS: [&str; 3] = ["AMER", "APJ", "EMEA"];

/// Column titles seen in header rows that are not marked up with `<th>`.
const HEADER_LABELS: &[&str] = &[
    "region",
    "regions",
    "global region",
    "geography",
    "location",
    "data center",
    "data center location",
    "datacenter location",
    "azure region",
    "aws region",
];

pub fn is_grouping_token(cell: &str) -> bool {
    GROUPING_TOKENS
        .iter()
        .any(|token| token.eq_ignore_ascii_case(cell.trim()))
}

fn is_header_label(cell: &str) -> bool {
    let lowered = cell.trim().to_ascii_lowercase();
    HEADER_LABELS.contains(&lowered.as_str())
}

/// Parse every table row in `markup` into one fact for `service_key`.
///
/// The source pages carry no machine region codes, so every fact has
/// `region_code: None` and must be matched by name. Rows made only of
/// header labels or grouping tokens, and rows built entirely from `<th>`
/// cells, are skipped.
pub fn parse_availability_table(
    markup: &str,
    service_key: &str,
    provider: Provider,
) -> Vec<AvailabilityFact> {
    let document = Html::parse_document(markup);

    let rows = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "tr");

    let mut facts = Vec::new();
    for row in rows {
        let cells: Vec<ElementRef<'_>> = child_elements(row, &["td", "th"]).collect();
        if cells.is_empty() || cells.iter().all(|c| c.value().name() == "th") {
            continue;
        }

        let texts: Vec<String> = cells
            .into_iter()
            .map(element_text)
            .filter(|t| !t.is_empty())
            .collect();

        if texts
            .iter()
            .all(|t| is_grouping_token(t) || is_header_label(t))
        {
            continue;
        }

        if let Some(name) = texts.iter().rev().find(|t| !is_grouping_token(t)) {
            facts.push(AvailabilityFact::new(Some(provider), name, service_key));
        }
    }

    facts
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROWSPAN_SAMPLE: &str = r#"
<table>
  <tr><td colspan="2">AMER</td></tr>
  <tr><td>East US</td></tr>
  <tr><td>Canada&nbsp;Central</td></tr>
  <tr><td> Brazil
      South </td></tr>
</table>"#;

    #[test]
    fn test_rowspan_sample_yields_continuation_rows() {
        let facts = parse_availability_table(ROWSPAN_SAMPLE, "vdc_m365", Provider::Azure);
        assert_eq!(facts.len(), 3);
        let names: Vec<&str> = facts.iter().map(|f| f.region_name.as_str()).collect();
        assert_eq!(names, vec!["East US", "Canada Central", "Brazil South"]);
        for fact in &facts {
            assert_eq!(fact.service_key, "vdc_m365");
            assert_eq!(fact.provider, Some(Provider::Azure));
            assert_eq!(fact.region_code, None);
            assert_eq!(fact.tier, None);
        }
    }

    #[test]
    fn test_grouping_cell_on_first_row_is_skipped() {
        let html = r#"
<table>
  <thead><tr><th>Global Region</th><th>Region</th></tr></thead>
  <tbody>
    <tr><td rowspan="2">EMEA</td><td><p>North Europe</p></td></tr>
    <tr><td>UK South</td></tr>
    <tr><td rowspan="1">APJ</td><td>Japan East</td></tr>
  </tbody>
</table>"#;
        let facts = parse_availability_table(html, "vdc_entra_id", Provider::Azure);
        let names: Vec<&str> = facts.iter().map(|f| f.region_name.as_str()).collect();
        assert_eq!(names, vec!["North Europe", "UK South", "Japan East"]);
    }

    #[test]
    fn test_header_row_in_td_cells_is_skipped() {
        let html = "<table><tr><td>Global Region</td><td>Region</td></tr>\
                    <tr><td>amer</td><td>US East 1 (N. Virginia)</td></tr></table>";
        let facts = parse_availability_table(html, "vdc_salesforce", Provider::Aws);
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].region_name, "US East 1 (N. Virginia)");
        assert_eq!(facts[0].provider, Some(Provider::Aws));
    }

    #[test]
    fn test_markup_without_tables_yields_nothing() {
        assert!(parse_availability_table("<p>Page moved</p>", "vdc_m365", Provider::Azure)
            .is_empty());
        assert!(parse_availability_table("", "vdc_m365", Provider::Azure).is_empty());
    }

    #[test]
    fn test_grouping_tokens_are_case_insensitive() {
        assert!(is_grouping_token("EMEA"));
        assert!(is_grouping_token(" apj "));
        assert!(!is_grouping_token("East US"));
    }
}
