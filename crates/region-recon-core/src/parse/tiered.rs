//! Nested-list parser for the tiered service.
//!
//! The tiered service's page is prose with bullet lists grouped by provider,
//! then by pricing tier ("Core Regions" / "Non-Core Regions"). The two
//! providers encode edition availability differently and both encodings are
//! kept as published:
//!
//! - Split lists: a tier is divided into a "Foundation" list and an
//!   "Advanced" list. A region's editions are the union of the lists it
//!   appears in.
//! - Marked lists: a single list per tier where a trailing `*` (or `†`) on a
//!   bullet means Advanced is not offered there. Unmarked bullets offer both
//!   editions.
//!
//! The page is walked in document order. Short label nodes (headings,
//! paragraphs, bold text, and the own text of list items holding nested
//! lists) move a cursor of provider / tier / list kind; leaf list items under
//! a known provider and tier become bullets.

use scraper::{ElementRef, Html};

use super::{collapse_whitespace, element_text};
use crate::models::{AvailabilityFact, Edition, Provider, Tier};
use crate::normalize::{normalize, words};

/// Trailing bullet markers meaning "Advanced not available here".
pub const ADVANCED_UNAVAILABLE_MARKERS: [char; 2] = ['*', '†'];

/// Labels longer than this are prose, not section titles.
const MAX_LABEL_CHARS: usize = 80;

/// Words an edition list title may consist of, e.g. "Foundation edition"
/// or "Core Regions: Advanced".
const LIST_LABEL_WORDS: &[&str] = &[
    "foundation", "advanced", "edition", "editions", "and", "only", "region", "regions",
    "core", "non", "noncore", "tier", "azure", "microsoft", "aws", "amazon", "web",
    "services",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Plain,
    Foundation,
    Advanced,
}

#[derive(Debug, Default, Clone, Copy)]
struct Label {
    provider: Option<Provider>,
    tier: Option<Tier>,
    list: Option<ListKind>,
}

impl Label {
    fn classify(text: &str) -> Option<Label> {
        if text.is_empty() || text.chars().count() > MAX_LABEL_CHARS {
            return None;
        }
        let lowered = text.to_ascii_lowercase();
        let tokens = words(&lowered);
        let has = |w: &str| tokens.iter().any(|t| *t == w);

        let provider = if has("azure") || has("microsoft") {
            Some(Provider::Azure)
        } else if has("aws") || has("amazon") {
            Some(Provider::Aws)
        } else {
            None
        };

        let tier = if lowered.contains("non-core")
            || lowered.contains("non core")
            || has("noncore")
        {
            Some(Tier::NonCore)
        } else if has("core") {
            Some(Tier::Core)
        } else {
            None
        };

        // Prose that merely mentions an edition, such as a marker legend,
        // must not turn the following list into an edition list.
        let list_label = tokens.iter().all(|t| LIST_LABEL_WORDS.contains(t));
        let list = match (list_label && has("foundation"), list_label && has("advanced")) {
            (true, false) => Some(ListKind::Foundation),
            (false, true) => Some(ListKind::Advanced),
            (true, true) => Some(ListKind::Plain),
            (false, false) => None,
        };

        if provider.is_none() && tier.is_none() && list.is_none() {
            None
        } else {
            Some(Label {
                provider,
                tier,
                list,
            })
        }
    }
}

#[derive(Debug, Default)]
struct Cursor {
    provider: Option<Provider>,
    /// Heading level that opened the current provider section, if any.
    provider_level: Option<u8>,
    tier: Option<Tier>,
    list: Option<ListKind>,
}

impl Cursor {
    fn apply(&mut self, label: Label, heading_level: Option<u8>) {
        if let Some(provider) = label.provider {
            if self.provider != Some(provider) {
                self.tier = None;
                self.list = None;
            }
            self.provider = Some(provider);
            self.provider_level = heading_level;
        }
        if let Some(tier) = label.tier {
            self.tier = Some(tier);
            self.list = None;
        }
        if let Some(list) = label.list {
            self.list = Some(list);
        }
    }

    fn heading(&mut self, text: &str, level: u8) {
        match Label::classify(text) {
            Some(label) => self.apply(label, Some(level)),
            None => {
                if self.provider_level.is_some_and(|open| level <= open) {
                    *self = Cursor::default();
                }
            }
        }
    }
}

#[derive(Debug)]
struct Bullet {
    name: String,
    code: Option<String>,
    marked: bool,
}

impl Bullet {
    fn parse(text: &str) -> Option<Bullet> {
        let trimmed = text.trim();
        let marked = trimmed.ends_with(ADVANCED_UNAVAILABLE_MARKERS);
        let unmarked = trimmed.trim_end_matches(|c: char| {
            ADVANCED_UNAVAILABLE_MARKERS.contains(&c) || c.is_whitespace()
        });

        let (name, code) = split_code(unmarked);
        if name.is_empty() {
            return None;
        }
        Some(Bullet {
            name: name.to_string(),
            code: code.map(str::to_string),
            marked,
        })
    }

    fn fact(
        &self,
        provider: Provider,
        service_key: &str,
        editions: Vec<Edition>,
        tier: Tier,
    ) -> AvailabilityFact {
        let fact = AvailabilityFact::new(Some(provider), &self.name, service_key)
            .with_tiering(editions, tier);
        match &self.code {
            Some(code) => fact.with_code(code),
            None => fact,
        }
    }
}

/// Lift a trailing machine-code parenthetical, e.g. `East US 2 (eastus2)`.
/// Display qualifiers such as `(N. Virginia)` stay part of the name.
fn split_code(text: &str) -> (&str, Option<&str>) {
    if let (Some(open), true) = (text.rfind('('), text.ends_with(')')) {
        let inner = &text[open + 1..text.len() - 1];
        if looks_like_code(inner) {
            return (text[..open].trim(), Some(inner));
        }
    }
    (text, None)
}

fn looks_like_code(text: &str) -> bool {
    text.len() >= 2
        && text
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[derive(Debug, Default)]
struct Section {
    plain: Vec<Bullet>,
    foundation: Vec<Bullet>,
    advanced: Vec<Bullet>,
}

impl Section {
    fn push(&mut self, list: Option<ListKind>, bullet: Bullet) {
        match list.unwrap_or(ListKind::Plain) {
            ListKind::Plain => self.plain.push(bullet),
            ListKind::Foundation => self.foundation.push(bullet),
            ListKind::Advanced => self.advanced.push(bullet),
        }
    }

    fn into_facts(
        self,
        provider: Provider,
        tier: Tier,
        service_key: &str,
    ) -> Vec<AvailabilityFact> {
        let mut facts = Vec::new();

        for bullet in &self.plain {
            let editions = if bullet.marked {
                vec![Edition::Foundation]
            } else {
                vec![Edition::Foundation, Edition::Advanced]
            };
            facts.push(bullet.fact(provider, service_key, editions, tier));
        }

        for bullet in &self.foundation {
            facts.push(bullet.fact(provider, service_key, vec![Edition::Foundation], tier));
        }

        for bullet in &self.advanced {
            let key = normalize(&bullet.name, true);
            let existing = facts
                .iter_mut()
                .find(|f| normalize(&f.region_name, true) == key);
            match existing {
                Some(fact) => {
                    let editions = fact.edition.get_or_insert_with(Vec::new);
                    if !editions.contains(&Edition::Advanced) {
                        editions.push(Edition::Advanced);
                    }
                }
                None => facts.push(bullet.fact(
                    provider,
                    service_key,
                    vec![Edition::Advanced],
                    tier,
                )),
            }
        }

        facts
    }
}

/// Parse the tiered service's page into one fact per region per tier.
///
/// Sections are emitted in the order they first appear on the page.
pub fn parse_tiered_availability(markup: &str, service_key: &str) -> Vec<AvailabilityFact> {
    let document = Html::parse_document(markup);
    let mut cursor = Cursor::default();
    let mut sections: Vec<(Provider, Tier, Section)> = Vec::new();

    for element in document.root_element().descendants().filter_map(ElementRef::wrap) {
        let name = element.value().name();
        match name {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = name[1..].parse::<u8>().unwrap_or(6);
                cursor.heading(&element_text(element), level);
            }
            "p" | "strong" | "b" | "dt" | "caption" => {
                if let Some(label) = Label::classify(&element_text(element)) {
                    cursor.apply(label, None);
                }
            }
            "li" if has_nested_list(element) => {
                if let Some(label) = Label::classify(&own_text(element)) {
                    cursor.apply(label, None);
                }
            }
            "li" => {
                let (Some(provider), Some(tier)) = (cursor.provider, cursor.tier) else {
                    continue;
                };
                let Some(bullet) = Bullet::parse(&element_text(element)) else {
                    continue;
                };
                let idx = match sections
                    .iter()
                    .position(|(p, t, _)| *p == provider && *t == tier)
                {
                    Some(idx) => idx,
                    None => {
                        sections.push((provider, tier, Section::default()));
                        sections.len() - 1
                    }
                };
                sections[idx].2.push(cursor.list, bullet);
            }
            _ => {}
        }
    }

    sections
        .into_iter()
        .flat_map(|(provider, tier, section)| section.into_facts(provider, tier, service_key))
        .collect()
}

fn has_nested_list(li: ElementRef<'_>) -> bool {
    li.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|el| matches!(el.value().name(), "ul" | "ol"))
}

/// Text of a list item excluding its nested lists.
fn own_text(li: ElementRef<'_>) -> String {
    let mut text = String::new();
    for child in li.children() {
        if let Some(t) = child.value().as_text() {
            text.push_str(t);
        } else if let Some(el) = ElementRef::wrap(child) {
            if !matches!(el.value().name(), "ul" | "ol") {
                text.extend(el.text());
            }
        }
        text.push(' ');
    }
    collapse_whitespace(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VAULT_PAGE: &str = r#"
<html><body>
<nav><ul><li>Home</li><li>Docs</li></ul></nav>
<h1>Region Availability</h1>
<p>Vault is offered in the Foundation and Advanced editions. Pricing depends on whether a region is a Core or Non-Core region.</p>

<h2>Microsoft Azure</h2>
<h3>Core Regions</h3>
<p>Foundation</p>
<ul>
  <li>East US (eastus)</li>
  <li>North Europe</li>
</ul>
<p>Advanced</p>
<ul>
  <li>East US (eastus)</li>
  <li>West Europe</li>
</ul>
<h3>Non-Core Regions</h3>
<ul>
  <li>Foundation
    <ul><li>Brazil South</li></ul>
  </li>
  <li>Advanced
    <ul><li>Brazil South</li></ul>
  </li>
</ul>

<h2>Amazon Web Services</h2>
<p><strong>Core Regions</strong></p>
<ul>
  <li>US East 1 (N. Virginia)</li>
</ul>
<p><strong>Non-Core Regions</strong></p>
<ul>
  <li>EU Central 1 (Frankfurt)</li>
  <li>AP South 1 (Mumbai)<sup>*</sup></li>
</ul>
<p>* Advanced edition is not available in this region.</p>

<h2>Frequently asked questions</h2>
<ul><li>How is storage billed?</li></ul>
</body></html>"#;

    fn find<'a>(facts: &'a [AvailabilityFact], name: &str, tier: Tier) -> &'a AvailabilityFact {
        facts
            .iter()
            .find(|f| f.region_name == name && f.tier == Some(tier))
            .unwrap_or_else(|| panic!("no fact for {} / {}", name, tier))
    }

    #[test]
    fn test_split_lists_union_editions() {
        let facts = parse_tiered_availability(VAULT_PAGE, "vdc_vault");

        let east = find(&facts, "East US", Tier::Core);
        assert_eq!(east.provider, Some(Provider::Azure));
        assert_eq!(east.region_code.as_deref(), Some("eastus"));
        assert_eq!(
            east.edition,
            Some(vec![Edition::Foundation, Edition::Advanced])
        );

        let north = find(&facts, "North Europe", Tier::Core);
        assert_eq!(north.edition, Some(vec![Edition::Foundation]));

        let west = find(&facts, "West Europe", Tier::Core);
        assert_eq!(west.edition, Some(vec![Edition::Advanced]));
    }

    #[test]
    fn test_nested_list_labels() {
        let facts = parse_tiered_availability(VAULT_PAGE, "vdc_vault");
        let brazil = find(&facts, "Brazil South", Tier::NonCore);
        assert_eq!(brazil.provider, Some(Provider::Azure));
        assert_eq!(
            brazil.edition,
            Some(vec![Edition::Foundation, Edition::Advanced])
        );
        assert!(!facts.iter().any(|f| f.region_name.starts_with("Foundation")));
    }

    #[test]
    fn test_marked_bullets_exclude_advanced() {
        let facts = parse_tiered_availability(VAULT_PAGE, "vdc_vault");

        let virginia = find(&facts, "US East 1 (N. Virginia)", Tier::Core);
        assert_eq!(virginia.provider, Some(Provider::Aws));
        assert_eq!(virginia.region_code, None);
        assert_eq!(
            virginia.edition,
            Some(vec![Edition::Foundation, Edition::Advanced])
        );

        let frankfurt = find(&facts, "EU Central 1 (Frankfurt)", Tier::NonCore);
        assert_eq!(
            frankfurt.edition,
            Some(vec![Edition::Foundation, Edition::Advanced])
        );

        let mumbai = find(&facts, "AP South 1 (Mumbai)", Tier::NonCore);
        assert_eq!(mumbai.edition, Some(vec![Edition::Foundation]));
    }

    #[test]
    fn test_marker_legend_before_list_keeps_markers() {
        let html = r#"
<h2>Amazon Web Services</h2>
<h3>Non-Core Regions</h3>
<p>Regions marked with * do not support the Advanced edition.</p>
<ul>
  <li>EU Central 1 (Frankfurt)</li>
  <li>AP South 1 (Mumbai)*</li>
</ul>"#;
        let facts = parse_tiered_availability(html, "vdc_vault");
        assert_eq!(facts.len(), 2);

        let frankfurt = find(&facts, "EU Central 1 (Frankfurt)", Tier::NonCore);
        assert_eq!(
            frankfurt.edition,
            Some(vec![Edition::Foundation, Edition::Advanced])
        );
        let mumbai = find(&facts, "AP South 1 (Mumbai)", Tier::NonCore);
        assert_eq!(mumbai.edition, Some(vec![Edition::Foundation]));
    }

    #[test]
    fn test_edition_titles_with_extra_words() {
        let html = r#"
<h2>Microsoft Azure</h2>
<h3>Core Regions</h3>
<p><strong>Foundation edition</strong></p>
<ul><li>North Europe</li></ul>
<p>Advanced edition only</p>
<ul><li>West Europe</li></ul>"#;
        let facts = parse_tiered_availability(html, "vdc_vault");
        assert_eq!(
            find(&facts, "North Europe", Tier::Core).edition,
            Some(vec![Edition::Foundation])
        );
        assert_eq!(
            find(&facts, "West Europe", Tier::Core).edition,
            Some(vec![Edition::Advanced])
        );
    }

    #[test]
    fn test_navigation_and_trailing_sections_are_ignored() {
        let facts = parse_tiered_availability(VAULT_PAGE, "vdc_vault");
        assert_eq!(facts.len(), 7);
        assert!(facts.iter().all(|f| f.service_key == "vdc_vault"));
        assert!(!facts.iter().any(|f| f.region_name == "Home"));
        assert!(!facts.iter().any(|f| f.region_name.contains("storage")));
    }

    #[test]
    fn test_restructured_page_yields_nothing() {
        let html = "<h1>Regions</h1><ul><li>East US</li></ul>";
        assert!(parse_tiered_availability(html, "vdc_vault").is_empty());
    }

    #[test]
    fn test_split_code() {
        assert_eq!(
            split_code("East US 2 (eastus2)"),
            ("East US 2", Some("eastus2"))
        );
        assert_eq!(
            split_code("US East 1 (us-east-1)"),
            ("US East 1", Some("us-east-1"))
        );
        assert_eq!(
            split_code("US East 1 (N. Virginia)"),
            ("US East 1 (N. Virginia)", None)
        );
        assert_eq!(split_code("UAE North"), ("UAE North", None));
    }
}
