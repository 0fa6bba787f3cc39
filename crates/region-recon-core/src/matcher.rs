//! Ordered region matching.
//!
//! Resolves an [`AvailabilityFact`] to the [`CanonicalRegion`] it describes.
//! Providers name regions inconsistently, so matching tries a fixed list of
//! comparisons from strictest to loosest and stops at the first one that
//! finds a candidate:
//!
//! | # | Rule | Compares |
//! |---|------|----------|
//! | 1 | [`MatchRule::StrippedName`] | fact name = candidate name without parenthetical |
//! | 2 | [`MatchRule::FullName`] | fact name = full candidate name |
//! | 3 | [`MatchRule::OrderedWords`] | same words in the same order, same word count |
//! | 4 | [`MatchRule::SameWords`] | same words in any order |
//! | 5 | [`MatchRule::Contains`] | full candidate name contains fact name |
//! | 6 | [`MatchRule::Compact`] | names equal with all whitespace removed |
//! | 7 | [`MatchRule::Alias`] | fact name = one of the candidate's aliases |
//!
//! All comparisons are on [`normalize`]d text. Rules are evaluated
//! rule-major: rule 1 is tried against every candidate before rule 2 is
//! tried against any. Within a rule the first candidate in catalog order
//! wins, so the catalog must be loaded in a stable order.
//!
//! When the fact names a provider only regions of that provider are
//! candidates.

use serde::Serialize;
use std::fmt;

use crate::models::{AvailabilityFact, CanonicalRegion};
use crate::normalize::{normalize, strip_parenthetical, words};

/// The comparison that resolved a fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    StrippedName,
    FullName,
    OrderedWords,
    SameWords,
    Contains,
    Compact,
    Alias,
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchRule::StrippedName => "stripped_name",
            MatchRule::FullName => "full_name",
            MatchRule::OrderedWords => "ordered_words",
            MatchRule::SameWords => "same_words",
            MatchRule::Contains => "contains",
            MatchRule::Compact => "compact",
            MatchRule::Alias => "alias",
        };
        f.write_str(name)
    }
}

/// Normalized forms of the scraped name.
struct Subject {
    name: String,
    words: Vec<String>,
    compact: String,
}

/// Normalized forms of one catalog region, computed once per matcher.
struct Candidate<'a> {
    region: &'a CanonicalRegion,
    stripped: String,
    full: String,
    stripped_words: Vec<String>,
    compact: String,
    aliases: Vec<String>,
}

impl<'a> Candidate<'a> {
    fn new(region: &'a CanonicalRegion) -> Self {
        let stripped = normalize(strip_parenthetical(&region.name), false);
        Self {
            region,
            stripped_words: owned_words(&stripped),
            compact: normalize(strip_parenthetical(&region.name), true),
            full: normalize(&region.name, false),
            aliases: region.aliases.iter().map(|a| normalize(a, false)).collect(),
            stripped,
        }
    }
}

fn owned_words(normalized: &str) -> Vec<String> {
    words(normalized).into_iter().map(str::to_string).collect()
}

type Predicate = fn(&Subject, &Candidate<'_>) -> bool;

/// Match rules in priority order.
const RULES: [(MatchRule, Predicate); 7] = [
    (MatchRule::StrippedName, stripped_name),
    (MatchRule::FullName, full_name),
    (MatchRule::OrderedWords, ordered_words),
    (MatchRule::SameWords, same_words),
    (MatchRule::Contains, contains),
    (MatchRule::Compact, compact),
    (MatchRule::Alias, alias),
];

fn stripped_name(subject: &Subject, candidate: &Candidate<'_>) -> bool {
    subject.name == candidate.stripped
}

fn full_name(subject: &Subject, candidate: &Candidate<'_>) -> bool {
    subject.name == candidate.full
}

/// Every subject word appears in order among the candidate's words, and the
/// counts are equal, so "West US" does not match "West US 2".
fn ordered_words(subject: &Subject, candidate: &Candidate<'_>) -> bool {
    if subject.words.is_empty() || subject.words.len() != candidate.stripped_words.len() {
        return false;
    }
    let mut remaining = candidate.stripped_words.iter();
    subject
        .words
        .iter()
        .all(|word| remaining.any(|c| c == word))
}

fn same_words(subject: &Subject, candidate: &Candidate<'_>) -> bool {
    if subject.words.is_empty() || subject.words.len() != candidate.stripped_words.len() {
        return false;
    }
    let mut left: Vec<&String> = subject.words.iter().collect();
    let mut right: Vec<&String> = candidate.stripped_words.iter().collect();
    left.sort();
    right.sort();
    left == right
}

fn contains(subject: &Subject, candidate: &Candidate<'_>) -> bool {
    candidate.full.contains(&subject.name)
}

fn compact(subject: &Subject, candidate: &Candidate<'_>) -> bool {
    subject.compact == candidate.compact
}

fn alias(subject: &Subject, candidate: &Candidate<'_>) -> bool {
    candidate.aliases.iter().any(|a| *a == subject.name)
}

/// A catalog prepared for repeated lookups.
///
/// Normalized candidate names are computed once, which matters when every
/// fact of a run is resolved against the same catalog.
pub struct RegionMatcher<'a> {
    candidates: Vec<Candidate<'a>>,
}

impl<'a> RegionMatcher<'a> {
    pub fn new(catalog: &'a [CanonicalRegion]) -> Self {
        Self {
            candidates: catalog.iter().map(Candidate::new).collect(),
        }
    }

    /// Resolve a fact, reporting which rule fired.
    pub fn find_with_rule(
        &self,
        fact: &AvailabilityFact,
    ) -> Option<(&'a CanonicalRegion, MatchRule)> {
        let name = normalize(&fact.region_name, false);
        if name.is_empty() {
            return None;
        }
        let subject = Subject {
            words: owned_words(&name),
            compact: normalize(&fact.region_name, true),
            name,
        };

        let eligible: Vec<&Candidate<'a>> = self
            .candidates
            .iter()
            .filter(|c| fact.provider.map_or(true, |p| c.region.provider == p))
            .collect();

        RULES.iter().find_map(|(rule, predicate)| {
            eligible
                .iter()
                .find(|candidate| predicate(&subject, candidate))
                .map(|candidate| (candidate.region, *rule))
        })
    }

    pub fn find(&self, fact: &AvailabilityFact) -> Option<&'a CanonicalRegion> {
        self.find_with_rule(fact).map(|(region, _)| region)
    }
}

/// Resolve one fact against `catalog`. `None` means no rule matched any
/// eligible candidate.
pub fn find_match<'a>(
    fact: &AvailabilityFact,
    catalog: &'a [CanonicalRegion],
) -> Option<&'a CanonicalRegion> {
    RegionMatcher::new(catalog).find(fact)
}

/// Like [`find_match`], also returning the rule that resolved the fact.
pub fn find_match_with_rule<'a>(
    fact: &AvailabilityFact,
    catalog: &'a [CanonicalRegion],
) -> Option<(&'a CanonicalRegion, MatchRule)> {
    RegionMatcher::new(catalog).find_with_rule(fact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provider;

    fn fact(provider: Option<Provider>, name: &str) -> AvailabilityFact {
        AvailabilityFact::new(provider, name, "vdc_m365")
    }

    fn matched(fact: &AvailabilityFact, catalog: &[CanonicalRegion]) -> Option<(String, MatchRule)> {
        find_match_with_rule(fact, catalog).map(|(r, rule)| (r.id.clone(), rule))
    }

    #[test]
    fn test_provider_scopes_candidates() {
        let catalog = vec![
            CanonicalRegion::new("azure-us-east-1", "US East 1 (N. Virginia)", Provider::Azure),
            CanonicalRegion::new("aws-us-east-1", "US East 1 (N. Virginia)", Provider::Aws),
        ];
        let f = fact(Some(Provider::Aws), "US East 1 (N. Virginia)");
        assert_eq!(
            matched(&f, &catalog),
            Some(("aws-us-east-1".to_string(), MatchRule::FullName))
        );
    }

    #[test]
    fn test_bare_name_matches_stripped_display_name() {
        let catalog = vec![CanonicalRegion::new(
            "aws-us-east-1",
            "US East 1 (N. Virginia)",
            Provider::Aws,
        )];
        let f = fact(Some(Provider::Aws), "us east 1");
        assert_eq!(
            matched(&f, &catalog),
            Some(("aws-us-east-1".to_string(), MatchRule::StrippedName))
        );
    }

    #[test]
    fn test_reordered_words_match() {
        let catalog = vec![CanonicalRegion::new(
            "azure-central-india",
            "Central India",
            Provider::Azure,
        )];
        let f = fact(None, "India Central");
        assert_eq!(
            matched(&f, &catalog),
            Some(("azure-central-india".to_string(), MatchRule::SameWords))
        );
    }

    #[test]
    fn test_punctuation_insensitive_word_order() {
        let catalog = vec![CanonicalRegion::new(
            "aws-eu-central-1",
            "EU Central 1 (Frankfurt)",
            Provider::Aws,
        )];
        let f = fact(Some(Provider::Aws), "EU-Central-1");
        assert_eq!(
            matched(&f, &catalog),
            Some(("aws-eu-central-1".to_string(), MatchRule::OrderedWords))
        );
    }

    #[test]
    fn test_word_count_guards_against_numbered_regions() {
        let catalog = vec![CanonicalRegion::new(
            "azure-west-us-2",
            "West US 2",
            Provider::Azure,
        )];
        let f = fact(Some(Provider::Azure), "West US");
        // Neither word rule fires; substring containment is the loosest
        // name rule and does.
        assert_eq!(
            matched(&f, &catalog),
            Some(("azure-west-us-2".to_string(), MatchRule::Contains))
        );
    }

    #[test]
    fn test_stricter_rule_beats_catalog_order() {
        let catalog = vec![
            CanonicalRegion::new("azure-west-us-2", "West US 2", Provider::Azure),
            CanonicalRegion::new("azure-west-us", "West US", Provider::Azure),
        ];
        let f = fact(Some(Provider::Azure), "West US");
        assert_eq!(
            matched(&f, &catalog),
            Some(("azure-west-us".to_string(), MatchRule::StrippedName))
        );
    }

    #[test]
    fn test_first_candidate_wins_within_rule() {
        let catalog = vec![
            CanonicalRegion::new("azure-uk-south-a", "UK South (London)", Provider::Azure),
            CanonicalRegion::new("azure-uk-south-b", "UK South (Cardiff)", Provider::Azure),
        ];
        let f = fact(Some(Provider::Azure), "UK South");
        assert_eq!(
            find_match(&f, &catalog).map(|r| r.id.as_str()),
            Some("azure-uk-south-a")
        );
    }

    #[test]
    fn test_compact_and_synonym_match() {
        let catalog = vec![CanonicalRegion::new(
            "azure-north-europe",
            "EU North (Ireland)",
            Provider::Azure,
        )];
        assert_eq!(
            matched(&fact(None, "North Europe"), &catalog),
            Some(("azure-north-europe".to_string(), MatchRule::StrippedName))
        );
        assert_eq!(
            matched(&fact(None, "EUNorth"), &catalog),
            Some(("azure-north-europe".to_string(), MatchRule::Compact))
        );
    }

    #[test]
    fn test_alias_match() {
        let catalog = vec![CanonicalRegion::new(
            "azure-uae-north",
            "UAE North (Dubai)",
            Provider::Azure,
        )
        .with_alias("Middle East North")];
        assert_eq!(
            matched(&fact(Some(Provider::Azure), "middle east north"), &catalog),
            Some(("azure-uae-north".to_string(), MatchRule::Alias))
        );
    }

    #[test]
    fn test_no_match() {
        let catalog = vec![CanonicalRegion::new(
            "aws-us-east-1",
            "US East 1 (N. Virginia)",
            Provider::Aws,
        )];
        assert!(find_match(&fact(Some(Provider::Aws), "Mars Base 1"), &catalog).is_none());
        assert!(find_match(&fact(Some(Provider::Azure), "US East 1"), &catalog).is_none());
        assert!(find_match(&fact(None, "   "), &catalog).is_none());
        assert!(find_match(&fact(None, "US East 1"), &[]).is_none());
    }
}
