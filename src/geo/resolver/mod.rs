use std::collections::HashSet;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::{normalize_name, sanitize_name};

use super::feature::CountryFeature;
use super::relations::CountryCode;

mod tables;

use self::tables::{CANONICAL_NAMES, MULTI_TERRITORY_CODES, NAME_OVERRIDES, NUMERIC_TO_ALPHA3};

const ISO_A3_KEYS: [&str; 4] = ["iso_a3", "ISO_A3", "ISO_A3_EH", "iso_a3_eh"];
const ADMIN_A3_KEYS: [&str; 4] = ["adm0_a3", "ADM0_A3", "gu_a3", "GU_A3"];
const ISO_N3_KEYS: [&str; 4] = ["iso_n3", "ISO_N3", "ISO_N3_EH", "iso_n3_eh"];

const FILLER_WORDS: [&str; 3] = ["of", "the", "and"];

pub trait ResolveStrategy {
    fn name(&self) -> &'static str;
    fn resolve(&self, feature: &CountryFeature) -> Option<CountryCode>;
}

pub struct CodeResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl Default for CodeResolver {
    fn default() -> Self {
        Self::with_known_names(std::iter::empty())
    }
}

impl CodeResolver {
    pub fn with_known_names<'a>(known_names: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            strategies: vec![
                Box::new(NameOverride),
                Box::new(IsoAlpha3),
                Box::new(AdminAlpha3),
                Box::new(NumericIso),
                Box::new(FuzzyName::new(known_names)),
            ],
        }
    }

    pub fn resolve(&self, feature: &CountryFeature) -> Option<CountryCode> {
        self.resolve_with_source(feature).map(|(code, _)| code)
    }

    pub fn resolve_with_source(&self, feature: &CountryFeature) -> Option<(CountryCode, &'static str)> {
        self.strategies
            .iter()
            .find_map(|strategy| strategy.resolve(feature).map(|code| (code, strategy.name())))
    }
}

fn valid_alpha3(value: &str) -> Option<String> {
    let value = value.trim();
    (value.len() == 3 && value.chars().all(|ch| ch.is_ascii_alphabetic()))
        .then(|| value.to_ascii_uppercase())
}

/// Keeps `code` for a multi-territory state's primary name and derives a
/// distinct `CODE-NAME` key for its other territories.
fn territory_code(code: String, name: Option<&str>) -> CountryCode {
    let Some((_, primary_names)) = MULTI_TERRITORY_CODES
        .iter()
        .find(|(shared, _)| *shared == code)
    else {
        return code;
    };
    let Some(name) = name else {
        return code;
    };

    let normalized = normalize_name(name);
    if primary_names
        .iter()
        .any(|primary| normalize_name(primary) == normalized)
    {
        return code;
    }

    let suffix = sanitize_name(name);
    if suffix.is_empty() {
        code
    } else {
        format!("{code}-{suffix}")
    }
}

struct NameOverride;

impl ResolveStrategy for NameOverride {
    fn name(&self) -> &'static str {
        "name-override"
    }

    fn resolve(&self, feature: &CountryFeature) -> Option<CountryCode> {
        let name = normalize_name(feature.name()?);
        NAME_OVERRIDES
            .iter()
            .find(|(override_name, _)| normalize_name(override_name) == name)
            .map(|(_, code)| (*code).to_owned())
    }
}

struct IsoAlpha3;

impl ResolveStrategy for IsoAlpha3 {
    fn name(&self) -> &'static str {
        "iso-a3"
    }

    fn resolve(&self, feature: &CountryFeature) -> Option<CountryCode> {
        let code = feature
            .string_properties(&ISO_A3_KEYS)
            .find_map(valid_alpha3)?;
        Some(territory_code(code, feature.name()))
    }
}

struct AdminAlpha3;

impl ResolveStrategy for AdminAlpha3 {
    fn name(&self) -> &'static str {
        "adm0-a3"
    }

    fn resolve(&self, feature: &CountryFeature) -> Option<CountryCode> {
        feature
            .string_properties(&ADMIN_A3_KEYS)
            .find_map(valid_alpha3)
    }
}

struct NumericIso;

impl ResolveStrategy for NumericIso {
    fn name(&self) -> &'static str {
        "iso-n3"
    }

    fn resolve(&self, feature: &CountryFeature) -> Option<CountryCode> {
        let numeric = feature
            .numeric_property(&ISO_N3_KEYS)
            .or_else(|| feature.numeric_id())?;
        NUMERIC_TO_ALPHA3
            .iter()
            .find(|(candidate, _)| *candidate == numeric)
            .map(|(_, code)| (*code).to_owned())
    }
}

struct FuzzyName {
    names: Vec<(String, CountryCode)>,
    matcher: SkimMatcherV2,
}

impl FuzzyName {
    fn new<'a>(known_names: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut seen = HashSet::new();
        let mut known = known_names.into_iter().collect::<Vec<_>>();
        known.sort_unstable();

        let names = CANONICAL_NAMES
            .iter()
            .map(|(code, name)| (*code, *name))
            .chain(known)
            .filter_map(|(code, name)| {
                let normalized = normalize_name(name);
                (!normalized.is_empty() && seen.insert(normalized.clone()))
                    .then(|| (normalized, code.to_owned()))
            })
            .collect();

        Self {
            names,
            matcher: SkimMatcherV2::default(),
        }
    }
}

impl ResolveStrategy for FuzzyName {
    fn name(&self) -> &'static str {
        "fuzzy-name"
    }

    fn resolve(&self, feature: &CountryFeature) -> Option<CountryCode> {
        let query = normalize_name(feature.name()?);
        if query.is_empty() {
            return None;
        }

        if let Some((_, code)) = self.names.iter().find(|(name, _)| *name == query) {
            return Some(code.clone());
        }

        let mut ranked = self
            .names
            .iter()
            .filter(|(candidate, _)| abbreviates(&query, candidate))
            .map(|(candidate, code)| {
                let score = self.matcher.fuzzy_match(candidate, &query).unwrap_or(0);
                (score, code)
            })
            .collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.0.cmp(&a.0));

        match ranked.as_slice() {
            [] => None,
            [(best, code), (runner_up, other), ..] if best == runner_up && code != other => None,
            [(_, code), ..] => Some((*code).clone()),
        }
    }
}

/// True when every query word is a prefix of a candidate word, in order, and
/// every candidate word other than a filler is claimed by one.
fn abbreviates(query: &str, candidate: &str) -> bool {
    let mut candidate_words = candidate.split(' ');
    for word in query.split(' ') {
        loop {
            let Some(next) = candidate_words.next() else {
                return false;
            };
            if next.starts_with(word) {
                break;
            }
            if !FILLER_WORDS.contains(&next) {
                return false;
            }
        }
    }
    candidate_words.all(|rest| FILLER_WORDS.contains(&rest))
}
