use std::collections::{BTreeMap, BTreeSet, HashMap};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

pub type CountryCode = String;

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RelationshipEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relations: HashMap<CountryCode, f64>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RelationshipData {
    entries: HashMap<CountryCode, RelationshipEntry>,
}

impl RelationshipData {
    pub fn from_entries(entries: impl IntoIterator<Item = (CountryCode, RelationshipEntry)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<&RelationshipEntry> {
        self.entries.get(code)
    }

    pub fn score(&self, from: &str, to: &str) -> Option<f64> {
        self.entries
            .get(from)
            .and_then(|entry| entry.relations.get(to))
            .copied()
            .filter(|score| score.is_finite())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.name.trim().is_empty())
            .map(|(code, entry)| (code.as_str(), entry.name.as_str()))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct AllianceMembership {
    alliances: BTreeMap<String, BTreeSet<CountryCode>>,
}

impl AllianceMembership {
    pub fn from_members<I, M>(alliances: I) -> Self
    where
        I: IntoIterator<Item = (String, M)>,
        M: IntoIterator<Item = CountryCode>,
    {
        Self {
            alliances: alliances
                .into_iter()
                .map(|(name, members)| (name, members.into_iter().collect()))
                .collect(),
        }
    }

    pub fn is_member(&self, alliance: &str, code: &str) -> bool {
        self.alliances
            .get(alliance)
            .is_some_and(|members| members.contains(code))
    }

    pub fn contains(&self, alliance: &str) -> bool {
        self.alliances.contains_key(alliance)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.alliances.keys().map(String::as_str)
    }

    pub fn member_count(&self, alliance: &str) -> usize {
        self.alliances.get(alliance).map_or(0, BTreeSet::len)
    }

    pub fn len(&self) -> usize {
        self.alliances.len()
    }
}

fn normalize_code(code: &str) -> CountryCode {
    code.trim().to_ascii_uppercase()
}

pub(super) fn parse_relations(raw: &str) -> Result<RelationshipData> {
    let parsed: Map<String, Value> =
        serde_json::from_str(raw).context("relationship JSON must be an object keyed by country code")?;

    let mut entries = HashMap::with_capacity(parsed.len());
    for (code, value) in parsed {
        match RelationshipEntry::deserialize(&value) {
            Ok(entry) => {
                let relations = entry
                    .relations
                    .into_iter()
                    .filter(|(_, score)| score.is_finite())
                    .map(|(partner, score)| (normalize_code(&partner), score))
                    .filter(|(partner, _)| !partner.is_empty())
                    .collect();
                entries.insert(
                    normalize_code(&code),
                    RelationshipEntry {
                        name: entry.name,
                        relations,
                    },
                );
            }
            Err(error) => warn!(code = code.as_str(), %error, "skipping malformed relationship entry"),
        }
    }

    if entries.is_empty() {
        Err(anyhow!("relationship JSON contained no usable entries"))
    } else {
        Ok(RelationshipData::from_entries(entries))
    }
}

pub(super) fn parse_alliances(raw: &str) -> Result<AllianceMembership> {
    let parsed: BTreeMap<String, Vec<String>> =
        serde_json::from_str(raw).context("alliance JSON must map names to code arrays")?;
    Ok(AllianceMembership::from_members(parsed.into_iter().map(
        |(name, members)| {
            let members = members
                .into_iter()
                .map(|code| normalize_code(&code))
                .filter(|code| !code.is_empty());
            (name, members.collect::<Vec<_>>())
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relations_parse_and_skip_malformed_entries() {
        let raw = r#"{
            "usa": { "name": "United States", "relations": { "RUS": -8, "GBR": 9 } },
            "XXX": "not an entry",
            "GBR": { "relations": { "USA": 9.5 } }
        }"#;
        let data = parse_relations(raw).expect("usable entries");
        assert_eq!(data.len(), 2);
        assert_eq!(data.score("USA", "RUS"), Some(-8.0));
        assert_eq!(data.score("USA", "CHN"), None);
        assert_eq!(data.score("GBR", "USA"), Some(9.5));
        assert_eq!(data.get("GBR").map(|entry| entry.name.as_str()), Some(""));
        assert_eq!(data.names().count(), 1);
    }

    #[test]
    fn partner_codes_are_normalized_like_entry_keys() {
        let raw = r#"{ "USA": { "relations": { "rus": -8, " gbr ": 9, "": 3 } } }"#;
        let data = parse_relations(raw).expect("usable entries");
        assert_eq!(data.score("USA", "RUS"), Some(-8.0));
        assert_eq!(data.score("USA", "GBR"), Some(9.0));
        assert_eq!(data.get("USA").map(|entry| entry.relations.len()), Some(2));
    }

    #[test]
    fn relations_without_entries_are_rejected() {
        assert!(parse_relations("{}").is_err());
        assert!(parse_relations("[]").is_err());
    }

    #[test]
    fn alliances_normalize_member_codes() {
        let alliances = parse_alliances(r#"{ "NATO": ["usa", " GBR ", ""], "AUKUS": ["AUS"] }"#)
            .expect("valid alliances");
        assert!(alliances.is_member("NATO", "USA"));
        assert!(alliances.is_member("NATO", "GBR"));
        assert!(!alliances.is_member("NATO", "AUS"));
        assert!(!alliances.is_member("SCO", "CHN"));
        assert_eq!(alliances.member_count("NATO"), 2);
        assert_eq!(alliances.names().collect::<Vec<_>>(), vec!["AUKUS", "NATO"]);
    }
}
