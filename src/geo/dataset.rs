use std::collections::HashMap;

use tracing::{debug, info, trace};

use super::feature::CountryFeature;
use super::relations::{AllianceMembership, CountryCode, RelationshipData};
use super::resolver::CodeResolver;

pub trait CountryLookup {
    fn feature(&self, code: &str) -> Option<&CountryFeature>;
}

#[derive(Clone, Debug)]
pub struct Dataset {
    pub features: Vec<CountryFeature>,
    pub codes: Vec<Option<CountryCode>>,
    pub relations: RelationshipData,
    pub alliances: AllianceMembership,
    index_by_code: HashMap<CountryCode, usize>,
}

impl Dataset {
    pub fn new(
        features: Vec<CountryFeature>,
        relations: RelationshipData,
        alliances: AllianceMembership,
    ) -> Self {
        let resolver = CodeResolver::with_known_names(relations.names());

        let mut codes = Vec::with_capacity(features.len());
        let mut index_by_code = HashMap::with_capacity(features.len());
        let mut unresolved = 0usize;
        for (index, feature) in features.iter().enumerate() {
            match resolver.resolve_with_source(feature) {
                Some((code, source)) => {
                    trace!(code = code.as_str(), source, "resolved feature");
                    index_by_code.entry(code.clone()).or_insert(index);
                    codes.push(Some(code));
                }
                None => {
                    unresolved += 1;
                    debug!(name = %feature.display_name(), "feature has no country code");
                    codes.push(None);
                }
            }
        }

        info!(
            features = features.len(),
            unresolved,
            relationship_entries = relations.len(),
            alliances = alliances.len(),
            "dataset ready"
        );

        Self {
            features,
            codes,
            relations,
            alliances,
            index_by_code,
        }
    }

    pub fn code_of(&self, index: usize) -> Option<&str> {
        self.codes.get(index).and_then(Option::as_deref)
    }

    pub fn index_of(&self, code: &str) -> Option<usize> {
        self.index_by_code.get(code).copied()
    }

    pub fn resolved_count(&self) -> usize {
        self.codes.iter().filter(|code| code.is_some()).count()
    }

    pub fn name_of(&self, code: &str) -> String {
        self.relations
            .get(code)
            .map(|entry| entry.name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .or_else(|| self.feature(code).map(CountryFeature::display_name))
            .unwrap_or_else(|| code.to_owned())
    }
}

impl CountryLookup for Dataset {
    fn feature(&self, code: &str) -> Option<&CountryFeature> {
        self.index_of(code).and_then(|index| self.features.get(index))
    }
}

impl CountryLookup for HashMap<CountryCode, CountryFeature> {
    fn feature(&self, code: &str) -> Option<&CountryFeature> {
        self.get(code)
    }
}
