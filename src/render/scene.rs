use std::collections::HashSet;

use eframe::egui::{Color32, Pos2};

use crate::config::Palette;
use crate::geo::{CountryCode, Dataset};
use crate::state::Selection;

use super::arcs::{ArcDescriptor, select_arcs};
use super::encoder::{FeatureStyle, draw_order, encode};
use super::projection::{PathGenerator, ProjectedPath, ProjectionFamily};

#[derive(Clone, Debug, PartialEq)]
pub struct SceneFeature {
    pub key: String,
    pub code: Option<CountryCode>,
    pub name: String,
    pub path: ProjectedPath,
    pub style: FeatureStyle,
    pub score: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SceneArc {
    pub descriptor: ArcDescriptor,
    pub color: Color32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    pub family: ProjectionFamily,
    pub outline: Option<(Pos2, f32)>,
    pub features: Vec<SceneFeature>,
    pub arcs: Vec<SceneArc>,
}

impl Scene {
    pub fn feature(&self, key: &str) -> Option<&SceneFeature> {
        self.features.iter().find(|feature| feature.key == key)
    }
}

pub fn compose(
    dataset: &Dataset,
    selection: &Selection,
    generator: &PathGenerator,
    palette: &Palette,
) -> Scene {
    let styles = dataset
        .features
        .iter()
        .enumerate()
        .map(|(index, _)| {
            encode(
                dataset.code_of(index),
                selection,
                &dataset.relations,
                &dataset.alliances,
                palette,
            )
        })
        .collect::<Vec<_>>();

    let mut seen = HashSet::with_capacity(styles.len());
    let mut features = Vec::with_capacity(styles.len());
    for index in draw_order(&styles) {
        let path = generator.path_of(&dataset.features[index]);
        if path.is_empty() {
            continue;
        }

        let code = dataset.code_of(index);
        let key = match code {
            Some(code) if seen.insert(code.to_owned()) => code.to_owned(),
            Some(code) => format!("{code}#{index}"),
            None => format!("#{index}"),
        };
        let score = selection
            .country()
            .zip(code)
            .and_then(|(selected, code)| dataset.relations.score(selected, code));

        features.push(SceneFeature {
            key,
            code: code.map(str::to_owned),
            name: code
                .map(|code| dataset.name_of(code))
                .unwrap_or_else(|| dataset.features[index].display_name()),
            path,
            style: styles[index],
            score,
        });
    }

    let scale = palette.color_scale();
    let arcs = selection
        .country()
        .map(|selected| select_arcs(selected, &dataset.relations, dataset, generator))
        .unwrap_or_default()
        .into_iter()
        .map(|descriptor| SceneArc {
            color: scale.color_of(descriptor.score),
            descriptor,
        })
        .collect();

    Scene {
        family: generator.family(),
        outline: generator.outline(),
        features,
        arcs,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use eframe::egui::vec2;
    use serde_json::json;

    use crate::geo::{
        AllianceMembership, CountryFeature, Geometry, RelationshipData, RelationshipEntry,
    };
    use crate::render::projection::{ProjectionEngine, ProjectionParams};

    use super::*;

    fn feature(name: &str, iso: &str, lon: f64) -> CountryFeature {
        let serde_json::Value::Object(properties) = json!({ "name": name, "iso_a3": iso }) else {
            unreachable!();
        };
        CountryFeature::new(
            None,
            properties,
            Geometry::Polygon(vec![vec![
                [lon, 0.0],
                [lon + 10.0, 0.0],
                [lon + 10.0, 10.0],
                [lon, 10.0],
                [lon, 0.0],
            ]]),
        )
    }

    fn dataset() -> Dataset {
        let features = vec![
            feature("United States", "USA", -100.0),
            feature("Atlantis", "-99", -40.0),
            feature("United Kingdom", "GBR", 0.0),
            feature("Russia", "RUS", 60.0),
        ];
        let relations = RelationshipData::from_entries([(
            "USA".to_owned(),
            RelationshipEntry {
                name: "United States".to_owned(),
                relations: HashMap::from([("GBR".to_owned(), 9.0), ("RUS".to_owned(), -8.0)]),
            },
        )]);
        let alliances =
            AllianceMembership::from_members([("NATO".to_owned(), vec!["USA".to_owned(), "GBR".to_owned()])]);
        Dataset::new(features, relations, alliances)
    }

    fn generator(dataset: &Dataset) -> PathGenerator {
        ProjectionEngine::build(
            vec2(800.0, 400.0),
            ProjectionFamily::Flat,
            [0.0, 0.0],
            &dataset.features,
            ProjectionParams {
                flat_padding: 20.0,
                globe_padding: 20.0,
            },
        )
        .expect("projection")
    }

    #[test]
    fn country_selection_highlights_and_draws_arcs() {
        let dataset = dataset();
        let scene = compose(
            &dataset,
            &Selection::Country("USA".to_owned()),
            &generator(&dataset),
            &Palette::default(),
        );

        let keys = scene.features.iter().map(|f| f.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["#1", "GBR", "RUS", "USA"]);
        assert_eq!(scene.feature("GBR").and_then(|f| f.score), Some(9.0));
        assert_eq!(scene.feature("USA").map(|f| f.name.as_str()), Some("United States"));
        assert_eq!(scene.arcs.len(), 2);
        assert_eq!(scene.arcs[0].color, Palette::default().color_scale().color_of(9.0));
    }

    #[test]
    fn alliance_selection_has_no_arcs() {
        let dataset = dataset();
        let scene = compose(
            &dataset,
            &Selection::Alliance("NATO".to_owned()),
            &generator(&dataset),
            &Palette::default(),
        );

        assert!(scene.arcs.is_empty());
        let highlighted = scene
            .features
            .iter()
            .filter(|f| f.style.highlighted)
            .map(|f| f.key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(highlighted, vec!["USA", "GBR"]);
    }
}
