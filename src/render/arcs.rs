use std::cmp::Ordering;
use std::fmt::Write;

use eframe::egui::{Pos2, pos2, vec2};
use tracing::trace;

use crate::geo::{CountryCode, CountryLookup, RelationshipData};

use super::projection::PathGenerator;

pub const ARC_LIMIT_PER_SIDE: usize = 5;
pub const ARC_CURVATURE: f32 = 0.3;

const LENGTH_SEGMENTS: usize = 32;

#[derive(Clone, Debug, PartialEq)]
pub struct ArcDescriptor {
    pub key: String,
    pub source: CountryCode,
    pub target: CountryCode,
    pub score: f64,
    pub from: Pos2,
    pub to: Pos2,
}

impl ArcDescriptor {
    /// Chord midpoint pushed along `(-dy, dx)`. The offset depends on the
    /// direction of travel, so `A -> B` and `B -> A` bow to opposite sides.
    pub fn control_point(&self) -> Pos2 {
        let chord = self.to - self.from;
        let midpoint = self.from + chord * 0.5;
        midpoint + vec2(-chord.y, chord.x) * ARC_CURVATURE
    }

    pub fn point_at(&self, t: f32) -> Pos2 {
        let control = self.control_point();
        let u = 1.0 - t;
        pos2(
            u * u * self.from.x + 2.0 * u * t * control.x + t * t * self.to.x,
            u * u * self.from.y + 2.0 * u * t * control.y + t * t * self.to.y,
        )
    }

    pub fn sample(&self, segments: usize) -> Vec<Pos2> {
        let segments = segments.max(1);
        (0..=segments)
            .map(|step| self.point_at(step as f32 / segments as f32))
            .collect()
    }

    pub fn length(&self) -> f32 {
        self.sample(LENGTH_SEGMENTS)
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).length())
            .sum()
    }

    pub fn stroke_width(&self) -> f32 {
        1.0 + 0.25 * self.score.abs() as f32
    }

    pub fn to_svg_d(&self) -> String {
        let control = self.control_point();
        let mut d = String::new();
        let _ = write!(
            d,
            "M{:.2},{:.2}Q{:.2},{:.2} {:.2},{:.2}",
            self.from.x, self.from.y, control.x, control.y, self.to.x, self.to.y
        );
        d
    }
}

pub fn select_arcs(
    selected: &str,
    relations: &RelationshipData,
    lookup: &impl CountryLookup,
    generator: &PathGenerator,
) -> Vec<ArcDescriptor> {
    let Some(entry) = relations.get(selected) else {
        return Vec::new();
    };
    let Some(from) = lookup
        .feature(selected)
        .and_then(|feature| generator.centroid_of(feature))
    else {
        trace!(selected, "selected country has no visible centroid");
        return Vec::new();
    };

    let mut ranked = entry
        .relations
        .iter()
        .filter(|(code, score)| code.as_str() != selected && score.is_finite() && **score != 0.0)
        .map(|(code, score)| (code.as_str(), *score))
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });

    let allies = ranked
        .iter()
        .filter(|(_, score)| *score > 0.0)
        .take(ARC_LIMIT_PER_SIDE);
    let adversaries = ranked
        .iter()
        .filter(|(_, score)| *score < 0.0)
        .take(ARC_LIMIT_PER_SIDE);

    allies
        .chain(adversaries)
        .filter_map(|&(target, score)| {
            let to = lookup
                .feature(target)
                .and_then(|feature| generator.centroid_of(feature));
            if to.is_none() {
                trace!(selected, target, "skipping arc without partner geometry");
            }
            Some(ArcDescriptor {
                key: format!("{selected}-{target}"),
                source: selected.to_owned(),
                target: target.to_owned(),
                score,
                from,
                to: to?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use proptest::prelude::*;
    use serde_json::Map;

    use crate::geo::{CountryFeature, Geometry, RelationshipEntry};
    use crate::render::projection::{ProjectionEngine, ProjectionFamily, ProjectionParams};

    use super::*;

    fn square(lon: f64, lat: f64) -> CountryFeature {
        CountryFeature::new(
            None,
            Map::new(),
            Geometry::Polygon(vec![vec![
                [lon, lat],
                [lon + 4.0, lat],
                [lon + 4.0, lat + 4.0],
                [lon, lat + 4.0],
                [lon, lat],
            ]]),
        )
    }

    fn lookup(codes: &[&str]) -> HashMap<CountryCode, CountryFeature> {
        codes
            .iter()
            .enumerate()
            .map(|(index, code)| {
                let lon = -170.0 + (index % 40) as f64 * 8.0;
                let lat = -60.0 + (index / 40) as f64 * 8.0;
                ((*code).to_owned(), square(lon, lat))
            })
            .collect()
    }

    fn generator(lookup: &HashMap<CountryCode, CountryFeature>) -> PathGenerator {
        let features = lookup.values().cloned().collect::<Vec<_>>();
        ProjectionEngine::build(
            vec2(960.0, 480.0),
            ProjectionFamily::Flat,
            [0.0, 0.0],
            &features,
            ProjectionParams {
                flat_padding: 20.0,
                globe_padding: 20.0,
            },
        )
        .expect("projection")
    }

    fn relations(selected: &str, scores: &[(&str, f64)]) -> RelationshipData {
        RelationshipData::from_entries([(
            selected.to_owned(),
            RelationshipEntry {
                name: selected.to_owned(),
                relations: scores
                    .iter()
                    .map(|(code, score)| ((*code).to_owned(), *score))
                    .collect(),
            },
        )])
    }

    #[test]
    fn small_relation_maps_produce_an_arc_per_partner() {
        let lookup = lookup(&["USA", "RUS", "GBR", "CHN"]);
        let relations = relations("USA", &[("RUS", -8.0), ("GBR", 9.0), ("CHN", -3.0)]);

        let arcs = select_arcs("USA", &relations, &lookup, &generator(&lookup));
        let keys = arcs.iter().map(|arc| arc.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["USA-GBR", "USA-RUS", "USA-CHN"]);
        assert_eq!(arcs[0].stroke_width(), 3.25);
    }

    #[test]
    fn each_side_keeps_its_five_strongest() {
        let codes = (0..14).map(|index| format!("C{index:02}")).collect::<Vec<_>>();
        let mut all = codes.iter().map(String::as_str).collect::<Vec<_>>();
        all.push("SEL");
        let lookup = lookup(&all);

        let scores = codes
            .iter()
            .enumerate()
            .map(|(index, code)| {
                let magnitude = 1.0 + (index / 2) as f64;
                let score = if index % 2 == 0 { magnitude } else { -magnitude };
                (code.as_str(), score)
            })
            .collect::<Vec<_>>();
        let relations = relations("SEL", &scores);

        let arcs = select_arcs("SEL", &relations, &lookup, &generator(&lookup));
        let allies = arcs.iter().filter(|arc| arc.score > 0.0).count();
        let adversaries = arcs.iter().filter(|arc| arc.score < 0.0).count();
        assert_eq!((allies, adversaries), (5, 5));
        assert!(arcs.iter().all(|arc| arc.score.abs() >= 3.0));
    }

    #[test]
    fn partners_without_geometry_are_skipped_after_the_cut() {
        let lookup = lookup(&["USA", "GBR"]);
        let relations = relations("USA", &[("GBR", 2.0), ("ATL", 9.0), ("RUS", -4.0)]);

        let arcs = select_arcs("USA", &relations, &lookup, &generator(&lookup));
        assert_eq!(arcs.len(), 1);
        assert_eq!(arcs[0].target, "GBR");
    }

    #[test]
    fn selection_without_entry_or_geometry_has_no_arcs() {
        let lookup = lookup(&["USA", "GBR"]);
        let generator = generator(&lookup);
        let usa_only = relations("USA", &[("GBR", 2.0)]);

        assert!(select_arcs("GBR", &usa_only, &lookup, &generator).is_empty());
        let unmapped = relations("ATL", &[("USA", 5.0)]);
        assert!(select_arcs("ATL", &unmapped, &lookup, &generator).is_empty());
    }

    #[test]
    fn control_point_bows_perpendicular_to_the_chord() {
        let arc = ArcDescriptor {
            key: "A-B".to_owned(),
            source: "A".to_owned(),
            target: "B".to_owned(),
            score: 4.0,
            from: pos2(0.0, 0.0),
            to: pos2(10.0, 0.0),
        };
        assert_eq!(arc.control_point(), pos2(5.0, 3.0));
        assert_eq!(arc.to_svg_d(), "M0.00,0.00Q5.00,3.00 10.00,0.00");
        assert!(arc.length() > 10.0);

        let reverse = ArcDescriptor {
            from: arc.to,
            to: arc.from,
            ..arc.clone()
        };
        assert_eq!(reverse.control_point(), pos2(5.0, -3.0));
    }

    proptest! {
        #[test]
        fn arcs_are_bounded_and_reference_known_partners(
            scores in proptest::collection::vec(-10.0f64..10.0, 0..40),
            known in proptest::collection::vec(any::<bool>(), 40),
        ) {
            let codes = (0..scores.len()).map(|index| format!("P{index:02}")).collect::<Vec<_>>();
            let mut present = codes
                .iter()
                .zip(&known)
                .filter(|(_, known)| **known)
                .map(|(code, _)| code.as_str())
                .collect::<Vec<_>>();
            present.push("SEL");
            let lookup = lookup(&present);
            let pairs = codes
                .iter()
                .map(String::as_str)
                .zip(scores.iter().copied())
                .collect::<Vec<_>>();
            let relations = relations("SEL", &pairs);

            let arcs = select_arcs("SEL", &relations, &lookup, &generator(&lookup));
            prop_assert!(arcs.len() <= 2 * ARC_LIMIT_PER_SIDE);
            prop_assert!(arcs.iter().filter(|arc| arc.score > 0.0).count() <= ARC_LIMIT_PER_SIDE);
            prop_assert!(arcs.iter().filter(|arc| arc.score < 0.0).count() <= ARC_LIMIT_PER_SIDE);
            for arc in &arcs {
                prop_assert!(lookup.contains_key(&arc.target));
            }
        }
    }
}
