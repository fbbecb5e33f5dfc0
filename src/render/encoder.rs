use eframe::egui::Color32;

use crate::config::Palette;
use crate::geo::{AllianceMembership, RelationshipData};
use crate::state::Selection;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeatureStyle {
    pub fill: Color32,
    pub stroke: Color32,
    pub stroke_width: f32,
    pub highlighted: bool,
}

impl FeatureStyle {
    fn ungraded(palette: &Palette) -> Self {
        Self {
            fill: palette.ungraded_fill,
            stroke: palette.default_stroke,
            stroke_width: palette.default_stroke_width,
            highlighted: false,
        }
    }
}

/// Style for one feature. The first matching rule wins: unresolved code,
/// alliance selection, country selection, nothing selected.
pub fn encode(
    code: Option<&str>,
    selection: &Selection,
    relations: &RelationshipData,
    alliances: &AllianceMembership,
    palette: &Palette,
) -> FeatureStyle {
    let Some(code) = code else {
        return FeatureStyle::ungraded(palette);
    };

    match selection {
        Selection::Alliance(name) if alliances.is_member(name, code) => FeatureStyle {
            fill: palette.alliance_fill,
            stroke: palette.alliance_stroke,
            stroke_width: palette.alliance_stroke_width,
            highlighted: true,
        },
        Selection::Alliance(_) => FeatureStyle::ungraded(palette),
        Selection::Country(selected) if selected == code => FeatureStyle {
            fill: palette.selected_fill,
            stroke: palette.selected_stroke,
            stroke_width: palette.selected_stroke_width,
            highlighted: true,
        },
        Selection::Country(selected) => FeatureStyle {
            fill: palette
                .color_scale()
                .color_of(relations.score(selected, code).unwrap_or(0.0)),
            ..FeatureStyle::ungraded(palette)
        },
        Selection::None => FeatureStyle::ungraded(palette),
    }
}

pub fn draw_order(styles: &[FeatureStyle]) -> Vec<usize> {
    let mut order = (0..styles.len()).collect::<Vec<_>>();
    order.sort_by_key(|&index| styles[index].highlighted);
    order
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::geo::RelationshipEntry;

    use super::*;

    fn relations() -> RelationshipData {
        RelationshipData::from_entries([(
            "USA".to_owned(),
            RelationshipEntry {
                name: "United States".to_owned(),
                relations: HashMap::from([("GBR".to_owned(), 9.0), ("RUS".to_owned(), -8.0)]),
            },
        )])
    }

    fn alliances() -> AllianceMembership {
        AllianceMembership::from_members([(
            "NATO".to_owned(),
            ["USA", "GBR"].map(str::to_owned).to_vec(),
        )])
    }

    fn style(code: Option<&str>, selection: &Selection) -> FeatureStyle {
        encode(code, selection, &relations(), &alliances(), &Palette::default())
    }

    #[test]
    fn unresolved_features_stay_ungraded_under_any_selection() {
        let palette = Palette::default();
        for selection in [
            Selection::None,
            Selection::Country("USA".to_owned()),
            Selection::Alliance("NATO".to_owned()),
        ] {
            let style = style(None, &selection);
            assert_eq!(style.fill, palette.ungraded_fill);
            assert!(!style.highlighted);
        }
    }

    #[test]
    fn alliance_members_are_highlighted() {
        let palette = Palette::default();
        let nato = Selection::Alliance("NATO".to_owned());

        let member = style(Some("GBR"), &nato);
        assert_eq!(member.fill, palette.alliance_fill);
        assert_eq!(member.stroke_width, palette.alliance_stroke_width);
        assert!(member.highlighted);

        let outsider = style(Some("RUS"), &nato);
        assert_eq!(outsider.fill, palette.ungraded_fill);
        assert!(!outsider.highlighted);
    }

    #[test]
    fn country_selection_colors_partners_by_score() {
        let palette = Palette::default();
        let usa = Selection::Country("USA".to_owned());
        let scale = palette.color_scale();

        let selected = style(Some("USA"), &usa);
        assert_eq!(selected.fill, palette.selected_fill);
        assert_eq!(selected.stroke, palette.selected_stroke);
        assert!(selected.highlighted);

        assert_eq!(style(Some("GBR"), &usa).fill, scale.color_of(9.0));
        assert_eq!(style(Some("RUS"), &usa).fill, scale.color_of(-8.0));
        assert_eq!(style(Some("FRA"), &usa).fill, scale.color_of(0.0));
        assert!(!style(Some("GBR"), &usa).highlighted);
    }

    #[test]
    fn nothing_selected_is_uniform() {
        let palette = Palette::default();
        let style = style(Some("USA"), &Selection::None);
        assert_eq!(style.fill, palette.ungraded_fill);
        assert_eq!(style.stroke, palette.default_stroke);
    }

    #[test]
    fn draw_order_moves_highlighted_last_and_is_stable() {
        let plain = FeatureStyle::ungraded(&Palette::default());
        let lit = FeatureStyle {
            highlighted: true,
            ..plain
        };
        let styles = [lit, plain, lit, plain, plain];
        assert_eq!(draw_order(&styles), vec![1, 3, 4, 0, 2]);
    }
}
