use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eframe::egui::Color32;
use serde::Deserialize;

use crate::render::{ProjectionFamily, ProjectionParams, RelationshipColorScale};

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub palette: Palette,
    pub map: MapConfig,
    pub export: ExportConfig,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Palette {
    #[serde(deserialize_with = "hex_color::deserialize")]
    pub hostile: Color32,
    #[serde(deserialize_with = "hex_color::deserialize")]
    pub neutral_score: Color32,
    #[serde(deserialize_with = "hex_color::deserialize")]
    pub ally: Color32,
    #[serde(deserialize_with = "hex_color::deserialize")]
    pub ungraded_fill: Color32,
    #[serde(deserialize_with = "hex_color::deserialize")]
    pub default_stroke: Color32,
    pub default_stroke_width: f32,
    #[serde(deserialize_with = "hex_color::deserialize")]
    pub selected_fill: Color32,
    #[serde(deserialize_with = "hex_color::deserialize")]
    pub selected_stroke: Color32,
    pub selected_stroke_width: f32,
    #[serde(deserialize_with = "hex_color::deserialize")]
    pub alliance_fill: Color32,
    #[serde(deserialize_with = "hex_color::deserialize")]
    pub alliance_stroke: Color32,
    pub alliance_stroke_width: f32,
    #[serde(deserialize_with = "hex_color::deserialize")]
    pub ocean: Color32,
    #[serde(deserialize_with = "hex_color::deserialize")]
    pub background: Color32,
    pub arc_opacity: f32,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            hostile: Color32::from_rgb(0xd7, 0x30, 0x27),
            neutral_score: Color32::from_rgb(0xf7, 0xf7, 0xf7),
            ally: Color32::from_rgb(0x1a, 0x98, 0x50),
            ungraded_fill: Color32::from_rgb(0xcb, 0xd5, 0xe1),
            default_stroke: Color32::from_rgb(0x64, 0x74, 0x8b),
            default_stroke_width: 0.5,
            selected_fill: Color32::from_rgb(0x3b, 0x82, 0xf6),
            selected_stroke: Color32::from_rgb(0xfa, 0xcc, 0x15),
            selected_stroke_width: 2.0,
            alliance_fill: Color32::from_rgb(0xf5, 0x9e, 0x0b),
            alliance_stroke: Color32::from_rgb(0xfb, 0xbf, 0x24),
            alliance_stroke_width: 1.5,
            ocean: Color32::from_rgb(0xdb, 0xea, 0xfe),
            background: Color32::from_rgb(0x0f, 0x17, 0x2a),
            arc_opacity: 0.85,
        }
    }
}

impl Palette {
    pub fn color_scale(&self) -> RelationshipColorScale {
        RelationshipColorScale::new(self.hostile, self.neutral_score, self.ally)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MapConfig {
    pub initial_projection: ProjectionFamily,
    pub flat_padding: f32,
    pub globe_padding: f32,
    pub rotate_sensitivity: f64,
    pub transition_ms: u64,
    pub arc_draw_ms: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            initial_projection: ProjectionFamily::Flat,
            flat_padding: 20.0,
            globe_padding: 20.0,
            rotate_sensitivity: 0.25,
            transition_ms: 300,
            arc_draw_ms: 1000,
        }
    }
}

impl MapConfig {
    pub fn projection_params(&self) -> ProjectionParams {
        ProjectionParams {
            flat_padding: self.flat_padding,
            globe_padding: self.globe_padding,
        }
    }

    pub fn transition_secs(&self) -> f64 {
        self.transition_ms as f64 / 1000.0
    }

    pub fn arc_draw_secs(&self) -> f64 {
        self.arc_draw_ms as f64 / 1000.0
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub width: u32,
    pub height: u32,
    pub supersample: u32,
    pub padding: f32,
    pub directory: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 800,
            supersample: 2,
            padding: 20.0,
            directory: PathBuf::from("."),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(config)
}

impl Config {
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => load_config(path),
            None => Ok(Self::default()),
        }
    }
}

mod hex_color {
    use eframe::egui::Color32;
    use serde::{Deserialize, Deserializer, de};

    use crate::util::parse_hex_color;

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<Color32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        parse_hex_color(&value)
            .ok_or_else(|| de::Error::custom(format!("expected a #rrggbb color, got {value:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").expect("empty config");
        assert_eq!(config.map, MapConfig::default());
        assert_eq!(config.export, ExportConfig::default());
        assert_eq!(config.palette, Palette::default());
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let config: Config = toml::from_str(
            r##"
            [palette]
            ally = "#0000ff"

            [map]
            initial_projection = "globe"
            rotate_sensitivity = 0.5

            [export]
            supersample = 3
            "##,
        )
        .expect("valid config");

        assert_eq!(config.palette.ally, Color32::from_rgb(0, 0, 255));
        assert_eq!(config.palette.hostile, Palette::default().hostile);
        assert_eq!(config.map.initial_projection, ProjectionFamily::Globe);
        assert_eq!(config.map.rotate_sensitivity, 0.5);
        assert_eq!(config.map.flat_padding, 20.0);
        assert_eq!(config.export.supersample, 3);
        assert_eq!(config.export.width, 1600);
    }

    #[test]
    fn bad_colors_and_unknown_fields_are_rejected() {
        assert!(toml::from_str::<Config>("[palette]\nally = \"green\"").is_err());
        assert!(toml::from_str::<Config>("[map]\nzoom = 3").is_err());
    }
}
