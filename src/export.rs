use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use eframe::egui::vec2;
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg;
use tracing::info;

use crate::config::{ExportConfig, Palette};
use crate::error::ExportError;
use crate::geo::Dataset;
use crate::render::{ProjectionEngine, ProjectionFamily, ProjectionParams, Scene, compose};
use crate::state::Selection;
use crate::util::{color_hex, file_label, xml_escape};

const SVG_PROLOG: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;
const SVG_NS: &str = "http://www.w3.org/2000/svg";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

pub struct ExportRenderer<'a> {
    dataset: &'a Dataset,
    palette: &'a Palette,
    config: &'a ExportConfig,
}

impl<'a> ExportRenderer<'a> {
    pub fn new(dataset: &'a Dataset, palette: &'a Palette, config: &'a ExportConfig) -> Self {
        Self {
            dataset,
            palette,
            config,
        }
    }

    pub fn scene(&self, selection: &Selection) -> Option<Scene> {
        let generator = ProjectionEngine::build(
            vec2(self.config.width as f32, self.config.height as f32),
            ProjectionFamily::Flat,
            [0.0, 0.0],
            &self.dataset.features,
            ProjectionParams {
                flat_padding: self.config.padding,
                globe_padding: self.config.padding,
            },
        )?;
        Some(compose(self.dataset, selection, &generator, self.palette))
    }

    pub fn render_svg(&self, selection: &Selection) -> String {
        let (width, height) = (self.config.width, self.config.height);
        let mut svg = String::new();
        let _ = writeln!(svg, "{SVG_PROLOG}");
        let _ = writeln!(
            svg,
            r#"<svg xmlns="{SVG_NS}" xmlns:xlink="{XLINK_NS}" version="1.1" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
        );
        let _ = writeln!(
            svg,
            r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
            color_hex(self.palette.ocean)
        );

        if let Some(scene) = self.scene(selection) {
            let _ = writeln!(svg, r#"<g id="countries" fill-rule="evenodd">"#);
            for feature in &scene.features {
                let _ = writeln!(
                    svg,
                    r#"<path data-key="{}" d="{}" fill="{}" stroke="{}" stroke-width="{:.2}"><title>{}</title></path>"#,
                    xml_escape(&feature.key),
                    feature.path.to_svg_d(),
                    color_hex(feature.style.fill),
                    color_hex(feature.style.stroke),
                    feature.style.stroke_width,
                    xml_escape(&feature.name),
                );
            }
            let _ = writeln!(svg, "</g>");

            let _ = writeln!(
                svg,
                r#"<g id="arcs" fill="none" stroke-linecap="round" stroke-opacity="{:.2}">"#,
                self.palette.arc_opacity
            );
            for arc in &scene.arcs {
                let _ = writeln!(
                    svg,
                    r#"<path data-key="{}" data-source="{}" data-target="{}" d="{}" stroke="{}" stroke-width="{:.2}"/>"#,
                    xml_escape(&arc.descriptor.key),
                    xml_escape(&arc.descriptor.source),
                    xml_escape(&arc.descriptor.target),
                    arc.descriptor.to_svg_d(),
                    color_hex(arc.color),
                    arc.descriptor.stroke_width(),
                );
            }
            let _ = writeln!(svg, "</g>");
        }

        svg.push_str("</svg>\n");
        svg
    }

    pub fn render_png(&self, selection: &Selection) -> Result<Vec<u8>, ExportError> {
        let svg = self.render_svg(selection);
        let tree = usvg::Tree::from_str(&svg, &usvg::Options::default())?;

        let factor = self.config.supersample.max(1);
        let width = self.config.width.saturating_mul(factor);
        let height = self.config.height.saturating_mul(factor);
        let mut pixmap = Pixmap::new(width, height).ok_or(ExportError::Pixmap { width, height })?;
        resvg::render(
            &tree,
            Transform::from_scale(factor as f32, factor as f32),
            &mut pixmap.as_mut(),
        );

        pixmap
            .encode_png()
            .map_err(|err| ExportError::Encode(err.to_string()))
    }

    pub fn write_svg(&self, selection: &Selection, path: &Path) -> Result<(), ExportError> {
        let svg = self.render_svg(selection);
        write_file(path, svg.as_bytes())?;
        info!(path = %path.display(), bytes = svg.len(), "exported SVG");
        Ok(())
    }

    pub fn write_png(&self, selection: &Selection, path: &Path) -> Result<(), ExportError> {
        let png = self.render_png(selection)?;
        write_file(path, &png)?;
        info!(path = %path.display(), bytes = png.len(), "exported PNG");
        Ok(())
    }

    pub fn default_path(&self, selection: &Selection, extension: &str) -> PathBuf {
        let label = match selection {
            Selection::None => file_label(""),
            Selection::Country(code) => file_label(code),
            Selection::Alliance(name) => file_label(name),
        };
        self.config
            .directory
            .join(format!("relmap-{label}.{extension}"))
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), ExportError> {
    let io_error = |source| ExportError::Io {
        path: path.to_owned(),
        source,
    };
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_error)?;
    }
    std::fs::write(path, contents).map_err(io_error)
}
