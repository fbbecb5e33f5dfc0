use std::cell::OnceCell;
use std::collections::HashMap;

use eframe::egui::epaint::Mesh;
use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke};
use tracing::trace;

use crate::config::Palette;
use crate::geo::CountryCode;
use crate::render::{
    ArcDescriptor, FeatureStyle, ProjectedPath, ProjectionFamily, Scene, SceneArc, SceneFeature,
};
use crate::state::ViewTransform;

use super::render_utils::{
    blend_color, ease_in_out_cubic, polyline_visible, progress, triangulate, truncate_polyline,
    with_opacity,
};

const ARC_SEGMENTS: usize = 48;

struct FillMesh {
    vertices: Vec<Pos2>,
    indices: Vec<u32>,
}

pub(in crate::app) struct FeatureElement {
    pub key: String,
    pub code: Option<CountryCode>,
    pub name: String,
    pub score: Option<f64>,
    path: ProjectedPath,
    bounds: Rect,
    /// Triangulated on first paint and reset whenever the path changes.
    fills: OnceCell<Vec<FillMesh>>,
    style_from: FeatureStyle,
    style_to: FeatureStyle,
    style_changed_at: f64,
}

impl FeatureElement {
    fn enter(feature: &SceneFeature, now: f64) -> Self {
        Self {
            key: feature.key.clone(),
            code: feature.code.clone(),
            name: feature.name.clone(),
            score: feature.score,
            bounds: path_bounds(&feature.path),
            fills: OnceCell::new(),
            path: feature.path.clone(),
            style_from: feature.style,
            style_to: feature.style,
            style_changed_at: now,
        }
    }

    fn set_path(&mut self, path: &ProjectedPath) {
        self.bounds = path_bounds(path);
        self.fills = OnceCell::new();
        self.path = path.clone();
    }

    fn fills(&self) -> &[FillMesh] {
        self.fills.get_or_init(|| fill_meshes(&self.path))
    }

    fn style_at(&self, now: f64, duration: f64) -> FeatureStyle {
        let t = ease_in_out_cubic(progress(self.style_changed_at, now, duration));
        if t >= 1.0 {
            return self.style_to;
        }
        FeatureStyle {
            fill: blend_color(self.style_from.fill, self.style_to.fill, t),
            stroke: blend_color(self.style_from.stroke, self.style_to.stroke, t),
            stroke_width: self.style_from.stroke_width
                + (self.style_to.stroke_width - self.style_from.stroke_width) * t,
            highlighted: self.style_to.highlighted,
        }
    }
}

struct ArcElement {
    key: String,
    descriptor: ArcDescriptor,
    color: Color32,
    points: Vec<Pos2>,
    length: f32,
    entered_at: f64,
    exiting_since: Option<f64>,
}

impl ArcElement {
    fn enter(arc: &SceneArc, now: f64) -> Self {
        let mut element = Self {
            key: arc.descriptor.key.clone(),
            descriptor: arc.descriptor.clone(),
            color: arc.color,
            points: Vec::new(),
            length: 0.0,
            entered_at: now,
            exiting_since: None,
        };
        element.reshape(arc);
        element
    }

    fn reshape(&mut self, arc: &SceneArc) {
        self.descriptor = arc.descriptor.clone();
        self.color = arc.color;
        self.points = arc.descriptor.sample(ARC_SEGMENTS);
        self.length = arc.descriptor.length();
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(in crate::app) struct SyncStats {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
}

pub(in crate::app) struct RenderSurface {
    features: Vec<FeatureElement>,
    arcs: Vec<ArcElement>,
    outline: Option<(Pos2, f32)>,
    family: ProjectionFamily,
    transition_secs: f64,
    arc_draw_secs: f64,
}

impl RenderSurface {
    pub(in crate::app) fn new(transition_secs: f64, arc_draw_secs: f64) -> Self {
        Self {
            features: Vec::new(),
            arcs: Vec::new(),
            outline: None,
            family: ProjectionFamily::Flat,
            transition_secs,
            arc_draw_secs,
        }
    }

    pub(in crate::app) fn sync(&mut self, scene: &Scene, now: f64) -> SyncStats {
        let mut stats = SyncStats::default();
        self.outline = scene.outline;
        self.family = scene.family;

        let mut previous = std::mem::take(&mut self.features)
            .into_iter()
            .map(|element| (element.key.clone(), element))
            .collect::<HashMap<_, _>>();

        for feature in &scene.features {
            let element = match previous.remove(&feature.key) {
                Some(mut element) => {
                    stats.updated += 1;
                    if element.path != feature.path {
                        element.set_path(&feature.path);
                    }
                    if element.style_to != feature.style {
                        element.style_from = element.style_at(now, self.transition_secs);
                        element.style_to = feature.style;
                        element.style_changed_at = now;
                    }
                    element.code = feature.code.clone();
                    element.name = feature.name.clone();
                    element.score = feature.score;
                    element
                }
                None => {
                    stats.entered += 1;
                    FeatureElement::enter(feature, now)
                }
            };
            self.features.push(element);
        }
        stats.exited = previous.len();

        let mut incoming = scene
            .arcs
            .iter()
            .map(|arc| (arc.descriptor.key.as_str(), arc))
            .collect::<HashMap<_, _>>();
        for element in &mut self.arcs {
            match incoming.remove(element.key.as_str()) {
                Some(arc) => {
                    if element.exiting_since.take().is_some() {
                        element.entered_at = now;
                    }
                    element.reshape(arc);
                }
                None => {
                    element.exiting_since.get_or_insert(now);
                }
            }
        }
        for arc in &scene.arcs {
            if incoming.contains_key(arc.descriptor.key.as_str()) {
                trace!(key = arc.descriptor.key.as_str(), "arc entered");
                self.arcs.push(ArcElement::enter(arc, now));
            }
        }
        self.prune(now);

        stats
    }

    pub(in crate::app) fn prune(&mut self, now: f64) {
        let duration = self.transition_secs;
        self.arcs.retain(|arc| {
            arc.exiting_since
                .is_none_or(|since| progress(since, now, duration) < 1.0)
        });
    }

    pub(in crate::app) fn is_animating(&self, now: f64) -> bool {
        self.features
            .iter()
            .any(|element| progress(element.style_changed_at, now, self.transition_secs) < 1.0)
            || self.arcs.iter().any(|arc| {
                arc.exiting_since.is_some()
                    || progress(arc.entered_at, now, self.arc_draw_secs) < 1.0
            })
    }

    pub(in crate::app) fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub(in crate::app) fn arc_count(&self) -> usize {
        self.arcs
            .iter()
            .filter(|arc| arc.exiting_since.is_none())
            .count()
    }

    pub(in crate::app) fn hit_test(&self, point: Pos2) -> Option<&FeatureElement> {
        self.features
            .iter()
            .rev()
            .find(|element| element.path.contains(point))
    }

    pub(in crate::app) fn paint(
        &self,
        painter: &Painter,
        rect: Rect,
        transform: ViewTransform,
        palette: &Palette,
        now: f64,
    ) {
        let to_screen = |point: Pos2| rect.min + transform.apply(point).to_vec2();

        match (self.family, self.outline) {
            (ProjectionFamily::Globe, Some((center, radius))) => {
                painter.rect_filled(rect, 0.0, palette.background);
                painter.circle_filled(to_screen(center), radius * transform.scale, palette.ocean);
            }
            _ => {
                painter.rect_filled(rect, 0.0, palette.ocean);
            }
        }

        for element in &self.features {
            let screen_bounds =
                Rect::from_two_pos(to_screen(element.bounds.min), to_screen(element.bounds.max));
            if !rect.intersects(screen_bounds) {
                continue;
            }

            let style = element.style_at(now, self.transition_secs);
            let mut mesh = Mesh::default();
            for fill in element.fills() {
                let base = mesh.vertices.len() as u32;
                for vertex in &fill.vertices {
                    mesh.colored_vertex(to_screen(*vertex), style.fill);
                }
                for triangle in fill.indices.chunks_exact(3) {
                    mesh.add_triangle(base + triangle[0], base + triangle[1], base + triangle[2]);
                }
            }
            if !mesh.is_empty() {
                painter.add(Shape::mesh(mesh));
            }

            let stroke = Stroke::new(style.stroke_width, style.stroke);
            for ring in element.path.rings() {
                let points = ring.iter().map(|point| to_screen(*point)).collect::<Vec<_>>();
                if polyline_visible(rect, &points, stroke) {
                    painter.add(Shape::closed_line(points, stroke));
                }
            }
        }

        for arc in &self.arcs {
            let drawn = ease_in_out_cubic(progress(arc.entered_at, now, self.arc_draw_secs));
            let fade = arc
                .exiting_since
                .map_or(1.0, |since| 1.0 - progress(since, now, self.transition_secs));
            let points = truncate_polyline(&arc.points, arc.length, drawn)
                .into_iter()
                .map(to_screen)
                .collect::<Vec<_>>();
            let stroke = Stroke::new(
                arc.descriptor.stroke_width(),
                with_opacity(arc.color, palette.arc_opacity * fade),
            );
            if points.len() >= 2 && polyline_visible(rect, &points, stroke) {
                painter.add(Shape::line(points, stroke));
            }
        }
    }
}

fn path_bounds(path: &ProjectedPath) -> Rect {
    Rect::from_points(&path.rings().flatten().copied().collect::<Vec<_>>())
}

fn fill_meshes(path: &ProjectedPath) -> Vec<FillMesh> {
    path.polygons
        .iter()
        .map(|rings| {
            let (vertices, indices) = triangulate(rings);
            FillMesh { vertices, indices }
        })
        .filter(|fill| !fill.indices.is_empty())
        .collect()
}
