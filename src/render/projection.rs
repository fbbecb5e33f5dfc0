use std::f64::consts::{PI, TAU};
use std::fmt::Write;

use eframe::egui::{Pos2, Vec2, pos2};
use serde::Deserialize;

use crate::geo::{CountryFeature, LonLat};

const HORIZON_STEP: f64 = 5.0 * PI / 180.0;
const AREA_EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionFamily {
    #[default]
    Flat,
    Globe,
}

impl ProjectionFamily {
    pub fn label(self) -> &'static str {
        match self {
            Self::Flat => "Flat",
            Self::Globe => "Globe",
        }
    }
}

pub type Rotation = [f64; 2];

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectionParams {
    pub flat_padding: f32,
    pub globe_padding: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProjectedPath {
    pub polygons: Vec<Vec<Vec<Pos2>>>,
}

impl ProjectedPath {
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    pub fn rings(&self) -> impl Iterator<Item = &[Pos2]> {
        self.polygons
            .iter()
            .flat_map(|rings| rings.iter().map(Vec::as_slice))
    }

    pub fn to_svg_d(&self) -> String {
        let mut d = String::new();
        for ring in self.rings() {
            for (index, point) in ring.iter().enumerate() {
                let command = if index == 0 { 'M' } else { 'L' };
                let _ = write!(d, "{command}{:.2},{:.2}", point.x, point.y);
            }
            d.push('Z');
        }
        d
    }

    pub fn contains(&self, point: Pos2) -> bool {
        self.polygons.iter().any(|rings| {
            rings
                .iter()
                .filter(|ring| ring_crosses(ring, point))
                .count()
                % 2
                == 1
        })
    }

    pub fn centroid(&self) -> Option<Pos2> {
        let mut weight = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;
        let mut count = 0usize;

        for rings in &self.polygons {
            for (ring_index, ring) in rings.iter().enumerate() {
                for point in ring {
                    sum_x += point.x as f64;
                    sum_y += point.y as f64;
                }
                count += ring.len();

                let (cross, mx, my) = ring_moments(ring);
                if cross.abs() < AREA_EPSILON {
                    continue;
                }
                let signed_area = if ring_index == 0 {
                    cross.abs() / 2.0
                } else {
                    -cross.abs() / 2.0
                };
                weight += signed_area;
                cx += signed_area * mx / (3.0 * cross);
                cy += signed_area * my / (3.0 * cross);
            }
        }

        if weight > AREA_EPSILON {
            Some(pos2((cx / weight) as f32, (cy / weight) as f32))
        } else if count > 0 {
            Some(pos2(
                (sum_x / count as f64) as f32,
                (sum_y / count as f64) as f32,
            ))
        } else {
            None
        }
    }
}

fn ring_moments(ring: &[Pos2]) -> (f64, f64, f64) {
    let mut cross_sum = 0.0;
    let mut mx = 0.0;
    let mut my = 0.0;
    for (index, a) in ring.iter().enumerate() {
        let b = ring[(index + 1) % ring.len()];
        let (ax, ay, bx, by) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
        let cross = ax * by - bx * ay;
        cross_sum += cross;
        mx += (ax + bx) * cross;
        my += (ay + by) * cross;
    }
    (cross_sum, mx, my)
}

fn ring_crosses(ring: &[Pos2], point: Pos2) -> bool {
    let mut inside = false;
    let mut previous = match ring.last() {
        Some(last) => *last,
        None => return false,
    };
    for &current in ring {
        if (current.y > point.y) != (previous.y > point.y) {
            let x = (previous.x - current.x) * (point.y - current.y) / (previous.y - current.y)
                + current.x;
            if point.x < x {
                inside = !inside;
            }
        }
        previous = current;
    }
    inside
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Projection {
    Equirectangular {
        scale: f64,
        translate: [f64; 2],
    },
    Orthographic {
        scale: f64,
        center: [f64; 2],
        rotation: Rotation,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct PathGenerator {
    projection: Projection,
}

pub struct ProjectionEngine;

impl ProjectionEngine {
    pub fn build(
        viewport: Vec2,
        family: ProjectionFamily,
        rotation: Rotation,
        features: &[CountryFeature],
        params: ProjectionParams,
    ) -> Option<PathGenerator> {
        if !(viewport.x > 0.0 && viewport.y > 0.0) || features.is_empty() {
            return None;
        }

        let projection = match family {
            ProjectionFamily::Flat => fit_equirectangular(viewport, features, params.flat_padding)?,
            ProjectionFamily::Globe => {
                let scale =
                    (viewport.x.min(viewport.y) as f64 - 2.0 * params.globe_padding as f64) / 2.0;
                if scale <= 0.0 || !rotation.iter().all(|angle| angle.is_finite()) {
                    return None;
                }
                Projection::Orthographic {
                    scale,
                    center: [viewport.x as f64 / 2.0, viewport.y as f64 / 2.0],
                    rotation,
                }
            }
        };

        Some(PathGenerator { projection })
    }
}

fn equirectangular_raw([lon, lat]: LonLat) -> [f64; 2] {
    [lon.to_radians(), -lat.to_radians()]
}

fn fit_equirectangular(
    viewport: Vec2,
    features: &[CountryFeature],
    padding: f32,
) -> Option<Projection> {
    let mut min = [f64::INFINITY; 2];
    let mut max = [f64::NEG_INFINITY; 2];
    for feature in features {
        for ring in feature.geometry.polygons().iter().flatten() {
            for point in unwrap_ring(open_ring(ring)) {
                let [x, y] = equirectangular_raw(point);
                min = [min[0].min(x), min[1].min(y)];
                max = [max[0].max(x), max[1].max(y)];
            }
        }
    }
    if !(min[0].is_finite() && min[1].is_finite()) {
        return None;
    }

    let padding = padding as f64;
    let width = viewport.x as f64 - 2.0 * padding;
    let height = viewport.y as f64 - 2.0 * padding;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }

    let bounds_width = max[0] - min[0];
    let bounds_height = max[1] - min[1];
    let scale = match (bounds_width > AREA_EPSILON, bounds_height > AREA_EPSILON) {
        (true, true) => (width / bounds_width).min(height / bounds_height),
        (true, false) => width / bounds_width,
        (false, true) => height / bounds_height,
        (false, false) => return None,
    };

    Some(Projection::Equirectangular {
        scale,
        translate: [
            padding + (width - scale * bounds_width) / 2.0 - scale * min[0],
            padding + (height - scale * bounds_height) / 2.0 - scale * min[1],
        ],
    })
}

/// Shifts longitudes so a ring crossing the antimeridian stays contiguous.
/// A step from one side of the seam straight to the other (a ring running
/// along ±180 to the pole, as Antarctica does) is drawn as is.
fn unwrap_ring(ring: &[LonLat]) -> impl Iterator<Item = LonLat> + '_ {
    let mut offset = 0.0;
    let mut previous: Option<f64> = None;
    ring.iter().map(move |&[lon, lat]| {
        if let Some(previous) = previous
            && !(previous.abs() == 180.0 && lon.abs() == 180.0)
        {
            let delta = lon - previous;
            if delta > 180.0 {
                offset -= 360.0;
            } else if delta < -180.0 {
                offset += 360.0;
            }
        }
        previous = Some(lon);
        [lon + offset, lat]
    })
}

fn open_ring(ring: &[LonLat]) -> &[LonLat] {
    match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 1 && first == last => &ring[..ring.len() - 1],
        _ => ring,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Crossing {
    None,
    Exit,
    Entry,
}

#[derive(Clone, Copy, Debug)]
struct ClippedPoint {
    point: [f64; 3],
    crossing: Crossing,
}

fn clip_hemisphere(points: &[[f64; 3]]) -> Vec<ClippedPoint> {
    let mut out = Vec::with_capacity(points.len() + 4);
    for (index, &current) in points.iter().enumerate() {
        let next = points[(index + 1) % points.len()];
        match (current[0] >= 0.0, next[0] >= 0.0) {
            (true, true) => out.push(ClippedPoint {
                point: next,
                crossing: Crossing::None,
            }),
            (true, false) => out.push(ClippedPoint {
                point: horizon_crossing(current, next),
                crossing: Crossing::Exit,
            }),
            (false, true) => {
                out.push(ClippedPoint {
                    point: horizon_crossing(current, next),
                    crossing: Crossing::Entry,
                });
                out.push(ClippedPoint {
                    point: next,
                    crossing: Crossing::None,
                });
            }
            (false, false) => {}
        }
    }
    out
}

fn horizon_crossing(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    let t = a[0] / (a[0] - b[0]);
    let y = a[1] + (b[1] - a[1]) * t;
    let z = a[2] + (b[2] - a[2]) * t;
    let length = y.hypot(z);
    if length < AREA_EPSILON {
        [0.0, y, z]
    } else {
        [0.0, y / length, z / length]
    }
}

fn wrap_angle(angle: f64) -> f64 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI { wrapped + TAU } else { wrapped }
}

impl PathGenerator {
    pub fn family(&self) -> ProjectionFamily {
        match self.projection {
            Projection::Equirectangular { .. } => ProjectionFamily::Flat,
            Projection::Orthographic { .. } => ProjectionFamily::Globe,
        }
    }

    pub fn project(&self, lonlat: LonLat) -> Option<Pos2> {
        match self.projection {
            Projection::Equirectangular { scale, translate } => {
                Some(flat_screen(scale, translate, lonlat))
            }
            Projection::Orthographic {
                scale,
                center,
                rotation,
            } => {
                let point = rotate(rotation, lonlat);
                (point[0] >= 0.0).then(|| sphere_screen(scale, center, point))
            }
        }
    }

    pub fn path_of(&self, feature: &CountryFeature) -> ProjectedPath {
        let polygons = feature
            .geometry
            .polygons()
            .iter()
            .filter_map(|rings| {
                let mut projected = Vec::with_capacity(rings.len());
                for (ring_index, ring) in rings.iter().enumerate() {
                    let screen = self.project_ring(open_ring(ring));
                    if screen.len() >= 3 {
                        projected.push(screen);
                    } else if ring_index == 0 {
                        return None;
                    }
                }
                Some(projected)
            })
            .collect();
        ProjectedPath { polygons }
    }

    pub fn centroid_of(&self, feature: &CountryFeature) -> Option<Pos2> {
        self.path_of(feature).centroid()
    }

    pub fn outline(&self) -> Option<(Pos2, f32)> {
        match self.projection {
            Projection::Equirectangular { .. } => None,
            Projection::Orthographic { scale, center, .. } => {
                Some((pos2(center[0] as f32, center[1] as f32), scale as f32))
            }
        }
    }

    fn project_ring(&self, ring: &[LonLat]) -> Vec<Pos2> {
        match self.projection {
            Projection::Equirectangular { scale, translate } => unwrap_ring(ring)
                .map(|point| flat_screen(scale, translate, point))
                .collect(),
            Projection::Orthographic {
                scale,
                center,
                rotation,
            } => {
                let rotated = ring
                    .iter()
                    .map(|point| rotate(rotation, *point))
                    .collect::<Vec<_>>();
                if rotated.iter().all(|point| point[0] >= 0.0) {
                    return rotated
                        .into_iter()
                        .map(|point| sphere_screen(scale, center, point))
                        .collect();
                }

                let clipped = clip_hemisphere(&rotated);
                let mut screen = Vec::with_capacity(clipped.len());
                for (index, entry) in clipped.iter().enumerate() {
                    screen.push(sphere_screen(scale, center, entry.point));
                    let next = clipped[(index + 1) % clipped.len()];
                    if entry.crossing == Crossing::Exit && next.crossing == Crossing::Entry {
                        let from = entry.point[2].atan2(entry.point[1]);
                        let delta = wrap_angle(next.point[2].atan2(next.point[1]) - from);
                        let steps = (delta.abs() / HORIZON_STEP).ceil() as usize;
                        for step in 1..steps {
                            let angle = from + delta * step as f64 / steps as f64;
                            screen.push(sphere_screen(
                                scale,
                                center,
                                [0.0, angle.cos(), angle.sin()],
                            ));
                        }
                    }
                }
                screen
            }
        }
    }
}

fn flat_screen(scale: f64, translate: [f64; 2], lonlat: LonLat) -> Pos2 {
    let [x, y] = equirectangular_raw(lonlat);
    pos2(
        (scale * x + translate[0]) as f32,
        (scale * y + translate[1]) as f32,
    )
}

/// Rotates a point by `[Δλ, Δφ]`: a spin about the polar axis followed by a
/// tilt about the screen's horizontal axis. Returns a unit vector whose x
/// axis points at the viewer.
fn rotate(rotation: Rotation, [lon, lat]: LonLat) -> [f64; 3] {
    let lambda = (lon + rotation[0]).to_radians();
    let phi = lat.clamp(-90.0, 90.0).to_radians();
    let (sin_tilt, cos_tilt) = rotation[1].clamp(-90.0, 90.0).to_radians().sin_cos();

    let cos_phi = phi.cos();
    let x = lambda.cos() * cos_phi;
    let y = lambda.sin() * cos_phi;
    let z = phi.sin();
    [x * cos_tilt - z * sin_tilt, y, z * cos_tilt + x * sin_tilt]
}

fn sphere_screen(scale: f64, center: [f64; 2], point: [f64; 3]) -> Pos2 {
    pos2(
        (center[0] + scale * point[1]) as f32,
        (center[1] - scale * point[2]) as f32,
    )
}
