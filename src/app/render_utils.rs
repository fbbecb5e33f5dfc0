use eframe::egui::{Color32, Pos2, Rect, Stroke};

const DEGENERATE_AREA: f32 = 1e-6;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)).round() as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)).round() as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)).round() as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)).round() as u8,
    )
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (opacity.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

pub(super) fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

pub(super) fn progress(start: f64, now: f64, duration: f64) -> f32 {
    if duration <= 0.0 {
        return 1.0;
    }
    ((now - start) / duration).clamp(0.0, 1.0) as f32
}

pub(super) fn polyline_visible(rect: Rect, points: &[Pos2], stroke: Stroke) -> bool {
    let padding = stroke.width;
    points
        .iter()
        .fold(Rect::NOTHING, |bounds, point| bounds.union(Rect::from_min_max(*point, *point)))
        .expand(padding)
        .intersects(rect)
}

pub(super) fn truncate_polyline(points: &[Pos2], length: f32, fraction: f32) -> Vec<Pos2> {
    if fraction >= 1.0 || points.len() < 2 {
        return points.to_vec();
    }

    let mut remaining = length * fraction.max(0.0);
    let mut out = vec![points[0]];
    for pair in points.windows(2) {
        let segment = pair[1] - pair[0];
        let segment_length = segment.length();
        if segment_length >= remaining {
            if segment_length > 0.0 {
                out.push(pair[0] + segment * (remaining / segment_length));
            }
            break;
        }
        remaining -= segment_length;
        out.push(pair[1]);
    }
    out
}

fn signed_area(ring: &[Pos2]) -> f32 {
    ring.iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f32>()
        / 2.0
}

fn cross(o: Pos2, a: Pos2, b: Pos2) -> f32 {
    let oa = a - o;
    let ob = b - o;
    (oa.x * ob.y) - (oa.y * ob.x)
}

fn segments_cross(a1: Pos2, a2: Pos2, b1: Pos2, b2: Pos2) -> bool {
    let c1 = cross(a1, a2, b1);
    let c2 = cross(a1, a2, b2);
    let c3 = cross(b1, b2, a1);
    let c4 = cross(b1, b2, a2);
    (c1 * c2 < 0.0) && (c3 * c4 < 0.0)
}

fn cleaned_ring(ring: &[Pos2]) -> Vec<Pos2> {
    let mut out: Vec<Pos2> = Vec::with_capacity(ring.len());
    for &point in ring {
        if out.last().is_none_or(|last| *last != point) {
            out.push(point);
        }
    }
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }
    out
}

/// Splices `hole` into `outer` through the closest outer vertex that can see
/// the hole's rightmost vertex, producing one weakly simple ring.
fn bridge_hole(outer: &[Pos2], hole: &[Pos2]) -> Vec<Pos2> {
    let Some((hole_start, anchor)) = hole
        .iter()
        .copied()
        .enumerate()
        .max_by(|a, b| a.1.x.total_cmp(&b.1.x))
    else {
        return outer.to_vec();
    };

    let edges = outer
        .iter()
        .zip(outer.iter().cycle().skip(1))
        .chain(hole.iter().zip(hole.iter().cycle().skip(1)));
    let blocked = |candidate: Pos2| {
        edges
            .clone()
            .any(|(a, b)| segments_cross(anchor, candidate, *a, *b))
    };

    let mut candidates = outer
        .iter()
        .copied()
        .enumerate()
        .map(|(index, point)| (index, (point - anchor).length_sq()))
        .collect::<Vec<_>>();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
    let outer_index = candidates
        .iter()
        .find(|(index, _)| !blocked(outer[*index]))
        .or(candidates.first())
        .map_or(0, |(index, _)| *index);

    let mut merged = Vec::with_capacity(outer.len() + hole.len() + 2);
    merged.extend_from_slice(&outer[..=outer_index]);
    merged.extend(hole[hole_start..].iter().chain(&hole[..=hole_start]).copied());
    merged.extend_from_slice(&outer[outer_index..]);
    merged
}

fn point_in_triangle(point: Pos2, a: Pos2, b: Pos2, c: Pos2) -> bool {
    cross(a, b, point) >= 0.0 && cross(b, c, point) >= 0.0 && cross(c, a, point) >= 0.0
}

pub(super) fn triangulate(rings: &[Vec<Pos2>]) -> (Vec<Pos2>, Vec<u32>) {
    let Some(exterior) = rings.first() else {
        return (Vec::new(), Vec::new());
    };

    let mut outer = cleaned_ring(exterior);
    if outer.len() < 3 || signed_area(&outer).abs() < DEGENERATE_AREA {
        return (Vec::new(), Vec::new());
    }
    if signed_area(&outer) < 0.0 {
        outer.reverse();
    }

    let mut holes = rings[1..]
        .iter()
        .map(|ring| cleaned_ring(ring))
        .filter(|ring| ring.len() >= 3 && signed_area(ring).abs() >= DEGENERATE_AREA)
        .map(|mut ring| {
            if signed_area(&ring) > 0.0 {
                ring.reverse();
            }
            ring
        })
        .collect::<Vec<_>>();
    holes.sort_by(|a, b| {
        let right = |ring: &[Pos2]| ring.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        right(b).total_cmp(&right(a))
    });
    for hole in &holes {
        outer = bridge_hole(&outer, hole);
    }

    let indices = clip_ears(&outer);
    (outer, indices)
}

fn clip_ears(vertices: &[Pos2]) -> Vec<u32> {
    let mut remaining = (0..vertices.len()).collect::<Vec<_>>();
    let mut triangles = Vec::with_capacity(vertices.len().saturating_sub(2) * 3);

    let mut cursor = 0;
    let mut misses = 0;
    while remaining.len() > 3 {
        let count = remaining.len();
        let (prev, current, next) = (
            remaining[(cursor + count - 1) % count],
            remaining[cursor % count],
            remaining[(cursor + 1) % count],
        );
        let (a, b, c) = (vertices[prev], vertices[current], vertices[next]);

        let convex = cross(a, b, c) > 0.0;
        let is_ear = convex
            && !remaining.iter().any(|&other| {
                let point = vertices[other];
                other != prev
                    && other != current
                    && other != next
                    && point != a
                    && point != b
                    && point != c
                    && point_in_triangle(point, a, b, c)
            });

        // Self-intersecting input can leave no valid ear.
        if is_ear || misses >= count {
            if cross(a, b, c).abs() > DEGENERATE_AREA {
                triangles.extend([prev as u32, current as u32, next as u32]);
            }
            remaining.remove(cursor % count);
            misses = 0;
            cursor %= remaining.len();
        } else {
            misses += 1;
            cursor = (cursor + 1) % count;
        }
    }

    if let [a, b, c] = remaining[..]
        && cross(vertices[a], vertices[b], vertices[c]).abs() > DEGENERATE_AREA
    {
        triangles.extend([a as u32, b as u32, c as u32]);
    }
    triangles
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    fn triangle_area(vertices: &[Pos2], indices: &[u32]) -> f32 {
        indices
            .chunks(3)
            .map(|tri| {
                cross(
                    vertices[tri[0] as usize],
                    vertices[tri[1] as usize],
                    vertices[tri[2] as usize],
                )
                .abs()
                    / 2.0
            })
            .sum()
    }

    fn square(min: f32, max: f32) -> Vec<Pos2> {
        vec![pos2(min, min), pos2(max, min), pos2(max, max), pos2(min, max)]
    }

    #[test]
    fn convex_and_concave_rings_keep_their_area() {
        let (vertices, indices) = triangulate(&[square(0.0, 10.0)]);
        assert_eq!(indices.len(), 6);
        assert!((triangle_area(&vertices, &indices) - 100.0).abs() < 1e-3);

        let l_shape = vec![
            pos2(0.0, 0.0),
            pos2(10.0, 0.0),
            pos2(10.0, 4.0),
            pos2(4.0, 4.0),
            pos2(4.0, 10.0),
            pos2(0.0, 10.0),
            pos2(0.0, 0.0),
        ];
        let (vertices, indices) = triangulate(&[l_shape]);
        assert_eq!(indices.len(), 12);
        assert!((triangle_area(&vertices, &indices) - 64.0).abs() < 1e-3);
    }

    #[test]
    fn holes_are_left_unfilled() {
        let (vertices, indices) = triangulate(&[square(0.0, 10.0), square(3.0, 6.0)]);
        assert!((triangle_area(&vertices, &indices) - 91.0).abs() < 1e-3);
    }

    #[test]
    fn degenerate_rings_produce_nothing() {
        let (_, indices) = triangulate(&[vec![pos2(0.0, 0.0), pos2(1.0, 1.0), pos2(2.0, 2.0)]]);
        assert!(indices.is_empty());
        assert!(triangulate(&[]).1.is_empty());
    }

    #[test]
    fn truncation_follows_arc_length() {
        let points = [pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 10.0)];
        let half = truncate_polyline(&points, 20.0, 0.75);
        assert_eq!(half, vec![pos2(0.0, 0.0), pos2(10.0, 0.0), pos2(10.0, 5.0)]);
        assert_eq!(truncate_polyline(&points, 20.0, 1.0).len(), 3);
    }

    #[test]
    fn easing_is_symmetric_and_bounded() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-6);
        assert!((ease_in_out_cubic(0.25) + ease_in_out_cubic(0.75) - 1.0).abs() < 1e-6);
    }
}
