//! Geometry kernel: bezier outline evaluation and symmetric replication.
//!
//! Everything here is a pure function over point data. Outlines are sampled
//! polylines of [`kurbo::Point`] in millimetres.

use std::f64::consts::TAU;

use kurbo::{Affine, CubicBez, ParamCurve, Point, Rect, Vec2};

use crate::error::DesignError;
use crate::models::{BezierControlPoint, Placement, Symmetry, SymmetryAxis};

/// A sampled outline.
pub type Outline = Vec<Point>;

/// Below this magnitude a polygon is treated as degenerate.
const AREA_EPSILON: f64 = 1e-9;

/// Evaluate the composite cubic path through `points` at `samples` uniform
/// parameter steps.
///
/// Segment `i` runs from `points[i]` to `points[i + 1]` using the outbound
/// handle of the first and the inbound handle of the second; a missing
/// handle sits on its point. The first sample is the first point and the
/// last sample is the last point.
pub fn evaluate_outline(points: &[BezierControlPoint], samples: u32) -> Outline {
    if points.is_empty() || samples == 0 {
        return Vec::new();
    }
    if points.len() == 1 {
        return vec![points[0].point(); samples as usize];
    }
    if samples == 1 {
        return vec![points[0].point()];
    }

    let segments: Vec<CubicBez> = points
        .windows(2)
        .map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            CubicBez::new(
                a.point(),
                a.handle_out.unwrap_or_else(|| a.point()),
                b.handle_in.unwrap_or_else(|| b.point()),
                b.point(),
            )
        })
        .collect();

    let segment_count = segments.len();
    let last_step = (samples - 1) as f64;

    (0..samples)
        .map(|step| {
            let s = step as f64 / last_step * segment_count as f64;
            let index = (s.floor() as usize).min(segment_count - 1);
            let t = s - index as f64;
            segments[index].eval(t)
        })
        .collect()
}

/// Replicate an outline according to its symmetry setting.
///
/// Disabled symmetry or a count of one yields the input unchanged. About
/// the `Z` axis copies are rotated evenly around the origin. About `X` or
/// `Y` every odd copy is mirrored across that axis and each plain/mirrored
/// pair is rotated evenly around the origin.
pub fn apply_symmetry(outline: &[Point], symmetry: &Symmetry) -> Result<Vec<Outline>, DesignError> {
    if symmetry.count < 1 {
        return Err(DesignError::InvalidSymmetry(symmetry.count));
    }
    if !symmetry.enabled || symmetry.count == 1 {
        return Ok(vec![outline.to_vec()]);
    }

    let count = symmetry.count;
    let copies = (0..count)
        .map(|k| {
            let affine = match symmetry.axis {
                SymmetryAxis::Z => Affine::rotate(TAU * k as f64 / count as f64),
                SymmetryAxis::X | SymmetryAxis::Y => {
                    let pairs = count.div_ceil(2);
                    let rotation = Affine::rotate(TAU * (k / 2) as f64 / pairs as f64);
                    if k % 2 == 1 {
                        rotation * mirror(symmetry.axis)
                    } else {
                        rotation
                    }
                }
            };
            transform(outline, affine)
        })
        .collect();

    Ok(copies)
}

fn mirror(axis: SymmetryAxis) -> Affine {
    match axis {
        // Reflect across the X axis: y -> -y
        SymmetryAxis::X => Affine::FLIP_Y,
        SymmetryAxis::Y => Affine::FLIP_X,
        SymmetryAxis::Z => Affine::IDENTITY,
    }
}

pub fn transform(outline: &[Point], affine: Affine) -> Outline {
    outline.iter().map(|p| affine * *p).collect()
}

/// Move an outline from part coordinates into body coordinates.
pub fn place(outline: &[Point], placement: &Placement) -> Outline {
    let affine = Affine::translate(Vec2::new(placement.x, placement.y))
        * Affine::rotate(placement.rotation_deg.to_radians());
    transform(outline, affine)
}

/// Signed shoelace area of the closed polygon through `outline`.
fn signed_area(outline: &[Point]) -> f64 {
    if outline.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for (i, p) in outline.iter().enumerate() {
        let q = outline[(i + 1) % outline.len()];
        sum += p.x * q.y - q.x * p.y;
    }
    sum / 2.0
}

/// Enclosed area of the polygon through `outline`, closing it implicitly.
pub fn polygon_area(outline: &[Point]) -> f64 {
    signed_area(outline).abs()
}

/// Area centroid of the polygon, or the vertex average for degenerate ones.
pub fn centroid(outline: &[Point]) -> Option<Point> {
    if outline.is_empty() {
        return None;
    }

    let area = signed_area(outline);
    if area.abs() < AREA_EPSILON {
        let n = outline.len() as f64;
        let (sx, sy) = outline
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Some(Point::new(sx / n, sy / n));
    }

    let (mut cx, mut cy) = (0.0, 0.0);
    for (i, p) in outline.iter().enumerate() {
        let q = outline[(i + 1) % outline.len()];
        let cross = p.x * q.y - q.x * p.y;
        cx += (p.x + q.x) * cross;
        cy += (p.y + q.y) * cross;
    }
    Some(Point::new(cx / (6.0 * area), cy / (6.0 * area)))
}

pub fn bounds(outline: &[Point]) -> Option<Rect> {
    let first = outline.first()?;
    let rect = outline
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p));
    Some(rect)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<BezierControlPoint> {
        vec![
            BezierControlPoint::new(0.0, 0.0),
            BezierControlPoint::new(10.0, 0.0),
            BezierControlPoint::new(10.0, 10.0),
            BezierControlPoint::new(0.0, 10.0),
            BezierControlPoint::new(0.0, 0.0),
        ]
    }

    fn curved() -> Vec<BezierControlPoint> {
        vec![
            BezierControlPoint::new(0.0, 0.0)
                .with_handles(None, Some(Point::new(3.0, 7.5))),
            BezierControlPoint::new(12.0, 4.0)
                .with_handles(Some(Point::new(9.0, 11.0)), Some(Point::new(15.0, -2.0))),
            BezierControlPoint::new(20.0, 0.0),
        ]
    }

    #[test]
    fn evaluation_is_deterministic() {
        let points = curved();
        let first = evaluate_outline(&points, 97);
        let second = evaluate_outline(&points, 97);
        assert_eq!(first.len(), 97);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.x.to_bits(), b.x.to_bits());
            assert_eq!(a.y.to_bits(), b.y.to_bits());
        }
    }

    #[test]
    fn evaluation_does_not_depend_on_call_order() {
        let a = curved();
        let b = square();
        let a_first = evaluate_outline(&a, 33);
        let _ = evaluate_outline(&b, 64);
        let a_again = evaluate_outline(&a, 33);
        assert_eq!(a_first, a_again);
    }

    #[test]
    fn samples_start_and_end_on_the_control_points() {
        let outline = evaluate_outline(&curved(), 10);
        assert_eq!(outline[0], Point::new(0.0, 0.0));
        assert_eq!(outline[9], Point::new(20.0, 0.0));
    }

    #[test]
    fn missing_handles_give_straight_segments() {
        let points = vec![
            BezierControlPoint::new(0.0, 0.0),
            BezierControlPoint::new(10.0, 20.0),
        ];
        for p in evaluate_outline(&points, 11) {
            assert!((p.y - 2.0 * p.x).abs() < 1e-9, "{:?} off the line", p);
        }
    }

    #[test]
    fn edge_sample_counts() {
        assert!(evaluate_outline(&square(), 0).is_empty());
        assert!(evaluate_outline(&[], 10).is_empty());
        assert_eq!(evaluate_outline(&square(), 1), vec![Point::new(0.0, 0.0)]);
        let single = [BezierControlPoint::new(3.0, 4.0)];
        assert_eq!(evaluate_outline(&single, 3), vec![Point::new(3.0, 4.0); 3]);
    }

    #[test]
    fn disabled_symmetry_returns_input() {
        let outline = evaluate_outline(&square(), 16);
        let sym = Symmetry {
            enabled: false,
            count: 4,
            axis: SymmetryAxis::Z,
        };
        let copies = apply_symmetry(&outline, &sym).unwrap();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0], outline);
    }

    #[test]
    fn radial_symmetry_makes_count_copies() {
        let outline = vec![Point::new(10.0, 0.0)];
        let copies = apply_symmetry(&outline, &Symmetry::radial(4)).unwrap();
        assert_eq!(copies.len(), 4);
        let quarter = copies[1][0];
        assert!(quarter.x.abs() < 1e-9);
        assert!((quarter.y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn mirror_symmetry_alternates_reflections() {
        let outline = vec![Point::new(3.0, 5.0)];
        let sym = Symmetry {
            enabled: true,
            count: 2,
            axis: SymmetryAxis::Y,
        };
        let copies = apply_symmetry(&outline, &sym).unwrap();
        assert_eq!(copies[0][0], Point::new(3.0, 5.0));
        assert_eq!(copies[1][0], Point::new(-3.0, 5.0));
    }

    #[test]
    fn zero_count_is_rejected() {
        let sym = Symmetry {
            enabled: true,
            count: 0,
            axis: SymmetryAxis::Z,
        };
        assert!(matches!(
            apply_symmetry(&[Point::ORIGIN], &sym),
            Err(DesignError::InvalidSymmetry(0))
        ));
    }

    #[test]
    fn area_and_centroid_of_square() {
        let outline = evaluate_outline(&square(), 5);
        assert!((polygon_area(&outline) - 100.0).abs() < 1e-9);
        let c = centroid(&outline).unwrap();
        assert!((c.x - 5.0).abs() < 1e-9);
        assert!((c.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn placement_translates_and_rotates() {
        let placed = place(
            &[Point::new(1.0, 0.0)],
            &Placement {
                x: 100.0,
                y: 0.0,
                rotation_deg: 90.0,
            },
        );
        assert!((placed[0].x - 100.0).abs() < 1e-9);
        assert!((placed[0].y - 1.0).abs() < 1e-9);
    }
}
