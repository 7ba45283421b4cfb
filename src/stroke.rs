//! Polyline approximation of arcs and curve elements.
//!
//! Both functions work on decoded values in master units. 3D arcs are
//! stroked in their own plane, ignoring the quaternion.

use crate::elements::{ArcElement, MultiPoint};
use crate::error::{DgnError, Result};
use crate::types::Vector3;

/// Length substituted for zero length curve segments.
const MIN_SEGMENT: f64 = 0.0001;

/// Sample `n` points along an arc or ellipse, from the start angle through
/// the sweep.
pub fn stroke_arc(arc: &ArcElement, n: usize) -> Result<Vec<Vector3>> {
    if n < 2 {
        return Err(DgnError::InvalidArgument(format!(
            "need at least 2 points to stroke an arc, got {}",
            n
        )));
    }
    if arc.primary_axis == 0.0 || arc.secondary_axis == 0.0 {
        return Err(DgnError::InvalidArgument(
            "cannot stroke an arc with a zero length axis".into(),
        ));
    }

    let step = arc.sweep_angle / (n - 1) as f64;
    let (rot_sin, rot_cos) = arc.rotation.to_radians().sin_cos();

    let points = (0..n)
        .map(|i| {
            let angle = (arc.start_angle + step * i as f64).to_radians();
            let x = arc.primary_axis * angle.cos();
            let y = arc.secondary_axis * angle.sin();
            Vector3::new(
                arc.origin.x + x * rot_cos - y * rot_sin,
                arc.origin.y + x * rot_sin + y * rot_cos,
                arc.origin.z,
            )
        })
        .collect();
    Ok(points)
}

/// Resample a curve element into `n` points.
///
/// The first and last two vertices of a curve only shape the end tangents;
/// the curve runs from vertex 2 to vertex `count - 3`, fitting one cubic per
/// segment. Every interior vertex appears in the output.
pub fn stroke_curve(curve: &MultiPoint, n: usize) -> Result<Vec<Vector3>> {
    let v = &curve.vertices;
    let count = v.len();
    if count < 6 {
        return Err(DgnError::InvalidArgument(format!(
            "a curve needs at least 6 vertices, got {}",
            count
        )));
    }
    if n < count - 4 {
        return Err(DgnError::InvalidArgument(format!(
            "{} points cannot hold the {} interior vertices of the curve",
            n,
            count - 4
        )));
    }

    // Chord length and unit direction of each segment.
    let mut d = vec![0.0; count];
    let mut mx = vec![0.0; count];
    let mut my = vec![0.0; count];
    for k in 0..count - 1 {
        let dx = v[k + 1].x - v[k].x;
        let dy = v[k + 1].y - v[k].y;
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            d[k] = MIN_SEGMENT;
        } else {
            d[k] = len;
            mx[k] = dx / len;
            my[k] = dy / len;
        }
    }
    let total: f64 = (2..count - 3).map(|k| d[k]).sum();

    // Tangents at the interior vertices, weighted per axis by how sharply
    // the direction changes on either side.
    let mut tx = vec![0.0; count];
    let mut ty = vec![0.0; count];
    for k in 2..count - 2 {
        tx[k] = tangent(&mx, k);
        ty[k] = tangent(&my, k);
    }

    let breaks = (n - (count - 4)).saturating_sub(1).max(1);
    let step = total / breaks as f64;

    let mut out = Vec::with_capacity(n);
    let mut dist = step;
    for k in 2..count - 3 {
        let seg = d[k];
        let dx = v[k + 1].x - v[k].x;
        let dy = v[k + 1].y - v[k].y;

        let cx = tx[k];
        let bx = (3.0 * dx / seg - 2.0 * tx[k] - tx[k + 1]) / seg;
        let ax = (tx[k] + tx[k + 1] - 2.0 * dx / seg) / (seg * seg);
        let cy = ty[k];
        let by = (3.0 * dy / seg - 2.0 * ty[k] - ty[k + 1]) / seg;
        let ay = (ty[k] + ty[k + 1] - 2.0 * dy / seg) / (seg * seg);

        out.push(Vector3::new(v[k].x, v[k].y, 0.0));

        while dist < seg && out.len() + (count - k - 1) < n {
            out.push(Vector3::new(
                ax * dist * dist * dist + bx * dist * dist + cx * dist + v[k].x,
                ay * dist * dist * dist + by * dist * dist + cy * dist + v[k].y,
                0.0,
            ));
            dist += step;
        }
        dist -= seg;
    }

    let last = &v[count - 3];
    while out.len() < n {
        out.push(Vector3::new(last.x, last.y, 0.0));
    }
    Ok(out)
}

fn tangent(m: &[f64], k: usize) -> f64 {
    let after = (m[k + 1] - m[k]).abs();
    let before = (m[k - 1] - m[k - 2]).abs();
    if after == 0.0 && before == 0.0 {
        (m[k] + m[k - 1]) / 2.0
    } else {
        (m[k - 1] * after + m[k] * before) / (after + before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(r: f64) -> ArcElement {
        ArcElement {
            origin: Vector3::new(10.0, 20.0, 3.0),
            primary_axis: r,
            secondary_axis: r,
            sweep_angle: 360.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_stroke_arc_quarter() {
        let arc = ArcElement {
            sweep_angle: 90.0,
            ..circle(5.0)
        };
        let pts = stroke_arc(&arc, 3).unwrap();
        assert_eq!(pts.len(), 3);
        assert!((pts[0].x - 15.0).abs() < 1e-9);
        assert!((pts[0].y - 20.0).abs() < 1e-9);
        assert!((pts[2].x - 10.0).abs() < 1e-9);
        assert!((pts[2].y - 25.0).abs() < 1e-9);
        assert!(pts.iter().all(|p| p.z == 3.0));
    }

    #[test]
    fn test_stroke_arc_rotation() {
        let arc = ArcElement {
            secondary_axis: 1.0,
            rotation: 90.0,
            sweep_angle: 180.0,
            ..circle(4.0)
        };
        let pts = stroke_arc(&arc, 2).unwrap();
        // primary axis now points along +y
        assert!((pts[0].x - 10.0).abs() < 1e-9);
        assert!((pts[0].y - 24.0).abs() < 1e-9);
        assert!((pts[1].y - 16.0).abs() < 1e-9);
    }

    #[test]
    fn test_stroke_arc_rejects() {
        assert!(stroke_arc(&circle(1.0), 1).is_err());
        let flat = ArcElement {
            secondary_axis: 0.0,
            ..circle(1.0)
        };
        assert!(stroke_arc(&flat, 10).is_err());
    }

    fn straight_curve() -> MultiPoint {
        MultiPoint::new((0..8).map(|i| Vector3::new(i as f64, 0.0, 0.0)).collect())
    }

    #[test]
    fn test_stroke_curve_straight() {
        let pts = stroke_curve(&straight_curve(), 9).unwrap();
        assert_eq!(pts.len(), 9);
        assert_eq!(pts[0].x, 2.0);
        assert_eq!(pts[8].x, 5.0);
        for w in pts.windows(2) {
            assert!(w[1].x >= w[0].x - 1e-9);
            assert!(w[1].y.abs() < 1e-9);
        }
    }

    #[test]
    fn test_stroke_curve_keeps_vertices() {
        let mp = MultiPoint::new(vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(3.0, 2.0, 0.0),
            Vector3::new(4.0, 0.0, 0.0),
            Vector3::new(5.0, 1.0, 0.0),
            Vector3::new(6.0, 0.0, 0.0),
        ]);
        let pts = stroke_curve(&mp, 12).unwrap();
        assert_eq!(pts.len(), 12);
        for k in 2..=4 {
            assert!(pts.iter().any(|p| p.x == mp.vertices[k].x && p.y == mp.vertices[k].y));
        }
    }

    #[test]
    fn test_stroke_curve_rejects() {
        let short = MultiPoint::new(vec![Vector3::ZERO; 5]);
        assert!(stroke_curve(&short, 10).is_err());
        assert!(stroke_curve(&straight_curve(), 3).is_err());
    }
}
