//! Geometry and element comparison utilities for tests.
//!
//! Provides tolerance-based f64/Vector3 assertions and a field-by-field
//! diff of decoded elements.

#![allow(dead_code)]

use dgnrust::{Element, ElementKind, Vector3};

/// Default tolerance for floating-point comparisons.
pub const TOL: f64 = 1e-6;

// ===========================================================================
// Scalar & point assertions
// ===========================================================================

/// Check approximate equality of two f64 values within `tol`.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() < tol
}

/// Assert two f64 values are approximately equal.
pub fn assert_f64_eq(a: f64, b: f64, tol: f64) {
    assert!(
        approx_eq(a, b, tol),
        "f64 mismatch: {a} vs {b} (delta={}, tol={tol})",
        (a - b).abs()
    );
}

/// Assert two Vector3 values are approximately equal component-wise.
pub fn assert_vec3_eq(a: &Vector3, b: &Vector3, tol: f64) {
    assert!(
        approx_eq(a.x, b.x, tol) && approx_eq(a.y, b.y, tol) && approx_eq(a.z, b.z, tol),
        "Vector3 mismatch: ({},{},{}) vs ({},{},{}) tol={tol}",
        a.x, a.y, a.z, b.x, b.y, b.z
    );
}

// ===========================================================================
// Diff-based comparison helpers
// ===========================================================================

/// Append a diff message if two f64 values differ beyond tolerance.
pub fn check_f64(diffs: &mut Vec<String>, name: &str, a: f64, b: f64) {
    if !approx_eq(a, b, TOL) {
        diffs.push(format!("{name}: {a} vs {b}"));
    }
}

/// Append a diff message if two Vector3 values differ beyond tolerance.
pub fn check_vec3(diffs: &mut Vec<String>, name: &str, a: &Vector3, b: &Vector3) {
    if !approx_eq(a.x, b.x, TOL) || !approx_eq(a.y, b.y, TOL) || !approx_eq(a.z, b.z, TOL) {
        diffs.push(format!(
            "{name}: ({},{},{}) vs ({},{},{})",
            a.x, a.y, a.z, b.x, b.y, b.z
        ));
    }
}

/// Compare the display fields and geometry of two elements.
///
/// Ids, offsets and raw images are ignored, so an element can be compared
/// with its copy in another file.
pub fn compare_elements(a: &Element, b: &Element) -> Vec<String> {
    let mut diffs = Vec::new();
    let (ca, cb) = (&a.core, &b.core);
    if ca.element_type != cb.element_type {
        diffs.push(format!("type: {} vs {}", ca.element_type, cb.element_type));
    }
    if ca.level != cb.level {
        diffs.push(format!("level: {} vs {}", ca.level, cb.level));
    }
    if (ca.color, ca.weight, ca.style) != (cb.color, cb.weight, cb.style) {
        diffs.push(format!(
            "symbology: {}/{}/{} vs {}/{}/{}",
            ca.color, ca.weight, ca.style, cb.color, cb.weight, cb.style
        ));
    }

    match (&a.kind, &b.kind) {
        (ElementKind::MultiPoint(pa), ElementKind::MultiPoint(pb)) => {
            if pa.vertices.len() != pb.vertices.len() {
                diffs.push(format!(
                    "vertex count: {} vs {}",
                    pa.vertices.len(),
                    pb.vertices.len()
                ));
            }
            for (i, (va, vb)) in pa.vertices.iter().zip(&pb.vertices).enumerate() {
                check_vec3(&mut diffs, &format!("vertex[{i}]"), va, vb);
            }
        }
        (ElementKind::Arc(aa), ElementKind::Arc(ab)) => {
            check_vec3(&mut diffs, "origin", &aa.origin, &ab.origin);
            check_f64(&mut diffs, "primary_axis", aa.primary_axis, ab.primary_axis);
            check_f64(&mut diffs, "secondary_axis", aa.secondary_axis, ab.secondary_axis);
            check_f64(&mut diffs, "start_angle", aa.start_angle, ab.start_angle);
            check_f64(&mut diffs, "sweep_angle", aa.sweep_angle, ab.sweep_angle);
        }
        (ElementKind::Text(ta), ElementKind::Text(tb)) => {
            check_vec3(&mut diffs, "origin", &ta.origin, &tb.origin);
            if ta.text != tb.text {
                diffs.push(format!("text: {:?} vs {:?}", ta.text, tb.text));
            }
        }
        (ka, kb) if std::mem::discriminant(ka) != std::mem::discriminant(kb) => {
            diffs.push(format!("kind: {:?} vs {:?}", a.structure_type(), b.structure_type()));
        }
        _ => {}
    }
    diffs
}
