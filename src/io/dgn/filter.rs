//! Raw record extents and the spatial / complex-group filter.

use super::cursor::ByteCursor;
use crate::types::{CoordinateTransform, ElementType, UorExtents, Vector3, UOR_LIMIT};

/// Offset that maps signed UOR coordinates onto the unsigned range block.
const RANGE_BIAS: f64 = 2_147_483_648.0;

/// Range block (bytes 4..28) of a record, for types that carry one.
pub fn raw_extents(element_type: u8, record: &[u8]) -> Option<UorExtents> {
    if !ElementType::from_code(element_type).is_some_and(|t| t.has_range()) {
        return None;
    }
    let c = ByteCursor::new(record);
    let mut min = [0u32; 3];
    let mut max = [0u32; 3];
    for axis in 0..3 {
        min[axis] = c.uint32_at(4 + axis * 4).ok()?;
        max[axis] = c.uint32_at(16 + axis * 4).ok()?;
    }
    Some(UorExtents::new(min, max))
}

/// Rectangle in master units, converted to biased UOR on first use.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FilterRect {
    min: Vector3,
    max: Vector3,
}

/// Inclusion decision for a scan, carrying the state of the last complex
/// group seen.
#[derive(Debug, Clone, Default)]
pub struct SpatialFilter {
    rect: Option<FilterRect>,
    uor: Option<([u32; 2], [u32; 2])>,
    in_complex_group: bool,
    select_complex_group: bool,
}

impl SpatialFilter {
    /// Set the filter rectangle. An all-zero rectangle disables filtering.
    pub fn set(&mut self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) {
        if min_x == 0.0 && min_y == 0.0 && max_x == 0.0 && max_y == 0.0 {
            self.rect = None;
        } else {
            self.rect = Some(FilterRect {
                min: Vector3::xy(min_x, min_y),
                max: Vector3::xy(max_x, max_y),
            });
        }
        self.uor = None;
    }

    pub fn is_active(&self) -> bool {
        self.rect.is_some()
    }

    /// Forget the UOR form, e.g. after the units changed.
    pub fn invalidate_uor(&mut self) {
        self.uor = None;
    }

    /// Leave any complex group, as after a seek.
    pub fn reset_group(&mut self) {
        self.in_complex_group = false;
        self.select_complex_group = false;
    }

    fn uor_rect(&mut self, transform: &CoordinateTransform) -> Option<([u32; 2], [u32; 2])> {
        let rect = self.rect?;
        if self.uor.is_none() {
            let to_biased = |v: f64| (v.clamp(-UOR_LIMIT, UOR_LIMIT) + RANGE_BIAS) as u32;
            let lo = transform.to_uor(rect.min);
            let hi = transform.to_uor(rect.max);
            self.uor = Some((
                [to_biased(lo.x), to_biased(lo.y)],
                [to_biased(hi.x), to_biased(hi.y)],
            ));
        }
        self.uor
    }

    /// Decide whether the record just read is delivered to the caller.
    ///
    /// Complex chain and shape headers are judged on their own range and
    /// their decision carries to the following complex members.
    pub fn accept(&mut self, record: &[u8], transform: &CoordinateTransform) -> bool {
        let Some((min, max)) = self.uor_rect(transform) else {
            return true;
        };
        if record.len() < 2 {
            return true;
        }

        let element_type = record[1] & 0x7f;
        let mut inside = match raw_extents(element_type, record) {
            None => true,
            Some(ext) => !(ext.min[0] > max[0]
                || ext.min[1] > max[1]
                || ext.max[0] < min[0]
                || ext.max[1] < min[1]),
        };

        if element_type == ElementType::ComplexChainHeader.code()
            || element_type == ElementType::ComplexShapeHeader.code()
        {
            self.in_complex_group = true;
            self.select_complex_group = inside;
        } else if record[0] & 0x80 != 0 {
            if self.in_complex_group {
                inside = self.select_complex_group;
            }
        } else {
            self.in_complex_group = false;
        }
        inside
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::dgn::cursor::ByteCursorMut;

    /// 2D line record with the given biased range.
    fn ranged(element_type: u8, complex: bool, min: [u32; 2], max: [u32; 2]) -> Vec<u8> {
        let mut raw = vec![0u8; 52];
        raw[0] = if complex { 0x81 } else { 0x01 };
        raw[1] = element_type;
        raw[2] = 24;
        let mut w = ByteCursorMut::new(&mut raw);
        for axis in 0..2 {
            w.put_int32(4 + axis * 4, min[axis] as i32).unwrap();
            w.put_int32(16 + axis * 4, max[axis] as i32).unwrap();
        }
        raw
    }

    const B: u32 = 0x8000_0000;

    #[test]
    fn test_raw_extents() {
        let raw = ranged(3, false, [B + 10, B + 20], [B + 30, B + 40]);
        let ext = raw_extents(3, &raw).unwrap();
        assert_eq!(ext.min[0], B + 10);
        assert_eq!(ext.max[1], B + 40);
        assert_eq!(ext.unbiased().0[0], 10.0);

        assert!(raw_extents(9, &raw).is_none());
        assert!(raw_extents(5, &raw).is_none());
        assert!(raw_extents(3, &raw[..10]).is_none());
    }

    #[test]
    fn test_no_filter_accepts_everything() {
        let mut f = SpatialFilter::default();
        let raw = ranged(3, false, [B + 10, B + 10], [B + 20, B + 20]);
        assert!(f.accept(&raw, &CoordinateTransform::default()));

        f.set(0.0, 0.0, 0.0, 0.0);
        assert!(!f.is_active());
    }

    #[test]
    fn test_outside_rejected() {
        let t = CoordinateTransform::default();
        let mut f = SpatialFilter::default();
        f.set(0.0, 0.0, 100.0, 100.0);
        let inside = ranged(3, false, [B + 10, B + 10], [B + 20, B + 20]);
        let outside = ranged(3, false, [B + 200, B + 200], [B + 300, B + 300]);
        assert!(f.accept(&inside, &t));
        assert!(!f.accept(&outside, &t));

        let mut tcb = vec![0u8; 40];
        tcb[1] = 9;
        assert!(f.accept(&tcb, &t));
    }

    #[test]
    fn test_complex_members_follow_header() {
        let t = CoordinateTransform::default();
        let mut f = SpatialFilter::default();
        f.set(0.0, 0.0, 100.0, 100.0);

        let header = ranged(12, false, [B + 500, B + 500], [B + 600, B + 600]);
        let member_inside = ranged(4, true, [B + 10, B + 10], [B + 20, B + 20]);
        assert!(!f.accept(&header, &t));
        assert!(!f.accept(&member_inside, &t));

        // A plain record ends the group.
        let plain = ranged(3, false, [B + 10, B + 10], [B + 20, B + 20]);
        assert!(f.accept(&plain, &t));
        assert!(f.accept(&member_inside, &t));
    }

    #[test]
    fn test_uor_conversion_uses_transform() {
        let t = CoordinateTransform::new(0.01, Vector3::ZERO);
        let mut f = SpatialFilter::default();
        f.set(0.0, 0.0, 1.0, 1.0);
        // 150 UOR = 1.5 master units
        let raw = ranged(3, false, [B + 150, B + 150], [B + 160, B + 160]);
        assert!(!f.accept(&raw, &t));
        f.invalidate_uor();
        assert!(!f.accept(&raw, &CoordinateTransform::new(0.01, Vector3::ZERO)));
        f.invalidate_uor();
        assert!(f.accept(&raw, &CoordinateTransform::new(0.001, Vector3::ZERO)));
    }
}
