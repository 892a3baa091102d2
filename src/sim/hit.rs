//! Pointer hit testing against a layout's grid
//!
//! Hit regions are smaller than their cell (fraction < 0.5), so only the
//! cell containing the pointer can ever match.

use glam::Vec2;

use super::layout::GridGeometry;

/// Shape of a slot's hit region, relative to the cell pitch
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitShape {
    Circle { radius_fraction: f32 },
    Rect { half_extent_fraction: f32 },
}

/// Signed distance to a circle
#[inline]
pub fn sd_circle(p: Vec2, center: Vec2, radius: f32) -> f32 {
    (p - center).length() - radius
}

/// Signed distance to an axis-aligned square
#[inline]
pub fn sd_square(p: Vec2, center: Vec2, half_extent: f32) -> f32 {
    let d = (p - center).abs() - Vec2::splat(half_extent);
    d.max(Vec2::ZERO).length() + d.max_element().min(0.0)
}

/// Index of the slot whose hit region contains `point`, if any
pub fn hit_test(geometry: &GridGeometry, shape: HitShape, point: Vec2) -> Option<usize> {
    hit_test_slots(geometry, point, |_| shape)
}

/// Like [`hit_test`], with a hit region per slot
pub fn hit_test_slots(
    geometry: &GridGeometry,
    point: Vec2,
    shape_of: impl Fn(usize) -> HitShape,
) -> Option<usize> {
    if geometry.count == 0 || geometry.pitch <= 0.0 || !point.is_finite() {
        return None;
    }

    let local = (point - geometry.origin) / geometry.pitch;
    if local.x < 0.0 || local.y < 0.0 {
        return None;
    }
    let col = local.x.floor() as usize;
    let row = local.y.floor() as usize;
    if col >= geometry.columns {
        return None;
    }
    let index = row * geometry.columns + col;
    if index >= geometry.count {
        return None;
    }

    let center = geometry.cell_center(index);
    let distance = match shape_of(index) {
        HitShape::Circle { radius_fraction } => {
            sd_circle(point, center, geometry.pitch * radius_fraction)
        }
        HitShape::Rect {
            half_extent_fraction,
        } => sd_square(point, center, geometry.pitch * half_extent_fraction),
    };
    (distance <= 0.0).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::BOARD_SIZE;

    const CIRCLE: HitShape = HitShape::Circle {
        radius_fraction: 0.35,
    };

    #[test]
    fn test_center_hits_each_cell() {
        let g = GridGeometry::square(16);
        for i in 0..16 {
            assert_eq!(hit_test(&g, CIRCLE, g.cell_center(i)), Some(i));
        }
    }

    #[test]
    fn test_gap_between_circles_misses() {
        let g = GridGeometry::square(16);
        // Cell corner is outside every circle
        assert_eq!(hit_test(&g, CIRCLE, Vec2::new(g.pitch, g.pitch)), None);
        // Just inside / just outside the radius
        let c = g.cell_center(5);
        let r = g.pitch * 0.35;
        assert_eq!(hit_test(&g, CIRCLE, c + Vec2::new(r - 0.5, 0.0)), Some(5));
        assert_eq!(hit_test(&g, CIRCLE, c + Vec2::new(r + 0.5, 0.0)), None);
    }

    #[test]
    fn test_outside_board_and_partial_rows() {
        let g = GridGeometry::square(12); // 4 columns, 3 rows
        assert_eq!(hit_test(&g, CIRCLE, Vec2::new(-1.0, 10.0)), None);
        assert_eq!(hit_test(&g, CIRCLE, Vec2::new(BOARD_SIZE + 5.0, 10.0)), None);
        // Fourth row would be slots 12..16, which do not exist
        let ghost = g.origin + Vec2::new(0.5, 3.5) * g.pitch;
        assert_eq!(hit_test(&g, CIRCLE, ghost), None);
        assert_eq!(hit_test(&g, CIRCLE, Vec2::NAN), None);
    }

    #[test]
    fn test_rect_buttons() {
        let g = GridGeometry::button_row(4);
        let shape = HitShape::Rect {
            half_extent_fraction: 0.46,
        };
        for i in 0..4 {
            let c = g.cell_center(i);
            assert_eq!(hit_test(&g, shape, c), Some(i));
            // Corner of the rect region still hits; a circle would not
            let corner = c + Vec2::splat(g.pitch * 0.45);
            assert_eq!(hit_test(&g, shape, corner), Some(i));
        }
        // Above the button row
        assert_eq!(hit_test(&g, shape, Vec2::new(10.0, 10.0)), None);
    }

    #[test]
    fn test_sd_square_sign() {
        assert!(sd_square(Vec2::ZERO, Vec2::ZERO, 1.0) < 0.0);
        assert!(sd_square(Vec2::new(2.0, 0.0), Vec2::ZERO, 1.0) > 0.0);
    }
}
