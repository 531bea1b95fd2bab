use serde::{Serialize, Deserialize};

// Basic 2D Vector type shared by the engine and its consumers
#[derive(Copy, Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    #[inline(always)]
    pub fn new(x: f32, y: f32) -> Self { Self { x, y } }
    #[inline(always)]
    pub fn zero() -> Self { Self::new(0.0, 0.0) }
    #[inline(always)]
    pub fn length_squared(self) -> f32 { self.x * self.x + self.y * self.y }
    #[inline(always)]
    pub fn length(self) -> f32 { self.length_squared().sqrt() }
    #[inline(always)]
    pub fn add(self, other: Self) -> Self { Self::new(self.x + other.x, self.y + other.y) }
    #[inline(always)]
    pub fn sub(self, other: Self) -> Self { Self::new(self.x - other.x, self.y - other.y) }
    #[inline(always)]
    pub fn scale(self, scalar: f32) -> Self { Self::new(self.x * scalar, self.y * scalar) }

    /// Rescales the vector down to `max_len` if it is longer, otherwise returns it unchanged.
    pub fn clamp_length(self, max_len: f32) -> Vec2 {
        let len = self.length();
        if len > max_len {
            self.scale(max_len / len)
        } else {
            self
        }
    }
}

/// Shortest-path component of a displacement on a periodic axis of length `extent`.
///
/// A raw difference longer than half the axis is replaced by the path that goes
/// the other way around the torus. Half the axis is taken as a float, so odd extents
/// split evenly instead of rounding the threshold down.
#[inline(always)]
pub fn toroidal_delta(d: f32, extent: f32) -> f32 {
    let half = extent * 0.5;
    if d > half {
        d - extent
    } else if d < -half {
        d + extent
    } else {
        d
    }
}

/// Shortest-path displacement `to - from` on a `width` x `height` torus.
#[inline(always)]
pub fn toroidal_displacement(from: Vec2, to: Vec2, width: f32, height: f32) -> Vec2 {
    Vec2::new(
        toroidal_delta(to.x - from.x, width),
        toroidal_delta(to.y - from.y, height),
    )
}

/// Wraps a coordinate back into `[0, extent)`.
///
/// Travel of at most one axis length per tick is folded by a single add or subtract;
/// anything further out falls back to a euclidean remainder.
pub fn wrap_coord(v: f32, extent: f32) -> f32 {
    if extent <= 0.0 {
        return 0.0;
    }
    let mut w = v;
    if w < 0.0 {
        w += extent;
    }
    if w >= extent {
        w -= extent;
    }
    if (0.0..extent).contains(&w) {
        return w;
    }
    // NaN and far-out values end up here
    let r = v.rem_euclid(extent);
    if (0.0..extent).contains(&r) { r } else { 0.0 }
}

/// Clamps a coordinate into `[0, max]` and reports whether it touched a wall.
#[inline(always)]
pub fn reflect_coord(v: f32, max: f32) -> (f32, bool) {
    if v < 0.0 {
        (0.0, true)
    } else if v > max {
        (max.max(0.0), true)
    } else {
        (v, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_extent_uses_exact_half() {
        assert_eq!(toroidal_delta(2.25, 5.0), 2.25);
        assert_eq!(toroidal_delta(-2.25, 5.0), -2.25);
        assert_eq!(toroidal_delta(2.75, 5.0), -2.25);
    }

    #[test]
    fn toroidal_delta_takes_the_short_way_round() {
        assert_eq!(toroidal_delta(3.0, 10.0), 3.0);
        assert_eq!(toroidal_delta(8.0, 10.0), -2.0);
        assert_eq!(toroidal_delta(-8.0, 10.0), 2.0);
        // exactly half stays as is
        assert_eq!(toroidal_delta(5.0, 10.0), 5.0);
    }

    #[test]
    fn displacement_across_the_seam() {
        let d = toroidal_displacement(Vec2::new(1.0, 9.5), Vec2::new(79.0, 0.5), 80.0, 10.0);
        assert!((d.x - -2.0).abs() < 1e-5);
        assert!((d.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn wrap_coord_stays_half_open() {
        assert_eq!(wrap_coord(-0.5, 10.0), 9.5);
        assert_eq!(wrap_coord(10.0, 10.0), 0.0);
        assert_eq!(wrap_coord(10.25, 10.0), 0.25);
        // rounding of a tiny negative must not land on the upper bound
        let w = wrap_coord(-1e-9, 10.0);
        assert!((0.0..10.0).contains(&w));
        let far = wrap_coord(35.0, 10.0);
        assert!((far - 5.0).abs() < 1e-5);
        assert_eq!(wrap_coord(f32::NAN, 10.0), 0.0);
    }

    #[test]
    fn reflect_coord_clamps_to_walls() {
        assert_eq!(reflect_coord(-0.2, 9.0), (0.0, true));
        assert_eq!(reflect_coord(9.4, 9.0), (9.0, true));
        assert_eq!(reflect_coord(4.0, 9.0), (4.0, false));
    }

    #[test]
    fn clamp_length_caps_long_vectors_only() {
        let v = Vec2::new(3.0, 4.0).clamp_length(0.5);
        assert!((v.length() - 0.5).abs() < 1e-6);
        let short = Vec2::new(0.1, 0.1);
        assert_eq!(short.clamp_length(0.5), short);
    }
}
