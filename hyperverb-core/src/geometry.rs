//! Geometry-aware math for the reverb simulation.
//!
//! Points live in homogeneous coordinates (`DVec4`, origin at `(0,0,0,1)`):
//! the Minkowski hyperboloid model for hyperbolic space, the unit sphere in
//! E4 for spherical space, and plain affine coordinates for Euclidean space.
//! The active geometry is always an explicit parameter; there is no ambient
//! "current geometry" state.

use glam::{DMat4, DVec4};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Geometry {
    Hyperbolic,
    Spherical,
    Euclidean,
}

impl Geometry {
    /// The shared origin of all three models.
    pub fn origin() -> DVec4 {
        DVec4::new(0.0, 0.0, 0.0, 1.0)
    }

    /// Geometry-aware distance from the origin to a point.
    pub fn distance_from_origin(self, p: DVec4) -> f64 {
        match self {
            Geometry::Hyperbolic => p.w.max(1.0).acosh(),
            Geometry::Spherical => p.w.clamp(-1.0, 1.0).acos(),
            Geometry::Euclidean => (p.x * p.x + p.y * p.y + p.z * p.z).sqrt(),
        }
    }

    /// The natural spreading function: how a wavefront widens with distance.
    /// Hyperbolic sine, sine, or the distance itself depending on curvature.
    pub fn sin_auto(self, d: f64) -> f64 {
        match self {
            Geometry::Hyperbolic => d.sinh(),
            Geometry::Spherical => d.sin(),
            Geometry::Euclidean => d,
        }
    }

    /// Isometry translating the origin by `d` along the lateral (x) axis.
    /// Used to place the two ear offsets at plus/minus the inter-aural
    /// distance in the listener's local frame.
    pub fn xpush(self, d: f64) -> DMat4 {
        match self {
            Geometry::Hyperbolic => DMat4::from_cols(
                DVec4::new(d.cosh(), 0.0, 0.0, d.sinh()),
                DVec4::new(0.0, 1.0, 0.0, 0.0),
                DVec4::new(0.0, 0.0, 1.0, 0.0),
                DVec4::new(d.sinh(), 0.0, 0.0, d.cosh()),
            ),
            Geometry::Spherical => DMat4::from_cols(
                DVec4::new(d.cos(), 0.0, 0.0, -d.sin()),
                DVec4::new(0.0, 1.0, 0.0, 0.0),
                DVec4::new(0.0, 0.0, 1.0, 0.0),
                DVec4::new(d.sin(), 0.0, 0.0, d.cos()),
            ),
            Geometry::Euclidean => DMat4::from_cols(
                DVec4::new(1.0, 0.0, 0.0, 0.0),
                DVec4::new(0.0, 1.0, 0.0, 0.0),
                DVec4::new(0.0, 0.0, 1.0, 0.0),
                DVec4::new(d, 0.0, 0.0, 1.0),
            ),
        }
    }
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Inverse linear interpolation: where `x` sits between `a` and `b`.
pub fn ilerp(a: f64, b: f64, x: f64) -> f64 {
    (x - a) / (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_xpush_distance_round_trip() {
        for geo in [Geometry::Hyperbolic, Geometry::Spherical, Geometry::Euclidean] {
            for d in [0.0, 0.05, 0.5, 1.0] {
                let p = geo.xpush(d) * Geometry::origin();
                assert!(
                    (geo.distance_from_origin(p) - d).abs() < EPS,
                    "{:?} xpush({}) round trip failed",
                    geo,
                    d
                );
            }
        }
    }

    #[test]
    fn test_xpush_composes() {
        let geo = Geometry::Hyperbolic;
        let p = geo.xpush(0.3) * geo.xpush(0.4) * Geometry::origin();
        assert!((geo.distance_from_origin(p) - 0.7).abs() < EPS);
    }

    #[test]
    fn test_sin_auto() {
        assert!((Geometry::Hyperbolic.sin_auto(1.0) - 1.0f64.sinh()).abs() < EPS);
        assert!((Geometry::Spherical.sin_auto(1.0) - 1.0f64.sin()).abs() < EPS);
        assert_eq!(Geometry::Euclidean.sin_auto(1.0), 1.0);
    }

    #[test]
    fn test_distance_clamps_degenerate_points() {
        // Numerical noise can push w slightly below 1 on the hyperboloid.
        let p = DVec4::new(0.0, 0.0, 0.0, 1.0 - 1e-12);
        assert_eq!(Geometry::Hyperbolic.distance_from_origin(p), 0.0);
    }

    #[test]
    fn test_lerp_ilerp() {
        assert_eq!(lerp(2.0, 4.0, 0.5), 3.0);
        assert_eq!(ilerp(2.0, 4.0, 3.0), 0.5);
        assert_eq!(lerp(2.0, 4.0, ilerp(2.0, 4.0, 3.5)), 3.5);
    }
}
