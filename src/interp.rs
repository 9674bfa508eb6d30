use crate::types::Value;

/// Interpolation factor `t` at which the isovalue sits between `v0` and `v1`.
///
/// Callers only invoke this on edges the surface crosses, so `v0 != v1`
/// by construction (one sample is strictly below the isovalue, the other
/// at or above it).
pub fn find_t(v0: Value, v1: Value, iso_val: Value) -> Value {
    (iso_val - v0) / (v1 - v0)
}

/// Linear interpolation.
pub fn lerp(a: Value, b: Value, t: Value) -> Value {
    a + (b - a) * t
}

/// Componentwise linear interpolation between two points by factor `t`.
pub fn interpolate_points(p0: [Value; 3], p1: [Value; 3], t: Value) -> [Value; 3] {
    [
        lerp(p0[0], p1[0], t),
        lerp(p0[1], p1[1], t),
        lerp(p0[2], p1[2], t),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_is_the_fractional_crossing() {
        assert_eq!(find_t(0.0, 2.0, 0.5), 0.25);
        assert_eq!(find_t(2.0, 0.0, 0.5), 0.75);
    }

    #[test]
    fn interpolation_endpoints() {
        let a = [1.0, 2.0, 3.0];
        let b = [5.0, 6.0, 7.0];
        assert_eq!(interpolate_points(a, b, 0.0), a);
        assert_eq!(interpolate_points(a, b, 1.0), b);
        assert_eq!(interpolate_points(a, b, 0.5), [3.0, 4.0, 5.0]);
    }
}
