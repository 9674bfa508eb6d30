use crate::types::Value;

/// A scalar field: maps a point in space to a [`Value`].
///
/// Implementations must be pure: evaluating the same point twice returns the
/// same value, with no side effects. Extraction relies on this for
/// deterministic output.
///
/// Any `Fn(Value, Value, Value) -> Value` closure satisfies the contract, so
/// analytic fields, noise functions, and user-supplied closures all work:
///
/// ```rust
/// use isofield::field::ScalarField;
///
/// let plane = |_x: f32, y: f32, _z: f32| y;
/// assert_eq!(plane.sample(0.0, 2.5, 0.0), 2.5);
/// ```
pub trait ScalarField {
    /// Evaluates the field at `(x, y, z)`.
    fn sample(&self, x: Value, y: Value, z: Value) -> Value;
}

impl<F> ScalarField for F
where
    F: Fn(Value, Value, Value) -> Value,
{
    fn sample(&self, x: Value, y: Value, z: Value) -> Value {
        self(x, y, z)
    }
}

/// `x² + y² + z²`; level sets are origin-centred spheres of radius `√isovalue`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sphere;

impl ScalarField for Sphere {
    fn sample(&self, x: Value, y: Value, z: Value) -> Value {
        x * x + y * y + z * z
    }
}

/// `y − sin(x)·cos(z)`; the zero level set is a rippled sheet.
#[derive(Clone, Copy, Debug, Default)]
pub struct SineRipple;

impl ScalarField for SineRipple {
    fn sample(&self, x: Value, y: Value, z: Value) -> Value {
        y - x.sin() * z.cos()
    }
}

/// `x² − y² − z² − z`; a saddle-shaped quadric with a double cone at
/// negative isovalues.
#[derive(Clone, Copy, Debug, Default)]
pub struct Saddle;

impl ScalarField for Saddle {
    fn sample(&self, x: Value, y: Value, z: Value) -> Value {
        x * x - y * y - z * z - z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_fields() {
        let shifted = |x: Value, y: Value, z: Value| Sphere.sample(x, y, z) - 1.0;
        assert_eq!(shifted.sample(1.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn sphere_is_radius_squared() {
        assert_eq!(Sphere.sample(0.0, 3.0, 4.0), 25.0);
    }

    #[test]
    fn ripple_zero_set_follows_the_product() {
        let x = 0.7_f32;
        let z = -1.3_f32;
        let y = x.sin() * z.cos();
        assert!(SineRipple.sample(x, y, z).abs() < 1e-6);
    }
}
