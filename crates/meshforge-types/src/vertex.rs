//! Vertex types and attributes.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Optional attributes that can be attached to a vertex.
///
/// - `normal`: computed from adjacent faces (area-weighted average)
/// - `uv`: 2-D parameterization, carried by swept profiles for
///   higher-fidelity cap triangulation
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VertexAttributes {
    /// Unit normal vector, computed from adjacent faces.
    pub normal: Option<Vector3<f64>>,

    /// 2-D parameterization coordinates (U, V).
    pub uv: Option<(f64, f64)>,
}

impl VertexAttributes {
    /// Create empty attributes with no values set.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            normal: None,
            uv: None,
        }
    }

    /// Create attributes with just a normal.
    #[inline]
    #[must_use]
    pub const fn with_normal(normal: Vector3<f64>) -> Self {
        Self {
            normal: Some(normal),
            uv: None,
        }
    }

    /// Check if any attributes are set.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.normal.is_none() && self.uv.is_none()
    }
}

/// A vertex in 3D space with optional attributes.
///
/// The position is stored as a `Point3<f64>` for high precision.
/// Attributes are optional and stored separately so position-only meshes
/// stay cheap.
///
/// # Example
///
/// ```
/// use meshforge_types::{Vertex, Point3};
///
/// let v1 = Vertex::new(Point3::new(1.0, 2.0, 3.0));
/// let v2 = Vertex::from_coords(1.0, 2.0, 3.0);
///
/// assert_eq!(v1.position, v2.position);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vertex {
    /// 3D position.
    pub position: Point3<f64>,

    /// Optional attributes (normal, uv).
    pub attributes: VertexAttributes,
}

impl Vertex {
    /// Create a new vertex with only position set.
    #[inline]
    #[must_use]
    pub const fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            attributes: VertexAttributes::empty(),
        }
    }

    /// Create a vertex from raw coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use meshforge_types::Vertex;
    ///
    /// let v = Vertex::from_coords(1.0, 2.0, 3.0);
    /// assert_eq!(v.position.y, 2.0);
    /// ```
    #[inline]
    #[must_use]
    #[allow(clippy::missing_const_for_fn)] // Point3::new is not const in nalgebra
    pub fn from_coords(x: f64, y: f64, z: f64) -> Self {
        Self::new(Point3::new(x, y, z))
    }

    /// Create a vertex with position and normal.
    #[inline]
    #[must_use]
    pub const fn with_normal(position: Point3<f64>, normal: Vector3<f64>) -> Self {
        Self {
            position,
            attributes: VertexAttributes::with_normal(normal),
        }
    }

    /// Get the normal if set.
    #[inline]
    #[must_use]
    pub const fn normal(&self) -> Option<Vector3<f64>> {
        self.attributes.normal
    }

    /// Get the UV coordinates if set.
    #[inline]
    #[must_use]
    pub const fn uv(&self) -> Option<(f64, f64)> {
        self.attributes.uv
    }
}

impl From<Point3<f64>> for Vertex {
    fn from(position: Point3<f64>) -> Self {
        Self::new(position)
    }
}

impl From<[f64; 3]> for Vertex {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self::from_coords(x, y, z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_from_coords() {
        let v = Vertex::from_coords(1.0, 2.0, 3.0);
        assert!((v.position.x - 1.0).abs() < f64::EPSILON);
        assert!((v.position.y - 2.0).abs() < f64::EPSILON);
        assert!((v.position.z - 3.0).abs() < f64::EPSILON);
        assert!(v.attributes.is_empty());
    }

    #[test]
    fn vertex_with_normal() {
        let v = Vertex::with_normal(Point3::origin(), Vector3::z());
        let n = v.normal().map(|n| (n.x, n.y, n.z));
        assert_eq!(n, Some((0.0, 0.0, 1.0)));
    }

    #[test]
    fn vertex_from_array() {
        let v: Vertex = [1.0, 2.0, 3.0].into();
        assert!((v.position.x - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn attributes_is_empty() {
        assert!(VertexAttributes::empty().is_empty());
        assert!(!VertexAttributes::with_normal(Vector3::z()).is_empty());
    }
}
