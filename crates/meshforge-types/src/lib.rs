//! Core mesh types for the meshforge geometry engine.
//!
//! This crate provides the foundational value types shared by the repair and
//! sweep crates:
//!
//! - [`Vertex`] - A point in 3D space with optional attributes
//! - [`TriMesh`] - An indexed triangle soup with optional per-face labels
//! - [`Triangle`] - A concrete triangle with resolved vertex positions
//! - [`Aabb`] - Axis-aligned bounding box
//! - [`GeometrySource`] - Tagged ingestion variants resolved once into a mesh
//!
//! # Coordinate System
//!
//! All coordinates are `f64` in one consistent world space; transforms are
//! applied upstream by the caller. The library is unit-agnostic.
//!
//! Face winding is **counter-clockwise (CCW) when viewed from outside**.
//! Normals point outward by the right-hand rule.
//!
//! # Example
//!
//! ```
//! use meshforge_types::{TriMesh, Vertex, Point3, MeshTopology};
//!
//! let mut mesh = TriMesh::new();
//! mesh.vertices.push(Vertex::new(Point3::new(0.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(1.0, 0.0, 0.0)));
//! mesh.vertices.push(Vertex::new(Point3::new(0.5, 1.0, 0.0)));
//! mesh.faces.push([0, 1, 2]);
//!
//! assert_eq!(mesh.face_count(), 1);
//! assert!(!mesh.is_empty());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod bounds;
mod mesh;
mod source;
mod traits;
mod triangle;
mod vertex;

pub use bounds::Aabb;
pub use mesh::{unit_cube, TriMesh};
pub use source::GeometrySource;
pub use traits::{MeshBounds, MeshTopology};
pub use triangle::Triangle;
pub use vertex::{Vertex, VertexAttributes};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
