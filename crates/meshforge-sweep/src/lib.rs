//! Generate closed solids by extruding and sweeping boundary-loop profiles.
//!
//! This crate is the generative counterpart to `meshforge-repair`: instead
//! of fixing an existing surface, it builds a new one from a planar
//! [`Profile`] (outer ring plus optional hole rings) and either a fixed
//! offset or a path polyline. Caps and side walls are constructed over
//! shared vertices, then welded and manifold-checked with a bounded retry,
//! so the output is a watertight solid whenever the input allows one.
//!
//! # Quick Start
//!
//! ```
//! use meshforge_sweep::{extrude, Profile};
//! use nalgebra::{Point3, Vector3};
//!
//! let square = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let profile = Profile::new(square, vec![]).unwrap();
//! let solid = extrude(&profile, Vector3::new(0.0, 0.0, 2.0)).unwrap();
//!
//! assert!((solid.signed_volume() - 2.0).abs() < 1e-9);
//! ```
//!
//! For curved paths, [`sweep_along`] normalizes the path, propagates
//! twist-stable frames along it, and places one profile ring per sample.

// Safety: deny unwrap/expect in library code. Tests may use them.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

mod error;
mod frame;
mod path;
mod profile;
mod sweep;

pub use error::{SweepError, SweepResult};
pub use frame::{propagate_frames, Frame};
pub use path::{normalize_aligned_path, normalize_translate_path};
pub use profile::Profile;
pub use sweep::{
    extrude, extrude_along, extrude_with_diagnostics, sweep_along, sweep_along_with_diagnostics,
};
