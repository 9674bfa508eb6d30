//! Isosurface mesh extraction from scalar fields.
//!
//! The core pipeline samples a [`ScalarField`](field::ScalarField) on a
//! regular lattice, classifies each cell against an isovalue, and emits a
//! flat-shaded triangle soup via the marching cubes tables. Meshes can be
//! written to ASCII PLY or handed to the Bevy integration for rendering.

pub mod error;
pub mod extract;
pub mod field;
pub mod grid;
pub mod interp;
pub mod mesh;
pub mod plugin;
pub mod ply;
pub mod tables;
pub mod types;

pub use error::{IsoFieldError, Result};
pub use extract::{EdgePlacement, ExtractParams, extract, extract_sampled};
pub use grid::{GridBounds, SampledGrid};
pub use mesh::IsoMesh;
pub use plugin::IsoMeshPlugin;
