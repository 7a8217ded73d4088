//! Engine data structures: transforms, meshes and the scene graph.
//!
//! - `instance` holds local/world transforms and their uniform layout
//! - `mesh` generates sphere, torus and starfield geometry
//! - `scene_graph` holds scene objects, their materials and lights
//! - `texture` contains the depth target

pub mod instance;
pub mod mesh;
pub mod scene_graph;
pub mod texture;
