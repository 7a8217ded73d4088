//! orbit-ngin
//!
//! A small scene engine for quiz-gated planet missions. A session builds a
//! starfield, lights and a handful of celestial bodies, animates them every
//! frame, resolves pointer clicks to bodies with ray casting and couples the
//! continuous travel animation to a discrete mission state machine. Every GPU
//! allocation is owned by the session and released exactly once when the
//! session closes, however it closes.
//!
//! High-level modules
//! - `animation`: per-frame animators for the explorer and the mission scene
//! - `builder`: declarative scene descriptors and the scene builder
//! - `camera`: camera, projection, uniforms and picking rays
//! - `clock`: the frame scheduling clock that runs while a session is mounted
//! - `config`: tunable constants (travel speed, proximity, rewards, ...)
//! - `context`: GPU and window context that owns device/queue/surface
//! - `data_structures`: transforms, meshes and the scene graph
//! - `flow`: the winit host that mounts a session and forwards input
//! - `mission`: quiz content and the mission state machine
//! - `pick`: pointer to body resolution
//! - `pipelines`: render pipelines for bodies, rings and stars
//! - `render`: draws a scene graph with the pipelines above
//! - `resources`: the resource registry and its GPU backends
//! - `session`: one mount-to-unmount lifetime of a scene
//!

pub mod animation;
pub mod builder;
pub mod camera;
pub mod clock;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod flow;
pub mod mission;
pub mod pick;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod session;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::dpi::{PhysicalPosition, PhysicalSize};
