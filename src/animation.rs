//! Per-frame animation of the two scenes.
//!
//! Rotations and bobbing scale with the frame's elapsed time, travel moves
//! by a fixed increment per tick. Animators only touch local transforms;
//! the session recomputes world transforms afterwards.

use crate::{
    builder::STARFIELD,
    clock::FrameTime,
    config::{ExploreConfig, MissionConfig},
    data_structures::scene_graph::{ObjectKind, SceneGraph, SceneObject},
    mission::MissionPhase,
};

/// Spins and bobs every interactive body, slowly turns the starfield.
#[derive(Debug, Clone)]
pub struct ExploreAnimator {
    config: ExploreConfig,
}

impl ExploreAnimator {
    pub fn new(config: ExploreConfig) -> Self {
        Self { config }
    }

    pub fn tick(&self, graph: &mut SceneGraph, frame: &FrameTime) {
        let dt = frame.dt_secs();
        let t = frame.elapsed_secs();
        let bodies: Vec<String> = graph
            .interactive_bodies()
            .into_iter()
            .map(|(name, _, _)| name.to_string())
            .collect();
        for (i, name) in bodies.iter().enumerate() {
            if let Some(body) = graph.get_mut(name) {
                body.local.spin_y(self.config.body_spin * dt);
                body.local.position.y = (t * self.config.bob_frequency + i as f32).sin()
                    * self.config.bob_amplitude;
            }
        }
        if let Some(stars) = graph.get_mut(STARFIELD) {
            stars.local.spin_y(self.config.starfield_drift * dt);
        }
    }
}

/// What one traveling tick did to the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelStep {
    pub depth: f32,
    /// Approach progress in `[0, 100]`.
    pub progress: f32,
    /// The target crossed the proximity threshold on this tick.
    pub arrived: bool,
}

/// Moves the current mission target toward the camera.
#[derive(Debug, Clone)]
pub struct MissionAnimator {
    config: MissionConfig,
}

fn ring_of(body: &mut SceneObject) -> Option<&mut SceneObject> {
    body.children_mut()
        .iter_mut()
        .find(|child| matches!(child.kind, ObjectKind::Ring { .. }))
}

impl MissionAnimator {
    pub fn new(config: MissionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    /// Animate the target body named `body` for the given phase.
    ///
    /// Returns a [`TravelStep`] only while traveling. Reaching the threshold
    /// is reported but the phase change is left to the caller.
    pub fn tick(
        &self,
        graph: &mut SceneGraph,
        body: &str,
        phase: MissionPhase,
        frame: &FrameTime,
    ) -> Option<TravelStep> {
        let dt = frame.dt_secs();
        let ring_target = phase.target() == Some(self.config.ring_target);
        let traveling = matches!(phase, MissionPhase::Traveling(_));

        let target = graph.get_mut(body)?;
        if let Some(ring) = ring_of(target) {
            ring.visible = ring_target;
            if ring_target && traveling {
                ring.local.spin_z(self.config.ring_spin * dt);
            }
        }
        if !traveling {
            return None;
        }

        target.local.position.z += self.config.travel_increment;
        target.local.spin_y(self.config.target_spin * dt);
        let depth = target.local.position.z;
        if let Some(stars) = graph.get_mut(STARFIELD) {
            stars.local.spin_z(self.config.starfield_drift * dt);
        }
        Some(TravelStep {
            depth,
            progress: self.config.progress_at(depth),
            arrived: depth >= self.config.proximity_threshold,
        })
    }
}
