//! One mount-to-unmount lifetime of a scene.
//!
//! A [`SceneSession`] exclusively owns the scene graph, the camera rig, the
//! resource registry, the animation clock and (in the guided mission) the
//! mission state. The host drives it with frames, clicks, resizes and
//! mission commands and receives [`SessionEvent`]s back.
//!
//! However the session ends (completion, cancellation, an explicit
//! [`SceneSession::teardown`] or simply being dropped) the clock stops first
//! and every registered resource is released exactly once before control
//! returns to the host.

use std::time::Duration;

use log::{info, warn};
use rand::{SeedableRng, rngs::StdRng};
use thiserror::Error;

use crate::{
    animation::{ExploreAnimator, MissionAnimator},
    builder::{MISSION_TARGETS, SceneDescriptor, SceneError, build_body, build_scene, mission_target},
    camera::CameraRig,
    clock::AnimationClock,
    config::{ConfigError, EngineConfig},
    data_structures::scene_graph::SceneGraph,
    mission::{AnswerOutcome, MissionError, MissionPhase, MissionState, Question, Quiz},
    pick::{self, InteractionHit, SurfaceRect},
    resources::{GpuBackend, ResourceError, ResourceRegistry},
};

/// Which scene a host wants to mount.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneRequest {
    Explore,
    Mission(Quiz),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A body was clicked in the explorer.
    Interacted(String),
    /// The current target is close enough; its question is now open.
    ChallengeStarted { target: usize, question: Question },
    Answered(AnswerOutcome),
    /// The next target was built and travel towards it began.
    TargetChanged(usize),
    Completed { score: u32 },
    Cancelled,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("the session has been torn down")]
    Closed,
    #[error("this scene has no mission")]
    NoMission,
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Mission(#[from] MissionError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

enum SceneMode {
    Explore(ExploreAnimator),
    Mission {
        state: MissionState,
        animator: MissionAnimator,
        body: String,
        progress: f32,
    },
}

pub struct SceneSession<B: GpuBackend> {
    config: EngineConfig,
    registry: ResourceRegistry<B>,
    graph: SceneGraph,
    rig: CameraRig,
    surface: SurfaceRect,
    clock: AnimationClock,
    mode: SceneMode,
    rng: StdRng,
    mounted: bool,
}

impl<B: GpuBackend> SceneSession<B> {
    fn mount(
        backend: B,
        viewport: (u32, u32),
        desc: &SceneDescriptor,
        mode: SceneMode,
        config: EngineConfig,
        seed: u64,
    ) -> Result<Self, SessionError> {
        let mut registry = ResourceRegistry::new(backend);
        let mut rng = StdRng::seed_from_u64(seed);
        let (graph, rig) = match build_scene(viewport, desc, &config.camera, &mut registry, &mut rng) {
            Ok(scene) => scene,
            Err(e) => {
                registry.teardown();
                return Err(e.into());
            }
        };
        let mut clock = AnimationClock::new();
        clock.start();
        info!("Scene session opened at {}x{}", viewport.0, viewport.1);
        Ok(Self {
            config,
            registry,
            graph,
            rig,
            surface: SurfaceRect::from_size(viewport.0, viewport.1),
            clock,
            mode,
            rng,
            mounted: true,
        })
    }

    /// Mount the free orbit explorer. Unusable constants are rejected before
    /// anything is allocated.
    pub fn open_explore(
        backend: B,
        viewport: (u32, u32),
        config: EngineConfig,
        seed: u64,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let mode = SceneMode::Explore(ExploreAnimator::new(config.explore));
        Self::mount(
            backend,
            viewport,
            &SceneDescriptor::orbit_explorer(),
            mode,
            config,
            seed,
        )
    }

    /// Mount the guided mission. Content without targets and unusable
    /// constants are rejected before anything is allocated.
    pub fn open_mission(
        backend: B,
        viewport: (u32, u32),
        quiz: Quiz,
        config: EngineConfig,
        seed: u64,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let state = MissionState::new(quiz, MISSION_TARGETS.len(), config.mission.reward)?;
        let desc = SceneDescriptor::guided_mission(0, &config.mission);
        let mode = SceneMode::Mission {
            state,
            animator: MissionAnimator::new(config.mission),
            body: desc.bodies[0].name.clone(),
            progress: 0.0,
        };
        Self::mount(backend, viewport, &desc, mode, config, seed)
    }

    pub fn open(
        backend: B,
        viewport: (u32, u32),
        request: SceneRequest,
        config: EngineConfig,
        seed: u64,
    ) -> Result<Self, SessionError> {
        match request {
            SceneRequest::Explore => Self::open_explore(backend, viewport, config, seed),
            SceneRequest::Mission(quiz) => {
                Self::open_mission(backend, viewport, quiz, config, seed)
            }
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn registry(&self) -> &ResourceRegistry<B> {
        &self.registry
    }

    pub fn backend(&self) -> &B {
        self.registry.backend()
    }

    pub fn clock(&self) -> &AnimationClock {
        &self.clock
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn phase(&self) -> Option<MissionPhase> {
        match &self.mode {
            SceneMode::Mission { state, .. } => Some(state.phase()),
            SceneMode::Explore(_) => None,
        }
    }

    pub fn score(&self) -> Option<u32> {
        match &self.mode {
            SceneMode::Mission { state, .. } => Some(state.score()),
            SceneMode::Explore(_) => None,
        }
    }

    /// Approach progress towards the current target in `[0, 100]`.
    pub fn progress(&self) -> Option<f32> {
        match &self.mode {
            SceneMode::Mission { progress, .. } => Some(*progress),
            SceneMode::Explore(_) => None,
        }
    }

    pub fn current_question(&self) -> Option<&Question> {
        match &self.mode {
            SceneMode::Mission { state, .. } => state.current_question(),
            SceneMode::Explore(_) => None,
        }
    }

    /// Name of the mission body currently on screen.
    pub fn current_body(&self) -> Option<&str> {
        match &self.mode {
            SceneMode::Mission { body, .. } => Some(body),
            SceneMode::Explore(_) => None,
        }
    }

    /// Apply a new viewport. Zero sizes and repeated sizes change nothing.
    pub fn resize(&mut self, width: u32, height: u32) -> bool {
        if !self.mounted {
            return false;
        }
        let changed = self.rig.resize(width, height);
        if changed {
            self.surface.width = width as f32;
            self.surface.height = height as f32;
        }
        changed
    }

    /// Where the surface sits relative to incoming click coordinates.
    pub fn set_surface_rect(&mut self, rect: SurfaceRect) {
        self.surface = rect;
    }

    /// Run one animation tick if one is scheduled and requeue the next.
    pub fn frame(&mut self, timestamp: Duration) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !self.mounted {
            return events;
        }
        let Some(frame) = self.clock.tick(timestamp) else {
            return events;
        };

        match &mut self.mode {
            SceneMode::Explore(animator) => animator.tick(&mut self.graph, &frame),
            SceneMode::Mission {
                state,
                animator,
                body,
                progress,
            } => {
                let step = animator.tick(&mut self.graph, body, state.phase(), &frame);
                if let Some(step) = step {
                    *progress = step.progress;
                    if step.arrived {
                        match state.enter_challenge() {
                            Ok(target) => {
                                if let Some(question) = state.current_question() {
                                    events.push(SessionEvent::ChallengeStarted {
                                        target,
                                        question: question.clone(),
                                    });
                                }
                            }
                            Err(e) => warn!("{}", e),
                        }
                    }
                }
            }
        }

        self.graph.update_world_transforms();
        if let Err(e) = self.graph.sync(&mut self.registry) {
            warn!("Could not upload scene state: {}", e);
        }
        self.clock.requeue();
        events
    }

    /// Resolve a click to an interactive body. Returns nothing after teardown.
    pub fn click(&self, x: f32, y: f32) -> Option<SessionEvent> {
        self.pick(x, y)
            .map(|hit| SessionEvent::Interacted(hit.name))
    }

    pub fn pick(&self, x: f32, y: f32) -> Option<InteractionHit> {
        if !self.mounted {
            warn!("Ignoring click at ({}, {}) after teardown", x, y);
            return None;
        }
        pick::resolve(&self.rig, &self.graph, &self.surface, x, y)
    }

    fn mission_mut(&mut self) -> Result<&mut MissionState, SessionError> {
        if !self.mounted {
            return Err(SessionError::Closed);
        }
        match &mut self.mode {
            SceneMode::Mission { state, .. } => Ok(state),
            SceneMode::Explore(_) => Err(SessionError::NoMission),
        }
    }

    pub fn select_answer(&mut self, option: usize) -> Result<SessionEvent, SessionError> {
        let outcome = self.mission_mut()?.select_answer(option)?;
        Ok(SessionEvent::Answered(outcome))
    }

    /// Leave an answered target. Builds the next target or completes the
    /// mission, in which case the session is torn down.
    ///
    /// The mission only moves on once the next target is in place. If it
    /// cannot be built the session stays on the answered target.
    pub fn advance(&mut self) -> Result<SessionEvent, SessionError> {
        let phase = self.mission_mut()?.next_phase()?;
        match phase {
            MissionPhase::Traveling(next) => {
                self.replace_target(next)?;
                self.mission_mut()?.advance()?;
                Ok(SessionEvent::TargetChanged(next))
            }
            MissionPhase::Completed { score } => {
                self.mission_mut()?.advance()?;
                self.teardown();
                Ok(SessionEvent::Completed { score })
            }
            phase => Err(MissionError::IllegalCommand {
                command: "advance",
                phase,
            }
            .into()),
        }
    }

    /// Build the next target at the start depth, then release the current
    /// body (and its ring) and put the new one in its place.
    fn replace_target(&mut self, next: usize) -> Result<(), SessionError> {
        let SceneMode::Mission { body, progress, .. } = &mut self.mode else {
            return Err(SessionError::NoMission);
        };
        let desc = mission_target(next, &self.config.mission);
        let new_body = build_body(&desc, &mut self.registry, &mut self.rng)?;
        if let Some(old) = self.graph.remove(body) {
            let released = old.dispose(&mut self.registry);
            info!("Released {} resources of target {}", released, body);
        }
        *body = desc.name;
        *progress = 0.0;
        self.graph.add(new_body);
        Ok(())
    }

    /// End the session without a score.
    pub fn cancel(&mut self) -> Result<SessionEvent, SessionError> {
        if !self.mounted {
            return Err(SessionError::Closed);
        }
        if let SceneMode::Mission { state, .. } = &mut self.mode {
            state.cancel()?;
        }
        info!("Scene session cancelled");
        self.teardown();
        Ok(SessionEvent::Cancelled)
    }

    /// Stop the clock and release every resource. Safe to call repeatedly.
    ///
    /// Returns the number of resources released by this call.
    pub fn teardown(&mut self) -> usize {
        self.clock.stop();
        if !self.mounted {
            warn!("Scene session is already torn down");
            return 0;
        }
        self.mounted = false;
        let released = self.graph.dispose(&mut self.registry) + self.registry.teardown();
        info!("Scene session closed, released {} resources", released);
        released
    }
}

impl<B: GpuBackend> Drop for SceneSession<B> {
    fn drop(&mut self) {
        if self.mounted {
            self.teardown();
        }
    }
}
