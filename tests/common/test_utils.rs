#![allow(dead_code)]

use std::time::Duration;

use orbit_ngin::{
    config::EngineConfig,
    data_structures::scene_graph::{ObjectKind, SceneObject},
    mission::{Question, Quiz},
    resources::{
        ResourceId,
        headless::{HeadlessBackend, HeadlessStats},
    },
    session::{SceneSession, SessionEvent},
};

pub(crate) const VIEWPORT: (u32, u32) = (800, 600);
pub(crate) const FRAME: Duration = Duration::from_millis(16);
/// Far more frames than any target needs to arrive with the default config.
pub(crate) const MAX_FRAMES: u32 = 2_000;

/// A quiz whose questions have three options each; `correct[i]` is the
/// right option of question `i`.
pub(crate) fn quiz(correct: &[usize]) -> Quiz {
    Quiz {
        questions: correct
            .iter()
            .enumerate()
            .map(|(i, c)| Question {
                id: format!("q{}", i),
                text: format!("Question {}?", i),
                image_url: None,
                options: vec!["one".into(), "two".into(), "three".into()],
                correct_answer: *c,
            })
            .collect(),
    }
}

pub(crate) fn explorer() -> SceneSession<HeadlessBackend> {
    match SceneSession::open_explore(HeadlessBackend::new(), VIEWPORT, EngineConfig::default(), 7)
    {
        Ok(session) => session,
        Err(e) => panic!("explorer did not open: {}", e),
    }
}

pub(crate) fn mission(correct: &[usize]) -> SceneSession<HeadlessBackend> {
    match SceneSession::open_mission(
        HeadlessBackend::new(),
        VIEWPORT,
        quiz(correct),
        EngineConfig::default(),
        7,
    ) {
        Ok(session) => session,
        Err(e) => panic!("mission did not open: {}", e),
    }
}

/// Feeds frames at 60 Hz and keeps track of the timestamp.
pub(crate) struct FrameDriver {
    now: Duration,
}

impl Default for FrameDriver {
    fn default() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }
}

impl FrameDriver {
    pub(crate) fn frame(&mut self, session: &mut SceneSession<HeadlessBackend>) -> Vec<SessionEvent> {
        self.now += FRAME;
        session.frame(self.now)
    }

    pub(crate) fn frames(&mut self, session: &mut SceneSession<HeadlessBackend>, n: u32) {
        for _ in 0..n {
            self.frame(session);
        }
    }

    /// Run frames until the current target opens its challenge.
    pub(crate) fn until_challenge(
        &mut self,
        session: &mut SceneSession<HeadlessBackend>,
    ) -> (usize, Question) {
        for _ in 0..MAX_FRAMES {
            for event in self.frame(session) {
                if let SessionEvent::ChallengeStarted { target, question } = event {
                    return (target, question);
                }
            }
        }
        panic!("no challenge after {} frames", MAX_FRAMES);
    }
}

/// Every resource id held by `object` and its descendants.
pub(crate) fn resource_ids(object: &SceneObject) -> Vec<ResourceId> {
    let mut ids = Vec::new();
    object.for_each(&mut |o| match o.kind {
        ObjectKind::Body {
            geometry, material, ..
        }
        | ObjectKind::Ring { geometry, material } => ids.extend([geometry, material]),
        ObjectKind::Starfield { points, material } => ids.extend([points, material]),
    });
    ids
}

pub(crate) fn assert_released_once(stats: &HeadlessStats) {
    assert!(stats.created_count() > 0);
    for id in stats.created_ids() {
        assert_eq!(stats.release_count(id), 1, "{:?} release count", id);
    }
}
