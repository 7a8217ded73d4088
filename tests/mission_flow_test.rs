use orbit_ngin::{
    builder::SceneError,
    config::{EngineConfig, MissionConfig},
    mission::{MissionError, MissionPhase},
    resources::{ResourceError, ResourceKind, headless::HeadlessBackend},
    session::{SceneSession, SessionError, SessionEvent},
};

use crate::common::test_utils::{
    FrameDriver, VIEWPORT, assert_released_once, mission, quiz, resource_ids,
};

mod common;

fn answer(session: &mut SceneSession<HeadlessBackend>, option: usize) -> (bool, u32, u32) {
    match session.select_answer(option) {
        Ok(SessionEvent::Answered(outcome)) => (outcome.correct, outcome.awarded, outcome.score),
        other => panic!("unexpected answer result {:?}", other),
    }
}

#[test]
fn two_targets_one_right_one_wrong() {
    let mut session = mission(&[1, 2]);
    let mut driver = FrameDriver::default();
    assert_eq!(session.phase(), Some(MissionPhase::Traveling(0)));

    let (target, question) = driver.until_challenge(&mut session);
    assert_eq!(target, 0);
    assert_eq!(question.id, "q0");
    assert_eq!(session.phase(), Some(MissionPhase::Challenge(0)));
    assert_eq!(session.progress(), Some(100.0));

    assert_eq!(answer(&mut session, 1), (true, 500, 500));
    assert_eq!(session.advance().unwrap(), SessionEvent::TargetChanged(1));
    assert_eq!(session.phase(), Some(MissionPhase::Traveling(1)));
    assert_eq!(session.progress(), Some(0.0));

    let (target, _) = driver.until_challenge(&mut session);
    assert_eq!(target, 1);
    assert_eq!(answer(&mut session, 0), (false, 0, 500));

    assert_eq!(
        session.advance().unwrap(),
        SessionEvent::Completed { score: 500 }
    );
    assert!(!session.is_mounted());
    assert_eq!(session.score(), Some(500));
    assert_eq!(session.registry().live_count(), 0);
    assert_released_once(&session.backend().stats());
}

#[test]
fn cancel_during_challenge_has_no_score_event() {
    let mut session = mission(&[0, 0]);
    let mut driver = FrameDriver::default();
    driver.until_challenge(&mut session);
    answer(&mut session, 0);

    assert_eq!(session.cancel().unwrap(), SessionEvent::Cancelled);
    assert_eq!(session.phase(), Some(MissionPhase::Cancelled));
    assert!(matches!(session.advance(), Err(SessionError::Closed)));
    assert!(driver.frame(&mut session).is_empty());
}

#[test]
fn only_the_first_answer_counts() {
    let mut session = mission(&[2]);
    let mut driver = FrameDriver::default();
    driver.until_challenge(&mut session);

    assert_eq!(answer(&mut session, 2), (true, 500, 500));
    assert!(matches!(
        session.select_answer(2),
        Err(SessionError::Mission(MissionError::AlreadyAnswered(0)))
    ));
    assert!(matches!(
        session.select_answer(0),
        Err(SessionError::Mission(MissionError::AlreadyAnswered(0)))
    ));
    assert_eq!(session.score(), Some(500));
}

#[test]
fn commands_out_of_phase_are_rejected() {
    let mut session = mission(&[0, 1]);
    assert!(matches!(
        session.select_answer(0),
        Err(SessionError::Mission(MissionError::IllegalCommand { .. }))
    ));
    assert!(matches!(
        session.advance(),
        Err(SessionError::Mission(MissionError::IllegalCommand { .. }))
    ));

    let mut driver = FrameDriver::default();
    driver.until_challenge(&mut session);
    assert!(matches!(
        session.advance(),
        Err(SessionError::Mission(MissionError::NotAnswered(0)))
    ));
    assert!(matches!(
        session.select_answer(3),
        Err(SessionError::Mission(MissionError::OptionOutOfRange {
            option: 3,
            count: 3
        }))
    ));
    assert_eq!(session.phase(), Some(MissionPhase::Challenge(0)));
}

#[test]
fn score_never_decreases_and_target_stays_in_bounds() {
    let correct = [0, 1, 2, 0, 1, 2, 0];
    let mut session = mission(&correct);
    let mut driver = FrameDriver::default();
    let mut last_score = 0;
    let mut visited = 0;

    loop {
        let (target, question) = driver.until_challenge(&mut session);
        assert_eq!(target, visited);
        assert!(target < 5);
        // alternate right and wrong answers
        let option = if target % 2 == 0 {
            question.correct_answer
        } else {
            (question.correct_answer + 1) % 3
        };
        let (_, _, score) = answer(&mut session, option);
        assert!(score >= last_score);
        last_score = score;
        visited += 1;
        match session.advance().unwrap() {
            SessionEvent::TargetChanged(next) => assert_eq!(next, visited),
            SessionEvent::Completed { score } => {
                assert_eq!(score, last_score);
                break;
            }
            other => panic!("unexpected {:?}", other),
        }
    }
    // seven questions, five targets
    assert_eq!(visited, 5);
    assert_eq!(last_score, 3 * 500);
}

#[test]
fn challenge_holds_the_target_still() {
    let mut session = mission(&[0]);
    let mut driver = FrameDriver::default();
    driver.until_challenge(&mut session);
    let body = session.current_body().unwrap().to_string();
    let depth = session.graph().get(&body).unwrap().local.position.z;

    for _ in 0..30 {
        assert!(driver.frame(&mut session).is_empty());
    }
    assert_eq!(session.graph().get(&body).unwrap().local.position.z, depth);
    assert_eq!(session.phase(), Some(MissionPhase::Challenge(0)));
}

#[test]
fn advancing_replaces_the_target_and_its_ring() {
    let mut session = mission(&[0, 0]);
    let mut driver = FrameDriver::default();
    driver.until_challenge(&mut session);
    answer(&mut session, 0);

    let old_name = session.current_body().unwrap().to_string();
    let old_ids = resource_ids(session.graph().get(&old_name).unwrap());
    // body and ring, geometry and material each
    assert_eq!(old_ids.len(), 4);
    let live = session.registry().live_count();

    session.advance().unwrap();
    let new_name = session.current_body().unwrap().to_string();
    assert_ne!(new_name, old_name);
    assert!(session.graph().get(&old_name).is_none());
    for id in old_ids {
        assert!(!session.registry().is_live(id));
        assert_eq!(session.backend().stats().release_count(id), 1);
    }
    assert_eq!(session.registry().live_count(), live);

    let config = MissionConfig::default();
    let body = session.graph().get(&new_name).unwrap();
    assert_eq!(body.local.position.z, config.start_depth);
}

#[test]
fn only_the_ring_target_shows_its_ring() {
    let mut session = mission(&[0; 5]);
    let mut driver = FrameDriver::default();
    for target in 0..5 {
        driver.frame(&mut session);
        let name = session.current_body().unwrap().to_string();
        let ring = &session.graph().get(&name).unwrap().children()[0];
        assert_eq!(ring.visible, target == 4, "ring of target {}", target);

        driver.until_challenge(&mut session);
        answer(&mut session, 0);
        session.advance().unwrap();
    }
    assert_eq!(session.score(), Some(2_500));
}

#[test]
fn travel_speed_comes_from_the_config() {
    let mut config = EngineConfig::default();
    config.mission.travel_increment = 1.0;
    config.mission.reward = 10;
    let mut session =
        SceneSession::open_mission(HeadlessBackend::new(), VIEWPORT, quiz(&[0]), config, 3)
            .unwrap_or_else(|e| panic!("{}", e));
    let mut driver = FrameDriver::default();

    let mut frames = 0;
    loop {
        frames += 1;
        let events = driver.frame(&mut session);
        if !events.is_empty() {
            break;
        }
    }
    // from -50 to 2 at one unit per frame
    assert_eq!(frames, 52);
    assert_eq!(answer(&mut session, 0), (true, 10, 10));
}

#[test]
fn failed_target_build_keeps_the_answered_target() {
    let mut session = SceneSession::open_mission(
        // the six scene allocations and the next target's geometry succeed
        HeadlessBackend::failing_after(7),
        VIEWPORT,
        quiz(&[0, 0]),
        EngineConfig::default(),
        7,
    )
    .unwrap_or_else(|e| panic!("{}", e));
    let stats = session.backend().stats();
    let mut driver = FrameDriver::default();
    driver.until_challenge(&mut session);
    answer(&mut session, 0);

    assert!(matches!(
        session.advance(),
        Err(SessionError::Scene(SceneError::Resource(
            ResourceError::Allocation {
                kind: ResourceKind::Material,
                ..
            }
        )))
    ));
    assert!(session.is_mounted());
    assert_eq!(session.phase(), Some(MissionPhase::Challenge(0)));
    assert_eq!(session.current_body(), Some("Mercury"));
    assert!(session.graph().get("Mercury").is_some());
    assert!(session.graph().get("Venus").is_none());
    assert_eq!(session.registry().live_count(), 6);
    assert_eq!(stats.created_count(), 7);
    assert_eq!(stats.live_count(), 6);

    // the answer is kept, so the target can still be left
    assert!(matches!(
        session.select_answer(0),
        Err(SessionError::Mission(MissionError::AlreadyAnswered(0)))
    ));
    assert_eq!(session.cancel().unwrap(), SessionEvent::Cancelled);
    assert_released_once(&stats);
}
