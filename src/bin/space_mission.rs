//! Fly the guided mission with the bundled quiz.
//!
//! Usage: `space_mission [config.toml]`. Answer with the number keys,
//! continue with Enter or Space and leave with Escape.

use log::info;
use orbit_ngin::{
    config::EngineConfig,
    flow::{SessionListener, run_with_config},
    mission::{AnswerOutcome, Question, Quiz},
    session::SceneRequest,
};

const SAMPLE_QUIZ: &str = include_str!("../../assets/sample_quiz.toml");

struct ConsoleListener;

impl SessionListener for ConsoleListener {
    fn on_interact(&mut self, name: &str) {
        info!("Clicked {}", name);
    }

    fn on_challenge(&mut self, target: usize, question: &Question) {
        println!("Target {}: {}", target + 1, question.text);
        for (i, option) in question.options.iter().enumerate() {
            println!("  [{}] {}", i + 1, option);
        }
    }

    fn on_answer(&mut self, outcome: &AnswerOutcome) {
        if outcome.correct {
            println!("Correct! +{} points, score {}", outcome.awarded, outcome.score);
        } else {
            println!(
                "Wrong, the answer was [{}]. Score {}",
                outcome.correct_answer + 1,
                outcome.score
            );
        }
        println!("Press Enter to continue");
    }

    fn on_target_changed(&mut self, target: usize) {
        info!("Heading to target {}", target + 1);
    }

    fn on_complete(&mut self, score: u32) {
        println!("Mission complete, final score {}", score);
    }

    fn on_cancel(&mut self) {
        println!("Mission aborted");
    }
}

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let quiz = Quiz::from_toml_str(SAMPLE_QUIZ)?;
    run_with_config(SceneRequest::Mission(quiz), config, Box::new(ConsoleListener))
}
