//! Quiz content and the mission state machine.
//!
//! A mission walks through its targets in order. Each target starts in
//! `Traveling`, switches to `Challenge` once the travel animation reports
//! proximity, accepts exactly one answer and waits for an explicit advance.
//! After the last target the mission is `Completed` with its score.
//! `Cancelled` ends the mission without a score.
//!
//! ```text
//! Traveling(i) --proximity--> Challenge(i) --answer--> Challenge(i) --advance--> Traveling(i+1)
//!                                                                            \--> Completed { score }
//! ```

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl Quiz {
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        let quiz = toml::from_str(source)?;
        Ok(quiz)
    }

    fn validate(&self, count: usize) -> Result<(), MissionError> {
        if count == 0 {
            return Err(MissionError::EmptyContent);
        }
        for (index, question) in self.questions.iter().take(count).enumerate() {
            if question.correct_answer >= question.options.len() {
                return Err(MissionError::InvalidQuestion {
                    index,
                    options: question.options.len(),
                    correct: question.correct_answer,
                });
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MissionPhase {
    Traveling(usize),
    Challenge(usize),
    Completed { score: u32 },
    Cancelled,
}

impl MissionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, MissionPhase::Completed { .. } | MissionPhase::Cancelled)
    }

    pub fn target(&self) -> Option<usize> {
        match self {
            MissionPhase::Traveling(i) | MissionPhase::Challenge(i) => Some(*i),
            _ => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MissionError {
    #[error("the mission has no targets")]
    EmptyContent,
    #[error("question {index} marks option {correct} as correct but has {options} options")]
    InvalidQuestion {
        index: usize,
        options: usize,
        correct: usize,
    },
    #[error("option {option} does not exist, the question has {count} options")]
    OptionOutOfRange { option: usize, count: usize },
    #[error("`{command}` is not allowed in phase {phase:?}")]
    IllegalCommand {
        command: &'static str,
        phase: MissionPhase,
    },
    #[error("target {0} has already been answered")]
    AlreadyAnswered(usize),
    #[error("target {0} has not been answered yet")]
    NotAnswered(usize),
}

/// Result of the one answer a target accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub target: usize,
    pub selected: usize,
    pub correct_answer: usize,
    pub correct: bool,
    pub awarded: u32,
    pub score: u32,
}

#[derive(Debug, Clone)]
pub struct MissionState {
    quiz: Quiz,
    target_count: usize,
    phase: MissionPhase,
    score: u32,
    reward: u32,
    selection: Option<usize>,
    travel: bool,
}

impl MissionState {
    /// A mission with a travel phase per target.
    ///
    /// Only the first `max_targets` questions are used. Fails before
    /// anything else happens if that leaves no target.
    pub fn new(quiz: Quiz, max_targets: usize, reward: u32) -> Result<Self, MissionError> {
        let target_count = quiz.questions.len().min(max_targets);
        quiz.validate(target_count)?;
        info!("Mission started with {} targets", target_count);
        Ok(Self {
            quiz,
            target_count,
            phase: MissionPhase::Traveling(0),
            score: 0,
            reward,
            selection: None,
            travel: true,
        })
    }

    /// The plain quiz mode: every question starts in `Challenge`.
    pub fn new_direct(quiz: Quiz, reward: u32) -> Result<Self, MissionError> {
        let target_count = quiz.questions.len();
        quiz.validate(target_count)?;
        Ok(Self {
            quiz,
            target_count,
            phase: MissionPhase::Challenge(0),
            score: 0,
            reward,
            selection: None,
            travel: false,
        })
    }

    pub fn phase(&self) -> MissionPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn current_target(&self) -> Option<usize> {
        self.phase.target()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.current_target()
            .and_then(|i| self.quiz.questions.get(i))
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    fn illegal(&self, command: &'static str) -> MissionError {
        MissionError::IllegalCommand {
            command,
            phase: self.phase,
        }
    }

    /// Traveling(i) -> Challenge(i). Returns the target index.
    pub fn enter_challenge(&mut self) -> Result<usize, MissionError> {
        match self.phase {
            MissionPhase::Traveling(i) => {
                self.phase = MissionPhase::Challenge(i);
                info!("Reached target {}, challenge begins", i);
                Ok(i)
            }
            _ => Err(self.illegal("enter_challenge")),
        }
    }

    /// Record the answer for the current target. Only the first one counts.
    pub fn select_answer(&mut self, option: usize) -> Result<AnswerOutcome, MissionError> {
        let target = match self.phase {
            MissionPhase::Challenge(i) => i,
            _ => return Err(self.illegal("select_answer")),
        };
        if self.selection.is_some() {
            warn!("Ignoring second answer for target {}", target);
            return Err(MissionError::AlreadyAnswered(target));
        }
        let Some(question) = self.quiz.questions.get(target) else {
            return Err(self.illegal("select_answer"));
        };
        if option >= question.options.len() {
            return Err(MissionError::OptionOutOfRange {
                option,
                count: question.options.len(),
            });
        }
        let correct = option == question.correct_answer;
        let awarded = if correct { self.reward } else { 0 };
        self.selection = Some(option);
        self.score = self.score.saturating_add(awarded);
        info!(
            "Target {} answered with option {} ({}), score {}",
            target,
            option,
            if correct { "correct" } else { "wrong" },
            self.score
        );
        Ok(AnswerOutcome {
            target,
            selected: option,
            correct_answer: question.correct_answer,
            correct,
            awarded,
            score: self.score,
        })
    }

    /// The phase [`advance`](Self::advance) would move to, without moving.
    pub fn next_phase(&self) -> Result<MissionPhase, MissionError> {
        let target = match self.phase {
            MissionPhase::Challenge(i) => i,
            _ => return Err(self.illegal("advance")),
        };
        if self.selection.is_none() {
            return Err(MissionError::NotAnswered(target));
        }
        let next = target + 1;
        Ok(if next >= self.target_count {
            MissionPhase::Completed { score: self.score }
        } else if self.travel {
            MissionPhase::Traveling(next)
        } else {
            MissionPhase::Challenge(next)
        })
    }

    /// Move past an answered target. Returns the new phase.
    pub fn advance(&mut self) -> Result<MissionPhase, MissionError> {
        let phase = self.next_phase()?;
        match phase {
            MissionPhase::Completed { score } => info!("Mission completed with score {}", score),
            MissionPhase::Traveling(next) => info!("Traveling to target {}", next),
            _ => {}
        }
        self.selection = None;
        self.phase = phase;
        Ok(phase)
    }

    pub fn cancel(&mut self) -> Result<(), MissionError> {
        if self.is_terminal() {
            return Err(self.illegal("cancel"));
        }
        info!("Mission cancelled in phase {:?}", self.phase);
        self.phase = MissionPhase::Cancelled;
        self.selection = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz(correct: &[usize]) -> Quiz {
        Quiz {
            questions: correct
                .iter()
                .enumerate()
                .map(|(i, c)| Question {
                    id: format!("q{}", i),
                    text: format!("question {}", i),
                    image_url: None,
                    options: vec!["a".into(), "b".into(), "c".into()],
                    correct_answer: *c,
                })
                .collect(),
        }
    }

    #[test]
    fn empty_content_is_rejected() {
        assert_eq!(
            MissionState::new(Quiz::default(), 5, 500).unwrap_err(),
            MissionError::EmptyContent
        );
        assert_eq!(
            MissionState::new(quiz(&[0]), 0, 500).unwrap_err(),
            MissionError::EmptyContent
        );
    }

    #[test]
    fn broken_question_is_rejected() {
        let err = MissionState::new(quiz(&[3]), 5, 500).unwrap_err();
        assert!(matches!(err, MissionError::InvalidQuestion { index: 0, .. }));
    }

    #[test]
    fn targets_are_capped() {
        let mission = MissionState::new(quiz(&[0; 7]), 5, 500).unwrap();
        assert_eq!(mission.target_count(), 5);
    }

    #[test]
    fn reward_is_granted_once() {
        let mut mission = MissionState::new(quiz(&[1]), 5, 500).unwrap();
        mission.enter_challenge().unwrap();
        let outcome = mission.select_answer(1).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.awarded, 500);
        assert_eq!(mission.select_answer(1), Err(MissionError::AlreadyAnswered(0)));
        assert_eq!(mission.score(), 500);
    }

    #[test]
    fn score_saturates_at_the_maximum() {
        let mut mission = MissionState::new_direct(quiz(&[0, 0]), u32::MAX).unwrap();
        mission.select_answer(0).unwrap();
        mission.advance().unwrap();
        let outcome = mission.select_answer(0).unwrap();
        assert_eq!(outcome.awarded, u32::MAX);
        assert_eq!(outcome.score, u32::MAX);
        assert_eq!(mission.advance(), Ok(MissionPhase::Completed { score: u32::MAX }));
    }

    #[test]
    fn next_phase_does_not_move() {
        let mut mission = MissionState::new(quiz(&[0, 1]), 5, 500).unwrap();
        assert!(mission.next_phase().is_err());
        mission.enter_challenge().unwrap();
        mission.select_answer(0).unwrap();
        assert_eq!(mission.next_phase(), Ok(MissionPhase::Traveling(1)));
        assert_eq!(mission.phase(), MissionPhase::Challenge(0));
        assert_eq!(mission.selection(), Some(0));
        assert_eq!(mission.advance(), Ok(MissionPhase::Traveling(1)));
        assert_eq!(mission.selection(), None);
    }

    #[test]
    fn answers_only_during_challenge() {
        let mut mission = MissionState::new(quiz(&[1, 0]), 5, 500).unwrap();
        assert!(matches!(
            mission.select_answer(1),
            Err(MissionError::IllegalCommand { .. })
        ));
        assert_eq!(mission.advance().unwrap_err().to_string(), "`advance` is not allowed in phase Traveling(0)");
        mission.enter_challenge().unwrap();
        assert_eq!(mission.advance(), Err(MissionError::NotAnswered(0)));
        assert_eq!(
            mission.select_answer(9),
            Err(MissionError::OptionOutOfRange { option: 9, count: 3 })
        );
        assert_eq!(mission.selection(), None);
    }

    #[test]
    fn terminal_states_reject_commands() {
        let mut mission = MissionState::new(quiz(&[0]), 5, 500).unwrap();
        mission.cancel().unwrap();
        assert!(mission.cancel().is_err());
        assert!(mission.enter_challenge().is_err());
        assert_eq!(mission.phase(), MissionPhase::Cancelled);
        assert_eq!(mission.current_question(), None);
    }

    #[test]
    fn direct_mode_skips_travel() {
        let mut mission = MissionState::new_direct(quiz(&[0, 2]), 100).unwrap();
        assert_eq!(mission.phase(), MissionPhase::Challenge(0));
        mission.select_answer(0).unwrap();
        assert_eq!(mission.advance(), Ok(MissionPhase::Challenge(1)));
        mission.select_answer(2).unwrap();
        assert_eq!(mission.advance(), Ok(MissionPhase::Completed { score: 200 }));
    }

    #[test]
    fn quiz_from_toml() {
        let quiz = Quiz::from_toml_str(
            r#"
            [[questions]]
            id = "mars"
            text = "Which planet is red?"
            options = ["Venus", "Mars"]
            correct_answer = 1
            "#,
        )
        .unwrap();
        assert_eq!(quiz.questions.len(), 1);
        assert_eq!(quiz.questions[0].image_url, None);
    }
}
