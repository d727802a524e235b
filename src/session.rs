//! Quiz session state machine and the per-question answer log.
//!
//! `empty -> answering <-> answered -> ... -> finished`
//!
//! Transitions never fail. A call whose precondition does not hold leaves the
//! session untouched and reports `Transition::Ignored` with the reason.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::domain::Question;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
  Empty,
  Answering,
  Answered,
  Finished,
}

/// Why a transition was ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Misuse {
  /// `load` with an empty question list.
  EmptyLoad,
  /// No questions loaded.
  NoQuestions,
  /// `confirm` twice on the same question, or `select` after confirming.
  AlreadyConfirmed,
  /// `advance` before `confirm`.
  NotConfirmed,
  Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
  Applied,
  Ignored(Misuse),
}

impl Transition {
  pub fn applied(&self) -> bool {
    matches!(self, Transition::Applied)
  }
}

#[derive(Clone, Debug, Default)]
pub struct Session {
  questions: Vec<Question>,
  current_index: usize,
  selected_answer: Option<String>,
  is_answered: bool,
  score: u32,
  finished: bool,
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn questions(&self) -> &[Question] {
    &self.questions
  }

  pub fn current_index(&self) -> usize {
    self.current_index
  }

  pub fn selected_answer(&self) -> Option<&str> {
    self.selected_answer.as_deref()
  }

  pub fn is_answered(&self) -> bool {
    self.is_answered
  }

  pub fn score(&self) -> u32 {
    self.score
  }

  pub fn finished(&self) -> bool {
    self.finished
  }

  pub fn current_question(&self) -> Option<&Question> {
    self.questions.get(self.current_index)
  }

  pub fn phase(&self) -> SessionPhase {
    if self.questions.is_empty() {
      SessionPhase::Empty
    } else if self.finished {
      SessionPhase::Finished
    } else if self.is_answered {
      SessionPhase::Answered
    } else {
      SessionPhase::Answering
    }
  }

  /// Start a new run over `questions`. An empty list is rejected.
  pub fn load(&mut self, questions: Vec<Question>) -> Transition {
    if questions.is_empty() {
      return Transition::Ignored(Misuse::EmptyLoad);
    }
    *self = Self { questions, ..Self::default() };
    Transition::Applied
  }

  /// Drop the current run.
  pub fn reset(&mut self) {
    *self = Self::default();
  }

  /// Choose an answer for the current question. Last call before `confirm` wins.
  pub fn select(&mut self, answer: impl Into<String>) -> Transition {
    match self.phase() {
      SessionPhase::Empty => Transition::Ignored(Misuse::NoQuestions),
      SessionPhase::Finished => Transition::Ignored(Misuse::Finished),
      SessionPhase::Answered => Transition::Ignored(Misuse::AlreadyConfirmed),
      SessionPhase::Answering => {
        self.selected_answer = Some(answer.into());
        Transition::Applied
      }
    }
  }

  /// Lock in the current selection, scoring it if correct.
  pub fn confirm(&mut self) -> Transition {
    match self.phase() {
      SessionPhase::Empty => Transition::Ignored(Misuse::NoQuestions),
      SessionPhase::Finished => Transition::Ignored(Misuse::Finished),
      SessionPhase::Answered => Transition::Ignored(Misuse::AlreadyConfirmed),
      SessionPhase::Answering => {
        let correct = self.selected_answer.as_deref().is_some_and(|a| self.is_correct(a));
        self.is_answered = true;
        if correct {
          self.score += 1;
        }
        Transition::Applied
      }
    }
  }

  /// Move to the next question, or finish on the last one (index unchanged).
  pub fn advance(&mut self) -> Transition {
    match self.phase() {
      SessionPhase::Empty => Transition::Ignored(Misuse::NoQuestions),
      SessionPhase::Finished => Transition::Ignored(Misuse::Finished),
      SessionPhase::Answering => Transition::Ignored(Misuse::NotConfirmed),
      SessionPhase::Answered => {
        if self.current_index + 1 >= self.questions.len() {
          self.finished = true;
        } else {
          self.current_index += 1;
          self.selected_answer = None;
          self.is_answered = false;
        }
        Transition::Applied
      }
    }
  }

  /// Incorrect answers plus the correct one, freshly shuffled on every call.
  pub fn shuffled_choices(&self) -> Vec<String> {
    self.shuffled_choices_with(&mut rand::thread_rng())
  }

  pub fn shuffled_choices_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
    let Some(q) = self.current_question() else {
      return Vec::new();
    };
    let mut choices = q.incorrect_answers.clone();
    choices.push(q.correct_answer.clone());
    choices.shuffle(rng);
    choices
  }

  pub fn is_correct(&self, answer: &str) -> bool {
    self.current_question().is_some_and(|q| q.correct_answer == answer)
  }
}

/// One answer slot per question, addressed by question index.
/// Slots start out unanswered (`None`) when a run is loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnswerLog {
  slots: Vec<Option<String>>,
}

impl AnswerLog {
  pub fn with_len(len: usize) -> Self {
    Self { slots: vec![None; len] }
  }

  pub fn slots(&self) -> &[Option<String>] {
    &self.slots
  }

  pub fn get(&self, index: usize) -> Option<&str> {
    self.slots.get(index).and_then(|s| s.as_deref())
  }

  /// Write the session's current selection into the slot for its current index.
  /// Calling it again for the same question overwrites that slot.
  pub fn record_current(&mut self, session: &Session) -> Transition {
    let index = session.current_index();
    match self.slots.get_mut(index) {
      Some(slot) if !session.questions().is_empty() => {
        *slot = session.selected_answer().map(str::to_string);
        Transition::Applied
      }
      _ => Transition::Ignored(Misuse::NoQuestions),
    }
  }
}
