//! Questionnaire session state machine.
//!
//! A session walks the steps of the content's flow script. Each step either shows a fixed
//! question or looks its question up in a branch table keyed by the category or emotion recorded
//! by an earlier answer:
//!
//! ```text
//!   Asking { step: 0 } --select--> Asking { step: 1, category, emotion } --> ... --> Finished
//!          ^                                   |
//!          +------- no branch question --------+        (answers cleared)
//! ```
//!
//! `Finished` is left only through [`ComfortSession::restart`].

use crate::content::{AnswerOption, Category, ComfortContent, FlowStep, Question};
use crate::engine::{self, Recommendation, ScoringConfig};
use crate::{SolaceError, SolaceResult, Tag};
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The option chosen at one step.
#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
    pub step: usize,
    pub question_id: u32,
    pub option: AnswerOption,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FlowState {
    /// Waiting for an answer at `step`; `category` and `emotion` select branch questions.
    Asking {
        step: usize,
        category: Option<Category>,
        emotion: Option<String>,
    },
    /// The result is on screen.
    Finished,
}

/// What a step operation did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Advanced { step: usize },
    Completed,
    /// `step` had no question for the recorded branch key; the session is back at step 0.
    Reset { step: usize, key: Option<String> },
}

/// One run through the questionnaire.
#[derive(Clone, Debug)]
pub struct ComfortSession {
    content: Arc<ComfortContent>,
    scoring: ScoringConfig,
    state: FlowState,
    answers: BTreeMap<usize, Answer>,
    recommendation: Option<Recommendation>,
}

impl ComfortSession {
    pub fn new(content: Arc<ComfortContent>, scoring: ScoringConfig) -> Self {
        Self {
            content,
            scoring,
            state: Self::initial_state(),
            answers: BTreeMap::new(),
            recommendation: None,
        }
    }

    fn initial_state() -> FlowState {
        FlowState::Asking {
            step: 0,
            category: None,
            emotion: None,
        }
    }

    pub fn content(&self) -> &ComfortContent {
        &self.content
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Current step index, or `None` once finished.
    pub fn step(&self) -> Option<usize> {
        match self.state {
            FlowState::Asking { step, .. } => Some(step),
            FlowState::Finished => None,
        }
    }

    pub fn total_steps(&self) -> usize {
        self.content.steps().len()
    }

    /// One-based position and step count, for progress display.
    pub fn progress(&self) -> (usize, usize) {
        let total = self.total_steps();
        match self.step() {
            Some(step) => (step + 1, total),
            None => (total, total),
        }
    }

    pub fn is_last_step(&self) -> bool {
        self.step().map_or(false, |step| step + 1 == self.total_steps())
    }

    /// Answers in step order.
    pub fn answers(&self) -> impl Iterator<Item = &Answer> {
        self.answers.values()
    }

    /// Option previously chosen at the current step, if any.
    pub fn selected_option(&self) -> Option<&AnswerOption> {
        self.step()
            .and_then(|step| self.answers.get(&step))
            .map(|answer| &answer.option)
    }

    pub fn recommendation(&self) -> Option<&Recommendation> {
        self.recommendation.as_ref()
    }

    /// Question shown at the current step.
    ///
    /// `None` when finished, or when the step branches on a key that has no question.
    pub fn current_question(&self) -> Option<&Question> {
        match &self.state {
            FlowState::Asking {
                step,
                category,
                emotion,
            } => self
                .content
                .steps()
                .get(*step)
                .and_then(|s| s.resolve(*category, emotion.as_deref())),
            FlowState::Finished => None,
        }
    }

    /// Records the chosen option and moves the session on.
    ///
    /// Re-answering a step discards the answers recorded after it, since they may belong to a
    /// different branch.
    ///
    /// # Errors
    ///
    /// - `SolaceError::SessionFinished` if the result is already shown
    /// - `SolaceError::UnknownOption` if the current question does not offer `option_id`
    pub fn select_option<R: Rng + ?Sized>(
        &mut self,
        option_id: &str,
        rng: &mut R,
    ) -> SolaceResult<Transition> {
        let step = self.step().ok_or(SolaceError::SessionFinished)?;

        let Some(question) = self.current_question() else {
            return Ok(self.reset_missing_branch(step));
        };
        let question_id = question.id;
        let option = question
            .option(option_id)
            .cloned()
            .ok_or_else(|| SolaceError::UnknownOption {
                step,
                option_id: option_id.to_owned(),
            })?;

        if self.is_last_step() {
            let tags = self.tags_with_last(step, &option);
            self.record(step, question_id, option);
            self.finish(&tags, rng);
            return Ok(Transition::Completed);
        }

        self.record(step, question_id, option);
        Ok(self.advance_to(step + 1))
    }

    /// Moves to the next step without choosing, or shows the result at the last step.
    pub fn go_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SolaceResult<Transition> {
        let step = self.step().ok_or(SolaceError::SessionFinished)?;
        if self.is_last_step() {
            self.show_result(rng)?;
            return Ok(Transition::Completed);
        }
        Ok(self.advance_to(step + 1))
    }

    /// Returns to the previous step. Does nothing at step 0.
    pub fn go_back(&mut self) -> SolaceResult<()> {
        let step = self.step().ok_or(SolaceError::SessionFinished)?;
        if step > 0 {
            self.state = self.asking_state(step - 1);
        }
        Ok(())
    }

    /// Scores the committed answers and shows the result.
    ///
    /// Only available at the last step; once finished it returns the existing result.
    pub fn show_result<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SolaceResult<&Recommendation> {
        if self.state == FlowState::Finished {
            return self
                .recommendation
                .as_ref()
                .ok_or(SolaceError::SessionFinished);
        }
        if !self.is_last_step() {
            return Err(SolaceError::InvalidInput(
                "the result is available from the last question".into(),
            ));
        }

        let tags: Vec<Tag> = self
            .answers
            .values()
            .flat_map(|a| a.option.tags.iter().cloned())
            .collect();
        self.finish(&tags, rng);
        self.recommendation
            .as_ref()
            .ok_or(SolaceError::SessionFinished)
    }

    /// Draws a different selection from the same candidate pool.
    pub fn new_selection<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> SolaceResult<&Recommendation> {
        let output_size = self.scoring.output_size();
        let recommendation = self.recommendation.as_mut().ok_or_else(|| {
            SolaceError::InvalidInput("no result to draw new verses from".into())
        })?;
        recommendation.redraw(output_size, rng);
        Ok(&*recommendation)
    }

    /// Clears all answers and returns to the first question.
    pub fn restart(&mut self) {
        self.answers.clear();
        self.recommendation = None;
        self.state = Self::initial_state();
    }

    fn record(&mut self, step: usize, question_id: u32, option: AnswerOption) {
        self.answers.retain(|&s, _| s < step);
        self.answers.insert(
            step,
            Answer {
                step,
                question_id,
                option,
            },
        );
    }

    /// Tags of every committed answer except the one at `step`, followed by `last`'s tags.
    fn tags_with_last(&self, step: usize, last: &AnswerOption) -> Vec<Tag> {
        self.answers
            .values()
            .filter(|a| a.step != step)
            .flat_map(|a| a.option.tags.iter().cloned())
            .chain(last.tags.iter().cloned())
            .collect()
    }

    fn finish<R: Rng + ?Sized>(&mut self, tags: &[Tag], rng: &mut R) {
        let recommendation = engine::score(tags, self.content.verses(), &self.scoring, rng);
        tracing::info!(
            "questionnaire finished: {} answers, {} verses recommended",
            self.answers.len(),
            recommendation.verses().len()
        );
        self.recommendation = Some(recommendation);
        self.state = FlowState::Finished;
    }

    fn advance_to(&mut self, next: usize) -> Transition {
        let state = self.asking_state(next);
        if let FlowState::Asking {
            category, emotion, ..
        } = &state
        {
            let has_question = self
                .content
                .steps()
                .get(next)
                .and_then(|s| s.resolve(*category, emotion.as_deref()))
                .is_some();
            if !has_question {
                return self.reset_missing_branch_with(next, *category, emotion.clone());
            }
        }
        self.state = state;
        Transition::Advanced { step: next }
    }

    /// Asking state for `step`, with branch keys taken from the answers before it.
    fn asking_state(&self, step: usize) -> FlowState {
        let earlier = || self.answers.range(..step).rev().map(|(_, a)| &a.option);
        FlowState::Asking {
            step,
            category: earlier().find_map(|o| o.category),
            emotion: earlier().find_map(|o| o.emotion.clone()),
        }
    }

    fn reset_missing_branch(&mut self, step: usize) -> Transition {
        let (category, emotion) = match &self.state {
            FlowState::Asking {
                category, emotion, ..
            } => (*category, emotion.clone()),
            FlowState::Finished => (None, None),
        };
        self.reset_missing_branch_with(step, category, emotion)
    }

    fn reset_missing_branch_with(
        &mut self,
        step: usize,
        category: Option<Category>,
        emotion: Option<String>,
    ) -> Transition {
        let key = match self.content.steps().get(step) {
            Some(FlowStep::ByEmotion(_)) => emotion,
            _ => category.map(|c| c.as_str().to_owned()),
        };
        tracing::warn!(
            "no question for step {} with branch key {:?}; restarting questionnaire",
            step,
            key
        );
        self.restart();
        Transition::Reset { step, key }
    }
}
