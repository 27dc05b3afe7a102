//! Pre-answered prompts.

use std::collections::VecDeque;

use unholy_core::{Confirmation, Interaction, Result, Step};

/// [`Interaction`] that answers confirmations from a queue and records
/// everything it is shown.
///
/// Once the queue is empty every further confirmation gets `default`.
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    answers: VecDeque<bool>,
    default: bool,
    pub asked: Vec<Confirmation>,
    pub steps: Vec<Step>,
}

impl ScriptedInteraction {
    /// Answers yes to everything.
    pub fn approving() -> Self {
        Self {
            default: true,
            ..Default::default()
        }
    }

    /// Answers no to everything.
    pub fn declining() -> Self {
        Self::default()
    }

    pub fn with_answers(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Default::default()
        }
    }
}

impl Interaction for ScriptedInteraction {
    fn confirm(&mut self, confirmation: &Confirmation) -> Result<bool> {
        self.asked.push(confirmation.clone());
        Ok(self.answers.pop_front().unwrap_or(self.default))
    }

    fn progress(&mut self, step: &Step) {
        self.steps.push(step.clone());
    }
}
