//! Step-through resolution state machine.
//!
//! ```text
//! Idle -> Presenting(i) -> Presenting(next unprocessed) -> ... -> AllProcessed -> Committing -> Idle
//! ```
//!
//! Navigation is free (the user may jump to any unprocessed candidate), so
//! the next candidate after a resolution is found by [`advance`]: scan
//! forward from the cursor, then wrap to the start. Completion is checked
//! before scanning, so the last resolution ends the session directly.

use serde::Serialize;

use crate::duplicate::{DuplicateCandidate, ResolutionAction};
use crate::error::CoreError;

/// Phase of a wizard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "index", rename_all = "snake_case")]
pub enum WizardPhase {
    Idle,
    Presenting(usize),
    AllProcessed,
    Committing,
}

/// Result of [`advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Done,
}

/// Pick the next unprocessed candidate after `cursor`.
///
/// Returns [`Advance::Done`] when every candidate is processed, including
/// for an empty slice.
pub fn advance(candidates: &[DuplicateCandidate], cursor: usize) -> Advance {
    if candidates.iter().all(|c| c.processed) {
        return Advance::Done;
    }

    let len = candidates.len();
    let cursor = cursor.min(len - 1);

    (cursor + 1..len)
        .chain(0..=cursor)
        .find(|&i| !candidates[i].processed)
        .map_or(Advance::Done, Advance::Next)
}

/// Outcome of one [`WizardState::resolve`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    /// Index of the candidate that was just resolved.
    pub index: usize,
    pub action: ResolutionAction,
    pub next: Advance,
}

/// Wizard session state: phase, candidates and cursor.
#[derive(Debug, Clone, Serialize)]
pub struct WizardState {
    pub phase: WizardPhase,
    pub candidates: Vec<DuplicateCandidate>,
    pub cursor: usize,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            phase: WizardPhase::Idle,
            candidates: Vec::new(),
            cursor: 0,
        }
    }
}

impl WizardState {
    /// Open a session over `candidates`. With no candidates the session is
    /// immediately [`WizardPhase::AllProcessed`].
    pub fn start(candidates: Vec<DuplicateCandidate>) -> Self {
        let phase = match advance(&candidates, candidates.len().saturating_sub(1)) {
            Advance::Next(i) => WizardPhase::Presenting(i),
            Advance::Done => WizardPhase::AllProcessed,
        };
        let cursor = match phase {
            WizardPhase::Presenting(i) => i,
            _ => 0,
        };
        Self {
            phase,
            candidates,
            cursor,
        }
    }

    /// The candidate currently presented, if any.
    pub fn current(&self) -> Option<&DuplicateCandidate> {
        match self.phase {
            WizardPhase::Presenting(i) => self.candidates.get(i),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.candidates.iter().all(|c| c.processed)
    }

    pub fn remaining(&self) -> usize {
        self.candidates.iter().filter(|c| !c.processed).count()
    }

    /// Jump to another unprocessed candidate.
    pub fn select(&mut self, index: usize) -> Result<(), CoreError> {
        self.require_presenting()?;
        let candidate = self.candidates.get(index).ok_or_else(|| {
            CoreError::Validation(format!(
                "Duplicate index {index} out of range (0..{})",
                self.candidates.len()
            ))
        })?;
        if candidate.processed {
            return Err(CoreError::Conflict(format!(
                "Duplicate '{}' has already been resolved",
                candidate.imported.name
            )));
        }
        self.cursor = index;
        self.phase = WizardPhase::Presenting(index);
        Ok(())
    }

    /// Apply `action` to the presented candidate and move on.
    pub fn resolve(&mut self, action: ResolutionAction) -> Result<Resolved, CoreError> {
        let index = self.require_presenting()?;
        let candidate = &mut self.candidates[index];
        if !candidate.resolve(action) {
            return Err(CoreError::Conflict(format!(
                "Duplicate '{}' has already been resolved",
                candidate.imported.name
            )));
        }

        let next = advance(&self.candidates, index);
        match next {
            Advance::Next(i) => {
                self.cursor = i;
                self.phase = WizardPhase::Presenting(i);
            }
            Advance::Done => self.phase = WizardPhase::AllProcessed,
        }

        Ok(Resolved {
            index,
            action,
            next,
        })
    }

    /// Abandon the session: every unprocessed candidate is implicitly
    /// skipped. Returns how many were skipped this way.
    pub fn cancel(&mut self) -> usize {
        let mut skipped = 0;
        for candidate in &mut self.candidates {
            if candidate.resolve(ResolutionAction::Skip) {
                skipped += 1;
            }
        }
        if self.phase != WizardPhase::Committing {
            self.phase = WizardPhase::AllProcessed;
        }
        skipped
    }

    /// `AllProcessed -> Committing`.
    pub fn begin_commit(&mut self) -> Result<(), CoreError> {
        match self.phase {
            WizardPhase::AllProcessed | WizardPhase::Committing => {
                self.phase = WizardPhase::Committing;
                Ok(())
            }
            other => Err(CoreError::Conflict(format!(
                "Cannot commit while wizard is {other:?}"
            ))),
        }
    }

    /// `Committing -> Idle`, releasing the candidates.
    pub fn finish(&mut self) -> Vec<DuplicateCandidate> {
        self.phase = WizardPhase::Idle;
        self.cursor = 0;
        std::mem::take(&mut self.candidates)
    }

    /// Candidates resolved with `action`.
    pub fn with_action(&self, action: ResolutionAction) -> impl Iterator<Item = &DuplicateCandidate> {
        self.candidates
            .iter()
            .filter(move |c| c.action == Some(action))
    }

    fn require_presenting(&self) -> Result<usize, CoreError> {
        match self.phase {
            WizardPhase::Presenting(i) => Ok(i),
            other => Err(CoreError::Conflict(format!(
                "No duplicate is being presented (wizard is {other:?})"
            ))),
        }
    }
}
