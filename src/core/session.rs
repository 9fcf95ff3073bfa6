//! Session state machine for the two-phase analysis.
//!
//! ```text
//! Idle -> LoadingBasic -> BasicReady -> LoadingInterpretation -> Complete
//!              |                                |
//!              +-> Failed(basic)                +-> Failed(interpretation), basic kept
//! ```
//!
//! The machine is synchronous and performs no I/O. It hands out
//! [`PhaseRequest`]s tagged with the epoch they belong to and accepts results
//! carrying that epoch back. A result whose epoch is not the current one is
//! dropped without touching the session.

use crate::domain::model::{BasicResult, InterpretiveResult, Query};
use crate::utils::error::{ErrorKind, Result};
use crate::utils::validation::Validate;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Basic,
    Interpretation,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Basic => f.write_str("basic"),
            Phase::Interpretation => f.write_str("interpretation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    Idle,
    LoadingBasic,
    BasicReady,
    LoadingInterpretation,
    Complete,
    Failed { phase: Phase, error: ErrorKind },
}

impl Status {
    /// No call for the current epoch is outstanding.
    pub fn is_settled(&self) -> bool {
        matches!(self, Status::Idle | Status::Complete | Status::Failed { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            Status::Idle => "Idle",
            Status::LoadingBasic => "LoadingBasic",
            Status::BasicReady => "BasicReady",
            Status::LoadingInterpretation => "LoadingInterpretation",
            Status::Complete => "Complete",
            Status::Failed { .. } => "Failed",
        }
    }
}

/// Immutable view of the session, published after every transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub epoch: u64,
    pub status: Status,
    pub basic_result: Option<Arc<BasicResult>>,
    pub interpretive_result: Option<Arc<InterpretiveResult>>,
    pub error: Option<ErrorKind>,
}

/// Work the machine asks its driver to perform.
#[derive(Debug, Clone)]
pub enum PhaseRequest {
    Basic {
        epoch: u64,
        query: Arc<Query>,
    },
    Interpretation {
        epoch: u64,
        query: Arc<Query>,
        basic: Arc<BasicResult>,
    },
}

impl PhaseRequest {
    pub fn epoch(&self) -> u64 {
        match self {
            PhaseRequest::Basic { epoch, .. } | PhaseRequest::Interpretation { epoch, .. } => {
                *epoch
            }
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            PhaseRequest::Basic { .. } => Phase::Basic,
            PhaseRequest::Interpretation { .. } => Phase::Interpretation,
        }
    }
}

/// What became of a result handed back to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// The result belonged to the current epoch and moved the session forward.
    Accepted,
    /// The result belonged to an abandoned epoch, or arrived in a state that
    /// no longer waits for it, and was dropped.
    Discarded { epoch: u64, phase: Phase },
}

// Results are carried by the stage that owns them, so a stage without a
// BasicResult cannot be asked for one.
#[derive(Debug, Clone)]
enum Stage {
    Idle,
    LoadingBasic,
    BasicReady(Arc<BasicResult>),
    LoadingInterpretation(Arc<BasicResult>),
    Complete(Arc<BasicResult>, Arc<InterpretiveResult>),
    FailedBasic(ErrorKind),
    FailedInterpretation(Arc<BasicResult>, ErrorKind),
}

#[derive(Debug)]
pub struct SessionMachine {
    epoch: u64,
    query: Option<Arc<Query>>,
    stage: Stage,
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMachine {
    pub fn new() -> Self {
        Self {
            epoch: 0,
            query: None,
            stage: Stage::Idle,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn query(&self) -> Option<&Query> {
        self.query.as_deref()
    }

    pub fn status(&self) -> Status {
        match &self.stage {
            Stage::Idle => Status::Idle,
            Stage::LoadingBasic => Status::LoadingBasic,
            Stage::BasicReady(_) => Status::BasicReady,
            Stage::LoadingInterpretation(_) => Status::LoadingInterpretation,
            Stage::Complete(..) => Status::Complete,
            Stage::FailedBasic(error) => Status::Failed {
                phase: Phase::Basic,
                error: error.clone(),
            },
            Stage::FailedInterpretation(_, error) => Status::Failed {
                phase: Phase::Interpretation,
                error: error.clone(),
            },
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        let (basic_result, interpretive_result, error) = match &self.stage {
            Stage::Idle | Stage::LoadingBasic => (None, None, None),
            Stage::BasicReady(basic) | Stage::LoadingInterpretation(basic) => {
                (Some(basic.clone()), None, None)
            }
            Stage::Complete(basic, interpretation) => {
                (Some(basic.clone()), Some(interpretation.clone()), None)
            }
            Stage::FailedBasic(error) => (None, None, Some(error.clone())),
            Stage::FailedInterpretation(basic, error) => {
                (Some(basic.clone()), None, Some(error.clone()))
            }
        };

        Snapshot {
            epoch: self.epoch,
            status: self.status(),
            basic_result,
            interpretive_result,
            error,
        }
    }

    /// Begin a new session from any state.
    ///
    /// An invalid query is rejected before anything changes. Otherwise the
    /// epoch advances, which orphans every call still in flight for the old
    /// one, prior results are cleared and the basic phase is requested.
    pub fn start(&mut self, query: Query) -> Result<PhaseRequest> {
        query.validate()?;

        let query = Arc::new(query);
        self.epoch += 1;
        self.query = Some(query.clone());
        self.move_to(Stage::LoadingBasic);

        Ok(PhaseRequest::Basic {
            epoch: self.epoch,
            query,
        })
    }

    /// Back to Idle; late results of the abandoned epoch will be discarded.
    pub fn reset(&mut self) {
        self.epoch += 1;
        self.query = None;
        self.move_to(Stage::Idle);
    }

    pub fn apply_basic(&mut self, epoch: u64, result: Result<BasicResult>) -> Applied {
        if epoch != self.epoch || !matches!(self.stage, Stage::LoadingBasic) {
            return self.discard(epoch, Phase::Basic);
        }

        match result {
            Ok(basic) => self.move_to(Stage::BasicReady(Arc::new(basic))),
            Err(error) => {
                tracing::warn!("Basic phase failed (epoch {}): {}", epoch, error);
                self.move_to(Stage::FailedBasic(error));
            }
        }
        Applied::Accepted
    }

    /// BasicReady -> LoadingInterpretation. Returns `None` in any other state,
    /// so at most one interpretation request exists per epoch.
    pub fn begin_interpretation(&mut self) -> Option<PhaseRequest> {
        let basic = match &self.stage {
            Stage::BasicReady(basic) => basic.clone(),
            _ => return None,
        };
        let query = self.query.clone()?;

        self.move_to(Stage::LoadingInterpretation(basic.clone()));
        Some(PhaseRequest::Interpretation {
            epoch: self.epoch,
            query,
            basic,
        })
    }

    pub fn apply_interpretation(
        &mut self,
        epoch: u64,
        result: Result<InterpretiveResult>,
    ) -> Applied {
        let basic = match &self.stage {
            Stage::LoadingInterpretation(basic) if epoch == self.epoch => basic.clone(),
            _ => return self.discard(epoch, Phase::Interpretation),
        };

        match result {
            Ok(interpretation) => self.move_to(Stage::Complete(basic, Arc::new(interpretation))),
            Err(error) => {
                tracing::warn!("Interpretation phase failed (epoch {}): {}", epoch, error);
                self.move_to(Stage::FailedInterpretation(basic, error));
            }
        }
        Applied::Accepted
    }

    fn move_to(&mut self, next: Stage) {
        let from = self.status().name();
        self.stage = next;
        tracing::info!(
            "Session epoch {}: {} -> {}",
            self.epoch,
            from,
            self.status().name()
        );
    }

    fn discard(&self, epoch: u64, phase: Phase) -> Applied {
        tracing::debug!(
            "Discarding {} result for epoch {} (current epoch {})",
            phase,
            epoch,
            self.epoch
        );
        Applied::Discarded { epoch, phase }
    }
}
