use crate::core::session::{Applied, Phase, PhaseRequest, SessionMachine, Snapshot};
use crate::domain::model::{BasicResult, InterpretiveResult, Query};
use crate::domain::ports::AnalysisService;
use crate::utils::error::{ErrorKind, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::{self, JoinError, JoinSet};

/// A phase result tagged with the epoch of the request that produced it.
#[derive(Debug)]
struct PhaseOutcome {
    epoch: u64,
    result: PhaseResult,
}

#[derive(Debug)]
enum PhaseResult {
    Basic(Result<BasicResult>),
    Interpretation(Result<InterpretiveResult>),
}

impl PhaseResult {
    fn failed(phase: Phase, error: ErrorKind) -> Self {
        match phase {
            Phase::Basic => PhaseResult::Basic(Err(error)),
            Phase::Interpretation => PhaseResult::Interpretation(Err(error)),
        }
    }
}

/// What one call to [`ProgressiveOrchestrator::advance`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// The result moved the session; every snapshot published on the way, in order.
    Applied(Vec<Snapshot>),
    /// The result belonged to an abandoned epoch and was dropped.
    Discarded { epoch: u64, phase: Phase },
}

/// Drives the two-phase analysis against an [`AnalysisService`].
///
/// Remote calls run as spawned tasks; their results come back to the
/// orchestrator only through [`advance`](Self::advance), where they are
/// applied to the session one at a time. Calls of an abandoned epoch are
/// left to finish and their results are discarded on arrival.
///
/// A task that panics or is aborted still ends its phase: the failure is
/// applied as [`ErrorKind::TaskFailed`] under the epoch it was spawned for.
///
/// Every transition is published as a [`Snapshot`] on a watch channel.
pub struct ProgressiveOrchestrator<S: AnalysisService + 'static> {
    service: Arc<S>,
    machine: SessionMachine,
    tasks: JoinSet<PhaseOutcome>,
    in_flight: HashMap<task::Id, (u64, Phase)>,
    snapshots: watch::Sender<Snapshot>,
}

impl<S: AnalysisService + 'static> ProgressiveOrchestrator<S> {
    pub fn new(service: Arc<S>) -> Self {
        let machine = SessionMachine::new();
        let (snapshots, _) = watch::channel(machine.snapshot());
        Self {
            service,
            machine,
            tasks: JoinSet::new(),
            in_flight: HashMap::new(),
            snapshots,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.machine.snapshot()
    }

    /// Calls whose results have not been collected yet, stale ones included.
    pub fn pending_calls(&self) -> usize {
        self.tasks.len()
    }

    /// Start a new session, abandoning any session in progress.
    ///
    /// The session is in `LoadingBasic` when this returns; the basic request
    /// runs in the background. An invalid query is rejected and nothing
    /// changes. Must be called from within a Tokio runtime.
    pub fn start(&mut self, query: Query) -> Result<Snapshot> {
        let request = self.machine.start(query)?;
        self.dispatch(request);
        Ok(self.publish())
    }

    pub fn reset(&mut self) -> Snapshot {
        self.machine.reset();
        self.publish()
    }

    /// Wait for the next remote call to finish and apply its result.
    ///
    /// Returns `None` when no call is outstanding.
    pub async fn advance(&mut self) -> Option<Advance> {
        loop {
            let outcome = match self.tasks.join_next_with_id().await? {
                Ok((id, outcome)) => {
                    self.in_flight.remove(&id);
                    outcome
                }
                Err(e) => match self.lost(e) {
                    Some(outcome) => outcome,
                    None => continue,
                },
            };
            return Some(self.apply(outcome));
        }
    }

    /// Advance until the current session reaches Idle, Complete or Failed.
    pub async fn settle(&mut self) -> Snapshot {
        while !self.machine.status().is_settled() {
            if self.advance().await.is_none() {
                break;
            }
        }
        self.snapshot()
    }

    /// [`start`](Self::start) followed by [`settle`](Self::settle).
    pub async fn run(&mut self, query: Query) -> Result<Snapshot> {
        self.start(query)?;
        Ok(self.settle().await)
    }

    fn apply(&mut self, outcome: PhaseOutcome) -> Advance {
        let PhaseOutcome { epoch, result } = outcome;
        let applied = match result {
            PhaseResult::Basic(result) => self.machine.apply_basic(epoch, result),
            PhaseResult::Interpretation(result) => {
                self.machine.apply_interpretation(epoch, result)
            }
        };

        if let Applied::Discarded { epoch, phase } = applied {
            return Advance::Discarded { epoch, phase };
        }

        let mut published = vec![self.publish()];
        if let Some(request) = self.machine.begin_interpretation() {
            self.dispatch(request);
            published.push(self.publish());
        }
        Advance::Applied(published)
    }

    /// Turn a task that ended without an outcome into a failure of its phase.
    fn lost(&mut self, error: JoinError) -> Option<PhaseOutcome> {
        let Some((epoch, phase)) = self.in_flight.remove(&error.id()) else {
            tracing::error!("Untracked analysis task ended without a result: {}", error);
            return None;
        };
        tracing::error!(
            "{} task for epoch {} ended without a result: {}",
            phase,
            epoch,
            error
        );
        Some(PhaseOutcome {
            epoch,
            result: PhaseResult::failed(phase, ErrorKind::TaskFailed(error.to_string())),
        })
    }

    fn dispatch(&mut self, request: PhaseRequest) {
        let service = self.service.clone();
        let (epoch, phase) = (request.epoch(), request.phase());
        tracing::debug!("Dispatching {} request for epoch {}", phase, epoch);

        let handle = match request {
            PhaseRequest::Basic { epoch, query } => {
                self.tasks.spawn(async move {
                    let result = service.request_basic(&query).await;
                    PhaseOutcome {
                        epoch,
                        result: PhaseResult::Basic(result),
                    }
                })
            }
            PhaseRequest::Interpretation {
                epoch,
                query,
                basic,
            } => {
                self.tasks.spawn(async move {
                    let result = service.request_interpretation(&query, &basic).await;
                    PhaseOutcome {
                        epoch,
                        result: PhaseResult::Interpretation(result),
                    }
                })
            }
        };
        self.in_flight.insert(handle.id(), (epoch, phase));
    }

    fn publish(&self) -> Snapshot {
        let snapshot = self.machine.snapshot();
        self.snapshots.send_replace(snapshot.clone());
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::Status;
    use crate::domain::model::{
        DailyFortune, DirectionAdvice, ElementCounts, FortuneOutlook, Gender, HealthStatus,
        LuckyElements, Personality,
    };
    use crate::utils::error::ErrorKind;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::oneshot;

    type Pending<T> = Mutex<HashMap<String, oneshot::Receiver<Result<T>>>>;

    /// Answers each call when the test releases the matching sender, keyed by query name.
    #[derive(Default)]
    struct Scripted {
        basic: Pending<BasicResult>,
        interpretation: Pending<InterpretiveResult>,
        basic_calls: AtomicUsize,
        interpretation_calls: AtomicUsize,
    }

    impl Scripted {
        fn expect_basic(&self, name: &str) -> oneshot::Sender<Result<BasicResult>> {
            let (tx, rx) = oneshot::channel();
            self.basic.lock().unwrap().insert(name.to_string(), rx);
            tx
        }

        fn expect_interpretation(
            &self,
            name: &str,
        ) -> oneshot::Sender<Result<InterpretiveResult>> {
            let (tx, rx) = oneshot::channel();
            self.interpretation.lock().unwrap().insert(name.to_string(), rx);
            tx
        }
    }

    async fn wait<T>(pending: &Pending<T>, name: &str) -> Result<T> {
        let rx = pending.lock().unwrap().remove(name);
        match rx {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(ErrorKind::NetworkUnavailable("dropped".into()))),
            None => Err(ErrorKind::NetworkUnavailable(format!("unscripted {}", name))),
        }
    }

    #[async_trait]
    impl AnalysisService for Scripted {
        async fn health_check(&self) -> Result<HealthStatus> {
            Err(ErrorKind::NetworkUnavailable("unscripted".into()))
        }

        async fn request_basic(&self, query: &Query) -> Result<BasicResult> {
            self.basic_calls.fetch_add(1, Ordering::SeqCst);
            wait(&self.basic, &query.name).await
        }

        async fn request_interpretation(
            &self,
            query: &Query,
            _basic: &BasicResult,
        ) -> Result<InterpretiveResult> {
            self.interpretation_calls.fetch_add(1, Ordering::SeqCst);
            wait(&self.interpretation, &query.name).await
        }

        async fn request_direction_advice(&self, _direction: &str) -> Result<DirectionAdvice> {
            Err(ErrorKind::NetworkUnavailable("unscripted".into()))
        }

        async fn request_daily_fortune(
            &self,
            _date: Option<NaiveDate>,
            _basic: Option<&BasicResult>,
        ) -> Result<DailyFortune> {
            Err(ErrorKind::NetworkUnavailable("unscripted".into()))
        }
    }

    /// Panics in the given phase and answers the basic phase otherwise.
    struct Crashing {
        phase: Phase,
    }

    #[async_trait]
    impl AnalysisService for Crashing {
        async fn health_check(&self) -> Result<HealthStatus> {
            Err(ErrorKind::NetworkUnavailable("unscripted".into()))
        }

        async fn request_basic(&self, _query: &Query) -> Result<BasicResult> {
            if self.phase == Phase::Basic {
                panic!("basic handler crashed");
            }
            Ok(basic("甲子"))
        }

        async fn request_interpretation(
            &self,
            _query: &Query,
            _basic: &BasicResult,
        ) -> Result<InterpretiveResult> {
            panic!("interpretation handler crashed");
        }

        async fn request_direction_advice(&self, _direction: &str) -> Result<DirectionAdvice> {
            Err(ErrorKind::NetworkUnavailable("unscripted".into()))
        }

        async fn request_daily_fortune(
            &self,
            _date: Option<NaiveDate>,
            _basic: Option<&BasicResult>,
        ) -> Result<DailyFortune> {
            Err(ErrorKind::NetworkUnavailable("unscripted".into()))
        }
    }

    fn query(name: &str) -> Query {
        Query {
            name: name.to_string(),
            year: 1990,
            month: 6,
            day: 15,
            hour: 14,
            gender: Gender::Male,
            location: "北京".to_string(),
        }
    }

    fn basic(year_pillar: &str) -> BasicResult {
        BasicResult {
            year_pillar: year_pillar.to_string(),
            month_pillar: "乙丑".to_string(),
            day_pillar: "丙寅".to_string(),
            hour_pillar: "丁卯".to_string(),
            tiangang: vec![],
            dizhi: vec![],
            wuxing: ElementCounts {
                wood: 2,
                fire: 2,
                earth: 2,
                metal: 1,
                water: 1,
            },
            zodiac: "马".to_string(),
            nayin: "路旁土".to_string(),
        }
    }

    fn interpretation() -> InterpretiveResult {
        InterpretiveResult {
            wuxing_analysis: None,
            personality: Personality {
                traits: vec!["稳重".to_string()],
                strengths: vec!["踏实".to_string()],
                weaknesses: vec!["固执".to_string()],
            },
            fortune: FortuneOutlook {
                career: "上升".to_string(),
                wealth: "平稳".to_string(),
                health: "良好".to_string(),
                relationship: "和谐".to_string(),
            },
            lucky_elements: LuckyElements {
                colors: vec!["黄色".to_string()],
                numbers: vec![5],
                directions: vec!["西南".to_string()],
                avoid_colors: None,
                avoid_directions: None,
                lifestyle_tips: None,
            },
            life_advice: vec!["多运动".to_string()],
            balance_score: 80,
        }
    }

    fn statuses(advance: Option<Advance>) -> Vec<Status> {
        match advance {
            Some(Advance::Applied(snapshots)) => snapshots.into_iter().map(|s| s.status).collect(),
            other => panic!("expected applied snapshots, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_start_is_synchronously_loading() {
        let service = Arc::new(Scripted::default());
        let _basic = service.expect_basic("A");
        let mut orchestrator = ProgressiveOrchestrator::new(service.clone());
        let watcher = orchestrator.subscribe();

        let snapshot = orchestrator.start(query("A")).unwrap();
        assert_eq!(snapshot.status, Status::LoadingBasic);
        assert_eq!(snapshot.epoch, 1);
        assert_eq!(watcher.borrow().status, Status::LoadingBasic);
        assert_eq!(orchestrator.pending_calls(), 1);
    }

    #[tokio::test]
    async fn test_phases_run_in_order() {
        let service = Arc::new(Scripted::default());
        let basic_tx = service.expect_basic("A");
        let interpretation_tx = service.expect_interpretation("A");
        let mut orchestrator = ProgressiveOrchestrator::new(service.clone());

        orchestrator.start(query("A")).unwrap();
        tokio::task::yield_now().await;
        assert_eq!(service.interpretation_calls.load(Ordering::SeqCst), 0);

        basic_tx.send(Ok(basic("甲子"))).unwrap();
        assert_eq!(
            statuses(orchestrator.advance().await),
            vec![Status::BasicReady, Status::LoadingInterpretation]
        );

        interpretation_tx.send(Ok(interpretation())).unwrap();
        assert_eq!(statuses(orchestrator.advance().await), vec![Status::Complete]);
        assert_eq!(service.interpretation_calls.load(Ordering::SeqCst), 1);
        assert!(orchestrator.advance().await.is_none());
    }

    #[tokio::test]
    async fn test_basic_failure_skips_interpretation() {
        let service = Arc::new(Scripted::default());
        let basic_tx = service.expect_basic("A");
        let mut orchestrator = ProgressiveOrchestrator::new(service.clone());

        orchestrator.start(query("A")).unwrap();
        basic_tx
            .send(Err(ErrorKind::ServerRejected("缺少必要字段".into())))
            .unwrap();

        let snapshot = orchestrator.settle().await;
        assert!(matches!(
            snapshot.status,
            Status::Failed {
                phase: Phase::Basic,
                ..
            }
        ));
        assert!(snapshot.basic_result.is_none());
        assert_eq!(service.interpretation_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_late_result_of_first_start_is_discarded() {
        let service = Arc::new(Scripted::default());
        let first_tx = service.expect_basic("first");
        let second_tx = service.expect_basic("second");
        let _second_interpretation = service.expect_interpretation("second");
        let mut orchestrator = ProgressiveOrchestrator::new(service.clone());
        let watcher = orchestrator.subscribe();

        orchestrator.start(query("first")).unwrap();
        orchestrator.start(query("second")).unwrap();

        first_tx.send(Ok(basic("庚午"))).unwrap();
        assert_eq!(
            orchestrator.advance().await,
            Some(Advance::Discarded {
                epoch: 1,
                phase: Phase::Basic
            })
        );
        assert_eq!(watcher.borrow().status, Status::LoadingBasic);
        assert!(watcher.borrow().basic_result.is_none());

        second_tx.send(Ok(basic("甲子"))).unwrap();
        orchestrator.advance().await;

        let published = watcher.borrow().clone();
        assert_eq!(published.epoch, 2);
        assert_eq!(published.basic_result.unwrap().year_pillar, "甲子");
    }

    #[tokio::test]
    async fn test_interpretation_failure_keeps_basic() {
        let service = Arc::new(Scripted::default());
        service
            .expect_basic("A")
            .send(Ok(basic("甲子")))
            .unwrap();
        service
            .expect_interpretation("A")
            .send(Err(ErrorKind::Timeout { after_ms: 90_000 }))
            .unwrap();
        let mut orchestrator = ProgressiveOrchestrator::new(service.clone());

        let snapshot = orchestrator.run(query("A")).await.unwrap();
        assert_eq!(
            snapshot.status,
            Status::Failed {
                phase: Phase::Interpretation,
                error: ErrorKind::Timeout { after_ms: 90_000 }
            }
        );
        assert_eq!(snapshot.basic_result.unwrap().year_pillar, "甲子");
    }

    #[tokio::test]
    async fn test_reset_orphans_pending_call() {
        let service = Arc::new(Scripted::default());
        let basic_tx = service.expect_basic("A");
        let mut orchestrator = ProgressiveOrchestrator::new(service.clone());

        orchestrator.start(query("A")).unwrap();
        assert_eq!(orchestrator.reset().status, Status::Idle);

        basic_tx.send(Ok(basic("甲子"))).unwrap();
        assert!(matches!(
            orchestrator.advance().await,
            Some(Advance::Discarded { epoch: 1, .. })
        ));
        assert_eq!(orchestrator.snapshot().status, Status::Idle);
    }

    #[tokio::test]
    async fn test_invalid_query_starts_nothing() {
        let service = Arc::new(Scripted::default());
        let mut orchestrator = ProgressiveOrchestrator::new(service.clone());
        let mut bad = query("A");
        bad.month = 13;

        assert!(orchestrator.start(bad).is_err());
        assert_eq!(orchestrator.pending_calls(), 0);
        assert_eq!(orchestrator.snapshot().epoch, 0);
        assert_eq!(service.basic_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_panicking_basic_task_fails_the_session() {
        let service = Arc::new(Crashing { phase: Phase::Basic });
        let mut orchestrator = ProgressiveOrchestrator::new(service);
        let watcher = orchestrator.subscribe();

        let snapshot = orchestrator.run(query("A")).await.unwrap();

        assert!(matches!(
            snapshot.status,
            Status::Failed {
                phase: Phase::Basic,
                error: ErrorKind::TaskFailed(_)
            }
        ));
        assert!(snapshot.basic_result.is_none());
        assert_eq!(orchestrator.pending_calls(), 0);
        assert_eq!(watcher.borrow().status, snapshot.status);
    }

    #[tokio::test]
    async fn test_panicking_interpretation_task_keeps_basic() {
        let service = Arc::new(Crashing {
            phase: Phase::Interpretation,
        });
        let mut orchestrator = ProgressiveOrchestrator::new(service);

        let snapshot = orchestrator.run(query("A")).await.unwrap();

        assert!(matches!(
            snapshot.status,
            Status::Failed {
                phase: Phase::Interpretation,
                error: ErrorKind::TaskFailed(_)
            }
        ));
        assert_eq!(snapshot.basic_result.unwrap().year_pillar, "甲子");
    }

    #[tokio::test]
    async fn test_panic_of_abandoned_epoch_is_discarded() {
        let service = Arc::new(Crashing { phase: Phase::Basic });
        let mut orchestrator = ProgressiveOrchestrator::new(service);

        orchestrator.start(query("A")).unwrap();
        orchestrator.reset();

        assert_eq!(
            orchestrator.advance().await,
            Some(Advance::Discarded {
                epoch: 1,
                phase: Phase::Basic
            })
        );
        assert_eq!(orchestrator.snapshot().status, Status::Idle);
    }
}
