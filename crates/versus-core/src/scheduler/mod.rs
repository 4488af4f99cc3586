//! Execution of the sample x version grid
//!
//! The scheduler dispatches every cell as an independent unit of work. All
//! strategies share one contract: each unit yields exactly one
//! [`CellResult`], success or failure, and the returned matrix has no
//! pending slot.

mod batch;
mod execute;
mod pool;
mod sequential;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{HarnessError, HarnessResult, panic_message};
use crate::metrics::MetricRegistry;
use crate::runner::{
    CellProgress, CellResult, ProgressCallback, ResultMatrix, Strategy, VersionHandle,
    resolve_version_names,
};
use crate::samples::{Sample, SampleSet};
use crate::trace::Tracer;

/// Read-only state shared by every unit of work in a run
pub(crate) struct RunContext {
    pub(crate) samples: Vec<Sample>,
    pub(crate) metrics: MetricRegistry,
    pub(crate) versions: Vec<VersionHandle>,
    pub(crate) version_names: Vec<String>,
    pub(crate) tracer: Arc<dyn Tracer>,
    progress: Option<ProgressCallback>,
    completed: AtomicUsize,
}

impl RunContext {
    fn total_cells(&self) -> usize {
        self.samples.len() * self.versions.len()
    }

    /// Report a finished cell. A panicking callback never costs the cell.
    pub(crate) fn notify(&self, cell: &CellResult) {
        let completed = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(callback) = &self.progress {
            let progress = CellProgress {
                completed,
                total: self.total_cells(),
                sample_index: cell.sample_index,
                version_name: cell.version_name.clone(),
                failed: cell.error.is_some(),
            };
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(progress))) {
                tracing::warn!(
                    case = cell.sample_index + 1,
                    version = %cell.version_name,
                    error = %panic_message(payload.as_ref()),
                    "Progress callback panicked"
                );
            }
        }
    }
}

/// Runs every (sample, version) cell under a chosen strategy
pub struct ExecutionScheduler {
    ctx: Arc<RunContext>,
}

impl ExecutionScheduler {
    /// Snapshot the samples and metrics for one run
    pub fn new(
        samples: &SampleSet,
        metrics: &MetricRegistry,
        versions: &[VersionHandle],
        tracer: Arc<dyn Tracer>,
        progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            ctx: Arc::new(RunContext {
                samples: samples.as_slice().to_vec(),
                metrics: metrics.clone(),
                versions: versions.to_vec(),
                version_names: resolve_version_names(versions),
                tracer,
                progress,
                completed: AtomicUsize::new(0),
            }),
        }
    }

    /// Display names, in version argument order
    pub fn version_names(&self) -> &[String] {
        &self.ctx.version_names
    }

    pub fn total_cells(&self) -> usize {
        self.ctx.total_cells()
    }

    /// Check that the grid can run on a synchronous strategy
    pub fn check_sync(&self, strategy: Strategy) -> HarnessResult<()> {
        match strategy {
            Strategy::CooperativeBatch { .. } => {
                return Err(HarnessError::CooperativeStrategyInSyncRun);
            }
            Strategy::WorkerPool { workers: 0 } => {
                return Err(HarnessError::invalid_config(
                    "worker pool needs at least one worker",
                ));
            }
            _ => {}
        }

        let async_names: Vec<String> = self
            .ctx
            .versions
            .iter()
            .zip(&self.ctx.version_names)
            .filter(|(version, _)| version.is_async())
            .map(|(_, name)| name.clone())
            .collect();
        if !async_names.is_empty() {
            return Err(HarnessError::AsyncVersionInSyncRun { names: async_names });
        }
        Ok(())
    }

    /// Run on the calling thread (sequential) or a thread pool
    pub fn run(&self, strategy: Strategy) -> HarnessResult<ResultMatrix> {
        self.check_sync(strategy)?;
        let matrix = match strategy {
            Strategy::WorkerPool { workers } => pool::run(&self.ctx, workers),
            _ => sequential::run(&self.ctx),
        };
        Ok(self.finalize(matrix))
    }

    /// Run every cell as its own task on the async runtime
    pub async fn run_async(&self, max_in_flight: Option<usize>) -> ResultMatrix {
        let matrix = batch::run(Arc::clone(&self.ctx), max_in_flight).await;
        self.finalize(matrix)
    }

    /// Replace any slot left pending with a synthetic task failure
    fn finalize(&self, mut matrix: ResultMatrix) -> ResultMatrix {
        let ctx = &self.ctx;
        let filled = matrix.fill_pending(|sample_index, version_index| {
            CellResult::task_failure(
                sample_index,
                version_index,
                &ctx.version_names[version_index],
                "Unit of work ended without producing a result",
                &ctx.metrics,
            )
        });
        if filled > 0 {
            tracing::error!(filled, "Filled pending cells with task failures");
        }
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VersionError;
    use crate::metrics::{Metric, MetricOutcome, Score};
    use crate::runner::CellStatus;
    use crate::trace::{NoopTracer, RecordingTracer};
    use parking_lot::Mutex;
    use serde_json::{Value, json};

    fn samples() -> SampleSet {
        SampleSet::new()
            .with_case(4, vec![json!(2), json!(2)])
            .with_case(5, vec![json!(2), json!(2)])
            .with_case(7, vec![json!(3), json!(4)])
    }

    fn metrics() -> MetricRegistry {
        let mut registry = MetricRegistry::new();
        registry.register("Exact Match", Metric::exact_match()).unwrap();
        registry
    }

    fn sum(args: &[Value]) -> i64 {
        args.iter().filter_map(|v| v.as_i64()).sum()
    }

    fn add() -> VersionHandle {
        VersionHandle::sync("add", |args, _| Ok(json!(sum(args))))
    }

    fn fails_on_second() -> VersionHandle {
        VersionHandle::sync("fragile", |args, _| {
            if args[1] == json!(2) && args[0] == json!(2) {
                Err(VersionError::new("unsupported input"))
            } else {
                Ok(json!(sum(args)))
            }
        })
    }

    fn scheduler(versions: &[VersionHandle]) -> ExecutionScheduler {
        ExecutionScheduler::new(&samples(), &metrics(), versions, Arc::new(NoopTracer), None)
    }

    fn outputs(matrix: &ResultMatrix) -> Vec<(usize, usize, Option<Value>)> {
        matrix
            .cells()
            .map(|c| (c.sample_index, c.version_index, c.raw_output.clone()))
            .collect()
    }

    #[test]
    fn test_sequential_fills_every_slot() {
        let matrix = scheduler(&[add(), fails_on_second()])
            .run(Strategy::Sequential)
            .unwrap();
        assert_eq!(matrix.len(), 6);
        assert!(matrix.is_complete());

        let failed = matrix.get(0, 1).unwrap();
        assert_eq!(failed.status, CellStatus::FunctionError);
        assert_eq!(failed.metric("Exact Match"), Some(&MetricOutcome::NotApplicable));

        let ok = matrix.get(2, 1).unwrap();
        assert_eq!(ok.metric("Exact Match"), Some(&MetricOutcome::Score(Score::Bool(true))));
    }

    #[test]
    fn test_sequential_completion_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&order);
        let progress: ProgressCallback = Arc::new(move |p: CellProgress| {
            sink.lock().push((p.sample_index, p.version_name));
        });
        let scheduler = ExecutionScheduler::new(
            &samples(),
            &metrics(),
            &[add(), add()],
            Arc::new(NoopTracer),
            Some(progress),
        );
        scheduler.run(Strategy::Sequential).unwrap();

        let order = order.lock().clone();
        assert_eq!(
            order,
            vec![
                (0, "add (1)".to_string()),
                (0, "add (2)".to_string()),
                (1, "add (1)".to_string()),
                (1, "add (2)".to_string()),
                (2, "add (1)".to_string()),
                (2, "add (2)".to_string()),
            ]
        );
    }

    #[test]
    fn test_worker_pool_matches_sequential() {
        let versions = [add(), fails_on_second(), add().with_version("add_v2")];
        let sequential = scheduler(&versions).run(Strategy::Sequential).unwrap();
        let pooled = scheduler(&versions)
            .run(Strategy::WorkerPool { workers: 4 })
            .unwrap();
        assert!(pooled.is_complete());
        assert_eq!(outputs(&sequential), outputs(&pooled));
    }

    #[test]
    fn test_worker_pool_survives_panicking_version() {
        let panicking = VersionHandle::sync("panics", |_, _| panic!("worker blew up"));
        let matrix = scheduler(&[panicking, add()])
            .run(Strategy::WorkerPool { workers: 2 })
            .unwrap();
        assert!(matrix.is_complete());
        assert!(matrix.column(0).all(|c| c.error_message() == Some("worker blew up")));
        assert!(matrix.column(1).all(|c| c.is_success()));
    }

    #[test]
    fn test_sync_preconditions() {
        let async_version = VersionHandle::new_async("remote", |_, _| async { Ok(json!(1)) });
        let err = scheduler(&[add(), async_version])
            .run(Strategy::Sequential)
            .unwrap_err();
        assert!(matches!(err, HarnessError::AsyncVersionInSyncRun { ref names } if names == &["remote"]));

        let err = scheduler(&[add()])
            .run(Strategy::CooperativeBatch { max_in_flight: None })
            .unwrap_err();
        assert!(matches!(err, HarnessError::CooperativeStrategyInSyncRun));

        let err = scheduler(&[add()])
            .run(Strategy::WorkerPool { workers: 0 })
            .unwrap_err();
        assert!(matches!(err, HarnessError::InvalidConfig { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cooperative_batch_mixes_sync_and_async() {
        let async_add = VersionHandle::new_async("async_add", |args, _| async move {
            tokio::task::yield_now().await;
            Ok(json!(sum(&args)))
        });
        let failing = VersionHandle::new_async("async_fail", |_, _| async {
            Err(VersionError::new("remote unavailable"))
        });

        let matrix = scheduler(&[add(), async_add, failing])
            .run_async(Some(2))
            .await;
        assert!(matrix.is_complete());
        assert_eq!(matrix.get(2, 1).unwrap().raw_output, Some(json!(7)));
        assert_eq!(matrix.get(2, 0).unwrap().raw_output, Some(json!(7)));
        assert!(matrix.column(2).all(|c| c.status == CellStatus::FunctionError));
    }

    /// Tracer whose span creation panics for one cell
    struct FaultyTracer {
        fail_on: &'static str,
    }

    impl Tracer for FaultyTracer {
        fn start(&self, name: &str) -> Box<dyn crate::trace::Span> {
            if name == self.fail_on {
                panic!("tracer backend unavailable");
            }
            NoopTracer.start(name)
        }
    }

    fn sync_strategies() -> [Strategy; 3] {
        [
            Strategy::Sequential,
            Strategy::WorkerPool { workers: 1 },
            Strategy::WorkerPool { workers: 4 },
        ]
    }

    fn faulty_tracer_scheduler() -> ExecutionScheduler {
        ExecutionScheduler::new(
            &samples(),
            &metrics(),
            &[add(), add().with_version("add_v2")],
            Arc::new(FaultyTracer { fail_on: "case_2_add" }),
            None,
        )
    }

    fn panicking_progress(calls: &Arc<AtomicUsize>) -> ProgressCallback {
        let counter = Arc::clone(calls);
        Arc::new(move |_: CellProgress| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("progress sink closed");
            }
        })
    }

    fn assert_only_traced_cell_failed(matrix: &ResultMatrix) {
        assert!(matrix.is_complete());
        let failed = matrix.get(1, 0).unwrap();
        assert_eq!(failed.status, CellStatus::TaskFailure);
        assert_eq!(failed.metric("Exact Match"), Some(&MetricOutcome::NotApplicable));
        assert_eq!(matrix.cells().filter(|c| c.is_success()).count(), 5);
    }

    #[test]
    fn test_tracer_fault_fails_only_its_cell() {
        for strategy in sync_strategies() {
            let matrix = faulty_tracer_scheduler().run(strategy).unwrap();
            assert_only_traced_cell_failed(&matrix);
            assert!(
                matrix
                    .get(1, 0)
                    .unwrap()
                    .error_message()
                    .is_some_and(|m| m.contains("tracer backend unavailable"))
            );
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_dead_batch_task_becomes_task_failure() {
        let matrix = faulty_tracer_scheduler().run_async(None).await;
        assert_only_traced_cell_failed(&matrix);
        assert!(
            matrix
                .get(1, 0)
                .unwrap()
                .error_message()
                .is_some_and(|m| m.starts_with("Task failed"))
        );
    }

    #[test]
    fn test_progress_fault_keeps_every_cell() {
        for strategy in sync_strategies() {
            let calls = Arc::new(AtomicUsize::new(0));
            let scheduler = ExecutionScheduler::new(
                &samples(),
                &metrics(),
                &[add()],
                Arc::new(NoopTracer),
                Some(panicking_progress(&calls)),
            );
            let matrix = scheduler.run(strategy).unwrap();

            assert!(matrix.is_complete());
            assert!(matrix.cells().all(|c| c.is_success()));
            assert_eq!(calls.load(Ordering::SeqCst), 3);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_progress_fault_keeps_every_batch_cell() {
        let calls = Arc::new(AtomicUsize::new(0));
        let scheduler = ExecutionScheduler::new(
            &samples(),
            &metrics(),
            &[add()],
            Arc::new(NoopTracer),
            Some(panicking_progress(&calls)),
        );
        let matrix = scheduler.run_async(Some(1)).await;

        assert!(matrix.cells().all(|c| c.is_success()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_cell_spans_are_recorded() {
        let tracer = RecordingTracer::new();
        let scheduler = ExecutionScheduler::new(
            &samples(),
            &metrics(),
            &[fails_on_second()],
            Arc::new(tracer.clone()),
            None,
        );
        scheduler.run(Strategy::Sequential).unwrap();

        let spans = tracer.spans();
        assert_eq!(spans.len(), 3);

        let failed = tracer.find("case_1_fragile").unwrap();
        assert!(failed.is_error());
        assert_eq!(
            failed.attribute("experiment.result.actual").map(|v| v.to_string()),
            Some("N/A (Func Err)".to_string())
        );

        let ok = tracer.find("case_3_fragile").unwrap();
        assert!(!ok.is_error());
        assert_eq!(
            ok.attribute("experiment.metric.Exact Match").map(|v| v.to_string()),
            Some("true".to_string())
        );
    }
}
