//! Phased, gated fan-out of fetch tasks.
//!
//! A run is a sequence of [`FetchPhase`]s. Each phase builds its task list
//! from the tables every earlier phase produced, only after those phases have
//! fully drained. Tasks of one phase run concurrently, but every task holds a
//! permit of one run-wide semaphore for the duration of its call. A task that
//! fails (retries exhausted, bad payload, panic) yields an empty table for its
//! unit of work and never disturbs its siblings.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use statsnba_api::types::ResultSelector;
use statsnba_api::{Params, Query};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

use crate::client::ClientError;
use crate::normalize::TableNormalizer;
use crate::season::SeasonContext;
use crate::table::RawTable;
use crate::tracker::RequestTracker;

/// Default number of concurrent calls.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// Tables keyed by dataset name.
pub type Tables = BTreeMap<String, RawTable>;

/// One call against one endpoint, landing in one dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct FetchTask {
    pub dataset: String,
    pub params: Params,
    pub selector: ResultSelector,
    /// Constant columns set on every row this task returns.
    pub tags: Vec<(String, Value)>,
}

impl FetchTask {
    pub fn new(dataset: impl Into<String>, params: impl Into<Params>) -> Self {
        Self {
            dataset: dataset.into(),
            params: params.into(),
            selector: ResultSelector::default(),
            tags: Vec::new(),
        }
    }

    pub fn select(mut self, selector: ResultSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn tag(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.tags.push((column.to_string(), value.into()));
        self
    }
}

impl fmt::Display for FetchTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}", self.dataset, self.params.endpoint())?;
        for (key, value) in self.params.to_query_pairs() {
            if matches!(key, "GameID" | "TeamID" | "PlayerID" | "GameDate") {
                write!(f, " {}={}", key, value)?;
            }
        }
        write!(f, ")")
    }
}

/// Anything that can turn a [`FetchTask`] into a raw, un-normalized table.
#[async_trait]
pub trait TableSource: Send + Sync + 'static {
    async fn fetch(&self, task: &FetchTask) -> Result<RawTable, ClientError>;

    /// Request counters, for sources that keep them.
    fn request_tracker(&self) -> Option<&RequestTracker> {
        None
    }
}

type BuildFn = Box<dyn FnOnce(&Tables) -> Vec<FetchTask> + Send>;

/// A stage of the run whose tasks may depend on earlier stages' output.
pub struct FetchPhase {
    pub name: &'static str,
    /// Datasets this phase produces. Each appears in the output, empty when
    /// the phase is skipped or every task for it failed.
    pub datasets: Vec<&'static str>,
    pub skip: bool,
    /// Per-dataset key columns; later rows repeating a key are dropped after
    /// the phase's tables are concatenated.
    pub dedupe: Vec<(&'static str, Vec<&'static str>)>,
    build: BuildFn,
}

impl FetchPhase {
    pub fn new<F>(name: &'static str, datasets: &[&'static str], build: F) -> Self
    where
        F: FnOnce(&Tables) -> Vec<FetchTask> + Send + 'static,
    {
        Self {
            name,
            datasets: datasets.to_vec(),
            skip: false,
            dedupe: Vec::new(),
            build: Box::new(build),
        }
    }

    pub fn skipped(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    pub fn dedupe_by(mut self, dataset: &'static str, keys: &[&'static str]) -> Self {
        self.dedupe.push((dataset, keys.to_vec()));
        self
    }

    /// Builds the task list from upstream tables without running anything.
    pub fn build_tasks(self, upstream: &Tables) -> Vec<FetchTask> {
        (self.build)(upstream)
    }
}

impl fmt::Debug for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchPhase")
            .field("name", &self.name)
            .field("datasets", &self.datasets)
            .field("skip", &self.skip)
            .field("dedupe", &self.dedupe)
            .finish()
    }
}

/// What the flush callback sees after a phase drains.
pub struct PhaseOutput<'a> {
    pub phase: &'static str,
    /// Tables produced by this phase only.
    pub tables: &'a Tables,
    /// Every table produced so far, this phase included.
    pub accumulated: &'a Tables,
}

/// Truncates a derived task list to `limit` entries, if set.
pub fn cap<T>(mut items: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

/// Runs phases against a [`TableSource`] under one concurrency gate.
pub struct FetchOrchestrator<S: TableSource> {
    source: Arc<S>,
    gate: Arc<Semaphore>,
    concurrency: usize,
}

impl<S: TableSource> FetchOrchestrator<S> {
    pub fn new(source: Arc<S>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            source,
            gate: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        }
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs every phase for one season and returns all produced tables.
    pub async fn run(&self, context: SeasonContext, phases: Vec<FetchPhase>) -> Tables {
        match self
            .run_with_flush(context, phases, |_| Ok::<(), Infallible>(()))
            .await
        {
            Ok(tables) => tables,
            Err(never) => match never {},
        }
    }

    /// Like [`run`](Self::run), calling `flush` after each phase drains. An
    /// error from `flush` stops the run and is returned.
    pub async fn run_with_flush<F, E>(
        &self,
        context: SeasonContext,
        phases: Vec<FetchPhase>,
        mut flush: F,
    ) -> Result<Tables, E>
    where
        F: FnMut(PhaseOutput<'_>) -> Result<(), E>,
    {
        let normalizer = TableNormalizer::new(context);
        let mut accumulated = Tables::new();

        for phase in phases {
            let FetchPhase {
                name,
                datasets,
                skip,
                dedupe,
                build,
            } = phase;

            let produced = if skip {
                tracing::info!("[{}] phase {} skipped", context, name);
                Tables::new()
            } else {
                let tasks = build(&accumulated);
                tracing::info!("[{}] phase {}: {} tasks", context, name, tasks.len());
                self.run_phase(normalizer, tasks).await
            };

            let mut tables = Tables::new();
            for dataset in &datasets {
                tables.insert(dataset.to_string(), RawTable::empty(*dataset));
            }
            tables.extend(produced);
            for (dataset, keys) in &dedupe {
                if let Some(table) = tables.get_mut(*dataset) {
                    let removed = table.dedupe_by(keys);
                    if removed > 0 {
                        tracing::debug!("[{}] {}: dropped {} duplicate rows", context, dataset, removed);
                    }
                }
            }
            for (dataset, table) in &tables {
                tracing::info!("[{}] {}={}", context, dataset, table.len());
            }

            accumulated.extend(tables.iter().map(|(k, v)| (k.clone(), v.clone())));
            flush(PhaseOutput {
                phase: name,
                tables: &tables,
                accumulated: &accumulated,
            })?;
        }

        Ok(accumulated)
    }

    /// Fans out one phase and concatenates results per dataset, in task order.
    async fn run_phase(&self, normalizer: TableNormalizer, tasks: Vec<FetchTask>) -> Tables {
        let total = tasks.len();
        let (tx, mut rx) = mpsc::channel::<(usize, String, RawTable)>(self.concurrency * 2);
        let mut join_set = JoinSet::new();

        for (index, task) in tasks.into_iter().enumerate() {
            let gate = Arc::clone(&self.gate);
            let source = Arc::clone(&self.source);
            let sender = tx.clone();

            join_set.spawn(async move {
                let dataset = task.dataset.clone();
                let table = run_task(&*source, &gate, normalizer, &task).await;
                let _ = sender.send((index, dataset, table)).await;
            });
        }
        drop(tx);

        let mut results: Vec<Option<(String, RawTable)>> = (0..total).map(|_| None).collect();
        while let Some((index, dataset, table)) = rx.recv().await {
            results[index] = Some((dataset, table));
        }
        while let Some(joined) = join_set.join_next().await {
            if let Err(e) = joined {
                tracing::warn!("fetch task aborted: {}", e);
            }
        }

        let mut grouped: BTreeMap<String, Vec<RawTable>> = BTreeMap::new();
        for (dataset, table) in results.into_iter().flatten() {
            grouped.entry(dataset).or_default().push(table);
        }
        grouped
            .into_iter()
            .map(|(dataset, parts)| {
                let table = RawTable::concat(dataset.clone(), parts);
                (dataset, table)
            })
            .collect()
    }
}

/// The task boundary: failures are logged and become an empty table.
async fn run_task<S: TableSource>(
    source: &S,
    gate: &Semaphore,
    normalizer: TableNormalizer,
    task: &FetchTask,
) -> RawTable {
    let fetched = {
        let _permit = match gate.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::warn!("{}: concurrency gate closed: {}", task, e);
                return RawTable::empty(task.dataset.clone());
            }
        };
        source.fetch(task).await
    };

    match fetched {
        Ok(raw) if raw.is_empty() => RawTable::empty(raw.dataset),
        Ok(raw) => {
            let mut table = normalizer.normalize(raw);
            for (column, value) in &task.tags {
                table.set_column(column, value.clone());
            }
            table
        }
        Err(e) => {
            tracing::warn!("{} failed, continuing without it: {}", task, e);
            RawTable::empty(task.dataset.clone())
        }
    }
}
