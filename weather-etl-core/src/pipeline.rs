//! The run itself: `schema -> fetch -> store`.
//!
//! Each stage is a typed step with declared inputs and outputs:
//!
//! | stage    | needs                 | produces       |
//! |----------|-----------------------|----------------|
//! | `Schema` | -                     | table exists   |
//! | `Fetch`  | city catalog          | `FetchReport`  |
//! | `Store`  | `Schema`, `Fetch`     | `WriteOutcome` |
//!
//! Only a database error fails a run. Cities that could not be fetched are
//! reported, never raised.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    config::Config,
    coordinator::FetchCoordinator,
    error::DatabaseError,
    model::{CityQuery, FetchFailure, FetchReport, WeatherRecord},
    provider::WeatherProvider,
    schema::SchemaManager,
    store::WeatherStore,
    writer::{WeatherWriter, WriteOutcome},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Schema,
    Fetch,
    Store,
}

impl Stage {
    /// Stages that must be complete before this one starts.
    pub fn depends_on(&self) -> &'static [Stage] {
        match self {
            Stage::Schema | Stage::Fetch => &[],
            Stage::Store => &[Stage::Schema, Stage::Fetch],
        }
    }

    /// Execution order, consistent with [`Stage::depends_on`].
    pub const ORDER: [Stage; 3] = [Stage::Schema, Stage::Fetch, Stage::Store];

    /// State the run reaches once this stage succeeds.
    pub fn completed_state(&self) -> PipelineState {
        match self {
            Stage::Schema => PipelineState::SchemaEnsured,
            Stage::Fetch => PipelineState::Fetched,
            Stage::Store => PipelineState::Stored,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Schema => "schema",
            Stage::Fetch => "fetch",
            Stage::Store => "store",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    SchemaEnsured,
    Fetched,
    Stored,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    /// States visited before the failure, ending in `Failed`.
    pub states: Vec<PipelineState>,
    #[source]
    pub source: DatabaseError,
}

/// Summary of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Every state visited, from `Init` to `Done`.
    pub states: Vec<PipelineState>,
    pub records: Vec<WeatherRecord>,
    pub failures: Vec<FetchFailure>,
    pub write: WriteOutcome,
}

impl RunReport {
    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Init)
    }
}

/// One manually triggered run over a fixed list of cities.
#[derive(Debug, Clone)]
pub struct Pipeline {
    cities: Vec<CityQuery>,
    schema: SchemaManager,
    coordinator: FetchCoordinator,
    writer: WeatherWriter,
}

impl Pipeline {
    pub fn new(
        cities: Vec<CityQuery>,
        schema: SchemaManager,
        coordinator: FetchCoordinator,
        writer: WeatherWriter,
    ) -> Self {
        Self {
            cities,
            schema,
            coordinator,
            writer,
        }
    }

    /// Wire a pipeline from configuration and already opened collaborators.
    pub fn from_config(
        config: &Config,
        cities: Vec<CityQuery>,
        provider: Arc<dyn WeatherProvider>,
        store: Arc<dyn WeatherStore>,
    ) -> Self {
        let coordinator = FetchCoordinator::new(
            provider,
            config.fetch.concurrency,
            config.fetch.retry_policy(),
        );
        let writer = WeatherWriter::new(Arc::clone(&store), config.store.persisted_columns.clone());

        Self::new(cities, SchemaManager::new(store), coordinator, writer)
    }

    pub fn cities(&self) -> &[CityQuery] {
        &self.cities
    }

    /// Run every stage in [`Stage::ORDER`]. The first database error stops
    /// the run.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let mut run = StateTracker::new();
        let mut report = FetchReport::default();
        let mut write = WriteOutcome::NothingToInsert;

        for stage in Stage::ORDER {
            let outcome = match stage {
                Stage::Schema => self.ensure_schema_stage().await,
                Stage::Fetch => {
                    report = self.fetch_stage().await;
                    Ok(())
                }
                Stage::Store => self
                    .store_stage(&report.records)
                    .await
                    .map(|outcome| write = outcome),
            };

            if let Err(source) = outcome {
                return Err(run.fail(stage, source));
            }
            run.advance(stage.completed_state());
        }
        run.advance(PipelineState::Done);

        match write {
            WriteOutcome::NothingToInsert => tracing::info!(
                failed = report.failures.len(),
                "Run complete: no weather data was available"
            ),
            WriteOutcome::Inserted { rows } => tracing::info!(
                rows,
                failed = report.failures.len(),
                "Run complete"
            ),
        }

        Ok(RunReport {
            states: run.states,
            records: report.records,
            failures: report.failures,
            write,
        })
    }

    async fn ensure_schema_stage(&self) -> Result<(), DatabaseError> {
        self.schema.ensure_schema().await
    }

    async fn fetch_stage(&self) -> FetchReport {
        self.coordinator.run_all(&self.cities).await
    }

    async fn store_stage(&self, records: &[WeatherRecord]) -> Result<WriteOutcome, DatabaseError> {
        self.writer.store(records).await
    }
}

struct StateTracker {
    states: Vec<PipelineState>,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            states: vec![PipelineState::Init],
        }
    }

    fn advance(&mut self, next: PipelineState) {
        tracing::debug!(from = ?self.states.last(), to = ?next, "pipeline state");
        self.states.push(next);
    }

    fn fail(mut self, stage: Stage, source: DatabaseError) -> PipelineError {
        tracing::error!(%stage, error = %source, "Run failed");
        self.advance(PipelineState::Failed);
        PipelineError {
            stage,
            states: self.states,
            source,
        }
    }
}
