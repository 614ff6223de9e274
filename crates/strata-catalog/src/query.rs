//! Analytical query collaborator.
//!
//! The mirrored blob data is queried through an external engine that
//! accepts a statement, runs it asynchronously, and is polled to
//! completion. The runner wraps the poll loop; the engine itself stays
//! behind a trait so tests and local tooling run in memory.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use strata_core::error::{Error, Result as CoreResult};

use crate::error::{CatalogError, Result};

/// Lifecycle state of a submitted query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryState {
    /// Accepted and still executing.
    Running,
    /// Finished; results can be fetched.
    Succeeded,
    /// Failed with an engine-reported reason.
    Failed(String),
    /// Cancelled before completion.
    Cancelled,
}

/// Rows returned by a finished query, column names first.
#[derive(Debug, Clone, Default)]
pub struct QueryResults {
    /// Column names in result order.
    pub columns: Vec<String>,
    /// Row values, one `Vec` per row.
    pub rows: Vec<Vec<String>>,
}

/// Asynchronous query engine over the mirrored data.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Submits a statement and returns the engine's execution ID.
    async fn submit(&self, statement: &str) -> CoreResult<String>;

    /// Reports the current state of an execution.
    async fn poll(&self, execution_id: &str) -> CoreResult<QueryState>;

    /// Fetches the results of a succeeded execution.
    async fn fetch_results(&self, execution_id: &str) -> CoreResult<QueryResults>;
}

/// Drives a query from submission to completion.
#[derive(Clone)]
pub struct QueryRunner<E> {
    engine: E,
    poll_interval: Duration,
}

impl<E: QueryEngine> QueryRunner<E> {
    /// Creates a runner polling at `poll_interval`.
    #[must_use]
    pub fn new(engine: E, poll_interval: Duration) -> Self {
        Self {
            engine,
            poll_interval,
        }
    }

    /// Submits `statement` and polls until it finishes, returning the
    /// results.
    ///
    /// # Errors
    ///
    /// `Dependency` when submission, polling, or fetching fails, or
    /// when the engine reports the query failed or cancelled.
    pub async fn run(&self, statement: &str) -> Result<QueryResults> {
        let execution_id = self.engine.submit(statement).await?;
        tracing::info!(execution_id, "submitted query");

        loop {
            match self.engine.poll(&execution_id).await? {
                QueryState::Running => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                QueryState::Succeeded => {
                    tracing::info!(execution_id, "query succeeded");
                    return Ok(self.engine.fetch_results(&execution_id).await?);
                }
                QueryState::Failed(reason) => {
                    return Err(CatalogError::dependency(format!(
                        "query {execution_id} failed: {reason}"
                    )));
                }
                QueryState::Cancelled => {
                    return Err(CatalogError::dependency(format!(
                        "query {execution_id} was cancelled"
                    )));
                }
            }
        }
    }
}

/// In-memory query engine for tests.
///
/// Each submitted statement is assigned a scripted sequence of states;
/// every poll consumes the next one. Unscripted statements succeed
/// immediately with empty results.
#[derive(Debug, Default)]
pub struct MemoryQueryEngine {
    scripts: RwLock<HashMap<String, Vec<QueryState>>>,
    executions: RwLock<HashMap<String, Vec<QueryState>>>,
    results: RwLock<HashMap<String, QueryResults>>,
    next_id: RwLock<u64>,
}

impl MemoryQueryEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the state sequence polled for `statement`.
    pub fn script(&self, statement: &str, states: Vec<QueryState>) {
        if let Ok(mut scripts) = self.scripts.write() {
            scripts.insert(statement.to_string(), states);
        }
    }

    /// Sets the results returned once `statement` succeeds.
    pub fn with_results(&self, statement: &str, results: QueryResults) {
        if let Ok(mut map) = self.results.write() {
            map.insert(statement.to_string(), results);
        }
    }
}

#[async_trait]
impl QueryEngine for MemoryQueryEngine {
    async fn submit(&self, statement: &str) -> CoreResult<String> {
        let mut next = self
            .next_id
            .write()
            .map_err(|_| Error::storage("lock poisoned"))?;
        *next += 1;
        let execution_id = format!("exec-{next}");

        let states = self
            .scripts
            .read()
            .map_err(|_| Error::storage("lock poisoned"))?
            .get(statement)
            .cloned()
            .unwrap_or_else(|| vec![QueryState::Succeeded]);
        self.executions
            .write()
            .map_err(|_| Error::storage("lock poisoned"))?
            .insert(execution_id.clone(), states);

        // Clone out of the read guard before taking the write lock;
        // keeping the guard alive across the write would deadlock.
        let scripted_results = self
            .results
            .read()
            .map_err(|_| Error::storage("lock poisoned"))?
            .get(statement)
            .cloned();
        if let Some(results) = scripted_results {
            if let Ok(mut map) = self.results.write() {
                map.insert(execution_id.clone(), results);
            }
        }
        Ok(execution_id)
    }

    async fn poll(&self, execution_id: &str) -> CoreResult<QueryState> {
        let mut executions = self
            .executions
            .write()
            .map_err(|_| Error::storage("lock poisoned"))?;
        let states = executions
            .get_mut(execution_id)
            .ok_or_else(|| Error::storage(format!("unknown execution {execution_id}")))?;
        if states.len() > 1 {
            Ok(states.remove(0))
        } else {
            Ok(states.first().cloned().unwrap_or(QueryState::Succeeded))
        }
    }

    async fn fetch_results(&self, execution_id: &str) -> CoreResult<QueryResults> {
        Ok(self
            .results
            .read()
            .map_err(|_| Error::storage("lock poisoned"))?
            .get(execution_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner(engine: MemoryQueryEngine) -> QueryRunner<MemoryQueryEngine> {
        QueryRunner::new(engine, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn polls_until_success_and_fetches_results() {
        let engine = MemoryQueryEngine::new();
        engine.script(
            "select 1",
            vec![
                QueryState::Running,
                QueryState::Running,
                QueryState::Succeeded,
            ],
        );
        engine.with_results(
            "select 1",
            QueryResults {
                columns: vec!["n".into()],
                rows: vec![vec!["1".into()]],
            },
        );

        let results = runner(engine).run("select 1").await.unwrap();
        assert_eq!(results.columns, vec!["n"]);
        assert_eq!(results.rows, vec![vec!["1".to_string()]]);
    }

    #[tokio::test]
    async fn failed_query_surfaces_engine_reason() {
        let engine = MemoryQueryEngine::new();
        engine.script(
            "select broken",
            vec![QueryState::Running, QueryState::Failed("no such table".into())],
        );

        let err = runner(engine).run("select broken").await.unwrap_err();
        assert!(err.to_string().contains("no such table"));
    }

    #[tokio::test]
    async fn cancelled_query_is_a_dependency_error() {
        let engine = MemoryQueryEngine::new();
        engine.script("select slow", vec![QueryState::Cancelled]);

        let err = runner(engine).run("select slow").await.unwrap_err();
        assert!(matches!(err, CatalogError::Dependency { .. }));
    }
}
