//! Fetch coordination against the remote document store.
//!
//! The store itself is an external collaborator behind [`DocumentSource`].
//! Independent fetches run concurrently and are joined on a barrier; a failed
//! fetch is collected alongside the successes instead of aborting the rest.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::ingest::{normalize_staff, Rejection};
use crate::models::{DashboardReport, IdentityProvider, RawDocument, StaffMember, StaffRole};
use crate::report::ReportEngine;

/// Fetch errors.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch {collection}: {error}")]
    Source {
        collection: String,
        error: anyhow::Error,
    },

    #[error("No role is associated with collection: {0}")]
    UnknownCollection(String),

    #[error("No signed-in session")]
    NoSession,
}

pub type FetchResult<T> = Result<T, FetchError>;

/// A queryable document store.
pub trait DocumentSource: Send + Sync {
    /// Fetch every document in a collection.
    fn fetch_collection(&self, collection: &str) -> anyhow::Result<Vec<RawDocument>>;
}

/// A task that did not produce a value.
#[derive(Debug)]
pub struct JoinFailure {
    pub label: String,
    pub error: anyhow::Error,
}

/// Everything a barrier collected.
#[derive(Debug)]
pub struct JoinOutcome<T> {
    /// Successful results, in task order
    pub successes: Vec<(String, T)>,
    pub failures: Vec<JoinFailure>,
}

impl<T> JoinOutcome<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run labelled tasks concurrently and wait for all of them.
///
/// No ordering is imposed among the tasks; only completion of all of them.
/// A panicking task is reported as a failure.
pub fn join_all<T, F>(tasks: Vec<(String, F)>) -> JoinOutcome<T>
where
    T: Send,
    F: FnOnce() -> anyhow::Result<T> + Send,
{
    std::thread::scope(|scope| {
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|(label, task)| (label, scope.spawn(task)))
            .collect();

        let mut outcome = JoinOutcome {
            successes: Vec::with_capacity(handles.len()),
            failures: Vec::new(),
        };

        for (label, handle) in handles {
            match handle.join() {
                Ok(Ok(value)) => outcome.successes.push((label, value)),
                Ok(Err(error)) => outcome.failures.push(JoinFailure { label, error }),
                Err(_) => {
                    let error = anyhow::anyhow!("task panicked");
                    outcome.failures.push(JoinFailure { label, error });
                }
            }
        }

        outcome
    })
}

/// Staff merged from every role collection.
#[derive(Debug, Default)]
pub struct StaffDirectory {
    /// Sorted by name, then id
    pub members: Vec<StaffMember>,
    pub rejected: Vec<Rejection>,
    pub failures: Vec<FetchError>,
}

/// Fetch all staff collections concurrently and merge them.
pub fn fetch_staff(source: &dyn DocumentSource, collections: &[String]) -> StaffDirectory {
    let mut directory = StaffDirectory::default();

    let mut known: Vec<(&String, StaffRole)> = Vec::with_capacity(collections.len());
    for collection in collections {
        match StaffRole::from_collection(collection) {
            Some(role) => known.push((collection, role)),
            None => directory
                .failures
                .push(FetchError::UnknownCollection(collection.clone())),
        }
    }

    let tasks: Vec<_> = known
        .iter()
        .map(|(collection, role)| {
            let role = *role;
            let task = move || -> anyhow::Result<(StaffRole, Vec<RawDocument>)> {
                Ok((role, source.fetch_collection(collection)?))
            };
            (collection.to_string(), task)
        })
        .collect();

    let outcome = join_all(tasks);

    for failure in outcome.failures {
        tracing::warn!(collection = %failure.label, error = %failure.error, "Staff fetch failed");
        directory.failures.push(FetchError::Source {
            collection: failure.label,
            error: failure.error,
        });
    }

    for (_, (role, docs)) in outcome.successes {
        for doc in &docs {
            match normalize_staff(doc, role) {
                Ok(member) => directory.members.push(member),
                Err(reason) => {
                    tracing::warn!(document_id = %doc.id, %reason, "Rejected staff document");
                    directory.rejected.push(Rejection {
                        document_id: doc.id.clone(),
                        reason,
                    });
                }
            }
        }
    }

    directory
        .members
        .sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    directory
}

/// Fetch → normalize → scope → aggregate, for the current session.
pub struct AppointmentPipeline<'a> {
    engine: &'a ReportEngine,
}

impl<'a> AppointmentPipeline<'a> {
    pub fn new(engine: &'a ReportEngine) -> Self {
        Self { engine }
    }

    /// Run the pipeline. Aggregation is skipped entirely if the fetch fails.
    pub fn run(
        &self,
        source: &dyn DocumentSource,
        identity: &dyn IdentityProvider,
        now: DateTime<Utc>,
    ) -> FetchResult<DashboardReport> {
        let session = identity.current_session().ok_or(FetchError::NoSession)?;
        let collection = &self.engine.config().appointments_collection;

        let docs = source
            .fetch_collection(collection)
            .map_err(|error| FetchError::Source {
                collection: collection.clone(),
                error,
            })?;

        Ok(self
            .engine
            .report_from_documents(&docs, &session.scope(), now))
    }

    /// Staff directory from the configured staff collections.
    pub fn staff_directory(&self, source: &dyn DocumentSource) -> StaffDirectory {
        fetch_staff(source, &self.engine.config().staff_collections)
    }
}
