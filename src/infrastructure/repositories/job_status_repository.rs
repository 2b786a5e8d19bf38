use crate::domain::synthesis::{ArtifactHandle, JobId, JobRecord, JobStatus};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Process-wide job table. Lives as long as the process; nothing is evicted.
///
/// Every write is a single-key upsert under the lock. Completed and Failed are
/// final: updates to a job already in one of them are ignored.
#[derive(Default)]
pub struct JobStatusRepository {
    jobs: RwLock<HashMap<JobId, JobRecord>>,
}

impl JobStatusRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: JobRecord) {
        self.jobs.write().insert(record.id, record);
    }

    pub fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.jobs.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Returns false when the job is unknown or already finished
    pub fn mark_completed(&self, id: &JobId, artifact: ArtifactHandle) -> bool {
        self.finish(id, |record| {
            record.status = JobStatus::Completed;
            record.artifact = Some(artifact);
        })
    }

    /// Returns false when the job is unknown or already finished
    pub fn mark_failed(&self, id: &JobId, error: impl Into<String>) -> bool {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "unknown error".to_string();
        }

        self.finish(id, |record| {
            record.status = JobStatus::Failed;
            record.error = Some(error);
        })
    }

    fn finish(&self, id: &JobId, update: impl FnOnce(&mut JobRecord)) -> bool {
        let mut jobs = self.jobs.write();
        let record = match jobs.get_mut(id) {
            Some(record) => record,
            None => {
                tracing::warn!(job_id = %id, "Status update for unknown job ignored");
                return false;
            }
        };

        if record.status.is_terminal() {
            tracing::warn!(
                job_id = %id,
                status = %record.status,
                "Status update for finished job ignored"
            );
            return false;
        }

        update(record);
        record.updated_at = Utc::now();
        true
    }
}
