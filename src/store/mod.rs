//! Task store port and its adapters.
//!
//! The store of record is remote; [`HttpTaskStore`] talks to it over HTTP.
//! [`InMemoryTaskStore`] applies the same rules in process and backs the
//! offline mode and the tests.

mod http;
mod memory;

pub use http::HttpTaskStore;
pub use memory::InMemoryTaskStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::task::{NewTask, Task, TaskCategory, TaskId, TaskStatus, UserId};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures talking to the store.
///
/// The view layer treats every variant alike ("request failed"); the variants
/// exist for the log.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} answered {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("malformed payload from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("task {0} not found")]
    NotFound(TaskId),

    #[error("task {id} is {actual}, expected {expected}")]
    Conflict {
        id: TaskId,
        expected: TaskStatus,
        actual: TaskStatus,
    },
}

/// Server-side filters for `GET /api/tasks`. The default query lists every task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub category: Option<TaskCategory>,
    pub status: Option<TaskStatus>,
    pub client_id: Option<UserId>,
    pub tasker_id: Option<UserId>,
}

impl TaskQuery {
    pub fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category {
            pairs.push(("category", category.as_str().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(client) = &self.client_id {
            pairs.push(("client_id", client.to_string()));
        }
        if let Some(tasker) = &self.tasker_id {
            pairs.push(("tasker_id", tasker.to_string()));
        }
        pairs
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.category.map_or(true, |c| task.category == c)
            && self.status.map_or(true, |s| task.status == s)
            && self.client_id.as_ref().map_or(true, |c| &task.client_id == c)
            && self
                .tasker_id
                .as_ref()
                .map_or(true, |t| task.tasker_id.as_ref() == Some(t))
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>>;

    async fn get_task(&self, id: &TaskId) -> StoreResult<Task>;

    /// Creates a task in `posted`.
    async fn create_task(&self, task: &NewTask) -> StoreResult<Task>;

    /// `posted → accepted`, assigning the tasker. Rejected unless the task is
    /// currently `posted`.
    async fn accept_task(&self, id: &TaskId, tasker: &UserId) -> StoreResult<()>;

    async fn start_task(&self, id: &TaskId) -> StoreResult<()>;

    async fn complete_task(&self, id: &TaskId) -> StoreResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::sample_task;

    #[test]
    fn empty_query_has_no_pairs_and_matches_everything() {
        let query = TaskQuery::default();
        let task = sample_task("t1", "u1", TaskCategory::Beauty, TaskStatus::Cancelled);

        assert!(query.pairs().is_empty());
        assert!(query.matches(&task));
    }

    #[test]
    fn query_pairs_use_wire_names() {
        let query = TaskQuery {
            category: Some(TaskCategory::PetCare),
            status: Some(TaskStatus::InProgress),
            client_id: None,
            tasker_id: Some(UserId::new("u2")),
        };

        assert_eq!(
            query.pairs(),
            vec![
                ("category", "pet_care".to_string()),
                ("status", "in_progress".to_string()),
                ("tasker_id", "u2".to_string()),
            ]
        );
    }
}
