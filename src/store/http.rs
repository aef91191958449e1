use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{StoreError, StoreResult, TaskQuery, TaskStore};
use crate::task::{NewTask, Task, TaskId, UserId};

/// Client for the remote task API rooted at `{base_url}/api`.
#[derive(Debug, Clone)]
pub struct HttpTaskStore {
    client: Client,
    api_base: String,
}

impl HttpTaskStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_base: format!("{}/api", base_url.trim_end_matches('/')),
        }
    }

    fn tasks_url(&self) -> String {
        format!("{}/tasks", self.api_base)
    }

    fn task_url(&self, id: &TaskId) -> String {
        format!("{}/tasks/{}", self.api_base, urlencoding::encode(id.as_str()))
    }

    fn task_action_url(&self, id: &TaskId, action: &str) -> String {
        format!("{}/{action}", self.task_url(id))
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> StoreResult<String> {
        let response = request.send().await.map_err(|source| StoreError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| StoreError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "store responded");

        if !status.is_success() {
            return Err(StoreError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(endpoint: &str, body: &str) -> StoreResult<T> {
        serde_json::from_str(body).map_err(|source| StoreError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}

#[async_trait]
impl TaskStore for HttpTaskStore {
    async fn list_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let endpoint = self.tasks_url();
        let mut request = self.client.get(&endpoint);
        let pairs = query.pairs();
        if !pairs.is_empty() {
            request = request.query(&pairs);
        }
        let body = self.send(&endpoint, request).await?;
        let records: Vec<Value> = Self::decode(&endpoint, &body)?;
        Ok(records
            .into_iter()
            .filter_map(|record| decode_listed(&endpoint, record))
            .collect())
    }

    async fn get_task(&self, id: &TaskId) -> StoreResult<Task> {
        let endpoint = self.task_url(id);
        let body = self.send(&endpoint, self.client.get(&endpoint)).await?;
        Self::decode(&endpoint, &body)
    }

    async fn create_task(&self, task: &NewTask) -> StoreResult<Task> {
        let endpoint = self.tasks_url();
        let body = self
            .send(&endpoint, self.client.post(&endpoint).json(task))
            .await?;
        Self::decode(&endpoint, &body)
    }

    async fn accept_task(&self, id: &TaskId, tasker: &UserId) -> StoreResult<()> {
        let endpoint = self.task_action_url(id, "accept");
        let request = self
            .client
            .put(&endpoint)
            .query(&[("tasker_id", tasker.as_str())]);
        self.send(&endpoint, request).await.map(|_| ())
    }

    async fn start_task(&self, id: &TaskId) -> StoreResult<()> {
        let endpoint = self.task_action_url(id, "start");
        self.send(&endpoint, self.client.put(&endpoint)).await.map(|_| ())
    }

    async fn complete_task(&self, id: &TaskId) -> StoreResult<()> {
        let endpoint = self.task_action_url(id, "complete");
        self.send(&endpoint, self.client.put(&endpoint)).await.map(|_| ())
    }
}

/// Other clients write to the same store, so one record this client cannot
/// read is logged and skipped instead of failing the whole list.
fn decode_listed(endpoint: &str, record: Value) -> Option<Task> {
    let id = record
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("<no id>")
        .to_string();
    match serde_json::from_value(record) {
        Ok(task) => Some(task),
        Err(err) => {
            warn!(endpoint, task_id = %id, %err, "skipping unreadable task");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("http://localhost:8001", "http://localhost:8001/api")]
    #[case("http://localhost:8001/", "http://localhost:8001/api")]
    #[case("https://market.example.com/v2/", "https://market.example.com/v2/api")]
    fn api_base_appends_fixed_prefix(#[case] base: &str, #[case] expected: &str) {
        assert_eq!(HttpTaskStore::new(base).api_base, expected);
    }

    #[test]
    fn task_paths_escape_identifiers() {
        let store = HttpTaskStore::new("http://localhost:8001");

        assert_eq!(
            store.task_action_url(&TaskId::new("a/b c"), "accept"),
            "http://localhost:8001/api/tasks/a%2Fb%20c/accept"
        );
    }

    #[test]
    fn unreadable_listed_record_is_dropped() {
        let record = serde_json::json!({ "id": "t9", "estimated_duration": -5 });

        assert_eq!(decode_listed("http://x/api/tasks", record), None);
    }
}
