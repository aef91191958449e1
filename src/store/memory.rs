use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskQuery, TaskStore};
use crate::task::{
    Location, NewTask, Priority, Task, TaskCategory, TaskId, TaskStatus, TransitionError, UserId,
};

/// Thread-safe in-process task store.
///
/// Every transition carries an expected-status precondition, so a second
/// accept of the same task fails with [`StoreError::Conflict`] instead of
/// reassigning it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<HashMap<TaskId, Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let tasks = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Self {
            tasks: Arc::new(RwLock::new(tasks)),
        }
    }

    /// A few open tasks from other users, for the offline mode.
    pub fn demo() -> Self {
        let now = Utc::now();
        let seed = [
            (
                "Deliver groceries",
                "Pick up a weekly order from the corner market.",
                TaskCategory::Delivery,
                15.0,
                25.0,
                Some(45),
            ),
            (
                "Deep clean studio",
                "Kitchen and bathroom, supplies provided.",
                TaskCategory::Cleaning,
                60.0,
                90.0,
                Some(180),
            ),
            (
                "Mount a TV",
                "55 inch TV on drywall, bracket included.",
                TaskCategory::Handyman,
                40.0,
                70.0,
                None,
            ),
        ];
        Self::with_tasks(seed.into_iter().enumerate().map(
            |(i, (title, description, category, min, max, duration))| {
                let new = NewTask {
                    title: title.to_string(),
                    description: description.to_string(),
                    category,
                    client_id: UserId::new(format!("neighbour-{}", i + 1)),
                    location: Location {
                        latitude: 40.7128,
                        longitude: -74.0060,
                        address: Some("New York, NY".to_string()),
                        is_shared: true,
                    },
                    budget_min: min,
                    budget_max: max,
                    priority: Priority::Normal,
                    estimated_duration: duration,
                    required_skills: Vec::new(),
                };
                let created_at = now - chrono::Duration::minutes(i as i64 * 10);
                Task::posted(TaskId::new(Uuid::new_v4().to_string()), new, created_at)
            },
        ))
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<TaskId, Task>> {
        self.tasks.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TaskId, Task>> {
        self.tasks.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn update(
        &self,
        id: &TaskId,
        expected: TaskStatus,
        apply: impl FnOnce(&mut Task) -> Result<(), TransitionError>,
    ) -> StoreResult<()> {
        let mut tasks = self.write();
        let task = tasks
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if task.status != expected {
            return Err(StoreError::Conflict {
                id: id.clone(),
                expected,
                actual: task.status,
            });
        }
        apply(task).map_err(|err| StoreError::Conflict {
            id: id.clone(),
            expected,
            actual: err.from,
        })
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list_tasks(&self, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        let mut tasks: Vec<Task> = self
            .read()
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn get_task(&self, id: &TaskId) -> StoreResult<Task> {
        self.read()
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    async fn create_task(&self, task: &NewTask) -> StoreResult<Task> {
        let id = TaskId::new(Uuid::new_v4().to_string());
        let created = Task::posted(id.clone(), task.clone(), Utc::now());
        self.write().insert(id, created.clone());
        Ok(created)
    }

    async fn accept_task(&self, id: &TaskId, tasker: &UserId) -> StoreResult<()> {
        self.update(id, TaskStatus::Posted, |task| {
            task.accept(tasker.clone(), Utc::now())
        })
    }

    async fn start_task(&self, id: &TaskId) -> StoreResult<()> {
        self.update(id, TaskStatus::Accepted, |task| task.start(Utc::now()))
    }

    async fn complete_task(&self, id: &TaskId) -> StoreResult<()> {
        self.update(id, TaskStatus::InProgress, |task| task.complete(Utc::now()))
    }
}
