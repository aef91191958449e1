//! Runs reducer effects against the store off the UI thread.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::app::{Action, Effect, Transition};
use crate::store::{TaskQuery, TaskStore};

/// Performs one effect and turns the outcome into the action that reports it.
pub async fn perform(store: &dyn TaskStore, effect: Effect) -> Action {
    match effect {
        Effect::FetchTasks { generation } => {
            match store.list_tasks(&TaskQuery::default()).await {
                Ok(tasks) => Action::TasksLoaded { generation, tasks },
                Err(err) => Action::LoadFailed(err.to_string()),
            }
        }
        Effect::CreateTask(new_task) => match store.create_task(&new_task).await {
            Ok(task) => Action::TaskCreated(task),
            Err(err) => Action::CreateFailed(err.to_string()),
        },
        Effect::Transition { id, transition } => {
            let result = match &transition {
                Transition::Accept { tasker } => store.accept_task(&id, tasker).await,
                Transition::Start => store.start_task(&id).await,
                Transition::Complete => store.complete_task(&id).await,
            };
            match result {
                Ok(()) => Action::Transitioned { id, transition },
                Err(err) => Action::TransitionFailed {
                    id,
                    transition,
                    reason: err.to_string(),
                },
            }
        }
    }
}

/// Spawns effects on a tokio runtime and sends their results back to the UI loop.
#[derive(Clone)]
pub struct EffectRunner {
    store: Arc<dyn TaskStore>,
    handle: Handle,
    results: UnboundedSender<Action>,
}

impl EffectRunner {
    pub fn new(
        store: Arc<dyn TaskStore>,
        handle: Handle,
        results: UnboundedSender<Action>,
    ) -> Self {
        Self {
            store,
            handle,
            results,
        }
    }

    pub fn run(&self, effect: Effect) {
        debug!(?effect, "running effect");
        let store = Arc::clone(&self.store);
        let results = self.results.clone();
        self.handle.spawn(async move {
            let action = perform(store.as_ref(), effect).await;
            if results.send(action).is_err() {
                debug!("ui loop gone, dropping effect result");
            }
        });
    }
}
