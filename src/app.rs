//! View controller: the application state and its reducer.
//!
//! [`AppState::apply`] is the only way state changes. Key presses and network
//! results both arrive as [`Action`]s; anything that needs the network is
//! returned as an [`Effect`] for the caller to run.

use chrono::Utc;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

use crate::filter::{self, CategoryFilter};
use crate::form::{FormInput, PostTaskForm};
use crate::payments::{PaymentsTab, Wallet};
use crate::task::{NewTask, Task, TaskId, TaskStatus, UserId};
use crate::user::User;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Home,
    BrowseTasks,
    PostTask,
    MyTasks,
    Profile,
    Payments,
}

impl View {
    pub const ALL: [View; 6] = [
        View::Home,
        View::BrowseTasks,
        View::PostTask,
        View::MyTasks,
        View::Profile,
        View::Payments,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "TaskMarket",
            Self::BrowseTasks => "Browse Tasks",
            Self::PostTask => "Post a Task",
            Self::MyTasks => "My Tasks",
            Self::Profile => "Profile",
            Self::Payments => "Payments",
        }
    }

    pub const fn nav_label(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::BrowseTasks => "Browse",
            Self::PostTask => "Post",
            Self::MyTasks => "My Tasks",
            Self::Profile => "Profile",
            Self::Payments => "Payments",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MyTasksTab {
    #[default]
    Client,
    Tasker,
}

/// A state change the store is asked to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Accept { tasker: UserId },
    Start,
    Complete,
}

impl Transition {
    pub const fn target(&self) -> TaskStatus {
        match self {
            Self::Accept { .. } => TaskStatus::Accepted,
            Self::Start => TaskStatus::InProgress,
            Self::Complete => TaskStatus::Completed,
        }
    }

    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Accept { .. } => "accepting",
            Self::Start => "starting",
            Self::Complete => "completing",
        }
    }

    fn success_message(&self) -> &'static str {
        match self {
            Self::Accept { .. } => "Task accepted successfully!",
            Self::Start => "Task started",
            Self::Complete => "Task completed",
        }
    }

    fn failure_message(&self) -> &'static str {
        match self {
            Self::Accept { .. } => "Error accepting task",
            Self::Start => "Error starting task",
            Self::Complete => "Error completing task",
        }
    }
}

/// Work for the effect runner.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Full-list fetch, tagged with the mutation generation it was requested at.
    FetchTasks { generation: u64 },
    CreateTask(NewTask),
    Transition { id: TaskId, transition: Transition },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(View),
    Refresh,
    TasksLoaded { generation: u64, tasks: Vec<Task> },
    LoadFailed(String),
    CycleCategory(isize),
    MoveCursor(isize),
    SwitchTab,
    AcceptSelected,
    StartSelected,
    CompleteSelected,
    Form(FormInput),
    SubmitPost,
    TaskCreated(Task),
    CreateFailed(String),
    Transitioned { id: TaskId, transition: Transition },
    TransitionFailed { id: TaskId, transition: Transition, reason: String },
    DismissNotice,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Blocking modal message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub user: User,
    pub view: View,
    pub tasks: Vec<Task>,
    pub category: CategoryFilter,
    pub browse_cursor: usize,
    pub my_tasks_tab: MyTasksTab,
    pub my_tasks_cursor: usize,
    pub payments_tab: PaymentsTab,
    pub wallet: Wallet,
    pub form: PostTaskForm,
    pub posting: bool,
    /// Tasks with a transition request in flight.
    pub pending: HashSet<TaskId>,
    pub notice: Option<Notice>,
    pub should_quit: bool,
    /// Bumped by every applied mutation; list results from older generations
    /// are stale.
    generation: u64,
    fetches_in_flight: usize,
}

impl AppState {
    /// Fresh state for `user` plus the initial full-list fetch.
    pub fn init(user: User) -> (Self, Effect) {
        let form = PostTaskForm::new(user.location.as_ref());
        let mut state = Self {
            user,
            view: View::Home,
            tasks: Vec::new(),
            category: CategoryFilter::All,
            browse_cursor: 0,
            my_tasks_tab: MyTasksTab::Client,
            my_tasks_cursor: 0,
            payments_tab: PaymentsTab::Wallet,
            wallet: Wallet::demo(),
            form,
            posting: false,
            pending: HashSet::new(),
            notice: None,
            should_quit: false,
            generation: 0,
            fetches_in_flight: 0,
        };
        let fetch = state.fetch();
        (state, fetch)
    }

    /// True while any list fetch is outstanding.
    pub fn loading(&self) -> bool {
        self.fetches_in_flight > 0
    }

    pub fn browse_tasks(&self) -> Vec<&Task> {
        filter::browse(&self.tasks, self.category)
    }

    pub fn client_tasks(&self) -> Vec<&Task> {
        filter::posted_by(&self.tasks, &self.user.id)
    }

    pub fn tasker_tasks(&self) -> Vec<&Task> {
        filter::assigned_to(&self.tasks, &self.user.id)
    }

    pub fn my_tasks(&self) -> Vec<&Task> {
        match self.my_tasks_tab {
            MyTasksTab::Client => self.client_tasks(),
            MyTasksTab::Tasker => self.tasker_tasks(),
        }
    }

    pub fn selected_browse_task(&self) -> Option<&Task> {
        self.browse_tasks().get(self.browse_cursor).copied()
    }

    pub fn selected_my_task(&self) -> Option<&Task> {
        self.my_tasks().get(self.my_tasks_cursor).copied()
    }

    pub fn apply(&mut self, action: Action) -> Option<Effect> {
        if self.notice.is_some() && !action.reaches_behind_notice() {
            return None;
        }

        match action {
            Action::Navigate(view) => {
                self.view = view;
                self.browse_cursor = 0;
                self.my_tasks_cursor = 0;
                None
            }
            Action::Refresh => Some(self.fetch()),
            Action::TasksLoaded { generation, tasks } => {
                self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
                if generation < self.generation {
                    debug!(generation, current = self.generation, "dropping stale task list");
                    return None;
                }
                info!(count = tasks.len(), "tasks loaded");
                self.tasks = tasks;
                self.clamp_cursors();
                None
            }
            Action::LoadFailed(reason) => {
                warn!(%reason, "error loading tasks");
                self.fetches_in_flight = self.fetches_in_flight.saturating_sub(1);
                None
            }
            Action::CycleCategory(step) => {
                self.category = self.category.cycle(step);
                self.browse_cursor = 0;
                None
            }
            Action::MoveCursor(step) => {
                match self.view {
                    View::BrowseTasks => {
                        let len = self.browse_tasks().len();
                        self.browse_cursor = step_cursor(self.browse_cursor, step, len);
                    }
                    View::MyTasks => {
                        let len = self.my_tasks().len();
                        self.my_tasks_cursor = step_cursor(self.my_tasks_cursor, step, len);
                    }
                    _ => {}
                }
                None
            }
            Action::SwitchTab => {
                match self.view {
                    View::MyTasks => {
                        self.my_tasks_tab = match self.my_tasks_tab {
                            MyTasksTab::Client => MyTasksTab::Tasker,
                            MyTasksTab::Tasker => MyTasksTab::Client,
                        };
                        self.my_tasks_cursor = 0;
                    }
                    View::Payments => self.payments_tab = self.payments_tab.next(),
                    _ => {}
                }
                None
            }
            Action::AcceptSelected => {
                let id = self.selected_browse_task()?.id.clone();
                let tasker = self.user.id.clone();
                self.request_transition(id, Transition::Accept { tasker })
            }
            Action::StartSelected => self.request_own_transition(Transition::Start),
            Action::CompleteSelected => self.request_own_transition(Transition::Complete),
            Action::Form(input) => {
                self.form.input(input);
                None
            }
            Action::SubmitPost => self.submit_post(),
            Action::TaskCreated(task) => {
                info!(task_id = %task.id, "task posted");
                self.posting = false;
                self.generation += 1;
                if !self.tasks.iter().any(|t| t.id == task.id) {
                    self.tasks.insert(0, task);
                }
                self.form = PostTaskForm::new(self.user.location.as_ref());
                self.notice = Some(Notice::info("Task posted successfully!"));
                self.view = View::MyTasks;
                self.my_tasks_tab = MyTasksTab::Client;
                self.my_tasks_cursor = 0;
                Some(self.fetch())
            }
            Action::CreateFailed(reason) => {
                error!(%reason, "error posting task");
                self.posting = false;
                self.notice = Some(Notice::error("Error posting task"));
                None
            }
            Action::Transitioned { id, transition } => {
                info!(task_id = %id, status = %transition.target(), "task transitioned");
                self.pending.remove(&id);
                self.generation += 1;
                if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                    let now = Utc::now();
                    let applied = match &transition {
                        Transition::Accept { tasker } => task.accept(tasker.clone(), now),
                        Transition::Start => task.start(now),
                        Transition::Complete => task.complete(now),
                    };
                    if let Err(err) = applied {
                        warn!(task_id = %id, %err, "held task out of step with store");
                    }
                }
                self.notice = Some(Notice::info(transition.success_message()));
                Some(self.fetch())
            }
            Action::TransitionFailed {
                id,
                transition,
                reason,
            } => {
                error!(task_id = %id, %reason, "error {} task", transition.verb());
                self.pending.remove(&id);
                self.notice = Some(Notice::error(transition.failure_message()));
                None
            }
            Action::DismissNotice => {
                self.notice = None;
                None
            }
            Action::Quit => {
                self.should_quit = true;
                None
            }
        }
    }

    fn fetch(&mut self) -> Effect {
        self.fetches_in_flight += 1;
        Effect::FetchTasks {
            generation: self.generation,
        }
    }

    fn clamp_cursors(&mut self) {
        self.browse_cursor = self
            .browse_cursor
            .min(self.browse_tasks().len().saturating_sub(1));
        self.my_tasks_cursor = self
            .my_tasks_cursor
            .min(self.my_tasks().len().saturating_sub(1));
    }

    fn submit_post(&mut self) -> Option<Effect> {
        if self.posting {
            return None;
        }
        let new_task = self
            .form
            .to_draft()
            .and_then(|draft| draft.submit(self.user.id.clone()));
        match new_task {
            Ok(new_task) => {
                self.posting = true;
                Some(Effect::CreateTask(new_task))
            }
            Err(err) => {
                self.notice = Some(Notice::error(err.to_string()));
                None
            }
        }
    }

    /// Start/complete apply only to tasks assigned to the active user.
    fn request_own_transition(&mut self, transition: Transition) -> Option<Effect> {
        if self.view != View::MyTasks || self.my_tasks_tab != MyTasksTab::Tasker {
            return None;
        }
        let id = self.selected_my_task()?.id.clone();
        self.request_transition(id, transition)
    }

    fn request_transition(&mut self, id: TaskId, transition: Transition) -> Option<Effect> {
        if self.pending.contains(&id) {
            return None;
        }
        let status = self.tasks.iter().find(|t| t.id == id)?.status;
        if !status.can_transition_to(transition.target()) {
            self.notice = Some(Notice::error(format!(
                "Task is {} and cannot become {}",
                status.label().to_lowercase(),
                transition.target().label().to_lowercase()
            )));
            return None;
        }
        self.pending.insert(id.clone());
        Some(Effect::Transition { id, transition })
    }
}

impl Action {
    /// Network results and dismissal are handled while a notice is shown;
    /// user input is not.
    fn reaches_behind_notice(&self) -> bool {
        matches!(
            self,
            Action::TasksLoaded { .. }
                | Action::LoadFailed(_)
                | Action::TaskCreated(_)
                | Action::CreateFailed(_)
                | Action::Transitioned { .. }
                | Action::TransitionFailed { .. }
                | Action::DismissNotice
                | Action::Quit
        )
    }
}

fn step_cursor(cursor: usize, step: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    cursor.saturating_add_signed(step).min(len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::sample_task;
    use crate::task::TaskCategory;
    use rstest::{fixture, rstest};

    fn demo_id() -> UserId {
        User::demo().id
    }

    fn loaded(generation: u64, tasks: Vec<Task>) -> Action {
        Action::TasksLoaded { generation, tasks }
    }

    #[fixture]
    fn state() -> AppState {
        let (mut state, _) = AppState::init(User::demo());
        let mut mine = sample_task("t3", "someone", TaskCategory::Cleaning, TaskStatus::Accepted);
        mine.tasker_id = Some(demo_id());
        state.apply(loaded(
            0,
            vec![
                sample_task("t1", "u1", TaskCategory::Delivery, TaskStatus::Posted),
                sample_task("t2", demo_id().as_str(), TaskCategory::Moving, TaskStatus::Posted),
                mine,
            ],
        ));
        state
    }

    fn fill_form(state: &mut AppState, min: &str, max: &str) {
        state.form.title = "Move a couch".to_string();
        state.form.description = "Third floor".to_string();
        state.form.category = TaskCategory::Moving;
        state.form.budget_min = min.to_string();
        state.form.budget_max = max.to_string();
    }

    #[test]
    fn init_sets_demo_user_and_requests_full_list() {
        let (state, effect) = AppState::init(User::demo());

        assert_eq!(effect, Effect::FetchTasks { generation: 0 });
        assert!(state.loading());
        assert_eq!(state.view, View::Home);
        assert_eq!(state.user.id, demo_id());
    }

    #[test]
    fn empty_list_renders_no_browse_cards() {
        let (mut state, _) = AppState::init(User::demo());
        state.apply(loaded(0, Vec::new()));

        assert!(!state.loading());
        assert!(state.browse_tasks().is_empty());
        assert!(state.notice.is_none());
    }

    #[rstest]
    fn load_failure_keeps_collection_without_notice(mut state: AppState) {
        state.apply(Action::Refresh);
        state.apply(Action::LoadFailed("connection refused".to_string()));

        assert!(!state.loading());
        assert_eq!(state.tasks.len(), 3);
        assert!(state.notice.is_none());
    }

    #[rstest]
    fn accept_selected_requests_transition_once(mut state: AppState) {
        state.apply(Action::Navigate(View::BrowseTasks));

        let effect = state.apply(Action::AcceptSelected);
        let again = state.apply(Action::AcceptSelected);

        assert_eq!(
            effect,
            Some(Effect::Transition {
                id: TaskId::new("t1"),
                transition: Transition::Accept { tasker: demo_id() },
            })
        );
        assert_eq!(again, None);
        assert!(state.pending.contains(&TaskId::new("t1")));
    }

    #[rstest]
    fn accepted_result_updates_task_and_refetches(mut state: AppState) {
        state.apply(Action::Navigate(View::BrowseTasks));
        state.apply(Action::AcceptSelected);

        let effect = state.apply(Action::Transitioned {
            id: TaskId::new("t1"),
            transition: Transition::Accept { tasker: demo_id() },
        });

        assert_eq!(effect, Some(Effect::FetchTasks { generation: 1 }));
        let task = state.tasks.iter().find(|t| t.id.as_str() == "t1").unwrap();
        assert_eq!(task.status, TaskStatus::Accepted);
        assert_eq!(task.tasker_id, Some(demo_id()));
        assert!(task.accepted_at.is_some());
        assert!(state.pending.is_empty());
        assert_eq!(
            state.notice.as_ref().map(|n| n.message.as_str()),
            Some("Task accepted successfully!")
        );
        assert!(state.browse_tasks().iter().all(|t| t.id.as_str() != "t1"));
    }

    #[rstest]
    fn failed_accept_shows_fixed_message_and_leaves_state(mut state: AppState) {
        state.apply(Action::Navigate(View::BrowseTasks));
        state.apply(Action::AcceptSelected);
        let before = state.tasks.clone();

        let effect = state.apply(Action::TransitionFailed {
            id: TaskId::new("t1"),
            transition: Transition::Accept { tasker: demo_id() },
            reason: "400 Task is not available for acceptance".to_string(),
        });

        assert_eq!(effect, None);
        assert_eq!(state.tasks, before);
        assert!(state.pending.is_empty());
        assert_eq!(
            state.notice,
            Some(Notice {
                level: NoticeLevel::Error,
                message: "Error accepting task".to_string()
            })
        );
    }

    #[rstest]
    fn notice_blocks_input_until_dismissed(mut state: AppState) {
        state.notice = Some(Notice::info("hello"));

        assert_eq!(state.apply(Action::Navigate(View::Profile)), None);
        assert_eq!(state.view, View::Home);

        state.apply(Action::DismissNotice);
        state.apply(Action::Navigate(View::Profile));
        assert_eq!(state.view, View::Profile);
    }

    #[rstest]
    fn submit_valid_form_creates_then_navigates_to_my_tasks(mut state: AppState) {
        state.apply(Action::Navigate(View::PostTask));
        fill_form(&mut state, "20", "50");

        let new_task = match state.apply(Action::SubmitPost) {
            Some(Effect::CreateTask(new_task)) => new_task,
            other => panic!("expected create effect, got {other:?}"),
        };
        assert_eq!(new_task.client_id, demo_id());
        assert_eq!(state.apply(Action::SubmitPost), None);

        let created = Task::posted(TaskId::new("new"), new_task, chrono::Utc::now());
        let effect = state.apply(Action::TaskCreated(created));

        assert_eq!(effect, Some(Effect::FetchTasks { generation: 1 }));
        assert_eq!(state.view, View::MyTasks);
        assert!(!state.posting);
        assert!(state.form.title.is_empty());
        assert!(state.client_tasks().iter().any(|t| t.id.as_str() == "new"));
    }

    #[rstest]
    fn inverted_budget_is_refused_before_any_request(mut state: AppState) {
        state.apply(Action::Navigate(View::PostTask));
        fill_form(&mut state, "50", "20");

        assert_eq!(state.apply(Action::SubmitPost), None);
        assert!(!state.posting);
        assert_eq!(state.notice.map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[rstest]
    fn create_failure_keeps_form_for_retry(mut state: AppState) {
        state.apply(Action::Navigate(View::PostTask));
        fill_form(&mut state, "20", "50");
        state.apply(Action::SubmitPost);

        state.apply(Action::CreateFailed("500".to_string()));

        assert_eq!(state.view, View::PostTask);
        assert_eq!(state.form.title, "Move a couch");
        assert_eq!(
            state.notice.as_ref().map(|n| n.message.as_str()),
            Some("Error posting task")
        );
    }

    #[rstest]
    fn start_only_from_tasker_tab(mut state: AppState) {
        state.apply(Action::Navigate(View::MyTasks));
        assert_eq!(state.apply(Action::StartSelected), None);

        state.apply(Action::SwitchTab);
        let effect = state.apply(Action::StartSelected);

        assert_eq!(
            effect,
            Some(Effect::Transition {
                id: TaskId::new("t3"),
                transition: Transition::Start,
            })
        );
    }

    #[rstest]
    fn complete_before_start_is_refused_locally(mut state: AppState) {
        state.apply(Action::Navigate(View::MyTasks));
        state.apply(Action::SwitchTab);

        assert_eq!(state.apply(Action::CompleteSelected), None);
        assert!(state.pending.is_empty());
        assert_eq!(state.notice.map(|n| n.level), Some(NoticeLevel::Error));
    }

    #[rstest]
    fn cursor_stays_within_visible_list(mut state: AppState) {
        state.apply(Action::Navigate(View::BrowseTasks));
        state.apply(Action::MoveCursor(5));
        assert_eq!(state.browse_cursor, 1);
        state.apply(Action::MoveCursor(-9));
        assert_eq!(state.browse_cursor, 0);
    }

    #[rstest]
    fn category_change_narrows_browse(mut state: AppState) {
        state.apply(Action::Navigate(View::BrowseTasks));
        state.apply(Action::CycleCategory(1));

        assert_eq!(state.category, CategoryFilter::Only(TaskCategory::Delivery));
        let ids: Vec<_> = state.browse_tasks().iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1"]);
    }

    #[rstest]
    fn my_tasks_counts_by_role(state: AppState) {
        assert_eq!(state.client_tasks().len(), 1);
        assert_eq!(state.tasker_tasks().len(), 1);
    }

    #[rstest]
    fn list_requested_before_accept_does_not_undo_it(mut state: AppState) {
        state.apply(Action::Navigate(View::BrowseTasks));
        let before = state.apply(Action::Refresh);
        assert_eq!(before, Some(Effect::FetchTasks { generation: 0 }));
        state.apply(Action::AcceptSelected);
        state.apply(Action::Transitioned {
            id: TaskId::new("t1"),
            transition: Transition::Accept { tasker: demo_id() },
        });
        state.apply(Action::DismissNotice);

        state.apply(loaded(
            0,
            vec![sample_task("t1", "u1", TaskCategory::Delivery, TaskStatus::Posted)],
        ));

        let task = state.tasks.iter().find(|t| t.id.as_str() == "t1").unwrap();
        assert_eq!(task.status, TaskStatus::Accepted);
        assert!(state.browse_tasks().iter().all(|t| t.id.as_str() != "t1"));
        assert_ne!(
            state.apply(Action::AcceptSelected),
            Some(Effect::Transition {
                id: TaskId::new("t1"),
                transition: Transition::Accept { tasker: demo_id() },
            })
        );
    }

    #[rstest]
    fn list_requested_after_mutation_replaces_collection(mut state: AppState) {
        state.apply(Action::Navigate(View::BrowseTasks));
        state.apply(Action::AcceptSelected);
        let refetch = state.apply(Action::Transitioned {
            id: TaskId::new("t1"),
            transition: Transition::Accept { tasker: demo_id() },
        });
        assert_eq!(refetch, Some(Effect::FetchTasks { generation: 1 }));

        state.apply(loaded(1, Vec::new()));

        assert!(state.tasks.is_empty());
        assert!(!state.loading());
    }

    #[rstest]
    fn loading_lasts_until_every_fetch_answers(mut state: AppState) {
        state.apply(Action::Refresh);
        state.apply(Action::Refresh);

        state.apply(loaded(0, Vec::new()));
        assert!(state.loading());

        state.apply(Action::LoadFailed("timeout".to_string()));
        assert!(!state.loading());
    }

    #[rstest]
    fn local_apply_follows_lifecycle(mut state: AppState) {
        state.apply(Action::Transitioned {
            id: TaskId::new("t3"),
            transition: Transition::Start,
        });
        let task = state.tasks.iter().find(|t| t.id.as_str() == "t3").unwrap();
        assert_eq!(task.status, TaskStatus::InProgress);
        assert!(task.started_at.is_some());

        state.apply(Action::Transitioned {
            id: TaskId::new("t1"),
            transition: Transition::Complete,
        });
        let task = state.tasks.iter().find(|t| t.id.as_str() == "t1").unwrap();
        assert_eq!(task.status, TaskStatus::Posted);
        assert!(task.completed_at.is_none());
    }
}
