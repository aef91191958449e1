//! Client-local projections over the held task collection.

use crate::task::{Task, TaskCategory, TaskStatus, UserId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(TaskCategory),
}

impl CategoryFilter {
    /// `All` followed by every category, in tab order.
    pub fn tabs() -> impl Iterator<Item = CategoryFilter> {
        std::iter::once(CategoryFilter::All)
            .chain(TaskCategory::ALL.into_iter().map(CategoryFilter::Only))
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All Tasks",
            Self::Only(category) => category.label(),
        }
    }

    pub fn matches(self, category: TaskCategory) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == category,
        }
    }

    pub fn index(self) -> usize {
        Self::tabs().position(|tab| tab == self).unwrap_or(0)
    }

    /// Steps through the tabs, wrapping at both ends.
    pub fn cycle(self, step: isize) -> Self {
        let count = TaskCategory::ALL.len() as isize + 1;
        let next = (self.index() as isize + step).rem_euclid(count) as usize;
        Self::tabs().nth(next).unwrap_or_default()
    }
}

/// Open tasks in the selected category.
pub fn browse(tasks: &[Task], filter: CategoryFilter) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| t.status == TaskStatus::Posted && filter.matches(t.category))
        .collect()
}

pub fn posted_by<'a>(tasks: &'a [Task], user: &UserId) -> Vec<&'a Task> {
    tasks.iter().filter(|t| &t.client_id == user).collect()
}

pub fn assigned_to<'a>(tasks: &'a [Task], user: &UserId) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.tasker_id.as_ref() == Some(user))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::tests::sample_task;
    use rstest::{fixture, rstest};

    #[fixture]
    fn tasks() -> Vec<Task> {
        let mut accepted = sample_task("t3", "u1", TaskCategory::Cleaning, TaskStatus::Accepted);
        accepted.tasker_id = Some(UserId::new("u2"));
        let mut mine_both_ways =
            sample_task("t4", "u2", TaskCategory::Moving, TaskStatus::InProgress);
        mine_both_ways.tasker_id = Some(UserId::new("u1"));
        vec![
            sample_task("t1", "u1", TaskCategory::Delivery, TaskStatus::Posted),
            sample_task("t2", "u3", TaskCategory::Cleaning, TaskStatus::Posted),
            accepted,
            mine_both_ways,
            sample_task("t5", "u3", TaskCategory::Delivery, TaskStatus::Completed),
        ]
    }

    fn ids(tasks: Vec<&Task>) -> Vec<&str> {
        tasks.into_iter().map(|t| t.id.as_str()).collect()
    }

    #[rstest]
    #[case(CategoryFilter::All, vec!["t1", "t2"])]
    #[case(CategoryFilter::Only(TaskCategory::Delivery), vec!["t1"])]
    #[case(CategoryFilter::Only(TaskCategory::Cleaning), vec!["t2"])]
    #[case(CategoryFilter::Only(TaskCategory::Tutoring), vec![])]
    fn browse_keeps_only_posted_tasks_in_category(
        tasks: Vec<Task>,
        #[case] filter: CategoryFilter,
        #[case] expected: Vec<&str>,
    ) {
        assert_eq!(ids(browse(&tasks, filter)), expected);
    }

    #[test]
    fn browse_of_empty_collection_is_empty() {
        assert!(browse(&[], CategoryFilter::All).is_empty());
    }

    #[rstest]
    fn ownership_filters_are_independent_and_may_overlap(tasks: Vec<Task>) {
        let u1 = UserId::new("u1");

        let posted = posted_by(&tasks, &u1);
        let assigned = assigned_to(&tasks, &u1);

        assert_eq!(ids(posted.clone()), vec!["t1", "t3"]);
        assert_eq!(ids(assigned.clone()), vec!["t4"]);
        assert!(posted
            .iter()
            .chain(assigned.iter())
            .all(|t| t.client_id == u1 || t.tasker_id.as_ref() == Some(&u1)));
    }

    #[rstest]
    fn user_can_be_client_and_tasker_on_the_same_task(mut tasks: Vec<Task>) {
        let u1 = UserId::new("u1");
        tasks[2].tasker_id = Some(u1.clone());

        assert!(ids(posted_by(&tasks, &u1)).contains(&"t3"));
        assert!(ids(assigned_to(&tasks, &u1)).contains(&"t3"));
    }

    #[test]
    fn cycling_wraps_in_both_directions() {
        assert_eq!(CategoryFilter::All.cycle(1), CategoryFilter::Only(TaskCategory::Delivery));
        assert_eq!(CategoryFilter::All.cycle(-1), CategoryFilter::Only(TaskCategory::Other));
        assert_eq!(CategoryFilter::Only(TaskCategory::Other).cycle(1), CategoryFilter::All);
    }
}
