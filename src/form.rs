//! Post-a-task form state.

use crate::task::{DraftError, Location, Priority, TaskCategory, TaskDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Category,
    BudgetMin,
    BudgetMax,
    Address,
    Priority,
    Duration,
}

impl Field {
    pub const ORDER: [Field; 8] = [
        Field::Title,
        Field::Description,
        Field::Category,
        Field::BudgetMin,
        Field::BudgetMax,
        Field::Address,
        Field::Priority,
        Field::Duration,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Title => "Task Title",
            Self::Description => "Description",
            Self::Category => "Category",
            Self::BudgetMin => "Min Budget ($)",
            Self::BudgetMax => "Max Budget ($)",
            Self::Address => "Location",
            Self::Priority => "Priority",
            Self::Duration => "Duration (minutes)",
        }
    }

    pub const fn is_choice(self) -> bool {
        matches!(self, Self::Category | Self::Priority)
    }
}

/// Editing operations the key map can send to the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormInput {
    Char(char),
    Backspace,
    NextField,
    PrevField,
    NextChoice,
    PrevChoice,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostTaskForm {
    pub title: String,
    pub description: String,
    pub category: TaskCategory,
    pub budget_min: String,
    pub budget_max: String,
    pub address: String,
    pub priority: Priority,
    pub estimated_duration: String,
    focus: usize,
    origin: (f64, f64),
}

impl PostTaskForm {
    const DEFAULT_ORIGIN: (f64, f64) = (40.7128, -74.0060);

    /// Empty form whose location defaults to the given coordinates.
    pub fn new(origin: Option<&Location>) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            category: TaskCategory::Other,
            budget_min: String::new(),
            budget_max: String::new(),
            address: String::new(),
            priority: Priority::Normal,
            estimated_duration: String::new(),
            focus: 0,
            origin: origin.map_or(Self::DEFAULT_ORIGIN, |l| (l.latitude, l.longitude)),
        }
    }

    pub fn focused(&self) -> Field {
        Field::ORDER[self.focus]
    }

    /// Display value of a field.
    pub fn value(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
            Field::Category => self.category.label(),
            Field::BudgetMin => &self.budget_min,
            Field::BudgetMax => &self.budget_max,
            Field::Address => &self.address,
            Field::Priority => self.priority.label(),
            Field::Duration => &self.estimated_duration,
        }
    }

    fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::Title => Some(&mut self.title),
            Field::Description => Some(&mut self.description),
            Field::BudgetMin => Some(&mut self.budget_min),
            Field::BudgetMax => Some(&mut self.budget_max),
            Field::Address => Some(&mut self.address),
            Field::Duration => Some(&mut self.estimated_duration),
            Field::Category | Field::Priority => None,
        }
    }

    pub fn input(&mut self, input: FormInput) {
        let field = self.focused();
        match input {
            FormInput::NextField => self.focus = (self.focus + 1) % Field::ORDER.len(),
            FormInput::PrevField => {
                self.focus = (self.focus + Field::ORDER.len() - 1) % Field::ORDER.len();
            }
            FormInput::NextChoice => self.cycle_choice(field, 1),
            FormInput::PrevChoice => self.cycle_choice(field, -1),
            FormInput::Char(c) => {
                if let Some(text) = self.text_mut(field) {
                    text.push(c);
                }
            }
            FormInput::Backspace => {
                if let Some(text) = self.text_mut(field) {
                    text.pop();
                }
            }
        }
    }

    fn cycle_choice(&mut self, field: Field, step: isize) {
        match field {
            Field::Category => {
                self.category = cycle(&TaskCategory::ALL, self.category, step);
            }
            Field::Priority => {
                self.priority = cycle(&Priority::ALL, self.priority, step);
            }
            _ => {}
        }
    }

    /// Parses the raw inputs. Validation of the parsed values happens in
    /// [`TaskDraft::submit`].
    pub fn to_draft(&self) -> Result<TaskDraft, DraftError> {
        let budget_min = parse_budget("budget_min", &self.budget_min)?;
        let budget_max = parse_budget("budget_max", &self.budget_max)?;
        let duration = self.estimated_duration.trim();
        let estimated_duration = if duration.is_empty() {
            None
        } else {
            let minutes = duration
                .parse::<u32>()
                .map_err(|_| DraftError::InvalidDuration(duration.to_string()))?;
            Some(minutes)
        };
        let address = self.address.trim();

        Ok(TaskDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category,
            budget_min,
            budget_max,
            priority: self.priority,
            estimated_duration,
            location: Location {
                latitude: self.origin.0,
                longitude: self.origin.1,
                address: (!address.is_empty()).then(|| address.to_string()),
                is_shared: true,
            },
        })
    }
}

fn parse_budget(field: &'static str, raw: &str) -> Result<f64, DraftError> {
    let raw = raw.trim();
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| DraftError::InvalidBudget {
            field,
            value: raw.to_string(),
        })
}

fn cycle<T: Copy + PartialEq>(options: &[T], current: T, step: isize) -> T {
    let len = options.len() as isize;
    let index = options.iter().position(|o| *o == current).unwrap_or(0) as isize;
    options[(index + step).rem_euclid(len) as usize]
}
