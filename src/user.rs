use serde::{Deserialize, Serialize};

use crate::task::{Location, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Client,
    Tasker,
    Both,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Client => "Client",
            Self::Tasker => "Tasker",
            Self::Both => "Client & Tasker",
        }
    }
}

/// The active user. There is no authentication, so this is always a local mock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: UserRole,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub location: Option<Location>,
    pub rating: f64,
    pub total_reviews: u32,
}

impl User {
    pub fn demo() -> Self {
        Self {
            id: UserId::new("demo-user-123"),
            name: "John Doe".to_string(),
            email: "john@example.com".to_string(),
            phone: "+1234567890".to_string(),
            role: UserRole::Both,
            bio: None,
            skills: Vec::new(),
            location: Some(Location {
                latitude: 40.7128,
                longitude: -74.0060,
                address: Some("New York, NY".to_string()),
                is_shared: true,
            }),
            rating: 4.8,
            total_reviews: 25,
        }
    }

    pub fn initial(&self) -> char {
        self.name.chars().next().unwrap_or('?')
    }

    pub fn shares_location(&self) -> bool {
        self.location.as_ref().is_some_and(|l| l.is_shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_user_is_client_and_tasker_in_new_york() {
        let user = User::demo();

        assert_eq!(user.id.as_str(), "demo-user-123");
        assert_eq!(user.role.label(), "Client & Tasker");
        assert_eq!(user.initial(), 'J');
        assert!(user.shares_location());
    }
}
