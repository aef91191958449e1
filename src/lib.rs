//! Terminal client for a local-services task marketplace.
//!
//! Clients post tasks with a budget range, taskers browse open tasks and
//! accept them. All task state lives behind a [`store::TaskStore`]; the UI
//! keeps a cached copy in [`app::AppState`] and refetches after each change.

pub mod app;
pub mod config;
pub mod effects;
pub mod filter;
pub mod form;
pub mod payments;
pub mod store;
pub mod task;
pub mod ui;
pub mod user;
