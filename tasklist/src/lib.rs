//! `tasklist`: terminal task list synced to a hosted row store.
//!
//! The [`store::TaskListStore`] owns the list and talks to a
//! [`repository::TaskRepository`]; [`sync`] runs it off the UI thread and
//! [`app`] / [`ui`] render it.

pub mod app;
pub mod config;
pub mod repository;
pub mod store;
pub mod sync;
pub mod ui;
