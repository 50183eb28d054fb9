//! Task model and wire rows shared by the `tasklist` client and backend.

pub mod query;
pub mod row;
pub mod task;
