//! Query shapes spoken between the client and the row store.
//!
//! The store exposes a PostgREST-style resource at
//! `<endpoint>/rest/v1/<table>`. Only four request shapes are ever used:
//!
//! | operation | method | query | body |
//! |-----------|--------|-------|------|
//! | fetch all | `GET` | `select=<cols>&order=created_at.desc` |  |
//! | insert | `POST` |  | `[NewTaskRow]`, `Prefer: return=representation` |
//! | update done | `PATCH` | `id=eq.<id>` | `DonePatch` |
//! | delete | `DELETE` | `id=eq.<id>` |  |

use crate::task::TaskId;

/// Path prefix of the REST interface.
pub const REST_PREFIX: &str = "/rest/v1";

/// Default table name.
pub const DEFAULT_TABLE: &str = "tasks";

/// Columns read by the client.
pub const SELECT_COLUMNS: &str = "id,text,done,priority,created_at";

/// Header carrying the access key.
pub const APIKEY_HEADER: &str = "apikey";

/// Header selecting what a write returns.
pub const PREFER_HEADER: &str = "prefer";

/// Ask the store to return the written row.
pub const PREFER_REPRESENTATION: &str = "return=representation";

/// Ask the store to return nothing.
pub const PREFER_MINIMAL: &str = "return=minimal";

/// Sort direction on `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    /// Newest first. The only order the client asks for.
    #[default]
    CreatedDesc,
    /// Oldest first.
    CreatedAsc,
}

impl Order {
    /// Query-string value for this order.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::CreatedDesc => "created_at.desc",
            Self::CreatedAsc => "created_at.asc",
        }
    }

    /// Parses an `order=` value. Only `created_at` ordering is understood.
    #[must_use]
    pub fn parse(param: &str) -> Option<Self> {
        match param {
            "created_at.desc" => Some(Self::CreatedDesc),
            "created_at" | "created_at.asc" => Some(Self::CreatedAsc),
            _ => None,
        }
    }
}

/// Builds the `id=eq.<id>` filter value.
#[must_use]
pub fn eq_filter(id: TaskId) -> String {
    format!("eq.{id}")
}

/// Parses an `eq.<id>` filter value.
#[must_use]
pub fn parse_eq_filter(value: &str) -> Option<TaskId> {
    value
        .strip_prefix("eq.")
        .and_then(|raw| raw.parse::<i64>().ok())
        .map(TaskId::new)
}

/// Path of a table resource, e.g. `/rest/v1/tasks`.
#[must_use]
pub fn table_path(table: &str) -> String {
    format!("{REST_PREFIX}/{table}")
}
