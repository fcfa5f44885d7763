//! Content records.
//!
//! Every record is a serde struct that flattens a [`RecordMeta`] (id, active
//! flag, timestamps) next to its own fields. Records are stored as JSON
//! documents keyed by [`Record::KIND`].

use crate::common::error::ValidationErrors;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub mod about;
pub mod mail;
pub mod guidance;
pub mod header;
pub mod home;
pub mod layout;
pub mod locations;
pub mod news;
pub mod products;
pub mod service;
pub mod user_support;

fn default_true() -> bool {
    true
}

/// Columns shared by every record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    #[serde(default)]
    pub id: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self {
            id: 0,
            is_active: true,
            created_at: None,
            updated_at: None,
            deleted_at: None,
        }
    }
}

impl RecordMeta {
    pub fn inactive() -> Self {
        Self {
            is_active: false,
            ..Self::default()
        }
    }
}

/// "At most one row with `flag` set", optionally per value of `scope`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExclusiveRule {
    pub flag: &'static str,
    pub scope: Option<&'static str>,
}

impl ExclusiveRule {
    pub const ACTIVE: ExclusiveRule = ExclusiveRule {
        flag: "is_active",
        scope: None,
    };

    pub const fn scoped(flag: &'static str, scope: &'static str) -> Self {
        Self {
            flag,
            scope: Some(scope),
        }
    }
}

pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: &'static str;

    /// Set for singleton kinds.
    const EXCLUSIVE: Option<ExclusiveRule> = None;

    /// Whether deleting from the admin surface only deactivates the row.
    const SOFT_DELETE: bool = true;

    fn meta(&self) -> &RecordMeta;
    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// Normalizes derived fields right before persisting.
    fn before_save(&mut self) {}

    fn validate(&self) -> Result<(), ValidationErrors> {
        Ok(())
    }

    fn id(&self) -> i64 {
        self.meta().id
    }

    fn is_active(&self) -> bool {
        self.meta().is_active
    }
}

/// Implements [`Record`] for a struct whose shared columns live in `meta`.
#[macro_export]
macro_rules! record {
    ($ty:ty, $kind:literal) => {
        impl $crate::domain::Record for $ty {
            const KIND: &'static str = $kind;
            fn meta(&self) -> &$crate::domain::RecordMeta {
                &self.meta
            }
            fn meta_mut(&mut self) -> &mut $crate::domain::RecordMeta {
                &mut self.meta
            }
        }
    };
    ($ty:ty, $kind:literal, singleton) => {
        impl $crate::domain::Record for $ty {
            const KIND: &'static str = $kind;
            const EXCLUSIVE: Option<$crate::domain::ExclusiveRule> =
                Some($crate::domain::ExclusiveRule::ACTIVE);
            fn meta(&self) -> &$crate::domain::RecordMeta {
                &self.meta
            }
            fn meta_mut(&mut self) -> &mut $crate::domain::RecordMeta {
                &mut self.meta
            }
        }
    };
}

/// Lifecycle of a user-submitted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
    Closed,
    Rejected,
}

impl SubmissionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "Pendiente",
            SubmissionStatus::InProgress => "En proceso",
            SubmissionStatus::Resolved => "Resuelto",
            SubmissionStatus::Closed => "Cerrado",
            SubmissionStatus::Rejected => "Rechazado",
        }
    }

    /// Entering one of these stamps `resolved_at`.
    pub fn is_terminal_resolution(&self) -> bool {
        matches!(self, SubmissionStatus::Resolved | SubmissionStatus::Closed)
    }
}

pub use self::about::*;
pub use self::mail::*;
pub use self::guidance::*;
pub use self::header::*;
pub use self::home::*;
pub use self::layout::*;
pub use self::locations::*;
pub use self::news::*;
pub use self::products::*;
pub use self::service::*;
pub use self::user_support::*;
