use chrono::NaiveDate;
use ulid::Ulid;

use crate::engine::policy::Action;
use crate::model::{LaboratoryId, ReservationId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Laboratory,
    User,
    Reservation,
}

impl Entity {
    fn name(&self) -> &'static str {
        match self {
            Entity::Laboratory => "laboratory",
            Entity::User => "user",
            Entity::Reservation => "reservation",
        }
    }
}

#[derive(Debug)]
pub enum Error {
    /// Malformed input: bad interval, past-cancel attempt, owner change, …
    Validation(&'static str),
    /// The requested slot overlaps an existing active reservation.
    Conflict {
        laboratory_id: LaboratoryId,
        date: NaiveDate,
        existing: ReservationId,
    },
    NotFound(Entity, Ulid),
    /// The actor exists but may not perform this action on this entity.
    Unauthorized(Action),
    /// A collaborator (store, token issuer, lookup, notifier) failed.
    Dependency {
        collaborator: &'static str,
        detail: String,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Validation(msg) => write!(f, "validation failed: {msg}"),
            Error::Conflict {
                laboratory_id,
                date,
                existing,
            } => write!(
                f,
                "laboratory {laboratory_id} is already reserved on {date} (reservation {existing})"
            ),
            Error::NotFound(entity, id) => write!(f, "{} not found: {id}", entity.name()),
            Error::Unauthorized(action) => {
                write!(f, "not authorized to {}", action.as_str())
            }
            Error::Dependency {
                collaborator,
                detail,
            } => write!(f, "{collaborator} failure: {detail}"),
        }
    }
}

impl std::error::Error for Error {}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::Validation(a), Error::Validation(b)) => a == b,
            (
                Error::Conflict {
                    laboratory_id: l1,
                    date: d1,
                    existing: e1,
                },
                Error::Conflict {
                    laboratory_id: l2,
                    date: d2,
                    existing: e2,
                },
            ) => l1 == l2 && d1 == d2 && e1 == e2,
            (Error::NotFound(e1, id1), Error::NotFound(e2, id2)) => e1 == e2 && id1 == id2,
            (Error::Unauthorized(a), Error::Unauthorized(b)) => a == b,
            // Dependency details are free-form; compare by collaborator only.
            (
                Error::Dependency { collaborator: a, .. },
                Error::Dependency { collaborator: b, .. },
            ) => a == b,
            _ => false,
        }
    }
}
