//! Two-state capability of an optional collaborator.
//!
//! A capability is evaluated once at the start of an operation and passed on explicitly, so the
//! fallback taken when a collaborator is missing is decided in exactly one place.

/// Whether a dependency (durable store, credential agent) can be used for the current operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability<T> {
    Available(T),
    Unavailable,
}

impl<T> Capability<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    /// Converts into an `Option`, discarding the distinction between the two variants' names.
    pub fn available(self) -> Option<T> {
        match self {
            Capability::Available(inner) => Some(inner),
            Capability::Unavailable => None,
        }
    }
}

impl<T> From<Option<T>> for Capability<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(inner) => Capability::Available(inner),
            None => Capability::Unavailable,
        }
    }
}
