//! Lifecycle of a single write operation.
//!
//! A `Mutation` moves `Idle -> Pending -> Success | Error`. A settled
//! mutation stays settled until the next `begin`, which re-arms it. While
//! pending, `begin` is refused: the control that triggers it is disabled.

use tracing::{debug, info, warn};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Toggle,
    Destroy,
}

impl MutationKind {
    /// Message shown when the mutation succeeds.
    pub fn success_message(&self) -> &'static str {
        match self {
            MutationKind::Create => "Todo created successfully",
            MutationKind::Toggle => "Todo toggled successfully",
            MutationKind::Destroy => "Todo deleted successfully",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error,
}

/// Returned by [`Mutation::begin`] when the previous run has not settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0:?} mutation is already pending")]
pub struct AlreadyPending(pub MutationKind);

#[derive(Debug, Clone)]
pub struct Mutation<I, O> {
    kind: MutationKind,
    status: MutationStatus,
    variables: Option<I>,
    data: Option<O>,
    error: Option<ApiError>,
}

impl<I: Clone, O> Mutation<I, O> {
    pub fn new(kind: MutationKind) -> Self {
        Self {
            kind,
            status: MutationStatus::Idle,
            variables: None,
            data: None,
            error: None,
        }
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn status(&self) -> MutationStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status == MutationStatus::Pending
    }

    /// Inputs of the current (or last) run.
    pub fn variables(&self) -> Option<&I> {
        self.variables.as_ref()
    }

    pub fn data(&self) -> Option<&O> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&ApiError> {
        self.error.as_ref()
    }

    /// Start a new run with `input`.
    pub fn begin(&mut self, input: I) -> Result<I, AlreadyPending> {
        if self.is_pending() {
            return Err(AlreadyPending(self.kind));
        }
        debug!(kind = ?self.kind, "mutation pending");
        self.status = MutationStatus::Pending;
        self.variables = Some(input.clone());
        self.data = None;
        self.error = None;
        Ok(input)
    }

    pub fn succeed(&mut self, output: O) {
        info!(kind = ?self.kind, "mutation succeeded");
        self.status = MutationStatus::Success;
        self.data = Some(output);
    }

    pub fn fail(&mut self, error: ApiError) {
        warn!(kind = ?self.kind, %error, "mutation failed");
        self.status = MutationStatus::Error;
        self.error = Some(error);
    }

    /// Back to `Idle`, forgetting the last run.
    pub fn reset(&mut self) {
        *self = Self::new(self.kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_path() {
        let mut m: Mutation<i64, ()> = Mutation::new(MutationKind::Destroy);
        assert_eq!(m.status(), MutationStatus::Idle);

        m.begin(4).unwrap();
        assert!(m.is_pending());
        assert_eq!(m.variables(), Some(&4));

        m.succeed(());
        assert_eq!(m.status(), MutationStatus::Success);
        assert_eq!(m.data(), Some(&()));
    }

    #[test]
    fn begin_is_refused_while_pending() {
        let mut m: Mutation<i64, ()> = Mutation::new(MutationKind::Toggle);
        m.begin(1).unwrap();
        assert_eq!(m.begin(2), Err(AlreadyPending(MutationKind::Toggle)));
        assert_eq!(m.variables(), Some(&1));
    }

    #[test]
    fn settled_mutation_rearms_on_next_begin() {
        let mut m: Mutation<i64, ()> = Mutation::new(MutationKind::Destroy);
        m.begin(1).unwrap();
        m.fail(ApiError::NotFound);
        assert_eq!(m.status(), MutationStatus::Error);
        assert_eq!(m.error(), Some(&ApiError::NotFound));

        m.begin(2).unwrap();
        assert!(m.is_pending());
        assert!(m.error().is_none());

        m.reset();
        assert_eq!(m.status(), MutationStatus::Idle);
        assert!(m.variables().is_none());
    }

    #[test]
    fn success_messages() {
        assert_eq!(MutationKind::Create.success_message(), "Todo created successfully");
        assert_eq!(MutationKind::Destroy.success_message(), "Todo deleted successfully");
    }
}
