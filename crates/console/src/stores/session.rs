//! The current identity.
//!
//! The store moves through `Anonymous -> Authenticating -> Authenticated` and
//! back. Every transition bumps a generation counter: a controller that
//! suspends on the data service captures the generation first and drops its
//! result if the session changed underneath it.
//!
//! Views never see `Authenticating`. While a login is running they see the
//! session that was current before it started.

use std::sync::{Mutex, MutexGuard};

use pricewatch_core::{User, UserId};
use secrecy::SecretString;

use crate::error::ConsoleError;
use crate::sync::lock;

/// An authenticated identity with its bearer token.
pub struct Session {
    pub user: User,
    pub token: SecretString,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Lifecycle state of the session.
#[derive(Debug, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    /// A login or registration is in flight.
    Authenticating { previous: Option<Session> },
    Authenticated(Session),
}

/// Coarse session phase, for logging and the auth dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    Authenticating,
    Authenticated,
}

/// Proof that the caller started the current authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct AuthTicket(u64);

/// Session state plus its generation, guarded together.
#[derive(Debug, Default)]
pub struct SessionSlot {
    state: SessionState,
    generation: u64,
}

impl SessionSlot {
    /// The user views should display.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated(session)
            | SessionState::Authenticating {
                previous: Some(session),
            } => Some(&session.user),
            SessionState::Anonymous | SessionState::Authenticating { previous: None } => None,
        }
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        match self.state {
            SessionState::Anonymous => SessionPhase::Anonymous,
            SessionState::Authenticating { .. } => SessionPhase::Authenticating,
            SessionState::Authenticated(_) => SessionPhase::Authenticated,
        }
    }

    fn transition(&mut self, state: SessionState) -> SessionState {
        self.generation += 1;
        std::mem::replace(&mut self.state, state)
    }

    /// Drop the session, returning the user that was logged in.
    pub fn clear(&mut self) -> Option<User> {
        match self.transition(SessionState::Anonymous) {
            SessionState::Authenticated(session)
            | SessionState::Authenticating {
                previous: Some(session),
            } => Some(session.user),
            SessionState::Anonymous | SessionState::Authenticating { previous: None } => None,
        }
    }
}

/// Holder of the single process-wide session.
#[derive(Debug, Default)]
pub struct SessionStore {
    inner: Mutex<SessionSlot>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the slot. Lock the session before any other store.
    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionSlot> {
        lock(&self.inner)
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.lock().user().cloned()
    }

    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.lock().user().map(|user| user.id.clone())
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.lock().phase()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.phase() == SessionPhase::Authenticated
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.lock().generation()
    }

    /// The authenticated user together with the current generation.
    ///
    /// `None` while a login is in flight, even though [`Self::user`] still
    /// reports the previous user for display. Mutations wait for the attempt
    /// to settle.
    #[must_use]
    pub fn authenticated(&self) -> Option<(User, u64)> {
        let slot = self.lock();
        match &slot.state {
            SessionState::Authenticated(session) => Some((session.user.clone(), slot.generation)),
            SessionState::Anonymous | SessionState::Authenticating { .. } => None,
        }
    }

    /// Enter `Authenticating`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::AuthInProgress`] if another attempt is running.
    pub fn begin_auth(&self) -> Result<AuthTicket, ConsoleError> {
        let mut slot = self.lock();
        let previous = match std::mem::take(&mut slot.state) {
            SessionState::Authenticating { previous } => {
                slot.state = SessionState::Authenticating { previous };
                return Err(ConsoleError::AuthInProgress);
            }
            SessionState::Authenticated(session) => Some(session),
            SessionState::Anonymous => None,
        };
        slot.transition(SessionState::Authenticating { previous });
        Ok(AuthTicket(slot.generation))
    }

    /// Finish a successful attempt. Returns the new generation, or `None`
    /// if the attempt was overtaken (e.g. by a logout) and must be discarded.
    pub fn complete_auth(&self, ticket: AuthTicket, user: User, token: SecretString) -> Option<u64> {
        let mut slot = self.lock();
        if slot.generation != ticket.0 {
            return None;
        }
        slot.transition(SessionState::Authenticated(Session { user, token }));
        Some(slot.generation)
    }

    /// Abandon a failed attempt, restoring the session that preceded it.
    pub fn fail_auth(&self, ticket: AuthTicket) {
        let mut slot = self.lock();
        if slot.generation != ticket.0 {
            return;
        }
        let restored = match std::mem::take(&mut slot.state) {
            SessionState::Authenticating {
                previous: Some(session),
            } => SessionState::Authenticated(session),
            _ => SessionState::Anonymous,
        };
        slot.transition(restored);
    }
}
