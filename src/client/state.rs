//! Device-side authentication state machine.
//!
//! ```text
//! Bootstrapping --SessionMissing------> Unauthenticated
//! Bootstrapping --SessionRestored(u)--> Authenticated(u)
//! Unauthenticated --SignedIn(u)-------> Authenticated(u)
//! Authenticated --SignedIn(u)---------> Authenticated(u)
//! Authenticated --SignedOut-----------> Unauthenticated
//! ```
//!
//! Every other pair leaves the state unchanged. Nothing leads back into
//! `Bootstrapping`.

use crate::storage::models::UserProjection;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// The persisted session has not been read yet; consumers should treat
    /// the user as unknown.
    #[default]
    Bootstrapping,
    Unauthenticated,
    Authenticated(UserProjection),
}

impl AuthState {
    pub fn user(&self) -> Option<&UserProjection> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, AuthState::Bootstrapping)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthAction {
    /// Bootstrap found no persisted session
    SessionMissing,
    /// Bootstrap found a persisted session; carries the cached projection
    SessionRestored(UserProjection),
    /// A register, login, federated login or profile update succeeded
    SignedIn(UserProjection),
    SignedOut,
}

/// Compute the next state. Pure; never fails.
pub fn reduce(state: &AuthState, action: &AuthAction) -> AuthState {
    use AuthAction::*;
    use AuthState::*;

    match (state, action) {
        (Bootstrapping, SessionMissing) => Unauthenticated,
        (Bootstrapping, SessionRestored(user)) => Authenticated(user.clone()),
        (Unauthenticated | Authenticated(_), SignedIn(user)) => Authenticated(user.clone()),
        (Authenticated(_), SignedOut) => Unauthenticated,
        _ => state.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str) -> UserProjection {
        UserProjection {
            email: format!("{}@x.com", name.to_lowercase()),
            id: format!("id-{name}"),
            is_admin: false,
            name: name.to_string(),
            phone: None,
            profile_image: None,
        }
    }

    #[test]
    fn test_bootstrap_transitions() {
        assert_eq!(
            reduce(&AuthState::Bootstrapping, &AuthAction::SessionMissing),
            AuthState::Unauthenticated
        );
        assert_eq!(
            reduce(
                &AuthState::Bootstrapping,
                &AuthAction::SessionRestored(user("Ann"))
            ),
            AuthState::Authenticated(user("Ann"))
        );
    }

    #[test]
    fn test_sign_in_and_out() {
        let signed_in = reduce(&AuthState::Unauthenticated, &AuthAction::SignedIn(user("Ann")));
        assert_eq!(signed_in, AuthState::Authenticated(user("Ann")));
        assert_eq!(signed_in.user().map(|u| u.name.as_str()), Some("Ann"));

        let updated = reduce(&signed_in, &AuthAction::SignedIn(user("Bob")));
        assert_eq!(updated, AuthState::Authenticated(user("Bob")));

        assert_eq!(
            reduce(&updated, &AuthAction::SignedOut),
            AuthState::Unauthenticated
        );
    }

    #[test]
    fn test_invalid_pairs_leave_state_unchanged() {
        let authed = AuthState::Authenticated(user("Ann"));
        let cases = [
            (AuthState::Bootstrapping, AuthAction::SignedIn(user("Ann"))),
            (AuthState::Bootstrapping, AuthAction::SignedOut),
            (AuthState::Unauthenticated, AuthAction::SessionMissing),
            (AuthState::Unauthenticated, AuthAction::SessionRestored(user("Ann"))),
            (AuthState::Unauthenticated, AuthAction::SignedOut),
            (authed.clone(), AuthAction::SessionMissing),
            (authed.clone(), AuthAction::SessionRestored(user("Bob"))),
        ];

        for (state, action) in cases {
            assert_eq!(reduce(&state, &action), state, "{action:?}");
        }
    }

    #[test]
    fn test_nothing_returns_to_bootstrapping() {
        let actions = [
            AuthAction::SessionMissing,
            AuthAction::SessionRestored(user("Ann")),
            AuthAction::SignedIn(user("Ann")),
            AuthAction::SignedOut,
        ];
        for state in [AuthState::Unauthenticated, AuthState::Authenticated(user("Ann"))] {
            for action in &actions {
                assert!(reduce(&state, action).is_known());
            }
        }
    }
}
