//! Route authorization.
//!
//! Every view transition is checked with [`can_access`] / [`authorize`] before it happens.
//! The rules, checked in order:
//!
//! 1. `home`, `signup`, `login` → open to everyone
//! 2. `patient`, `diagnose`, `history` → any signed-in account
//! 3. `admin` → signed-in account with the admin role
//!
//! A denied caller is redirected to the login view when signed out, or to their own
//! landing view when signed in with the wrong role.

use crate::account::{Account, Role};
use crate::{SessionError, SessionResult};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Signup,
    Login,
    Patient,
    Diagnose,
    History,
    Admin,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Home,
        Route::Signup,
        Route::Login,
        Route::Patient,
        Route::Diagnose,
        Route::History,
        Route::Admin,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Signup => "signup",
            Self::Login => "login",
            Self::Patient => "patient",
            Self::Diagnose => "diagnose",
            Self::History => "history",
            Self::Admin => "admin",
        }
    }

    /// The role a route requires, or `None` if any signed-in account will do.
    fn required_role(self) -> Option<Role> {
        match self {
            Self::Admin => Some(Role::Admin),
            _ => None,
        }
    }

    fn is_public(self) -> bool {
        matches!(self, Self::Home | Self::Signup | Self::Login)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Route {
    type Err = SessionError;

    fn from_str(s: &str) -> SessionResult<Self> {
        Route::ALL
            .into_iter()
            .find(|route| route.as_str() == s.trim())
            .ok_or_else(|| SessionError::Validation(format!("unknown route: {s}")))
    }
}

/// The view an account lands on after signing in.
pub fn landing_route(role: Role) -> Route {
    match role {
        Role::Admin => Route::Admin,
        Role::Patient => Route::Patient,
    }
}

pub fn can_access(route: Route, active: Option<&Account>) -> bool {
    if route.is_public() {
        return true;
    }

    match (active, route.required_role()) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(account), Some(role)) => account.role == role,
    }
}

/// Like [`can_access`], but explains where a denied caller should go instead.
///
/// # Errors
///
/// Returns `SessionError::AuthorizationRequired` carrying the redirect route.
pub fn authorize(route: Route, active: Option<&Account>) -> SessionResult<()> {
    if can_access(route, active) {
        return Ok(());
    }

    let redirect = match active {
        None => Route::Login,
        Some(account) => landing_route(account.role),
    };

    Err(SessionError::AuthorizationRequired { route, redirect })
}
