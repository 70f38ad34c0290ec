use crate::error::AppError;
use serde::{Deserialize, Serialize};

mod durable;
mod transient;

pub use durable::{DurableScope, session_path};
pub use transient::TransientScope;

const DEMO_EMAIL: &str = "intern@demo.com";
const DEMO_PASSWORD: &str = "intern123";
const DEMO_NAME: &str = "Intern User";
const DEMO_ROLE: &str = "admin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    pub name: String,
    pub role: String,
}

/// One place a signed-in user can be kept.
pub trait SessionScope {
    fn load(&self) -> Option<User>;

    fn store(&self, user: &User) -> Result<(), AppError>;

    fn clear(&self) -> Result<(), AppError>;
}

/// Decides who may reach the board. Holds a durable and a transient scope;
/// the `remember` flag picks which one a login lands in.
pub struct SessionGate {
    durable: Box<dyn SessionScope>,
    transient: Box<dyn SessionScope>,
}

impl SessionGate {
    pub fn new(durable: Box<dyn SessionScope>, transient: Box<dyn SessionScope>) -> Self {
        Self {
            durable,
            transient,
        }
    }

    pub fn scope(&self, remember: bool) -> &dyn SessionScope {
        if remember {
            self.durable.as_ref()
        } else {
            self.transient.as_ref()
        }
    }

    pub fn authenticate(
        &self,
        email: &str,
        password: &str,
        remember: bool,
    ) -> Result<User, AppError> {
        if email != DEMO_EMAIL || password != DEMO_PASSWORD {
            tracing::warn!(email, "login rejected");
            return Err(AppError::invalid_credentials("Invalid email or password"));
        }

        let user = User {
            email: email.to_string(),
            name: DEMO_NAME.to_string(),
            role: DEMO_ROLE.to_string(),
        };
        self.scope(remember).store(&user)?;
        self.scope(!remember).clear()?;
        tracing::debug!(email, remember, "login accepted");
        Ok(user)
    }

    pub fn current_user(&self) -> Option<User> {
        self.durable.load().or_else(|| self.transient.load())
    }

    /// Same as `current_user`, but an absent user is an error.
    pub fn require_user(&self) -> Result<User, AppError> {
        self.current_user()
            .ok_or_else(|| AppError::unauthenticated("please log in first"))
    }

    pub fn end_session(&self) -> Result<(), AppError> {
        self.durable.clear()?;
        self.transient.clear()
    }
}
