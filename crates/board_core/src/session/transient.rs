use crate::error::AppError;
use crate::session::{SessionScope, User};
use std::cell::RefCell;

/// Session slot that lives only as long as this process.
#[derive(Debug, Default)]
pub struct TransientScope {
    user: RefCell<Option<User>>,
}

impl TransientScope {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionScope for TransientScope {
    fn load(&self) -> Option<User> {
        self.user.borrow().clone()
    }

    fn store(&self, user: &User) -> Result<(), AppError> {
        *self.user.borrow_mut() = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AppError> {
        self.user.borrow_mut().take();
        Ok(())
    }
}
