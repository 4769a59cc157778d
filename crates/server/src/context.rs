//! Request-scoped context.
//!
//! Every operation receives one of these instead of reaching for ambient
//! state: the resolved caller (if any) plus handles to the three external
//! collaborators. The context is owned by the call for its duration.

use std::sync::Arc;

use crate::error::AppError;
use crate::mail::Mailer;
use crate::models::User;
use crate::payments::PaymentGateway;
use crate::store::Store;

/// Everything one inbound operation is allowed to touch.
#[derive(Clone)]
pub struct RequestContext {
    /// The authenticated caller, or `None` for anonymous requests.
    pub caller: Option<User>,
    pub store: Arc<dyn Store>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub mailer: Arc<dyn Mailer>,
}

impl RequestContext {
    /// Create a context for one request.
    #[must_use]
    pub const fn new(
        caller: Option<User>,
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            caller,
            store,
            gateway,
            mailer,
        }
    }

    /// The caller, or `Unauthorized` if the request is anonymous.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when no caller is set.
    pub fn caller(&self) -> Result<&User, AppError> {
        self.caller
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("you must be logged in".to_owned()))
    }
}
