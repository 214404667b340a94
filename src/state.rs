use std::sync::Arc;

use crate::config::Config;
use crate::email::Mailer;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: Config,
    /// `None` when the provider is missing credentials or a sender address.
    pub mailer: Option<Arc<dyn Mailer>>,
}
