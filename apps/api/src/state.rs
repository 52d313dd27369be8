use std::sync::Arc;

use crate::config::Config;
use crate::session::{SessionRegistry, SessionServices};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Store, photo storage, validator and text generator, shared by every session.
    pub services: SessionServices,
    pub sessions: Arc<SessionRegistry>,
}
