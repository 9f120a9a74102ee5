use crate::config::Config;
use crate::generation::generator::ContentGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the completion capability. Constructed once in `main`.
    pub generator: ContentGenerator,
    pub config: Config,
}
