use thiserror::Error;

/// Failures surfaced at the session boundary. Everything after start-up is
/// logged instead of returned.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("media engine setup failed: {0}")]
    Media(String),

    #[error("invalid session config: {0}")]
    InvalidConfig(String),

    #[error("mesh session is closed")]
    SessionClosed,
}
