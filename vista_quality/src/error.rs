use thiserror::Error;

use vista_scene::ProfileError;

use crate::backend::BackendError;

/// Failures inside the degradation machinery. None of these propagate out
/// of `evaluate`/`apply`: action failures are logged and retried, platform
/// gaps downgrade to size-only operation, and a bad profile just leaves the
/// model unoptimized.
#[derive(Debug, Error)]
pub enum QualityError {
    #[error("degradation action failed: {0}")]
    ActionApplication(#[from] BackendError),
    #[error("platform exposes no heap introspection")]
    UnsupportedPlatform,
    #[error("invalid model profile: {0}")]
    InvalidProfile(#[from] ProfileError),
}
