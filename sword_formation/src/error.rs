use formation_core::ConfigError;
use thiserror::Error;

/// Fatal front-end errors.  Everything inside the pipeline degrades to the
/// idle formation instead of failing.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not open window: {0}")]
    Window(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("bad command line: {0}")]
    Usage(String),
}
