use thiserror::Error;

#[derive(Debug, Error)]
pub enum Red64Error {
    #[error("red64 configuration not found: run /red64:init to initialize your project")]
    ConfigNotFound,

    #[error("red64 configuration is malformed: {0}")]
    ConfigMalformed(String),

    #[error("invalid task type: {0}")]
    InvalidTaskType(String),

    #[error("invalid glob pattern '{pattern}' in standard '{standard}': {reason}")]
    InvalidPattern {
        standard: String,
        pattern: String,
        reason: String,
    },

    #[error("malformed roadmap item: {0}")]
    RoadmapMalformed(String),

    #[error("stage '{stage}' panicked")]
    StagePanicked { stage: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Red64Error {
    /// True for the errors that stop the context pipeline before it runs.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Red64Error::ConfigNotFound | Red64Error::ConfigMalformed(_))
    }
}

pub type Result<T> = std::result::Result<T, Red64Error>;
