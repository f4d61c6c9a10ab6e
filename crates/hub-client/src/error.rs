use thiserror::Error;

pub type Result<T, E = HubError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("email is already registered")]
    EmailTaken,

    #[error("username is already taken")]
    UsernameTaken,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("not logged in")]
    NotLoggedIn,

    #[error("administrator role required")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Validation(&'static str),

    #[error("image upload failed: {0}")]
    Upload(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("backend request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("session file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

impl HubError {
    /// Errors that are the user's to fix, as opposed to transport or storage
    /// failures.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::EmailTaken
                | Self::UsernameTaken
                | Self::InvalidCredentials
                | Self::NotLoggedIn
                | Self::Forbidden
                | Self::NotFound(_)
                | Self::Validation(_)
        )
    }
}
