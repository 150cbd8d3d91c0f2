use thiserror::Error;

#[derive(Debug, Error)]
pub enum BriefingError {
    #[error("no form data received")]
    MissingForm,

    #[error("no entry webhook configured")]
    NoEntryWebhook,

    #[error("no callback URL configured and none derivable from the request")]
    NoCallbackUrl,

    #[error("could not reach the remote webhook: {0}")]
    Upstream(String),
}

pub type Result<T> = std::result::Result<T, BriefingError>;
