use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("upstream returned HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),
}
