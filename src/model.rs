use thiserror::Error;

pub mod offer;
pub mod published;

#[derive(Error, Debug)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("template: {0}")]
    Template(#[from] tera::Error),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("url: {0}")]
    Url(#[from] url::ParseError),

    #[error("query: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),

    #[error("time: {0}")]
    Time(#[from] time::error::Format),

    #[error("page already exists: {0}")]
    PageExists(std::path::PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
