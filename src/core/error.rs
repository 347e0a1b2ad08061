use thiserror::Error;

#[derive(Error, Debug)]
pub enum SightError {
    #[error("gateway transport failure: {0}")]
    Gateway(#[from] crate::gateway::GatewayError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("layout parse error: {0}")]
    LayoutParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, SightError>;
