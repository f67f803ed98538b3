use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("{0}")]
    Other(String),
}

/// Both transports failed for one event.
#[derive(Error, Debug)]
#[error("delivery failed: primary ({primary}), secondary ({secondary})")]
pub struct DeliveryError {
    pub primary: TransportError,
    pub secondary: TransportError,
}
