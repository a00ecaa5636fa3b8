use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Inbound payload was not JSON or did not have the telemetry shape.
    #[error("malformed telemetry frame: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    /// The outbound socket was not open when a command had to go out.
    #[error("transport unavailable, command dropped")]
    TransportUnavailable,

    #[error("failed to encode control command: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to read config {path}: {source}")]
    Config {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
