use serde::{Deserialize, Serialize};

/// Error category enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    ParseError,
    ConversionAttemptError,
    SubprocessError,
    TimeoutError,
    ConfigError,
    IoError,
    ServerError,
    InternalError,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Error severity enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Aborts the run.
    Fatal,
    /// Logged; the pipeline moves on to the next stage.
    Recoverable,
    Error,
}

/// In-process call shapes tried by the conversion ladder, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStage {
    /// `(input, destination, options)`
    WithDestination,
    /// `(input, options)`
    InputOnly,
}

impl ConversionStage {
    /// Short marker used in log lines.
    pub fn marker(self) -> &'static str {
        match self {
            ConversionStage::WithDestination => "attempt-1",
            ConversionStage::InputOnly => "attempt-2",
        }
    }
}

impl std::fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.marker())
    }
}
