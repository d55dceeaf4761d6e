/// Failure category; each maps to a process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration (flags, env vars).
    Config,
    /// Zero rows survive normalization + the analysis window.
    DataQuality,
    /// Unreachable source, malformed table, missing columns, bad model artifact.
    Ingestion,
    /// Model incompatible with the input or unable to produce a prediction.
    Forecast,
    /// Export files or terminal I/O.
    Output,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config => 2,
            ErrorKind::DataQuality => 3,
            ErrorKind::Ingestion => 4,
            ErrorKind::Forecast => 5,
            ErrorKind::Output => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Config => "configuration error",
            ErrorKind::DataQuality => "data quality error",
            ErrorKind::Ingestion => "ingestion error",
            ErrorKind::Forecast => "forecast error",
            ErrorKind::Output => "output error",
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn data_quality(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataQuality, message)
    }

    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Ingestion, message)
    }

    pub fn forecast(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forecast, message)
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Output, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
