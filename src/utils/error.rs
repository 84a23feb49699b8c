use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelPerfError {
    #[error("Benchmark download failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Benchmark data could not be parsed: {message}")]
    ParseError { message: String },

    #[error("Could not find {tool} (searched: {searched})")]
    ToolNotFoundError { tool: String, searched: String },

    #[error("Running {tool} failed: {message}")]
    ToolInvocationError { tool: String, message: String },

    #[error("Unexpected device listing on line {line_number}: {line:?}")]
    FormatError { line_number: usize, line: String },

    #[error("Device {name:?} is not present in the benchmark dataset")]
    UnknownDeviceError { name: String },

    #[error("Device {name:?} has a non-positive benchmark score ({score})")]
    InvalidScoreError { name: String, score: u64 },

    #[error("Platform {platform} is not supported yet")]
    UnsupportedPlatformError { platform: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value:?} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Tool,
    Platform,
    System,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl RelPerfError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RelPerfError::NetworkError(_) => ErrorCategory::Network,
            RelPerfError::ParseError { .. }
            | RelPerfError::FormatError { .. }
            | RelPerfError::UnknownDeviceError { .. }
            | RelPerfError::InvalidScoreError { .. } => ErrorCategory::Data,
            RelPerfError::ToolNotFoundError { .. } | RelPerfError::ToolInvocationError { .. } => {
                ErrorCategory::Tool
            }
            RelPerfError::UnsupportedPlatformError { .. } => ErrorCategory::Platform,
            RelPerfError::IoError(_) => ErrorCategory::System,
            RelPerfError::ConfigError { .. } | RelPerfError::InvalidConfigValueError { .. } => {
                ErrorCategory::Configuration
            }
        }
    }

    /// Every variant aborts the run; severity only selects the exit code.
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Tool | ErrorCategory::Configuration => {
                ErrorSeverity::High
            }
            ErrorCategory::Platform | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::High => 1,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            RelPerfError::NetworkError(_) => {
                "Check your network connection and run again".to_string()
            }
            RelPerfError::ParseError { .. } => {
                "Delete the cached benchmark file so it is downloaded again".to_string()
            }
            RelPerfError::ToolNotFoundError { tool, .. } => format!(
                "Install the NVIDIA driver utilities and make sure {} is on your PATH",
                tool
            ),
            RelPerfError::ToolInvocationError { tool, .. } => {
                format!("Run `{} --list-gpus` manually to inspect the failure", tool)
            }
            RelPerfError::FormatError { .. } => {
                "The driver tool output format changed; please report the line above".to_string()
            }
            RelPerfError::UnknownDeviceError { .. } => {
                "The benchmark database has no entry with this exact name; try refreshing it"
                    .to_string()
            }
            RelPerfError::InvalidScoreError { .. } => {
                "The benchmark database contains a zero score; refresh it".to_string()
            }
            RelPerfError::UnsupportedPlatformError { .. } => {
                "Run on Linux or Windows with an NVIDIA driver installed".to_string()
            }
            RelPerfError::IoError(_) => {
                "Check that the cache directory exists and is writable".to_string()
            }
            RelPerfError::ConfigError { .. } | RelPerfError::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            RelPerfError::NetworkError(_) => {
                format!("Could not download benchmark scores: {}", self)
            }
            RelPerfError::ToolNotFoundError { tool, searched } => {
                format!("{} is not installed or not reachable (looked in {})", tool, searched)
            }
            RelPerfError::UnknownDeviceError { name } => {
                format!("No benchmark score is known for \"{}\"", name)
            }
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RelPerfError>;
