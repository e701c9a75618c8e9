use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    HttpStatusError { url: String, status: u16 },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Missing field at {path}")]
    MissingField { path: String },

    #[error("Type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid value at {path} ({value}): {reason}")]
    InvalidValue {
        path: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorCategory::Network,
            EtlError::SerializationError(_)
            | EtlError::CsvError(_)
            | EtlError::MissingField { .. }
            | EtlError::TypeMismatch { .. }
            | EtlError::InvalidValue { .. } => ErrorCategory::Data,
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::MissingConfigError { .. } => ErrorCategory::Configuration,
            EtlError::IoError(_) | EtlError::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 網路錯誤通常重試即可
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 欄位路徑，僅解碼錯誤才有
    pub fn field_path(&self) -> Option<&str> {
        match self {
            EtlError::MissingField { path }
            | EtlError::TypeMismatch { path, .. }
            | EtlError::InvalidValue { path, .. } => Some(path.as_str()),
            _ => None,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ApiError(_) => {
                "Check network connectivity and that the source URL is reachable".to_string()
            }
            EtlError::HttpStatusError { status, .. } if *status >= 500 => {
                "The source server failed; retry later".to_string()
            }
            EtlError::HttpStatusError { .. } => "Verify the source URL".to_string(),
            EtlError::SerializationError(_) => {
                "Make sure the source contains well-formed JSON".to_string()
            }
            EtlError::MissingField { path } => {
                format!("Add the `{}` field to the input document", path)
            }
            EtlError::TypeMismatch { path, expected, .. } => {
                format!("Provide a {} at `{}`", expected, path)
            }
            EtlError::InvalidValue { path, .. } => {
                format!("Correct the value at `{}`", path)
            }
            EtlError::InvalidConfigValueError { field, .. } => {
                format!("Fix the `{}` setting", field)
            }
            EtlError::MissingConfigError { field } => {
                format!("Set the `{}` setting", field)
            }
            EtlError::ConfigError { .. } => "Review the configuration file".to_string(),
            EtlError::CsvError(_) | EtlError::ZipError(_) | EtlError::IoError(_) => {
                "Check that the output directory is writable and has free space".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not fetch the race data: {}", self),
            ErrorCategory::Data => format!("The race data is malformed: {}", self),
            ErrorCategory::Configuration => format!("The configuration is invalid: {}", self),
            ErrorCategory::System => format!("A system error occurred: {}", self),
        }
    }

    /// 依嚴重程度決定結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
