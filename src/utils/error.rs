use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntentError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Gemini API Key is not configured. Please set the API_KEY environment variable.")]
    MissingApiKey,

    #[error("The provided Gemini API Key is invalid or has expired.")]
    InvalidApiKey,

    #[error("Gemini API request failed due to authentication or permission issues. Please check your API key and project setup.")]
    AuthenticationFailed,

    #[error("Gemini API quota exceeded. Please check your usage limits or try again later.")]
    QuotaExceeded,

    #[error("LLM request failed: {message}")]
    LlmResponse { message: String },

    #[error("Failed to parse JGTMLSpec from LLM response. Invalid JSON: {message}")]
    SpecParse { message: String },

    #[error("{message}")]
    SpecValidation { message: String },

    #[error("{message}")]
    CsvFormat { message: String },

    #[error("Cannot send an empty message.")]
    EmptyMessage,

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Authentication,
    Quota,
    Network,
    LlmResponse,
    Validation,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IntentError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            IntentError::MissingApiKey
            | IntentError::InvalidConfigValueError { .. }
            | IntentError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            IntentError::InvalidApiKey | IntentError::AuthenticationFailed => {
                ErrorCategory::Authentication
            }
            IntentError::QuotaExceeded => ErrorCategory::Quota,
            IntentError::ApiError(_) => ErrorCategory::Network,
            IntentError::LlmResponse { .. } | IntentError::SpecParse { .. } => {
                ErrorCategory::LlmResponse
            }
            IntentError::SpecValidation { .. } | IntentError::EmptyMessage => {
                ErrorCategory::Validation
            }
            IntentError::CsvError(_)
            | IntentError::CsvFormat { .. }
            | IntentError::SerializationError(_)
            | IntentError::ProcessingError { .. } => ErrorCategory::Data,
            IntentError::IoError(_) | IntentError::ZipError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Authentication => {
                ErrorSeverity::Critical
            }
            ErrorCategory::Quota | ErrorCategory::Network | ErrorCategory::LlmResponse => {
                ErrorSeverity::Medium
            }
            ErrorCategory::Validation | ErrorCategory::Data | ErrorCategory::Storage => {
                ErrorSeverity::High
            }
        }
    }

    /// API key、認證、配額類錯誤重試也不會成功
    pub fn is_definitive(&self) -> bool {
        matches!(
            self,
            IntentError::MissingApiKey
                | IntentError::InvalidApiKey
                | IntentError::AuthenticationFailed
                | IntentError::QuotaExceeded
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            IntentError::ApiError(e) if e.is_timeout() => {
                "The LLM service did not answer in time.".to_string()
            }
            IntentError::ApiError(_) => "Could not reach the LLM service.".to_string(),
            IntentError::IoError(e) => format!("File operation failed: {}", e),
            IntentError::CsvError(e) => format!("Failed to parse CSV file: {}", e),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            IntentError::MissingApiKey => {
                "Export API_KEY, pass --api-key, or set llm.api_key in the config file"
            }
            IntentError::InvalidApiKey | IntentError::AuthenticationFailed => {
                "Check the API key and the Google AI project it belongs to"
            }
            IntentError::QuotaExceeded => "Wait for the quota window to reset and try again",
            IntentError::ApiError(_) => "Check network connectivity and the llm.base_url setting",
            IntentError::LlmResponse { .. } | IntentError::SpecParse { .. } => {
                "Run the translation again or rephrase the narrative"
            }
            IntentError::SpecValidation { .. } => {
                "Make sure the spec has strategy_intent, instruments, timeframes and signals"
            }
            IntentError::CsvError(_) | IntentError::CsvFormat { .. } => {
                "Make sure the CSV has a header row and at least two data rows"
            }
            IntentError::EmptyMessage => "Type a message before sending",
            IntentError::InvalidConfigValueError { .. }
            | IntentError::ConfigValidationError { .. } => {
                "Review the command-line flags and the TOML configuration file"
            }
            IntentError::IoError(_) | IntentError::ZipError(_) => {
                "Check that the data and output directories are writable"
            }
            IntentError::SerializationError(_) | IntentError::ProcessingError { .. } => {
                "Check the input data format"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, IntentError>;
