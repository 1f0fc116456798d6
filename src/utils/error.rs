use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StackError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("File is not valid UTF-8: {0}")]
    EncodingError(#[from] std::string::FromUtf8Error),

    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Unsupported document layout: {message}")]
    UnsupportedLayout { message: String },

    #[error("Transformed content of {file} could not be re-parsed: {message}")]
    ReparseError { file: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// 單一檔案失敗，其他檔案繼續處理
    Recoverable,
    /// 整個執行中止
    Fatal,
}

impl StackError {
    pub fn unsupported(message: impl Into<String>) -> Self {
        StackError::UnsupportedLayout {
            message: message.into(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StackError::DirectoryNotFound { .. }
            | StackError::ConfigError { .. }
            | StackError::MissingConfigError { .. }
            | StackError::InvalidConfigValueError { .. }
            | StackError::TomlError(_) => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Recoverable,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            StackError::DirectoryNotFound { path } => {
                format!("Source directory {} does not exist", path.display())
            }
            StackError::TomlError(_) => "The configuration file is not valid TOML".to_string(),
            StackError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration field '{}' is invalid: {}", field, reason)
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            StackError::DirectoryNotFound { .. } => {
                "Check --source-dir or source_dir in the configuration file"
            }
            StackError::TomlError(_) | StackError::ConfigError { .. } => {
                "Fix the configuration file and run again"
            }
            StackError::MissingConfigError { .. } | StackError::InvalidConfigValueError { .. } => {
                "Provide a valid value for the reported field"
            }
            StackError::YamlError(_)
            | StackError::UnsupportedLayout { .. }
            | StackError::ReparseError { .. }
            | StackError::EncodingError(_) => "Check the stack file syntax",
            StackError::IoError(_) => "Check file permissions and free disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, StackError>;
