use thiserror::Error;

/// Failure taxonomy shared by the remote client, the orchestrator and the CLI.
///
/// Cloneable so a failure can live inside a published session snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("Request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("Remote service unreachable: {0}")]
    NetworkUnavailable(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Request rejected by server: {0}")]
    ServerRejected(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Invalid value for '{field}': {value} ({reason})")]
    ValidationError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in '{field}': {message}")]
    ConfigError { field: String, message: String },

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Analysis task failed: {0}")]
    TaskFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Server,
    Data,
    Input,
    Configuration,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl ErrorKind {
    pub fn validation(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        ErrorKind::ValidationError {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ErrorKind::Timeout { .. } | ErrorKind::NetworkUnavailable(_) => ErrorCategory::Network,
            ErrorKind::ServerError { .. } | ErrorKind::ServerRejected(_) => ErrorCategory::Server,
            ErrorKind::MalformedResponse(_) => ErrorCategory::Data,
            ErrorKind::ValidationError { .. } => ErrorCategory::Input,
            ErrorKind::ConfigError { .. } | ErrorKind::IoError(_) => ErrorCategory::Configuration,
            ErrorKind::TaskFailed(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ErrorKind::Timeout { .. } | ErrorKind::NetworkUnavailable(_) => ErrorSeverity::Medium,
            ErrorKind::ServerError { status, .. } if *status >= 500 => ErrorSeverity::Medium,
            ErrorKind::ServerError { .. }
            | ErrorKind::ServerRejected(_)
            | ErrorKind::MalformedResponse(_)
            | ErrorKind::ValidationError { .. }
            | ErrorKind::TaskFailed(_) => ErrorSeverity::High,
            ErrorKind::ConfigError { .. } | ErrorKind::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// Transient failures a caller may reasonably try again.
    pub fn is_retryable(&self) -> bool {
        self.severity() == ErrorSeverity::Medium
    }

    /// Process exit status for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ErrorKind::Timeout { after_ms } => {
                format!("请求超时（{}秒），分析过程可能需要较长时间", after_ms / 1000)
            }
            ErrorKind::NetworkUnavailable(_) => "无法连接到后端服务".to_string(),
            ErrorKind::ServerError { status, message } => {
                format!("服务器错误 ({}): {}", status, message)
            }
            ErrorKind::ServerRejected(message) => message.clone(),
            ErrorKind::MalformedResponse(_) => "服务返回了无法识别的数据".to_string(),
            ErrorKind::ValidationError { field, reason, .. } => {
                format!("输入信息有误（{}）：{}", field, reason)
            }
            ErrorKind::ConfigError { field, message } => {
                format!("配置错误（{}）：{}", field, message)
            }
            ErrorKind::IoError(message) => format!("文件读写失败：{}", message),
            ErrorKind::TaskFailed(_) => "分析任务意外中断".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "请检查网络连接或后端服务是否已启动，稍后重试",
            ErrorCategory::Server => "请稍后重试，如问题持续请联系服务维护者",
            ErrorCategory::Data => "服务端版本可能不兼容，请确认后端服务版本",
            ErrorCategory::Input => "请检查出生信息是否填写正确",
            ErrorCategory::Configuration => "请检查配置文件与命令行参数",
            ErrorCategory::Internal => "请重新发起分析，如问题持续请反馈",
        }
    }
}

pub type Result<T> = std::result::Result<T, ErrorKind>;
