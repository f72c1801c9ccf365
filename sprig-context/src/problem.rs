//! 配置问题报告
//!
//! 解析声明式配置时，单个过滤器之类的局部错误不会直接中断整个声明，而是交给
//! [`ProblemReporter`] 处理。报告器决定是立即失败、记录日志还是收集起来。

use std::fmt;

use parking_lot::Mutex;
use sprig_core::error::{ContainerError, ContainerResult};

/// 配置问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    message: String,
    source: Option<String>,
    cause: Option<String>,
}

impl Problem {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            cause: None,
        }
    }

    /// 问题所在的声明，例如 `application.toml[component-scan #0]`
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    pub fn with_cause(mut self, cause: &ContainerError) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(source) = &self.source {
            write!(f, "\nOffending resource: {}", source)?;
        }
        Ok(())
    }
}

/// 问题报告器
pub trait ProblemReporter: Send + Sync {
    /// 报告错误，返回 `Err` 时调用方中止当前声明
    fn error(&self, problem: Problem) -> ContainerResult<()>;

    /// 报告警告
    fn warning(&self, problem: Problem);
}

/// 第一个错误就失败
#[derive(Debug, Default)]
pub struct FailFastProblemReporter;

impl ProblemReporter for FailFastProblemReporter {
    fn error(&self, problem: Problem) -> ContainerResult<()> {
        Err(ContainerError::Configuration(problem.to_string()))
    }

    fn warning(&self, problem: Problem) {
        tracing::warn!("{}", problem);
    }
}

/// 把问题写入日志并继续
#[derive(Debug, Default)]
pub struct LoggingProblemReporter;

impl ProblemReporter for LoggingProblemReporter {
    fn error(&self, problem: Problem) -> ContainerResult<()> {
        match problem.cause() {
            Some(cause) => tracing::error!("{} (caused by: {})", problem, cause),
            None => tracing::error!("{}", problem),
        }
        Ok(())
    }

    fn warning(&self, problem: Problem) {
        tracing::warn!("{}", problem);
    }
}

/// 收集所有问题，供调用方之后检查
#[derive(Debug, Default)]
pub struct CollectingProblemReporter {
    errors: Mutex<Vec<Problem>>,
    warnings: Mutex<Vec<Problem>>,
}

impl CollectingProblemReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> Vec<Problem> {
        self.errors.lock().clone()
    }

    pub fn warnings(&self) -> Vec<Problem> {
        self.warnings.lock().clone()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.lock().is_empty()
    }
}

impl ProblemReporter for CollectingProblemReporter {
    fn error(&self, problem: Problem) -> ContainerResult<()> {
        tracing::debug!("Collected configuration error: {}", problem.message());
        self.errors.lock().push(problem);
        Ok(())
    }

    fn warning(&self, problem: Problem) {
        self.warnings.lock().push(problem);
    }
}
