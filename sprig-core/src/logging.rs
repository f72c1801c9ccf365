//! 日志初始化
//!
//! 级别直接使用 [`tracing::Level`]。配置来自环境变量（`RUST_LOG`、`LOG_LEVEL`、
//! `LOG_FORMAT`）或者 Environment 中的 `logging.*` 属性。

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::Environment;
use crate::error::{ContainerError, ContainerResult};

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    /// 带时间、级别和目标的完整格式
    Full,
    Json,
    /// 多行输出，适合本地开发
    Pretty,
}

impl LogFormat {
    const NAMES: [(&'static str, LogFormat); 4] = [
        ("compact", LogFormat::Compact),
        ("full", LogFormat::Full),
        ("json", LogFormat::Json),
        ("pretty", LogFormat::Pretty),
    ];

    pub fn as_str(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(_, format)| *format == self)
            .map(|(name, _)| *name)
            .unwrap_or("compact")
    }
}

impl FromStr for LogFormat {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::NAMES
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, format)| *format)
            .ok_or_else(|| ContainerError::Configuration(format!("Invalid log format: {}", s)))
    }
}

/// 解析日志级别，额外接受 `warning`
pub fn parse_level(value: &str) -> ContainerResult<Level> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("warning") {
        return Ok(Level::WARN);
    }
    value
        .parse::<Level>()
        .map_err(|_| ContainerError::Configuration(format!("Invalid log level: {}", value)))
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: Level,
    pub format: LogFormat,
    /// 是否输出模块路径
    pub show_target: bool,
    pub show_thread_ids: bool,
    /// EnvFilter 指令，例如 `sprig_context=debug,sprig_core=warn`；优先于 `level`
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::default(),
            show_target: false,
            show_thread_ids: false,
            filter: None,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_target(mut self, show: bool) -> Self {
        self.show_target = show;
        self
    }

    pub fn with_thread_ids(mut self, show: bool) -> Self {
        self.show_thread_ids = show;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// 读取环境变量，无法解析的值被忽略
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.filter = std::env::var("RUST_LOG").ok();
        if let Some(level) = std::env::var("LOG_LEVEL").ok().and_then(|v| parse_level(&v).ok()) {
            config.level = level;
        }
        if let Some(format) = std::env::var("LOG_FORMAT").ok().and_then(|v| v.parse().ok()) {
            config.format = format;
        }
        config
    }

    /// 读取 `logging.*` 属性，无效值是配置错误
    pub fn from_environment(environment: &Environment) -> ContainerResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            level: match environment.get_string("logging.level") {
                Some(level) => parse_level(&level)?,
                None => defaults.level,
            },
            format: match environment.get_string("logging.format") {
                Some(format) => format.parse()?,
                None => defaults.format,
            },
            show_target: environment.get_bool_or("logging.show-target", defaults.show_target),
            show_thread_ids: environment.get_bool_or("logging.show-thread-ids", defaults.show_thread_ids),
            filter: environment.get_string("logging.filter"),
        })
    }

    fn env_filter(&self) -> EnvFilter {
        let by_level = || EnvFilter::default().add_directive(LevelFilter::from_level(self.level).into());
        match &self.filter {
            Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|_| by_level()),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| by_level()),
        }
    }

    /// 安装全局订阅者，重复安装返回 `LoggingInitFailed`
    pub fn init(self) -> ContainerResult<()> {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids);

        let installed = match self.format {
            LogFormat::Full => builder.try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Pretty => builder.pretty().try_init(),
        };
        installed.map_err(|e| ContainerError::LoggingInitFailed(e.to_string()))
    }
}
