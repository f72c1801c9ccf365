//! 统一的错误处理类型
//!
//! 容器的所有操作都返回 [`ContainerResult`]。配置阶段的错误（`Configuration`、
//! `TypeResolution`）在产生任何副作用之前抛出；解析阶段的错误
//! （`NoSuchBeanDefinition`、`UnsupportedOperation`）原样传播给触发解析的调用方。

use thiserror::Error;

/// 容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 声明式配置无效或自相矛盾
    #[error("Configuration problem: {0}")]
    Configuration(String),

    /// 指定名称的类型（类或注解）无法加载
    #[error("{message}")]
    TypeResolution { type_name: String, message: String },

    /// 目标类型无法被代理
    #[error("{0}")]
    ProxyCreation(String),

    /// 解析时找不到匹配的 Bean
    #[error("No qualifying bean of type '{type_name}' available: {message}")]
    NoSuchBeanDefinition { type_name: String, message: String },

    /// 在尚未解析的早期引用上调用了身份相关的方法
    #[error("{0}")]
    UnsupportedOperation(String),

    #[error("Bean '{0}' not found")]
    BeanNotFound(String),

    #[error("Bean '{0}' already exists")]
    BeanAlreadyExists(String),

    /// 扫描得到的 Bean 名称与已有的、不兼容的定义冲突
    #[error("{message}")]
    ConflictingBeanDefinition { bean_name: String, message: String },

    #[error("Failed to create bean: {0}")]
    BeanCreationFailed(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Type mismatch: expected '{expected}', found '{found}'")]
    TypeMismatch { expected: String, found: String },

    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ContainerError {
    /// 是否属于配置阶段的错误
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ContainerError::Configuration(_) | ContainerError::TypeResolution { .. }
        )
    }
}

/// 容器操作的结果类型
pub type ContainerResult<T> = std::result::Result<T, ContainerError>;
