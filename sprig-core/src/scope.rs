use std::fmt;
use std::str::FromStr;

use crate::error::ContainerError;

/// Bean 的作用域
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// 单例模式 - 容器中只有一个实例
    #[default]
    Singleton,

    /// 原型模式 - 每次请求都创建新实例
    Prototype,
}

impl FromStr for Scope {
    type Err = ContainerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "singleton" => Ok(Scope::Singleton),
            "prototype" => Ok(Scope::Prototype),
            other => Err(ContainerError::Configuration(format!(
                "Unsupported scope '{}': only 'singleton' and 'prototype' are available",
                other
            ))),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Singleton => write!(f, "singleton"),
            Scope::Prototype => write!(f, "prototype"),
        }
    }
}

/// 作用域代理模式
///
/// 决定扫描到的组件是否需要包装一个作用域代理，以及代理基于接口还是基于目标类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopedProxyMode {
    /// 使用解析器上配置的默认模式
    #[default]
    Default,

    /// 不创建代理
    No,

    /// 基于接口的代理，只暴露目标类型实现的接口
    Interfaces,

    /// 基于目标类的代理，代理可以当作目标类本身使用
    TargetClass,
}

impl FromStr for ScopedProxyMode {
    type Err = ContainerError;

    /// 解析注解属性中的枚举名（`DEFAULT`、`NO`、`INTERFACES`、`TARGET_CLASS`）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "DEFAULT" => Ok(ScopedProxyMode::Default),
            "NO" => Ok(ScopedProxyMode::No),
            "INTERFACES" => Ok(ScopedProxyMode::Interfaces),
            "TARGET_CLASS" => Ok(ScopedProxyMode::TargetClass),
            other => Err(ContainerError::Configuration(format!(
                "Unknown scoped proxy mode '{}'",
                other
            ))),
        }
    }
}
