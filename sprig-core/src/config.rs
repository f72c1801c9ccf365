//! 属性配置
//!
//! 多个属性源按优先级叠加，高优先级的源先被查询。组件扫描通过
//! [`Environment::resolve_placeholders`] 展开 base-package 里的 `${...}`。

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;

use crate::error::{ContainerError, ContainerResult};

static PLACEHOLDER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::([^}]*))?\}").expect("placeholder pattern is valid")
});

const MAX_PLACEHOLDER_DEPTH: usize = 16;

const ENV_SOURCE_PRIORITY: i32 = 100;
const MAP_SOURCE_PRIORITY: i32 = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    List(Vec<ConfigValue>),
}

impl ConfigValue {
    /// 标量的文本形式，列表返回 None
    pub fn to_property_string(&self) -> Option<String> {
        Some(match self {
            ConfigValue::String(text) => text.clone(),
            ConfigValue::Int(number) => number.to_string(),
            ConfigValue::Float(number) => number.to_string(),
            ConfigValue::Bool(flag) => flag.to_string(),
            ConfigValue::List(_) => return None,
        })
    }

    /// 除布尔值外还接受 `true/false`、`yes/no`、`on/off`、`1/0` 文本
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(flag) => Some(*flag),
            ConfigValue::String(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl From<&toml::Value> for ConfigValue {
    fn from(value: &toml::Value) -> Self {
        match value {
            toml::Value::String(text) => ConfigValue::String(text.clone()),
            toml::Value::Integer(number) => ConfigValue::Int(*number),
            toml::Value::Float(number) => ConfigValue::Float(*number),
            toml::Value::Boolean(flag) => ConfigValue::Bool(*flag),
            toml::Value::Datetime(datetime) => ConfigValue::String(datetime.to_string()),
            toml::Value::Array(items) => ConfigValue::List(items.iter().map(ConfigValue::from).collect()),
            // 数组里的内联表没有点分键可用，保留其 TOML 文本
            toml::Value::Table(table) => ConfigValue::String(table.to_string()),
        }
    }
}

pub trait PropertySource: Send + Sync {
    fn name(&self) -> &str;

    fn get(&self, key: &str) -> Option<ConfigValue>;

    /// 数值越大越先被查询
    fn priority(&self) -> i32 {
        0
    }
}

#[derive(Default)]
pub struct Environment {
    sources: RwLock<Vec<Box<dyn PropertySource>>>,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sources = self.sources.read();
        f.debug_list()
            .entries(sources.iter().map(|source| (source.name(), source.priority())))
            .finish()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// 同优先级的源保持加入顺序
    pub fn add_property_source(&self, source: Box<dyn PropertySource>) {
        tracing::debug!(
            "Adding property source '{}' (priority {})",
            source.name(),
            source.priority()
        );
        let mut sources = self.sources.write();
        let position = sources.partition_point(|existing| existing.priority() >= source.priority());
        sources.insert(position, source);
    }

    pub fn with_property_source(self, source: impl PropertySource + 'static) -> Self {
        self.add_property_source(Box::new(source));
        self
    }

    pub fn get(&self, key: &str) -> Option<ConfigValue> {
        let sources = self.sources.read();
        let found = sources
            .iter()
            .find_map(|source| source.get(key).map(|value| (source.name().to_string(), value)));
        match found {
            Some((source, value)) => {
                tracing::trace!("Property '{}' resolved from '{}'", key, source);
                Some(value)
            }
            None => None,
        }
    }

    pub fn contains_property(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)?.to_property_string()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// TOML 列表或逗号分隔的文本，空项被丢弃
    pub fn get_string_array(&self, key: &str) -> Option<Vec<String>> {
        let items: Vec<String> = match self.get(key)? {
            ConfigValue::List(items) => items.iter().filter_map(ConfigValue::to_property_string).collect(),
            ConfigValue::String(text) => text.split(',').map(|item| item.trim().to_string()).collect(),
            _ => return None,
        };
        Some(items.into_iter().filter(|item| !item.is_empty()).collect())
    }

    /// 展开 `${key}` 和 `${key:default}` 占位符
    ///
    /// 属性值中的占位符会继续展开。没有值也没有默认值的占位符是配置错误。
    ///
    /// ```
    /// use sprig_core::config::{ConfigValue, Environment, MapPropertySource};
    ///
    /// let env = Environment::new().with_property_source(
    ///     MapPropertySource::new("test")
    ///         .with_property("app.package", ConfigValue::String("example::scannable".into())),
    /// );
    ///
    /// assert_eq!(env.resolve_placeholders("${app.package}").unwrap(), "example::scannable");
    /// assert_eq!(env.resolve_placeholders("${missing:fallback}").unwrap(), "fallback");
    /// assert!(env.resolve_placeholders("${missing}").is_err());
    /// ```
    pub fn resolve_placeholders(&self, text: &str) -> ContainerResult<String> {
        self.expand(text, 0)
    }

    fn expand(&self, text: &str, depth: usize) -> ContainerResult<String> {
        if depth > MAX_PLACEHOLDER_DEPTH {
            return Err(ContainerError::Configuration(format!(
                "Circular placeholder reference in '{}'",
                text
            )));
        }

        let mut expanded = String::with_capacity(text.len());
        let mut tail = 0;
        for captures in PLACEHOLDER_PATTERN.captures_iter(text) {
            let (Some(placeholder), Some(key)) = (captures.get(0), captures.get(1)) else {
                continue;
            };
            let key = key.as_str().trim();
            let replacement = match self.get_string(key) {
                Some(value) => self.expand(&value, depth + 1)?,
                None => captures
                    .get(2)
                    .map(|default| default.as_str().to_string())
                    .ok_or_else(|| {
                        ContainerError::Configuration(format!(
                            "Could not resolve placeholder '{}' in value \"{}\"",
                            key, text
                        ))
                    })?,
            };
            expanded.push_str(&text[tail..placeholder.start()]);
            expanded.push_str(&replacement);
            tail = placeholder.end();
        }
        expanded.push_str(&text[tail..]);
        Ok(expanded)
    }
}

/// 以前缀映射的进程环境变量，`logging.show-target` 对应 `<PREFIX>LOGGING_SHOW_TARGET`
pub struct EnvironmentPropertySource {
    prefix: String,
    priority: i32,
}

impl EnvironmentPropertySource {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            priority: ENV_SOURCE_PRIORITY,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    fn variable_name(&self, key: &str) -> String {
        let mut name = self.prefix.clone();
        name.extend(key.chars().map(|c| match c {
            '.' | '-' => '_',
            other => other.to_ascii_uppercase(),
        }));
        name
    }
}

impl PropertySource for EnvironmentPropertySource {
    fn name(&self) -> &str {
        "environment"
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        std::env::var(self.variable_name(key)).ok().map(ConfigValue::String)
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// 内存中的属性表
pub struct MapPropertySource {
    name: String,
    properties: HashMap<String, ConfigValue>,
    priority: i32,
}

impl MapPropertySource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: HashMap::new(),
            priority: MAP_SOURCE_PRIORITY,
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: ConfigValue) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }
}

impl PropertySource for MapPropertySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.properties.get(key).cloned()
    }

    fn priority(&self) -> i32 {
        self.priority
    }
}

/// TOML 文档，嵌套表展平成点分键。默认优先级 0，低于其它源。
pub struct TomlPropertySource(MapPropertySource);

impl TomlPropertySource {
    pub fn from_file(path: impl AsRef<Path>) -> ContainerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ContainerError::Configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content, path.display().to_string())
    }

    pub fn from_toml_str(content: &str, name: impl Into<String>) -> ContainerResult<Self> {
        let document: toml::Table = toml::from_str(content)
            .map_err(|e| ContainerError::Configuration(format!("Failed to parse TOML: {}", e)))?;

        let mut source = MapPropertySource::new(name).with_priority(0);
        let mut pending = vec![(String::new(), &document)];
        while let Some((prefix, table)) = pending.pop() {
            for (key, value) in table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                match value {
                    toml::Value::Table(nested) => pending.push((path, nested)),
                    leaf => {
                        source.properties.insert(path, ConfigValue::from(leaf));
                    }
                }
            }
        }
        Ok(Self(source))
    }

    pub fn with_priority(self, priority: i32) -> Self {
        Self(self.0.with_priority(priority))
    }
}

impl PropertySource for TomlPropertySource {
    fn name(&self) -> &str {
        self.0.name()
    }

    fn get(&self, key: &str) -> Option<ConfigValue> {
        self.0.get(key)
    }

    fn priority(&self) -> i32 {
        self.0.priority()
    }
}
