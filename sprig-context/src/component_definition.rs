//! 组件定义
//!
//! 一次声明（例如一个 component-scan）注册的所有 Bean 被组合成一个
//! [`CompositeComponentDefinition`]，通过 [`ComponentRegisteredEvent`] 通知监听器。

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use sprig_core::bean::BeanDefinitionHolder;
use sprig_core::event::Event;

/// 组件定义 trait
pub trait ComponentDefinition: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn description(&self) -> String;

    /// 定义来源
    fn source(&self) -> Option<&str>;

    /// 组件包含的所有 Bean 定义（组合组件会展开嵌套组件）
    fn bean_definitions(&self) -> Vec<BeanDefinitionHolder>;

    fn nested_components(&self) -> Vec<Arc<dyn ComponentDefinition>> {
        Vec::new()
    }
}

/// 单个 Bean 定义构成的组件
#[derive(Debug, Clone)]
pub struct BeanComponentDefinition {
    holder: BeanDefinitionHolder,
}

impl BeanComponentDefinition {
    pub fn new(holder: BeanDefinitionHolder) -> Self {
        Self { holder }
    }

    pub fn holder(&self) -> &BeanDefinitionHolder {
        &self.holder
    }
}

impl ComponentDefinition for BeanComponentDefinition {
    fn name(&self) -> &str {
        &self.holder.bean_name
    }

    fn description(&self) -> String {
        format!(
            "Bean definition with name '{}': class [{}]",
            self.holder.bean_name, self.holder.definition.bean_class_name
        )
    }

    fn source(&self) -> Option<&str> {
        self.holder.definition.source.as_deref()
    }

    fn bean_definitions(&self) -> Vec<BeanDefinitionHolder> {
        vec![self.holder.clone()]
    }
}

/// 组合组件
#[derive(Debug, Clone)]
pub struct CompositeComponentDefinition {
    name: String,
    source: Option<String>,
    nested: Vec<Arc<dyn ComponentDefinition>>,
}

impl CompositeComponentDefinition {
    pub fn new(name: impl Into<String>, source: Option<String>) -> Self {
        Self {
            name: name.into(),
            source,
            nested: Vec::new(),
        }
    }

    pub fn add_nested_component(&mut self, component: Arc<dyn ComponentDefinition>) {
        self.nested.push(component);
    }
}

impl ComponentDefinition for CompositeComponentDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> String {
        format!("{} with {} nested component(s)", self.name, self.nested.len())
    }

    fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    fn bean_definitions(&self) -> Vec<BeanDefinitionHolder> {
        self.nested
            .iter()
            .flat_map(|component| component.bean_definitions())
            .collect()
    }

    fn nested_components(&self) -> Vec<Arc<dyn ComponentDefinition>> {
        self.nested.clone()
    }
}

/// 组件注册完成事件
#[derive(Debug, Clone)]
pub struct ComponentRegisteredEvent {
    component: Arc<dyn ComponentDefinition>,
    timestamp: SystemTime,
}

impl ComponentRegisteredEvent {
    pub fn new(component: Arc<dyn ComponentDefinition>) -> Self {
        Self {
            component,
            timestamp: SystemTime::now(),
        }
    }

    pub fn component(&self) -> &Arc<dyn ComponentDefinition> {
        &self.component
    }
}

impl Event for ComponentRegisteredEvent {
    fn event_name(&self) -> &str {
        "ComponentRegisteredEvent"
    }

    fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
