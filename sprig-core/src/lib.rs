// sprig-core: 组件扫描与早期引用代理所依赖的容器核心
//
// 提供：
// - Bean 定义、作用域与默认的可列举 Bean 工厂
// - 取代类加载器的显式类型目录（支持 inventory 收集）
// - 组件扫描使用的类型过滤器
// - Environment 配置、同步事件多播与日志初始化

pub mod bean;
pub mod bean_factory;
pub mod catalog;
pub mod config;
pub mod constants;
pub mod error;
pub mod event;
pub mod logging;
pub mod metadata;
pub mod scope;
pub mod type_filter;
pub mod utils;

// 常用类型直接从 crate 根导出
pub use bean::{
    BeanDefinition, BeanDefinitionDefaults, BeanDefinitionHolder, BeanRole, ConstructorFactory,
    FunctionFactory, ObjectFactory,
};
pub use bean_factory::{
    BeanDefinitionRegistry, BeanFactory, BeanFactoryExt, ConfigurableListableBeanFactory,
    DefaultListableBeanFactory, ListableBeanFactory, SingletonBeanRegistry,
};
pub use catalog::{InstanceConstructor, LoadedType, ResourcePattern, TypeCatalog, TypeRegistration};
pub use config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
    TomlPropertySource,
};
pub use constants::*;
pub use error::{ContainerError, ContainerResult};
pub use event::{
    typed_listener, ApplicationEventMulticaster, ErrorHandler, Event, EventListener,
    SimpleApplicationEventMulticaster, TypedEventListener,
};
pub use logging::{parse_level, LogFormat, LoggingConfig};
pub use metadata::{AnnotationMetadata, NoArgConstructor, TypeKind, TypeMetadata};
pub use scope::{Scope, ScopedProxyMode};
pub use type_filter::{
    AnnotationTypeFilter, AspectJTypeFilter, AssignableTypeFilter, RegexPatternTypeFilter,
    TypeFilter,
};

// 导出 inventory，供 TypeRegistration 的 submit! 使用
pub use inventory;

/// `use sprig_core::prelude::*;` 引入注册、扫描和事件相关的 trait
pub mod prelude {
    pub use crate::bean::{BeanDefinition, BeanDefinitionHolder, BeanRole, FunctionFactory, ObjectFactory};
    pub use crate::bean_factory::{
        BeanDefinitionRegistry, BeanFactory, BeanFactoryExt, ConfigurableListableBeanFactory,
        DefaultListableBeanFactory, ListableBeanFactory, SingletonBeanRegistry,
    };
    pub use crate::catalog::{LoadedType, TypeCatalog, TypeRegistration};
    pub use crate::config::{ConfigValue, Environment, MapPropertySource, PropertySource};
    pub use crate::error::{ContainerError, ContainerResult};
    pub use crate::event::{
        typed_listener, ApplicationEventMulticaster, Event, EventListener,
        SimpleApplicationEventMulticaster, TypedEventListener,
    };
    pub use crate::logging::{LogFormat, LoggingConfig};
    pub use crate::metadata::{AnnotationMetadata, NoArgConstructor, TypeMetadata};
    pub use crate::scope::{Scope, ScopedProxyMode};
    pub use crate::type_filter::TypeFilter;
    pub use crate::utils;
    pub use anyhow::{anyhow, Context};
}
