// sprig-context: 早期引用代理与组件扫描
//
// 提供：
// - 早期 Bean 引用代理：在目标单例真正实例化之前交给调用方的替身
// - component-scan 声明的解析、扫描元数据与扫描读取器
// - Bean 名称生成、作用域解析与作用域代理
// - 注解配置的基础设施 Bean 与组件注册事件

pub mod annotation_config;
pub mod component_definition;
pub mod dependency;
pub mod early_proxy;
pub mod name_generator;
pub mod problem;
pub mod proxy_creator;
pub mod proxy_status;
pub mod reader_context;
pub mod scan_element;
pub mod scan_metadata;
pub mod scan_parser;
pub mod scan_reader;
pub mod scope_resolver;
pub mod scoped_proxy;

#[cfg(test)]
pub(crate) mod test_support;

// 重新导出常用类型
pub use annotation_config::{register_annotation_config_processors, AnnotationConfigProcessor};
pub use component_definition::{
    BeanComponentDefinition, ComponentDefinition, ComponentRegisteredEvent, CompositeComponentDefinition,
};
pub use dependency::DependencyDescriptor;
pub use early_proxy::{
    as_early_reference, is_early_bean_reference, BeanMethodReturn, EarlyBeanReference,
    EarlyBeanReferenceProxy, ProxyClass, Superclass,
};
pub use name_generator::{AnnotationBeanNameGenerator, BeanNameGenerator, DefaultBeanNameGenerator};
pub use problem::{
    CollectingProblemReporter, FailFastProblemReporter, LoggingProblemReporter, Problem, ProblemReporter,
};
pub use proxy_creator::EarlyBeanReferenceProxyCreator;
pub use proxy_status::{EarlyBeanReferenceProxyStatus, ProxyStatusGuard};
pub use reader_context::ReaderContext;
pub use scan_element::{parse_scan_elements, ComponentScanElement, FilterElement};
pub use scan_metadata::ComponentScanMetadata;
pub use scan_parser::{parse_all, ComponentScanBeanDefinitionParser};
pub use scan_reader::ComponentScanMetadataReader;
pub use scope_resolver::{AnnotationScopeMetadataResolver, ScopeMetadata, ScopeMetadataResolver};
pub use scoped_proxy::{create_scoped_proxy, ScopedProxy};

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::component_definition::{ComponentDefinition, ComponentRegisteredEvent};
    pub use crate::dependency::DependencyDescriptor;
    pub use crate::early_proxy::{BeanMethodReturn, EarlyBeanReference, EarlyBeanReferenceProxy};
    pub use crate::name_generator::BeanNameGenerator;
    pub use crate::problem::ProblemReporter;
    pub use crate::proxy_creator::EarlyBeanReferenceProxyCreator;
    pub use crate::proxy_status::EarlyBeanReferenceProxyStatus;
    pub use crate::reader_context::ReaderContext;
    pub use crate::scan_element::ComponentScanElement;
    pub use crate::scan_parser::ComponentScanBeanDefinitionParser;
    pub use crate::scope_resolver::ScopeMetadataResolver;
    pub use sprig_core::prelude::*;
}
