//! `component-scan` 声明的解析
//!
//! 把 [`ComponentScanElement`] 转换为经过校验的 [`ComponentScanMetadata`]，交给
//! [`ComponentScanMetadataReader`] 扫描，再把结果注册为一个组合组件并发布事件。

use std::sync::Arc;

use sprig_core::bean::BeanDefinitionHolder;
use sprig_core::catalog::TypeCatalog;
use sprig_core::constants::CONFIG_LOCATION_DELIMITERS;
use sprig_core::error::{ContainerError, ContainerResult};
use sprig_core::scope::ScopedProxyMode;
use sprig_core::type_filter::{
    AnnotationTypeFilter, AspectJTypeFilter, AssignableTypeFilter, RegexPatternTypeFilter, TypeFilter,
};
use sprig_core::utils::strings::tokenize_to_string_array;

use crate::annotation_config::register_annotation_config_processors;
use crate::component_definition::{BeanComponentDefinition, CompositeComponentDefinition};
use crate::name_generator::{BeanNameGenerator, BEAN_NAME_GENERATOR_STRATEGY};
use crate::reader_context::ReaderContext;
use crate::scan_element::{parse_scan_elements, ComponentScanElement, FilterElement, COMPONENT_SCAN_ELEMENT};
use crate::scan_metadata::ComponentScanMetadata;
use crate::scan_reader::ComponentScanMetadataReader;
use crate::scope_resolver::{ScopeMetadataResolver, SCOPE_METADATA_RESOLVER_STRATEGY};

/// 自定义类型过滤器必须实现的策略
pub const TYPE_FILTER_STRATEGY: &str = "sprig::core::TypeFilter";

#[derive(Debug, Clone, Copy, Default)]
pub struct ComponentScanBeanDefinitionParser;

impl ComponentScanBeanDefinitionParser {
    pub fn new() -> Self {
        Self
    }

    /// 解析并执行一个扫描声明，返回扫描注册的定义
    pub fn parse(
        &self,
        element: &ComponentScanElement,
        context: &ReaderContext,
    ) -> ContainerResult<Vec<BeanDefinitionHolder>> {
        let metadata = self.parse_component_scan_metadata(element, context)?;
        let scanned = ComponentScanMetadataReader::new(context).read(&metadata)?;
        self.register_components(context, &scanned, element)?;
        Ok(scanned)
    }

    /// 构建扫描元数据
    ///
    /// 属性错误直接返回；单个过滤器的错误交给问题报告器，其余过滤器照常生效
    pub fn parse_component_scan_metadata(
        &self,
        element: &ComponentScanElement,
        context: &ReaderContext,
    ) -> ContainerResult<ComponentScanMetadata> {
        if element.scope_resolver.is_some() && element.scoped_proxy.is_some() {
            return Err(ContainerError::Configuration(
                "Cannot define both 'scope-resolver' and 'scoped-proxy' on <component-scan> tag".to_string(),
            ));
        }

        let catalog = context.catalog();
        let mut metadata = ComponentScanMetadata::new(tokenize_to_string_array(
            &element.base_package,
            CONFIG_LOCATION_DELIMITERS,
        ));
        metadata.set_source(element.source.clone());

        if let Some(annotation_config) = element.annotation_config {
            metadata.set_include_annotation_config(annotation_config);
        }
        if let Some(use_default_filters) = element.use_default_filters {
            metadata.set_use_default_filters(use_default_filters);
        }
        if let Some(resource_pattern) = &element.resource_pattern {
            metadata.set_resource_pattern(resource_pattern.clone());
        }

        if let Some(class_name) = &element.name_generator {
            let generator = catalog
                .instantiate_strategy::<dyn BeanNameGenerator>(class_name, BEAN_NAME_GENERATOR_STRATEGY)?;
            metadata.set_bean_name_generator(generator);
        }
        if let Some(class_name) = &element.scope_resolver {
            let resolver = catalog
                .instantiate_strategy::<dyn ScopeMetadataResolver>(class_name, SCOPE_METADATA_RESOLVER_STRATEGY)?;
            metadata.set_scope_metadata_resolver(resolver);
        }
        if let Some(mode) = &element.scoped_proxy {
            metadata.set_scoped_proxy_mode(parse_scoped_proxy_mode(mode)?);
        }

        for filter in &element.include_filter {
            match self.create_type_filter(filter, catalog) {
                Ok(type_filter) => metadata.add_include_filter(type_filter),
                Err(e) => context.error(problem_message(&e), element.source.as_deref(), Some(&e))?,
            }
        }
        for filter in &element.exclude_filter {
            match self.create_type_filter(filter, catalog) {
                Ok(type_filter) => metadata.add_exclude_filter(type_filter),
                Err(e) => context.error(problem_message(&e), element.source.as_deref(), Some(&e))?,
            }
        }

        tracing::debug!("Parsed component scan metadata: {:?}", metadata);
        Ok(metadata)
    }

    /// 根据过滤器声明创建类型过滤器
    pub fn create_type_filter(
        &self,
        filter: &FilterElement,
        catalog: &TypeCatalog,
    ) -> ContainerResult<Arc<dyn TypeFilter>> {
        let expression = filter.expression.trim();
        let not_found = |_| ContainerError::TypeResolution {
            type_name: expression.to_string(),
            message: format!("Type filter class not found: {}", expression),
        };

        match filter.filter_type.as_str() {
            "annotation" => {
                catalog.load_type(expression).map_err(not_found)?;
                Ok(Arc::new(AnnotationTypeFilter::new(expression)))
            }
            "assignable" => {
                catalog.load_type(expression).map_err(not_found)?;
                Ok(Arc::new(AssignableTypeFilter::new(expression)))
            }
            "aspectj" => Ok(Arc::new(AspectJTypeFilter::new(expression)?)),
            "regex" => Ok(Arc::new(RegexPatternTypeFilter::new(expression)?)),
            "custom" => {
                let loaded = catalog.load_type(expression).map_err(not_found)?;
                if !loaded.implements::<dyn TypeFilter>() {
                    return Err(ContainerError::Configuration(format!(
                        "Class is not assignable to [{}]: {}",
                        TYPE_FILTER_STRATEGY, expression
                    )));
                }
                catalog.instantiate_strategy::<dyn TypeFilter>(expression, TYPE_FILTER_STRATEGY)
            }
            other => Err(ContainerError::Configuration(format!(
                "Unsupported filter type: {}",
                other
            ))),
        }
    }

    /// 把扫描结果注册为组合组件，按需加上注解配置的基础设施 Bean，然后发布事件
    pub fn register_components(
        &self,
        context: &ReaderContext,
        scanned: &[BeanDefinitionHolder],
        element: &ComponentScanElement,
    ) -> ContainerResult<Arc<CompositeComponentDefinition>> {
        let source = element.source.as_deref();
        let mut composite = CompositeComponentDefinition::new(COMPONENT_SCAN_ELEMENT, element.source.clone());

        for holder in scanned {
            composite.add_nested_component(Arc::new(BeanComponentDefinition::new(holder.clone())));
        }

        if element.annotation_config.unwrap_or(true) {
            for processor in register_annotation_config_processors(context.registry(), source)? {
                composite.add_nested_component(Arc::new(BeanComponentDefinition::new(processor)));
            }
        }

        let composite = Arc::new(composite);
        context.fire_component_registered(composite.clone());
        Ok(composite)
    }
}

fn problem_message(error: &ContainerError) -> String {
    match error {
        ContainerError::Configuration(message) => message.clone(),
        other => other.to_string(),
    }
}

fn parse_scoped_proxy_mode(mode: &str) -> ContainerResult<ScopedProxyMode> {
    match mode.trim() {
        "targetClass" => Ok(ScopedProxyMode::TargetClass),
        "interfaces" => Ok(ScopedProxyMode::Interfaces),
        "no" => Ok(ScopedProxyMode::No),
        _ => Err(ContainerError::Configuration(
            "scoped-proxy only supports 'no', 'interfaces' and 'targetClass'".to_string(),
        )),
    }
}

/// 解析 TOML 文档中的全部扫描声明并依次执行
pub fn parse_all(
    content: &str,
    source_name: &str,
    context: &ReaderContext,
) -> ContainerResult<Vec<BeanDefinitionHolder>> {
    let parser = ComponentScanBeanDefinitionParser::new();
    let mut registered = Vec::new();
    for element in parse_scan_elements(content, source_name)? {
        registered.extend(parser.parse(&element, context)?);
    }
    Ok(registered)
}
