use std::fmt;
use std::sync::Arc;

use sprig_core::constants::DEFAULT_RESOURCE_PATTERN;
use sprig_core::error::{ContainerError, ContainerResult};
use sprig_core::scope::ScopedProxyMode;
use sprig_core::type_filter::TypeFilter;

use crate::name_generator::BeanNameGenerator;
use crate::scope_resolver::ScopeMetadataResolver;

/// 一次组件扫描的完整描述
///
/// 由解析器构造，交给读取器使用一次
pub struct ComponentScanMetadata {
    base_packages: Vec<String>,
    resource_pattern: String,
    use_default_filters: bool,
    include_annotation_config: bool,
    include_filters: Vec<Arc<dyn TypeFilter>>,
    exclude_filters: Vec<Arc<dyn TypeFilter>>,
    bean_name_generator: Option<Arc<dyn BeanNameGenerator>>,
    scope_metadata_resolver: Option<Arc<dyn ScopeMetadataResolver>>,
    scoped_proxy_mode: Option<ScopedProxyMode>,
    source: Option<String>,
}

impl ComponentScanMetadata {
    pub fn new(base_packages: Vec<String>) -> Self {
        Self {
            base_packages,
            resource_pattern: DEFAULT_RESOURCE_PATTERN.to_string(),
            use_default_filters: true,
            include_annotation_config: true,
            include_filters: Vec::new(),
            exclude_filters: Vec::new(),
            bean_name_generator: None,
            scope_metadata_resolver: None,
            scoped_proxy_mode: None,
            source: None,
        }
    }

    pub fn base_packages(&self) -> &[String] {
        &self.base_packages
    }

    pub fn resource_pattern(&self) -> &str {
        &self.resource_pattern
    }

    pub fn set_resource_pattern(&mut self, pattern: impl Into<String>) {
        self.resource_pattern = pattern.into();
    }

    pub fn use_default_filters(&self) -> bool {
        self.use_default_filters
    }

    pub fn set_use_default_filters(&mut self, use_default_filters: bool) {
        self.use_default_filters = use_default_filters;
    }

    pub fn include_annotation_config(&self) -> bool {
        self.include_annotation_config
    }

    pub fn set_include_annotation_config(&mut self, include: bool) {
        self.include_annotation_config = include;
    }

    pub fn include_filters(&self) -> &[Arc<dyn TypeFilter>] {
        &self.include_filters
    }

    pub fn add_include_filter(&mut self, filter: Arc<dyn TypeFilter>) {
        self.include_filters.push(filter);
    }

    pub fn exclude_filters(&self) -> &[Arc<dyn TypeFilter>] {
        &self.exclude_filters
    }

    pub fn add_exclude_filter(&mut self, filter: Arc<dyn TypeFilter>) {
        self.exclude_filters.push(filter);
    }

    pub fn bean_name_generator(&self) -> Option<&Arc<dyn BeanNameGenerator>> {
        self.bean_name_generator.as_ref()
    }

    pub fn set_bean_name_generator(&mut self, generator: Arc<dyn BeanNameGenerator>) {
        self.bean_name_generator = Some(generator);
    }

    pub fn scope_metadata_resolver(&self) -> Option<&Arc<dyn ScopeMetadataResolver>> {
        self.scope_metadata_resolver.as_ref()
    }

    pub fn set_scope_metadata_resolver(&mut self, resolver: Arc<dyn ScopeMetadataResolver>) {
        self.scope_metadata_resolver = Some(resolver);
    }

    pub fn scoped_proxy_mode(&self) -> Option<ScopedProxyMode> {
        self.scoped_proxy_mode
    }

    pub fn set_scoped_proxy_mode(&mut self, mode: ScopedProxyMode) {
        self.scoped_proxy_mode = Some(mode);
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn set_source(&mut self, source: Option<String>) {
        self.source = source;
    }

    /// 作用域解析器和作用域代理模式互斥
    pub fn validate(&self) -> ContainerResult<()> {
        if self.scope_metadata_resolver.is_some() && self.scoped_proxy_mode.is_some() {
            return Err(ContainerError::Configuration(
                "Cannot define both 'scope-resolver' and 'scoped-proxy' on <component-scan> tag".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ComponentScanMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let describe = |filters: &[Arc<dyn TypeFilter>]| -> Vec<String> {
            filters.iter().map(|filter| filter.describe()).collect()
        };
        f.debug_struct("ComponentScanMetadata")
            .field("base_packages", &self.base_packages)
            .field("resource_pattern", &self.resource_pattern)
            .field("use_default_filters", &self.use_default_filters)
            .field("include_annotation_config", &self.include_annotation_config)
            .field("include_filters", &describe(&self.include_filters))
            .field("exclude_filters", &describe(&self.exclude_filters))
            .field("custom_name_generator", &self.bean_name_generator.is_some())
            .field("custom_scope_resolver", &self.scope_metadata_resolver.is_some())
            .field("scoped_proxy_mode", &self.scoped_proxy_mode)
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope_resolver::AnnotationScopeMetadataResolver;
    use sprig_core::type_filter::RegexPatternTypeFilter;

    #[test]
    fn test_defaults() {
        let metadata = ComponentScanMetadata::new(vec!["example".to_string()]);
        assert_eq!(metadata.resource_pattern(), "**/*");
        assert!(metadata.use_default_filters());
        assert!(metadata.include_annotation_config());
        assert!(metadata.include_filters().is_empty());
        assert!(metadata.scoped_proxy_mode().is_none());
        assert!(metadata.validate().is_ok());
    }

    #[test]
    fn test_scope_resolver_and_scoped_proxy_are_exclusive() {
        let mut metadata = ComponentScanMetadata::new(vec!["example".to_string()]);
        metadata.set_scope_metadata_resolver(Arc::new(AnnotationScopeMetadataResolver::new()));
        assert!(metadata.validate().is_ok());

        metadata.set_scoped_proxy_mode(ScopedProxyMode::Interfaces);
        match metadata.validate() {
            Err(ContainerError::Configuration(message)) => {
                assert!(message.contains("'scope-resolver' and 'scoped-proxy'"))
            }
            other => panic!("expected Configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_lists_filters() {
        let mut metadata = ComponentScanMetadata::new(vec!["example".to_string()]);
        metadata.add_exclude_filter(Arc::new(RegexPatternTypeFilter::new(".*Stub.*").unwrap()));
        let debug = format!("{:?}", metadata);
        assert!(debug.contains(".*Stub.*"));
    }
}
