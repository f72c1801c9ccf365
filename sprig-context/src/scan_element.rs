//! 声明式 `component-scan` 配置
//!
//! ```toml
//! [[component-scan]]
//! base-package = "example.scannable, example.other"
//! scoped-proxy = "interfaces"
//!
//! [[component-scan.exclude-filter]]
//! type = "regex"
//! expression = ".*Stub.*"
//! ```

use serde::Deserialize;

use sprig_core::error::{ContainerError, ContainerResult};

/// 配置元素名称，同时用作注册的组合组件名称
pub const COMPONENT_SCAN_ELEMENT: &str = "component-scan";

/// 过滤器声明
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FilterElement {
    /// `annotation`、`assignable`、`aspectj`、`regex` 或 `custom`
    #[serde(rename = "type")]
    pub filter_type: String,
    pub expression: String,
}

impl FilterElement {
    pub fn new(filter_type: impl Into<String>, expression: impl Into<String>) -> Self {
        Self {
            filter_type: filter_type.into(),
            expression: expression.into(),
        }
    }
}

/// 一个 `component-scan` 声明
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ComponentScanElement {
    #[serde(default)]
    pub base_package: String,
    pub resource_pattern: Option<String>,
    pub use_default_filters: Option<bool>,
    pub annotation_config: Option<bool>,
    pub name_generator: Option<String>,
    pub scope_resolver: Option<String>,
    pub scoped_proxy: Option<String>,
    #[serde(default)]
    pub include_filter: Vec<FilterElement>,
    #[serde(default)]
    pub exclude_filter: Vec<FilterElement>,
    /// 声明所在的位置，用于问题报告
    #[serde(skip)]
    pub source: Option<String>,
}

impl ComponentScanElement {
    pub fn new(base_package: impl Into<String>) -> Self {
        Self {
            base_package: base_package.into(),
            ..Self::default()
        }
    }

    pub fn with_resource_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.resource_pattern = Some(pattern.into());
        self
    }

    pub fn with_use_default_filters(mut self, use_default_filters: bool) -> Self {
        self.use_default_filters = Some(use_default_filters);
        self
    }

    pub fn with_annotation_config(mut self, annotation_config: bool) -> Self {
        self.annotation_config = Some(annotation_config);
        self
    }

    pub fn with_name_generator(mut self, class_name: impl Into<String>) -> Self {
        self.name_generator = Some(class_name.into());
        self
    }

    pub fn with_scope_resolver(mut self, class_name: impl Into<String>) -> Self {
        self.scope_resolver = Some(class_name.into());
        self
    }

    pub fn with_scoped_proxy(mut self, mode: impl Into<String>) -> Self {
        self.scoped_proxy = Some(mode.into());
        self
    }

    pub fn with_include_filter(mut self, filter_type: &str, expression: &str) -> Self {
        self.include_filter.push(FilterElement::new(filter_type, expression));
        self
    }

    pub fn with_exclude_filter(mut self, filter_type: &str, expression: &str) -> Self {
        self.exclude_filter.push(FilterElement::new(filter_type, expression));
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Debug, Deserialize)]
struct ScanDocument {
    #[serde(rename = "component-scan", default)]
    component_scan: Vec<ComponentScanElement>,
}

/// 解析 TOML 文档中的所有 `[[component-scan]]` 声明
pub fn parse_scan_elements(content: &str, source_name: &str) -> ContainerResult<Vec<ComponentScanElement>> {
    let document: ScanDocument = toml::from_str(content).map_err(|e| {
        ContainerError::Configuration(format!(
            "Failed to parse component-scan configuration from {}: {}",
            source_name, e
        ))
    })?;

    Ok(document
        .component_scan
        .into_iter()
        .enumerate()
        .map(|(index, element)| {
            element.with_source(format!("{}[{} #{}]", source_name, COMPONENT_SCAN_ELEMENT, index))
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_element() {
        let content = r#"
            [[component-scan]]
            base-package = "example.scannable"
            resource-pattern = "**/*Impl"
            use-default-filters = false
            annotation-config = false
            name-generator = "example::naming::TestBeanNameGenerator"
            scoped-proxy = "targetClass"

            [[component-scan.include-filter]]
            type = "annotation"
            expression = "sprig::stereotype::Service"

            [[component-scan.exclude-filter]]
            type = "regex"
            expression = ".*Stub.*"
        "#;

        let elements = parse_scan_elements(content, "beans.toml").unwrap();
        assert_eq!(elements.len(), 1);

        let element = &elements[0];
        assert_eq!(element.base_package, "example.scannable");
        assert_eq!(element.resource_pattern.as_deref(), Some("**/*Impl"));
        assert_eq!(element.use_default_filters, Some(false));
        assert_eq!(element.annotation_config, Some(false));
        assert_eq!(element.scoped_proxy.as_deref(), Some("targetClass"));
        assert!(element.scope_resolver.is_none());
        assert_eq!(
            element.include_filter,
            vec![FilterElement::new("annotation", "sprig::stereotype::Service")]
        );
        assert_eq!(element.exclude_filter[0].filter_type, "regex");
        assert_eq!(element.source.as_deref(), Some("beans.toml[component-scan #0]"));
    }

    #[test]
    fn test_multiple_elements_keep_order() {
        let content = r#"
            [[component-scan]]
            base-package = "a"

            [[component-scan]]
            base-package = "b"
        "#;
        let elements = parse_scan_elements(content, "app.toml").unwrap();
        let packages: Vec<_> = elements.iter().map(|e| e.base_package.as_str()).collect();
        assert_eq!(packages, vec!["a", "b"]);
        assert_eq!(elements[1].source.as_deref(), Some("app.toml[component-scan #1]"));
    }

    #[test]
    fn test_invalid_document_is_configuration_error() {
        let result = parse_scan_elements("[[component-scan]]\nbase-package = 3", "broken.toml");
        assert!(matches!(result, Err(ContainerError::Configuration(ref m)) if m.contains("broken.toml")));
    }
}
