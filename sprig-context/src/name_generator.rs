//! Bean 名称生成
//!
//! 扫描得到的组件默认使用 [`AnnotationBeanNameGenerator`]：stereotype 注解上显式
//! 给出的 `value`，否则使用去掉包路径并首字母小写的类型名。

use std::sync::Arc;

use sprig_core::bean::BeanDefinition;
use sprig_core::bean_factory::BeanDefinitionRegistry;
use sprig_core::catalog::TypeCatalog;
use sprig_core::constants::{COMPONENT_ANNOTATION, STEREOTYPE_ANNOTATIONS};
use sprig_core::error::{ContainerError, ContainerResult};
use sprig_core::utils::naming::{decapitalize, short_type_name};

/// 声明式配置中 `name-generator` 策略的名称
pub const BEAN_NAME_GENERATOR_STRATEGY: &str = "sprig::context::BeanNameGenerator";

/// 生成的名称和计数器之间的分隔符
pub const GENERATED_BEAN_NAME_SEPARATOR: &str = "#";

/// Bean 名称生成器
pub trait BeanNameGenerator: Send + Sync {
    fn generate_bean_name(
        &self,
        definition: &BeanDefinition,
        registry: &dyn BeanDefinitionRegistry,
    ) -> ContainerResult<String>;
}

/// 基于 stereotype 注解的名称生成器
#[derive(Debug, Clone, Default)]
pub struct AnnotationBeanNameGenerator {
    /// 用于识别以 Component 为元注解的自定义 stereotype
    catalog: Option<Arc<TypeCatalog>>,
}

impl AnnotationBeanNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type_catalog(mut self, catalog: Arc<TypeCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    fn is_stereotype(&self, annotation_type: &str) -> bool {
        STEREOTYPE_ANNOTATIONS.contains(&annotation_type)
            || self
                .catalog
                .as_ref()
                .and_then(|catalog| catalog.metadata(annotation_type))
                .map(|metadata| metadata.has_annotation(COMPONENT_ANNOTATION))
                .unwrap_or(false)
    }

    /// 从 stereotype 注解的 `value` 属性中取得名称
    fn determine_bean_name_from_annotation(
        &self,
        definition: &BeanDefinition,
    ) -> ContainerResult<Option<String>> {
        let Some(metadata) = &definition.type_metadata else {
            return Ok(None);
        };

        let mut bean_name: Option<String> = None;
        for annotation in metadata.annotations() {
            if !self.is_stereotype(annotation.name()) {
                continue;
            }
            let Some(value) = annotation.attribute("value").map(str::trim) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            match &bean_name {
                Some(existing) if existing != value => {
                    return Err(ContainerError::Configuration(format!(
                        "Stereotype annotations suggest inconsistent component names: '{}' versus '{}'",
                        existing, value
                    )));
                }
                _ => bean_name = Some(value.to_string()),
            }
        }

        Ok(bean_name)
    }

    /// 默认名称：短类型名首字母小写
    pub fn build_default_bean_name(definition: &BeanDefinition) -> String {
        decapitalize(short_type_name(&definition.bean_class_name))
    }
}

impl BeanNameGenerator for AnnotationBeanNameGenerator {
    fn generate_bean_name(
        &self,
        definition: &BeanDefinition,
        _registry: &dyn BeanDefinitionRegistry,
    ) -> ContainerResult<String> {
        match self.determine_bean_name_from_annotation(definition)? {
            Some(name) => Ok(name),
            None => Ok(Self::build_default_bean_name(definition)),
        }
    }
}

/// 使用完整类型名加计数器的名称生成器，例如 `example::FooService#0`
#[derive(Debug, Clone, Default)]
pub struct DefaultBeanNameGenerator;

impl BeanNameGenerator for DefaultBeanNameGenerator {
    fn generate_bean_name(
        &self,
        definition: &BeanDefinition,
        registry: &dyn BeanDefinitionRegistry,
    ) -> ContainerResult<String> {
        let base = definition.bean_class_name.trim();
        if base.is_empty() {
            return Err(ContainerError::Configuration(
                "Unnamed bean definition specifies no bean class: can't generate bean name".to_string(),
            ));
        }

        let mut counter = 0usize;
        loop {
            let candidate = format!("{}{}{}", base, GENERATED_BEAN_NAME_SEPARATOR, counter);
            if !registry.is_bean_name_in_use(&candidate) {
                return Ok(candidate);
            }
            counter += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::bean::FunctionFactory;
    use sprig_core::bean_factory::DefaultListableBeanFactory;
    use sprig_core::constants::SERVICE_ANNOTATION;
    use sprig_core::metadata::{AnnotationMetadata, TypeMetadata};

    fn definition_for(metadata: TypeMetadata) -> BeanDefinition {
        let mut definition = BeanDefinition::new(metadata.name(), FunctionFactory::new(|| Ok(())));
        definition.type_metadata = Some(Arc::new(metadata));
        definition
    }

    #[test]
    fn test_default_name_is_decapitalized_short_name() {
        let registry = DefaultListableBeanFactory::new();
        let definition = definition_for(
            TypeMetadata::class("example::scannable::FooServiceImpl")
                .with_annotation(AnnotationMetadata::new(SERVICE_ANNOTATION)),
        );
        let name = AnnotationBeanNameGenerator::new()
            .generate_bean_name(&definition, &registry)
            .unwrap();
        assert_eq!(name, "fooServiceImpl");
    }

    #[test]
    fn test_explicit_stereotype_value_wins() {
        let registry = DefaultListableBeanFactory::new();
        let definition = definition_for(
            TypeMetadata::class("example::scannable::NamedComponent").with_annotation(
                AnnotationMetadata::new(COMPONENT_ANNOTATION).with_attribute("value", "myNamedComponent"),
            ),
        );
        let name = AnnotationBeanNameGenerator::new()
            .generate_bean_name(&definition, &registry)
            .unwrap();
        assert_eq!(name, "myNamedComponent");
    }

    #[test]
    fn test_custom_stereotype_requires_catalog() {
        let registry = DefaultListableBeanFactory::new();
        let catalog = Arc::new(TypeCatalog::new().with_metadata(
            TypeMetadata::annotation("example::Gateway")
                .with_annotation(AnnotationMetadata::new(COMPONENT_ANNOTATION)),
        ));
        let definition = definition_for(
            TypeMetadata::class("example::PaymentGateway")
                .with_annotation(AnnotationMetadata::new("example::Gateway").with_attribute("value", "payments")),
        );

        let plain = AnnotationBeanNameGenerator::new();
        assert_eq!(plain.generate_bean_name(&definition, &registry).unwrap(), "paymentGateway");

        let with_catalog = AnnotationBeanNameGenerator::new().with_type_catalog(catalog);
        assert_eq!(with_catalog.generate_bean_name(&definition, &registry).unwrap(), "payments");
    }

    #[test]
    fn test_inconsistent_stereotype_names_fail() {
        let registry = DefaultListableBeanFactory::new();
        let definition = definition_for(
            TypeMetadata::class("example::Confused")
                .with_annotation(AnnotationMetadata::new(COMPONENT_ANNOTATION).with_attribute("value", "a"))
                .with_annotation(AnnotationMetadata::new(SERVICE_ANNOTATION).with_attribute("value", "b")),
        );
        let result = AnnotationBeanNameGenerator::new().generate_bean_name(&definition, &registry);
        assert!(matches!(result, Err(ContainerError::Configuration(ref m)) if m.contains("inconsistent")));
    }

    #[test]
    fn test_default_generator_appends_counter() {
        let registry = DefaultListableBeanFactory::new();
        let definition = BeanDefinition::new("example::Foo", FunctionFactory::new(|| Ok(())));
        let generator = DefaultBeanNameGenerator;

        let first = generator.generate_bean_name(&definition, &registry).unwrap();
        assert_eq!(first, "example::Foo#0");
        registry
            .register_bean_definition(&first, Arc::new(definition.clone()))
            .unwrap();

        let second = generator.generate_bean_name(&definition, &registry).unwrap();
        assert_eq!(second, "example::Foo#1");
    }
}
