//! 组件扫描读取器
//!
//! 在类型目录中查找基础包下的候选类型，依次应用排除过滤器、包含过滤器和
//! 具体类规则，为通过的类型生成名称、解析作用域、应用默认值并注册 Bean 定义。

use std::sync::Arc;

use sprig_core::bean::{BeanDefinition, BeanDefinitionDefaults, BeanDefinitionHolder};
use sprig_core::bean_factory::BeanDefinitionRegistry;
use sprig_core::catalog::ResourcePattern;
use sprig_core::constants::{COMPONENT_ANNOTATION, LAZY_ANNOTATION, PRIMARY_ANNOTATION};
use sprig_core::error::{ContainerError, ContainerResult};
use sprig_core::metadata::TypeMetadata;
use sprig_core::scope::ScopedProxyMode;
use sprig_core::type_filter::{AnnotationTypeFilter, TypeFilter};
use sprig_core::utils::naming::PATH_SEPARATOR;
use sprig_core::utils::strings::simple_match;

use crate::name_generator::{AnnotationBeanNameGenerator, BeanNameGenerator};
use crate::reader_context::ReaderContext;
use crate::scan_metadata::ComponentScanMetadata;
use crate::scope_resolver::{AnnotationScopeMetadataResolver, ScopeMetadataResolver};
use crate::scoped_proxy::create_scoped_proxy;

pub struct ComponentScanMetadataReader<'a> {
    context: &'a ReaderContext,
}

impl<'a> ComponentScanMetadataReader<'a> {
    pub fn new(context: &'a ReaderContext) -> Self {
        Self { context }
    }

    /// 执行扫描，按扫描顺序返回注册的定义
    pub fn read(&self, metadata: &ComponentScanMetadata) -> ContainerResult<Vec<BeanDefinitionHolder>> {
        metadata.validate()?;
        if metadata.base_packages().is_empty() {
            return Err(ContainerError::Configuration(
                "At least one base package must be specified".to_string(),
            ));
        }

        let name_generator: Arc<dyn BeanNameGenerator> = match metadata.bean_name_generator() {
            Some(generator) => Arc::clone(generator),
            None => Arc::new(AnnotationBeanNameGenerator::new().with_type_catalog(Arc::clone(self.context.catalog()))),
        };
        let scope_resolver: Arc<dyn ScopeMetadataResolver> = match metadata.scope_metadata_resolver() {
            Some(resolver) => Arc::clone(resolver),
            None => Arc::new(
                AnnotationScopeMetadataResolver::new()
                    .with_default_proxy_mode(metadata.scoped_proxy_mode().unwrap_or(ScopedProxyMode::No)),
            ),
        };

        let mut include_filters: Vec<Arc<dyn TypeFilter>> = Vec::new();
        if metadata.use_default_filters() {
            include_filters.push(Arc::new(AnnotationTypeFilter::new(COMPONENT_ANNOTATION)));
        }
        include_filters.extend(metadata.include_filters().iter().cloned());

        let defaults = self.context.bean_definition_defaults();
        let mut holders = Vec::new();

        for base_package in metadata.base_packages() {
            let base_package = self.context.environment().resolve_placeholders(base_package)?;
            let base_package = base_package.trim().replace('.', PATH_SEPARATOR);
            let pattern = ResourcePattern::new(&base_package, metadata.resource_pattern())?;

            for candidate in self.context.catalog().find_candidate_types(&pattern) {
                if !self.is_candidate_component(&candidate, &include_filters, metadata.exclude_filters())? {
                    continue;
                }
                if !candidate.is_concrete() {
                    tracing::debug!(
                        "Ignored because not a concrete top-level class: {}",
                        candidate.name()
                    );
                    continue;
                }
                tracing::debug!("Identified candidate component class: {}", candidate.name());

                if let Some(holder) = self.register_candidate(
                    &candidate,
                    name_generator.as_ref(),
                    scope_resolver.as_ref(),
                    &defaults,
                )? {
                    holders.push(holder);
                }
            }
        }

        tracing::info!(
            "Component scan of {:?} registered {} bean definition(s)",
            metadata.base_packages(),
            holders.len()
        );
        Ok(holders)
    }

    /// 排除过滤器优先，之后任意一个包含过滤器匹配即可
    fn is_candidate_component(
        &self,
        candidate: &TypeMetadata,
        include_filters: &[Arc<dyn TypeFilter>],
        exclude_filters: &[Arc<dyn TypeFilter>],
    ) -> ContainerResult<bool> {
        let catalog = self.context.catalog();
        for filter in exclude_filters {
            if filter.matches(candidate, catalog)? {
                tracing::trace!("Type {} excluded by {}", candidate.name(), filter.describe());
                return Ok(false);
            }
        }
        for filter in include_filters {
            if filter.matches(candidate, catalog)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn register_candidate(
        &self,
        candidate: &TypeMetadata,
        name_generator: &dyn BeanNameGenerator,
        scope_resolver: &dyn ScopeMetadataResolver,
        defaults: &BeanDefinitionDefaults,
    ) -> ContainerResult<Option<BeanDefinitionHolder>> {
        let catalog = self.context.catalog();
        let registry = self.context.registry();

        let loaded = catalog.load_type(candidate.name())?;
        let mut definition = BeanDefinition::from_loaded_type(&loaded, catalog).with_source(candidate.name());
        definition.scanned = true;

        let scope_metadata = scope_resolver.resolve_scope_metadata(&definition)?;
        definition.scope = scope_metadata.scope;

        let bean_name = name_generator.generate_bean_name(&definition, registry)?;
        apply_defaults(&mut definition, &bean_name, defaults);
        apply_common_annotations(&mut definition, candidate);

        if !self.check_candidate(&bean_name, &definition)? {
            return Ok(None);
        }

        let holder = BeanDefinitionHolder::new(bean_name, Arc::new(definition));
        let holder = create_scoped_proxy(
            holder,
            self.context.bean_factory(),
            catalog,
            scope_metadata.scoped_proxy_mode,
        )?;
        registry.register_bean_definition(&holder.bean_name, Arc::clone(&holder.definition))?;

        Ok(Some(holder))
    }

    /// 名称未被占用时返回 true；被兼容的定义占用时跳过；否则是冲突
    fn check_candidate(&self, bean_name: &str, definition: &BeanDefinition) -> ContainerResult<bool> {
        let registry = self.context.registry();
        if !registry.contains_bean_definition(bean_name) {
            return Ok(true);
        }

        let existing = registry.get_bean_definition(bean_name)?;
        if is_compatible(&existing, definition) {
            tracing::debug!(
                "Skipping scanned bean '{}': compatible definition already registered",
                bean_name
            );
            return Ok(false);
        }

        Err(ContainerError::ConflictingBeanDefinition {
            bean_name: bean_name.to_string(),
            message: format!(
                "Annotation-specified bean name '{}' for bean class [{}] conflicts with existing, \
                 non-compatible bean definition of same name and class [{}]",
                bean_name, definition.bean_class_name, existing.bean_class_name
            ),
        })
    }
}

/// 显式注册的定义覆盖扫描结果；同一来源被扫描两次也视为兼容
fn is_compatible(existing: &BeanDefinition, candidate: &BeanDefinition) -> bool {
    !existing.scanned || (existing.source.is_some() && existing.source == candidate.source)
}

fn apply_defaults(definition: &mut BeanDefinition, bean_name: &str, defaults: &BeanDefinitionDefaults) {
    definition.lazy = defaults.lazy_init;
    if !defaults.autowire_candidate_patterns.is_empty() {
        definition.autowire_candidate = defaults
            .autowire_candidate_patterns
            .iter()
            .any(|pattern| simple_match(pattern, bean_name));
    }
}

fn apply_common_annotations(definition: &mut BeanDefinition, metadata: &TypeMetadata) {
    if let Some(lazy) = metadata.annotation_metadata(LAZY_ANNOTATION) {
        definition.lazy = lazy
            .attribute("value")
            .map(|value| !value.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(true);
    }
    if metadata.has_annotation(PRIMARY_ANNOTATION) {
        definition.primary = true;
    }
}
