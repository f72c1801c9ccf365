//! 注解配置所需的基础设施 Bean

use std::sync::Arc;

use sprig_core::bean::{BeanDefinition, BeanDefinitionHolder, BeanRole, FunctionFactory};
use sprig_core::bean_factory::BeanDefinitionRegistry;
use sprig_core::constants::{
    CONFIGURATION_ANNOTATION_PROCESSOR_BEAN_NAME, EARLY_BEAN_REFERENCE_PROXY_STATUS_BEAN_NAME,
};
use sprig_core::error::ContainerResult;

use crate::proxy_status::EarlyBeanReferenceProxyStatus;

pub const EARLY_BEAN_REFERENCE_PROXY_STATUS_TYPE: &str = "sprig::context::EarlyBeanReferenceProxyStatus";

pub const ANNOTATION_CONFIG_PROCESSOR_TYPE: &str = "sprig::context::AnnotationConfigProcessor";

/// 配置类处理器
///
/// 它在容器中的存在表示注解配置已经启用；具体的配置类处理不在这里进行
#[derive(Debug, Clone, Default)]
pub struct AnnotationConfigProcessor {
    source: Option<String>,
}

impl AnnotationConfigProcessor {
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

/// 注册注解配置的基础设施 Bean，已经存在的不会重复注册
///
/// 返回本次新注册的定义
pub fn register_annotation_config_processors(
    registry: &dyn BeanDefinitionRegistry,
    source: Option<&str>,
) -> ContainerResult<Vec<BeanDefinitionHolder>> {
    let mut registered = Vec::new();

    if !registry.contains_bean_definition(EARLY_BEAN_REFERENCE_PROXY_STATUS_BEAN_NAME) {
        let definition = BeanDefinition::new(
            EARLY_BEAN_REFERENCE_PROXY_STATUS_TYPE,
            FunctionFactory::new(|| Ok(EarlyBeanReferenceProxyStatus::new())),
        );
        registered.push(register_infrastructure(
            registry,
            EARLY_BEAN_REFERENCE_PROXY_STATUS_BEAN_NAME,
            definition,
            source,
        )?);
    }

    if !registry.contains_bean_definition(CONFIGURATION_ANNOTATION_PROCESSOR_BEAN_NAME) {
        let processor_source = source.map(str::to_string);
        let definition = BeanDefinition::new(
            ANNOTATION_CONFIG_PROCESSOR_TYPE,
            FunctionFactory::new(move || {
                Ok(AnnotationConfigProcessor {
                    source: processor_source.clone(),
                })
            }),
        );
        registered.push(register_infrastructure(
            registry,
            CONFIGURATION_ANNOTATION_PROCESSOR_BEAN_NAME,
            definition,
            source,
        )?);
    }

    Ok(registered)
}

fn register_infrastructure(
    registry: &dyn BeanDefinitionRegistry,
    bean_name: &str,
    definition: BeanDefinition,
    source: Option<&str>,
) -> ContainerResult<BeanDefinitionHolder> {
    let mut definition = definition
        .with_role(BeanRole::Infrastructure)
        .with_autowire_candidate(false);
    definition.source = source.map(str::to_string);

    let definition = Arc::new(definition);
    registry.register_bean_definition(bean_name, Arc::clone(&definition))?;
    tracing::debug!("Registered infrastructure bean '{}'", bean_name);

    Ok(BeanDefinitionHolder::new(bean_name, definition))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprig_core::bean_factory::{BeanFactoryExt, DefaultListableBeanFactory};

    #[test]
    fn test_registers_infrastructure_once() {
        let bf = DefaultListableBeanFactory::new();

        let first = register_annotation_config_processors(&bf, Some("beans.toml")).unwrap();
        let names: Vec<_> = first.iter().map(|h| h.bean_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                EARLY_BEAN_REFERENCE_PROXY_STATUS_BEAN_NAME,
                CONFIGURATION_ANNOTATION_PROCESSOR_BEAN_NAME
            ]
        );
        assert!(first
            .iter()
            .all(|h| h.definition.role == BeanRole::Infrastructure && !h.definition.autowire_candidate));

        let second = register_annotation_config_processors(&bf, None).unwrap();
        assert!(second.is_empty());
        assert_eq!(bf.get_bean_definition_count(), 2);
    }

    #[test]
    fn test_status_bean_is_shared_singleton() {
        let bf = DefaultListableBeanFactory::new();
        register_annotation_config_processors(&bf, None).unwrap();

        let a = bf
            .get_bean_as::<EarlyBeanReferenceProxyStatus>(EARLY_BEAN_REFERENCE_PROXY_STATUS_BEAN_NAME)
            .unwrap();
        let b = bf
            .get_bean_as::<EarlyBeanReferenceProxyStatus>(EARLY_BEAN_REFERENCE_PROXY_STATUS_BEAN_NAME)
            .unwrap();
        assert!(a.shares_flag_with(&b));

        let processor = bf
            .get_bean_as::<AnnotationConfigProcessor>(CONFIGURATION_ANNOTATION_PROCESSOR_BEAN_NAME)
            .unwrap();
        assert!(processor.source().is_none());
    }
}
