//! 早期引用代理的创建与目标解析

use std::fmt;
use std::sync::Arc;

use sprig_core::bean::BeanDefinition;
use sprig_core::bean_factory::{
    BeanDefinitionRegistry, BeanFactory, BeanFactoryExt, ConfigurableListableBeanFactory,
    ListableBeanFactory,
};
use sprig_core::catalog::TypeCatalog;
use sprig_core::constants::EARLY_BEAN_REFERENCE_PROXY_STATUS_BEAN_NAME;
use sprig_core::error::{ContainerError, ContainerResult};
use sprig_core::metadata::{NoArgConstructor, TypeMetadata};

use crate::dependency::DependencyDescriptor;
use crate::early_proxy::{EarlyBeanReference, ProxyClass, ResolvedTarget};
use crate::name_generator::{AnnotationBeanNameGenerator, BeanNameGenerator};
use crate::proxy_status::EarlyBeanReferenceProxyStatus;

pub fn final_class_error_message(type_name: &str) -> String {
    format!(
        "Cannot create early bean reference proxy for type [{}]: class is declared final",
        type_name
    )
}

pub fn missing_no_arg_constructor_error_message(type_name: &str) -> String {
    format!(
        "Cannot create early bean reference proxy for type [{}]: class must declare a no-arg constructor",
        type_name
    )
}

pub fn private_no_arg_constructor_error_message(type_name: &str) -> String {
    format!(
        "Cannot create early bean reference proxy for type [{}]: no-arg constructor is private and constructor bypass is disabled",
        type_name
    )
}

/// 早期引用代理创建器
///
/// 持有 Bean 工厂和共享的代理状态。可选的类型目录用于在没有任何候选定义时
/// 按类型补注册一个定义。
#[derive(Clone)]
pub struct EarlyBeanReferenceProxyCreator {
    bean_factory: Arc<dyn ConfigurableListableBeanFactory>,
    status: EarlyBeanReferenceProxyStatus,
    catalog: Option<Arc<TypeCatalog>>,
    name_generator: Arc<dyn BeanNameGenerator>,
    constructor_bypass: bool,
}

impl EarlyBeanReferenceProxyCreator {
    pub fn new(
        bean_factory: Arc<dyn ConfigurableListableBeanFactory>,
        status: EarlyBeanReferenceProxyStatus,
    ) -> Self {
        Self {
            bean_factory,
            status,
            catalog: None,
            name_generator: Arc::new(AnnotationBeanNameGenerator::new()),
            constructor_bypass: true,
        }
    }

    /// 使用容器中登记的共享状态 Bean；没有登记时创建新的状态
    pub fn for_bean_factory(bean_factory: Arc<dyn ConfigurableListableBeanFactory>) -> ContainerResult<Self> {
        let status = if bean_factory.contains_bean(EARLY_BEAN_REFERENCE_PROXY_STATUS_BEAN_NAME) {
            let shared = bean_factory
                .get_bean_as::<EarlyBeanReferenceProxyStatus>(EARLY_BEAN_REFERENCE_PROXY_STATUS_BEAN_NAME)?;
            EarlyBeanReferenceProxyStatus::clone(&shared)
        } else {
            EarlyBeanReferenceProxyStatus::new()
        };
        Ok(Self::new(bean_factory, status))
    }

    pub fn with_type_catalog(mut self, catalog: Arc<TypeCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_bean_name_generator(mut self, generator: Arc<dyn BeanNameGenerator>) -> Self {
        self.name_generator = generator;
        self
    }

    /// 是否允许使用私有的无参构造函数（默认允许）
    pub fn with_constructor_bypass(mut self, bypass: bool) -> Self {
        self.constructor_bypass = bypass;
        self
    }

    pub fn status(&self) -> &EarlyBeanReferenceProxyStatus {
        &self.status
    }

    pub fn bean_factory(&self) -> &Arc<dyn ConfigurableListableBeanFactory> {
        &self.bean_factory
    }

    /// 为依赖描述创建早期引用代理，不访问容器
    pub fn create_proxy(&self, descriptor: &DependencyDescriptor) -> ContainerResult<EarlyBeanReference> {
        let target_type = descriptor.dependency_type();
        self.check_proxyable(target_type)?;

        let proxy_class = ProxyClass::for_type(target_type, self.catalog.as_deref());
        tracing::debug!(
            "Created early bean reference proxy [{}] for {}",
            proxy_class.name(),
            descriptor
        );

        Ok(EarlyBeanReference::new(
            proxy_class,
            Arc::clone(target_type),
            self.clone(),
        ))
    }

    fn check_proxyable(&self, target_type: &TypeMetadata) -> ContainerResult<()> {
        if target_type.is_interface() || target_type.is_annotation() {
            return Ok(());
        }
        if target_type.is_final() {
            return Err(ContainerError::ProxyCreation(final_class_error_message(
                target_type.name(),
            )));
        }
        match target_type.no_arg_constructor() {
            NoArgConstructor::Public => Ok(()),
            NoArgConstructor::Private if self.constructor_bypass => {
                tracing::trace!(
                    "Bypassing private no-arg constructor of [{}] for early reference proxy",
                    target_type.name()
                );
                Ok(())
            }
            NoArgConstructor::Private => Err(ContainerError::ProxyCreation(
                private_no_arg_constructor_error_message(target_type.name()),
            )),
            NoArgConstructor::Missing => Err(ContainerError::ProxyCreation(
                missing_no_arg_constructor_error_message(target_type.name()),
            )),
        }
    }

    /// 解析早期引用的目标单例
    ///
    /// 实例化期间暂停早期代理的创建，目标自身的 Bean 方法返回真实对象
    pub(crate) fn resolve_target(&self, target_type: &TypeMetadata) -> ContainerResult<ResolvedTarget> {
        let type_name = target_type.name();

        let mut candidates = self.autowire_candidates(type_name);
        // 只在完全没有该类型的定义时补注册，已有但不参与自动装配的定义不算缺失
        if candidates.is_empty() && self.bean_factory.get_bean_names_for_type(type_name).is_empty() {
            if let Some(registered) = self.register_definition_for(target_type)? {
                candidates.push(registered);
            }
        }

        let bean_name = match candidates.len() {
            0 => {
                return Err(ContainerError::NoSuchBeanDefinition {
                    type_name: type_name.to_string(),
                    message: "expected at least 1 bean which qualifies as autowire candidate for this dependency"
                        .to_string(),
                })
            }
            1 => candidates.remove(0),
            _ => self.determine_primary_candidate(type_name, &candidates)?,
        };

        let definition = self.bean_factory.get_bean_definition(&bean_name)?;
        let bean = {
            let _suspended = self.status.suspend();
            self.bean_factory.get_bean(&bean_name)?
        };

        tracing::debug!(
            "Resolved early bean reference for type [{}] to bean '{}'",
            type_name,
            bean_name
        );

        Ok(ResolvedTarget {
            bean_name,
            class_name: definition.bean_class_name.clone(),
            bean,
        })
    }

    fn autowire_candidates(&self, type_name: &str) -> Vec<String> {
        self.bean_factory
            .get_bean_names_for_type(type_name)
            .into_iter()
            .filter(|name| {
                self.bean_factory
                    .get_bean_definition(name)
                    .map(|definition| definition.autowire_candidate)
                    .unwrap_or(false)
            })
            .collect()
    }

    fn determine_primary_candidate(&self, type_name: &str, candidates: &[String]) -> ContainerResult<String> {
        let primaries: Vec<&String> = candidates
            .iter()
            .filter(|name| {
                self.bean_factory
                    .get_bean_definition(name)
                    .map(|definition| definition.primary)
                    .unwrap_or(false)
            })
            .collect();

        match primaries.as_slice() {
            [primary] => Ok((*primary).clone()),
            _ => Err(ContainerError::NoSuchBeanDefinition {
                type_name: type_name.to_string(),
                message: format!(
                    "expected single matching bean but found {}: {}",
                    candidates.len(),
                    candidates.join(",")
                ),
            }),
        }
    }

    /// 目录中存在可实例化的具体类型时，为它注册一个定义
    fn register_definition_for(&self, target_type: &TypeMetadata) -> ContainerResult<Option<String>> {
        let Some(catalog) = &self.catalog else {
            return Ok(None);
        };
        let Ok(loaded) = catalog.load_type(target_type.name()) else {
            return Ok(None);
        };
        if !loaded.metadata().is_concrete() || !loaded.is_instantiable() {
            return Ok(None);
        }

        let definition = BeanDefinition::from_loaded_type(&loaded, catalog);
        let registry = self.bean_factory.as_registry();
        let bean_name = self.name_generator.generate_bean_name(&definition, registry)?;
        if registry.is_bean_name_in_use(&bean_name) {
            tracing::debug!(
                "Not registering [{}] for early reference: bean name '{}' is already in use",
                target_type.name(),
                bean_name
            );
            return Ok(None);
        }
        registry.register_bean_definition(&bean_name, Arc::new(definition))?;

        tracing::info!(
            "Registered bean definition '{}' for early reference to type [{}]",
            bean_name,
            target_type.name()
        );
        Ok(Some(bean_name))
    }
}

impl fmt::Debug for EarlyBeanReferenceProxyCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EarlyBeanReferenceProxyCreator")
            .field("creating_early_proxies", &self.status.is_creating_early_proxies())
            .field("constructor_bypass", &self.constructor_bypass)
            .finish()
    }
}
