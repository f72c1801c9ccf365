//! 作用域代理
//!
//! 目标定义改名为 `scopedTarget.<name>` 注册并退出自动装配，原名称下注册一个单例
//! 代理定义。代理每次访问目标时都通过 Bean 工厂按名称获取，因此原型作用域的目标
//! 在每次访问时都是新实例。

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use sprig_core::bean::{BeanDefinition, BeanDefinitionHolder, FunctionFactory};
use sprig_core::bean_factory::{BeanDefinitionRegistry, BeanFactory, ConfigurableListableBeanFactory};
use sprig_core::catalog::TypeCatalog;
use sprig_core::constants::SCOPED_TARGET_NAME_PREFIX;
use sprig_core::error::{ContainerError, ContainerResult};
use sprig_core::scope::{Scope, ScopedProxyMode};

/// 作用域代理 Bean 的类型名
pub const SCOPED_PROXY_TYPE: &str = "sprig::context::ScopedProxy";

/// 目标定义注册时使用的名称
pub fn scoped_target_bean_name(bean_name: &str) -> String {
    format!("{}{}", SCOPED_TARGET_NAME_PREFIX, bean_name)
}

/// 作用域代理实例
pub struct ScopedProxy {
    target_bean_name: String,
    mode: ScopedProxyMode,
    bean_factory: Weak<dyn ConfigurableListableBeanFactory>,
}

impl ScopedProxy {
    pub fn target_bean_name(&self) -> &str {
        &self.target_bean_name
    }

    pub fn mode(&self) -> ScopedProxyMode {
        self.mode
    }

    /// 按名称从 Bean 工厂获取当前目标
    pub fn target(&self) -> ContainerResult<Arc<dyn Any + Send + Sync>> {
        let bean_factory = self.bean_factory.upgrade().ok_or_else(|| {
            ContainerError::BeanCreationFailed(format!(
                "Bean factory for scoped target '{}' is no longer available",
                self.target_bean_name
            ))
        })?;
        bean_factory.get_bean(&self.target_bean_name)
    }

    pub fn target_as<T: Any + Send + Sync>(&self) -> ContainerResult<Arc<T>> {
        let target = self.target()?;
        target.downcast::<T>().map_err(|_| ContainerError::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            found: self.target_bean_name.clone(),
        })
    }
}

impl fmt::Debug for ScopedProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedProxy")
            .field("target_bean_name", &self.target_bean_name)
            .field("mode", &self.mode)
            .finish()
    }
}

/// 为定义创建作用域代理
///
/// 目标定义立即注册到 Bean 工厂；返回的代理定义由调用方以原名称注册。
/// `mode` 为 `No` 或 `Default` 时原样返回。
pub fn create_scoped_proxy(
    holder: BeanDefinitionHolder,
    bean_factory: &Arc<dyn ConfigurableListableBeanFactory>,
    catalog: &TypeCatalog,
    mode: ScopedProxyMode,
) -> ContainerResult<BeanDefinitionHolder> {
    if matches!(mode, ScopedProxyMode::No | ScopedProxyMode::Default) {
        return Ok(holder);
    }

    let original_name = holder.bean_name.clone();
    let target_name = scoped_target_bean_name(&original_name);
    let target = holder.definition.as_ref();

    let proxied_types: Vec<String> = match (mode, &target.type_metadata) {
        (ScopedProxyMode::Interfaces, Some(metadata)) => catalog.interface_closure(metadata),
        (ScopedProxyMode::Interfaces, None) => target
            .assignable_types
            .iter()
            .filter(|t| *t != &target.bean_class_name)
            .cloned()
            .collect(),
        _ => target.assignable_types.clone(),
    };

    let factory_name = target_name.clone();
    let weak_factory = Arc::downgrade(bean_factory);
    let mut proxy = BeanDefinition::new(
        SCOPED_PROXY_TYPE,
        FunctionFactory::new(move || {
            Ok(ScopedProxy {
                target_bean_name: factory_name.clone(),
                mode,
                bean_factory: weak_factory.clone(),
            })
        }),
    )
    .with_scope(Scope::Singleton)
    .with_primary(target.primary)
    .with_autowire_candidate(target.autowire_candidate)
    .with_role(target.role);
    for proxied_type in proxied_types {
        proxy = proxy.with_assignable_type(proxied_type);
    }
    proxy.type_metadata = target.type_metadata.clone();
    proxy.source = target.source.clone();
    proxy.scanned = target.scanned;

    let hidden_target = target
        .clone()
        .with_autowire_candidate(false)
        .with_primary(false);
    bean_factory.register_bean_definition(&target_name, Arc::new(hidden_target))?;

    tracing::debug!(
        "Registered scoped target '{}' behind {:?} proxy '{}'",
        target_name,
        mode,
        original_name
    );

    Ok(BeanDefinitionHolder::new(original_name, Arc::new(proxy)))
}
