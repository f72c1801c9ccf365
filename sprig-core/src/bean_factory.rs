//! 容器的注册表和 Bean 工厂
//!
//! 注册表一侧只提供早期引用代理和组件扫描需要的能力：按名称检查和注册定义、
//! 单例登记、按类型列举名称，以及首次使用时实例化单例。

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{
    bean::BeanDefinition,
    error::{ContainerError, ContainerResult},
    utils::dependency::CreationTracker,
    Scope,
};

/// 按名称取 Bean，可作为 trait object 使用
pub trait BeanFactory: Send + Sync {
    /// 通过名称获取 Bean，必要时创建它
    fn get_bean(&self, name: &str) -> ContainerResult<Arc<dyn Any + Send + Sync>>;

    /// 检查是否包含指定名称的 Bean（定义或已登记的单例）
    fn contains_bean(&self, name: &str) -> bool;
}

/// 带泛型的便捷方法，对所有 `BeanFactory` 自动实现
pub trait BeanFactoryExt: BeanFactory {
    /// 取 Bean 并向下转型，类型不符时返回 `TypeMismatch`
    fn get_bean_as<T: Any + Send + Sync>(&self, name: &str) -> ContainerResult<Arc<T>> {
        self.get_bean(name)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                found: format!("bean '{}'", name),
            })
    }
}

impl<F: BeanFactory + ?Sized> BeanFactoryExt for F {}

pub trait ListableBeanFactory: BeanFactory {
    /// 获取所有 Bean 的名称（定义在前，按注册顺序）
    fn get_bean_names(&self) -> Vec<String>;

    /// 获取可以赋值给指定类型的所有 Bean 名称
    fn get_bean_names_for_type(&self, type_name: &str) -> Vec<String>;
}

pub trait BeanDefinitionRegistry: Send + Sync {
    fn register_bean_definition(&self, name: &str, definition: Arc<BeanDefinition>) -> ContainerResult<()>;

    fn remove_bean_definition(&self, name: &str) -> ContainerResult<()>;

    fn get_bean_definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>>;

    fn contains_bean_definition(&self, name: &str) -> bool;

    /// 所有 Bean 定义的名称，按注册顺序
    fn get_bean_definition_names(&self) -> Vec<String>;

    fn get_bean_definition_count(&self) -> usize;

    /// 名称是否已经被定义或单例占用
    fn is_bean_name_in_use(&self, name: &str) -> bool;
}

/// 不经过定义直接登记的单例
pub trait SingletonBeanRegistry: Send + Sync {
    /// 直接登记一个已存在的单例对象
    fn register_singleton(&self, name: &str, singleton: Arc<dyn Any + Send + Sync>) -> ContainerResult<()>;

    /// 获取已经创建的单例，不会触发创建
    fn get_singleton(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>>;

    fn contains_singleton(&self, name: &str) -> bool;

    fn get_singleton_count(&self) -> usize;
}

pub trait ConfigurableListableBeanFactory:
    ListableBeanFactory + BeanDefinitionRegistry + SingletonBeanRegistry
{
    /// 预实例化所有非延迟的单例 Bean
    fn preinstantiate_singletons(&self) -> ContainerResult<()>;

    /// 冻结后注册或移除定义都会失败
    fn freeze_configuration(&self);

    fn is_configuration_frozen(&self) -> bool;

    /// 销毁所有单例 Bean
    fn destroy_singletons(&self);

    /// 以注册表视图访问
    fn as_registry(&self) -> &dyn BeanDefinitionRegistry;
}

/// 定义和单例都保存在内存里，名称保持注册顺序
pub struct DefaultListableBeanFactory {
    definitions: RwLock<HashMap<String, Arc<BeanDefinition>>>,

    /// 定义名称，按注册顺序
    definition_names: RwLock<Vec<String>>,

    singletons: RwLock<HashMap<String, Arc<dyn Any + Send + Sync>>>,

    /// 直接登记（没有定义）的单例名称，按登记顺序
    manual_singleton_names: RwLock<Vec<String>>,

    creation_tracker: CreationTracker,

    configuration_frozen: RwLock<bool>,
}

impl DefaultListableBeanFactory {
    pub fn new() -> Self {
        Self {
            definitions: RwLock::new(HashMap::new()),
            definition_names: RwLock::new(Vec::new()),
            singletons: RwLock::new(HashMap::new()),
            manual_singleton_names: RwLock::new(Vec::new()),
            creation_tracker: CreationTracker::new(),
            configuration_frozen: RwLock::new(false),
        }
    }

    /// 按定义创建一个实例
    ///
    /// 调用实例工厂时不持有任何锁，工厂内部可以再次访问容器
    fn create_bean_internal(
        &self,
        name: &str,
        definition: &BeanDefinition,
    ) -> ContainerResult<Arc<dyn Any + Send + Sync>> {
        if !self.creation_tracker.start_creating(name) {
            let creating_chain = self.creation_tracker.current_creating();
            return Err(ContainerError::CircularDependency(format!(
                "{} -> {}",
                creating_chain.join(" -> "),
                name
            )));
        }

        // 守卫在返回和 panic 时都会移出创建链
        struct CreationGuard<'a> {
            tracker: &'a CreationTracker,
            name: &'a str,
        }

        impl Drop for CreationGuard<'_> {
            fn drop(&mut self) {
                self.tracker.finish_creating(self.name);
            }
        }

        let _guard = CreationGuard {
            tracker: &self.creation_tracker,
            name,
        };

        let instance = definition.factory.create().map_err(|e| {
            // 循环依赖原样返回，链条信息在里面
            match e {
                ContainerError::CircularDependency(_) => e,
                _ => ContainerError::BeanCreationFailed(format!("{}: {}", name, e)),
            }
        })?;

        Ok(Arc::from(instance))
    }

    fn check_not_frozen(&self, action: &str, name: &str) -> ContainerResult<()> {
        if *self.configuration_frozen.read() {
            return Err(ContainerError::Configuration(format!(
                "Cannot {} bean definition '{}': configuration is frozen",
                action, name
            )));
        }
        Ok(())
    }
}

impl Default for DefaultListableBeanFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanFactory for DefaultListableBeanFactory {
    fn get_bean(&self, name: &str) -> ContainerResult<Arc<dyn Any + Send + Sync>> {
        tracing::trace!("get_bean('{}')", name);

        if let Some(bean) = self.singletons.read().get(name) {
            tracing::trace!("Returning cached instance of singleton bean '{}'", name);
            return Ok(Arc::clone(bean));
        }

        let definition = self.definitions.read().get(name).cloned().ok_or_else(|| {
            tracing::debug!("No bean named '{}'", name);
            ContainerError::BeanNotFound(name.to_string())
        })?;

        match definition.scope {
            Scope::Singleton => {
                tracing::info!("Instantiating singleton '{}'", name);

                let bean = self.create_bean_internal(name, &definition)?;

                // 创建过程中可能已经有人登记了同名单例，以先登记者为准
                let mut singletons = self.singletons.write();
                let cached = singletons
                    .entry(name.to_string())
                    .or_insert_with(|| Arc::clone(&bean));

                tracing::debug!("Cached singleton '{}'", name);
                Ok(Arc::clone(cached))
            }
            Scope::Prototype => {
                tracing::debug!("New prototype instance for '{}'", name);
                self.create_bean_internal(name, &definition)
            }
        }
    }

    fn contains_bean(&self, name: &str) -> bool {
        self.definitions.read().contains_key(name) || self.singletons.read().contains_key(name)
    }
}

impl ListableBeanFactory for DefaultListableBeanFactory {
    fn get_bean_names(&self) -> Vec<String> {
        let mut names = self.definition_names.read().clone();
        names.extend(self.manual_singleton_names.read().iter().cloned());
        names
    }

    fn get_bean_names_for_type(&self, type_name: &str) -> Vec<String> {
        let definitions = self.definitions.read();
        self.definition_names
            .read()
            .iter()
            .filter(|name| {
                definitions
                    .get(name.as_str())
                    .map(|definition| definition.is_assignable_to(type_name))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

impl BeanDefinitionRegistry for DefaultListableBeanFactory {
    fn register_bean_definition(&self, name: &str, definition: Arc<BeanDefinition>) -> ContainerResult<()> {
        self.check_not_frozen("register", name)?;

        tracing::trace!(
            "Attempting to register bean: name='{}', type='{}', scope={:?}",
            name,
            definition.bean_class_name,
            definition.scope
        );

        {
            let mut definitions = self.definitions.write();
            if definitions.contains_key(name) {
                tracing::warn!("Refusing to override bean definition '{}'", name);
                return Err(ContainerError::BeanAlreadyExists(name.to_string()));
            }
            definitions.insert(name.to_string(), definition);
        }
        self.definition_names.write().push(name.to_string());

        tracing::debug!("Registered bean definition '{}'", name);
        Ok(())
    }

    fn remove_bean_definition(&self, name: &str) -> ContainerResult<()> {
        self.check_not_frozen("remove", name)?;

        self.definitions
            .write()
            .remove(name)
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))?;
        self.definition_names.write().retain(|n| n != name);
        self.singletons.write().remove(name);

        tracing::debug!("Removed bean definition '{}'", name);
        Ok(())
    }

    fn get_bean_definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>> {
        self.definitions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ContainerError::BeanNotFound(name.to_string()))
    }

    fn contains_bean_definition(&self, name: &str) -> bool {
        self.definitions.read().contains_key(name)
    }

    fn get_bean_definition_names(&self) -> Vec<String> {
        self.definition_names.read().clone()
    }

    fn get_bean_definition_count(&self) -> usize {
        self.definitions.read().len()
    }

    fn is_bean_name_in_use(&self, name: &str) -> bool {
        self.contains_bean(name)
    }
}

impl SingletonBeanRegistry for DefaultListableBeanFactory {
    fn register_singleton(&self, name: &str, singleton: Arc<dyn Any + Send + Sync>) -> ContainerResult<()> {
        {
            let mut singletons = self.singletons.write();
            if singletons.contains_key(name) {
                return Err(ContainerError::BeanAlreadyExists(name.to_string()));
            }
            singletons.insert(name.to_string(), singleton);
        }

        if !self.definitions.read().contains_key(name) {
            self.manual_singleton_names.write().push(name.to_string());
        }

        tracing::debug!("Registered singleton object '{}'", name);
        Ok(())
    }

    fn get_singleton(&self, name: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.singletons.read().get(name).cloned()
    }

    fn contains_singleton(&self, name: &str) -> bool {
        self.singletons.read().contains_key(name)
    }

    fn get_singleton_count(&self) -> usize {
        self.singletons.read().len()
    }
}

impl ConfigurableListableBeanFactory for DefaultListableBeanFactory {
    fn preinstantiate_singletons(&self) -> ContainerResult<()> {
        let bean_names: Vec<String> = {
            let definitions = self.definitions.read();
            self.definition_names
                .read()
                .iter()
                .filter(|name| {
                    definitions
                        .get(name.as_str())
                        .map(|def| def.is_singleton() && !def.lazy)
                        .unwrap_or(false)
                })
                .cloned()
                .collect()
        };

        tracing::debug!("Eagerly instantiating {} singleton(s)", bean_names.len());

        for name in bean_names {
            self.get_bean(&name)?;
        }

        Ok(())
    }

    fn freeze_configuration(&self) {
        *self.configuration_frozen.write() = true;
        tracing::debug!("Bean definitions frozen");
    }

    fn is_configuration_frozen(&self) -> bool {
        *self.configuration_frozen.read()
    }

    fn destroy_singletons(&self) {
        let destroyed = {
            let mut singletons = self.singletons.write();
            let count = singletons.len();
            singletons.clear();
            count
        };
        self.manual_singleton_names.write().clear();

        tracing::info!("Destroyed {} singleton bean(s)", destroyed);
    }

    fn as_registry(&self) -> &dyn BeanDefinitionRegistry {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::FunctionFactory;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Counter {
        id: usize,
    }

    fn counting_definition(
        class_name: &str,
        counter: Arc<AtomicUsize>,
    ) -> Arc<BeanDefinition> {
        Arc::new(BeanDefinition::new(
            class_name,
            FunctionFactory::new(move || {
                Ok(Counter {
                    id: counter.fetch_add(1, Ordering::SeqCst),
                })
            }),
        ))
    }

    #[test]
    fn test_singleton_is_created_once() {
        let factory = DefaultListableBeanFactory::new();
        let created = Arc::new(AtomicUsize::new(0));
        factory
            .register_bean_definition("counter", counting_definition("example::Counter", created.clone()))
            .unwrap();

        assert!(!factory.contains_singleton("counter"));
        let first = factory.get_bean_as::<Counter>("counter").unwrap();
        let second = factory.get_bean_as::<Counter>("counter").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(factory.contains_singleton("counter"));
        assert_eq!(factory.get_singleton_count(), 1);
    }

    #[test]
    fn test_prototype_creates_new_instances() {
        let factory = DefaultListableBeanFactory::new();
        let created = Arc::new(AtomicUsize::new(0));
        let definition = BeanDefinition::clone(&counting_definition("example::Counter", created.clone()))
            .with_scope(Scope::Prototype);
        factory
            .register_bean_definition("counter", Arc::new(definition))
            .unwrap();

        let first = factory.get_bean_as::<Counter>("counter").unwrap();
        let second = factory.get_bean_as::<Counter>("counter").unwrap();
        assert_ne!(first.id, second.id);
        assert!(!factory.contains_singleton("counter"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let factory = DefaultListableBeanFactory::new();
        let created = Arc::new(AtomicUsize::new(0));
        factory
            .register_bean_definition("counter", counting_definition("example::Counter", created.clone()))
            .unwrap();

        let result = factory.register_bean_definition("counter", counting_definition("example::Counter", created));
        assert!(matches!(result, Err(ContainerError::BeanAlreadyExists(ref n)) if n == "counter"));
    }

    #[test]
    fn test_frozen_configuration_rejects_registration() {
        let factory = DefaultListableBeanFactory::new();
        factory.freeze_configuration();
        assert!(factory.is_configuration_frozen());

        let result = factory.register_bean_definition(
            "counter",
            counting_definition("example::Counter", Arc::new(AtomicUsize::new(0))),
        );
        assert!(matches!(result, Err(ContainerError::Configuration(_))));
    }

    #[test]
    fn test_names_for_type_keep_registration_order() {
        let factory = DefaultListableBeanFactory::new();
        let created = Arc::new(AtomicUsize::new(0));
        for (name, class) in [("b", "example::B"), ("a", "example::A"), ("c", "example::C")] {
            let definition = BeanDefinition::clone(&counting_definition(class, created.clone()))
                .with_assignable_type("example::Countable");
            factory.register_bean_definition(name, Arc::new(definition)).unwrap();
        }

        assert_eq!(
            factory.get_bean_names_for_type("example::Countable"),
            vec!["b", "a", "c"]
        );
        assert_eq!(factory.get_bean_names_for_type("example::A"), vec!["a"]);
        assert!(factory.get_bean_names_for_type("example::Missing").is_empty());
    }

    #[test]
    fn test_circular_creation_is_detected() {
        let factory = Arc::new(DefaultListableBeanFactory::new());
        let weak = Arc::downgrade(&factory);
        factory
            .register_bean_definition(
                "selfish",
                Arc::new(BeanDefinition::new(
                    "example::Selfish",
                    FunctionFactory::new(move || {
                        let factory = weak.upgrade().ok_or_else(|| {
                            ContainerError::BeanCreationFailed("factory dropped".to_string())
                        })?;
                        factory.get_bean("selfish")?;
                        Ok(0_u8)
                    }),
                )),
            )
            .unwrap();

        let result = factory.get_bean("selfish");
        assert!(matches!(result, Err(ContainerError::CircularDependency(ref chain)) if chain == "selfish -> selfish"));
        assert!(!factory.contains_singleton("selfish"));
    }

    #[test]
    fn test_manual_singletons_and_destruction() {
        let factory = DefaultListableBeanFactory::new();
        factory
            .register_singleton("config", Arc::new(String::from("value")))
            .unwrap();

        assert!(factory.contains_bean("config"));
        assert!(factory.is_bean_name_in_use("config"));
        assert!(!factory.contains_bean_definition("config"));
        assert_eq!(factory.get_bean_names(), vec!["config"]);
        assert_eq!(*factory.get_bean_as::<String>("config").unwrap(), "value");
        assert!(matches!(
            factory.get_bean_as::<u32>("config"),
            Err(ContainerError::TypeMismatch { .. })
        ));

        factory.destroy_singletons();
        assert_eq!(factory.get_singleton_count(), 0);
        assert!(!factory.contains_bean("config"));
    }

    #[test]
    fn test_preinstantiate_skips_lazy_and_prototype() {
        let factory = DefaultListableBeanFactory::new();
        let created = Arc::new(AtomicUsize::new(0));

        factory
            .register_bean_definition("eager", counting_definition("example::Eager", created.clone()))
            .unwrap();
        let lazy = BeanDefinition::clone(&counting_definition("example::Lazy", created.clone())).with_lazy(true);
        factory.register_bean_definition("lazy", Arc::new(lazy)).unwrap();
        let prototype = BeanDefinition::clone(&counting_definition("example::Proto", created.clone()))
            .with_scope(Scope::Prototype);
        factory.register_bean_definition("proto", Arc::new(prototype)).unwrap();

        factory.preinstantiate_singletons().unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 1);
        assert!(factory.contains_singleton("eager"));
        assert!(!factory.contains_singleton("lazy"));
    }
}
