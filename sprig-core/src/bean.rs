use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::catalog::{InstanceConstructor, LoadedType, TypeCatalog};
use crate::error::{ContainerError, ContainerResult};
use crate::metadata::TypeMetadata;
use crate::Scope;

/// 负责产出 Bean 实例
pub trait ObjectFactory: Send + Sync {
    fn create(&self) -> ContainerResult<Box<dyn Any + Send + Sync>>;

    /// 产出实例的类型名，用于日志和错误信息
    fn type_name(&self) -> &str;
}

/// 包装一个闭包
pub struct FunctionFactory<T, F>
where
    T: Any + Send + Sync,
    F: Fn() -> ContainerResult<T> + Send + Sync,
{
    factory_fn: F,
    _phantom: PhantomData<fn() -> T>,
}

impl<T, F> FunctionFactory<T, F>
where
    T: Any + Send + Sync,
    F: Fn() -> ContainerResult<T> + Send + Sync,
{
    pub fn new(factory_fn: F) -> Self {
        Self {
            factory_fn,
            _phantom: PhantomData,
        }
    }

    pub fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }
}

impl<T, F> ObjectFactory for FunctionFactory<T, F>
where
    T: Any + Send + Sync,
    F: Fn() -> ContainerResult<T> + Send + Sync,
{
    fn create(&self) -> ContainerResult<Box<dyn Any + Send + Sync>> {
        let instance = (self.factory_fn)()?;
        Ok(Box::new(instance))
    }

    fn type_name(&self) -> &str {
        std::any::type_name::<T>()
    }
}

/// 通过类型目录中登记的无参构造函数创建实例
pub struct ConstructorFactory {
    type_name: String,
    constructor: Option<InstanceConstructor>,
}

impl ConstructorFactory {
    pub fn new(loaded: &LoadedType) -> Self {
        Self {
            type_name: loaded.name().to_string(),
            constructor: loaded.constructor().cloned(),
        }
    }
}

impl ObjectFactory for ConstructorFactory {
    fn create(&self) -> ContainerResult<Box<dyn Any + Send + Sync>> {
        match &self.constructor {
            Some(constructor) => Ok(constructor()),
            None => Err(ContainerError::BeanCreationFailed(format!(
                "No default constructor found for type [{}]",
                self.type_name
            ))),
        }
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }
}

/// Bean 的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BeanRole {
    /// 应用自己定义的 Bean
    #[default]
    Application,

    /// 较大配置中的支撑部分
    Support,

    /// 完全属于容器内部的基础设施 Bean
    Infrastructure,
}

/// 容器创建一个 Bean 所需的全部信息
#[derive(Clone)]
pub struct BeanDefinition {
    /// Bean 的类型名称
    pub bean_class_name: String,

    /// Bean 可以赋值给的所有类型名称（包括自身）
    pub assignable_types: Vec<String>,

    /// 扫描得到的类型元数据
    pub type_metadata: Option<Arc<TypeMetadata>>,

    pub scope: Scope,

    /// 实例工厂
    pub factory: Arc<dyn ObjectFactory>,

    /// 只影响单例的预实例化
    pub lazy: bool,

    /// 按类型解析时存在多个候选者时优先使用
    pub primary: bool,

    /// 是否参与按类型的自动装配
    pub autowire_candidate: bool,

    pub role: BeanRole,

    /// 定义的来源描述，例如扫描到的类型路径
    pub source: Option<String>,

    /// 是否由组件扫描产生
    pub scanned: bool,
}

impl BeanDefinition {
    pub fn new<F>(bean_class_name: impl Into<String>, factory: F) -> Self
    where
        F: ObjectFactory + 'static,
    {
        Self::with_factory(bean_class_name, Arc::new(factory))
    }

    /// 使用已共享的实例工厂创建 Bean 定义
    pub fn with_factory(bean_class_name: impl Into<String>, factory: Arc<dyn ObjectFactory>) -> Self {
        let bean_class_name = bean_class_name.into();
        Self {
            assignable_types: vec![bean_class_name.clone()],
            bean_class_name,
            type_metadata: None,
            scope: Scope::default(),
            factory,
            lazy: false,
            primary: false,
            autowire_candidate: true,
            role: BeanRole::default(),
            source: None,
            scanned: false,
        }
    }

    /// 从类型目录中的类型创建定义
    ///
    /// 可赋值类型包括类型本身和它的所有父类型
    pub fn from_loaded_type(loaded: &LoadedType, catalog: &TypeCatalog) -> Self {
        let metadata = Arc::clone(loaded.metadata());
        let mut definition = Self::new(metadata.name(), ConstructorFactory::new(loaded));
        definition
            .assignable_types
            .extend(catalog.supertype_closure(&metadata));
        definition.type_metadata = Some(metadata);
        definition
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = primary;
        self
    }

    pub fn with_autowire_candidate(mut self, autowire_candidate: bool) -> Self {
        self.autowire_candidate = autowire_candidate;
        self
    }

    pub fn with_role(mut self, role: BeanRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// 追加一个可赋值类型
    pub fn with_assignable_type(mut self, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        if !self.assignable_types.contains(&type_name) {
            self.assignable_types.push(type_name);
        }
        self
    }

    pub fn is_singleton(&self) -> bool {
        self.scope == Scope::Singleton
    }

    pub fn is_prototype(&self) -> bool {
        self.scope == Scope::Prototype
    }

    /// 是否可以赋值给指定类型
    pub fn is_assignable_to(&self, type_name: &str) -> bool {
        self.assignable_types.iter().any(|t| t == type_name)
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("bean_class_name", &self.bean_class_name)
            .field("scope", &self.scope)
            .field("lazy", &self.lazy)
            .field("primary", &self.primary)
            .field("autowire_candidate", &self.autowire_candidate)
            .field("role", &self.role)
            .field("source", &self.source)
            .field("factory_type", &self.factory.type_name())
            .finish()
    }
}

/// Bean 名称加上对应的定义
#[derive(Debug, Clone)]
pub struct BeanDefinitionHolder {
    pub bean_name: String,
    pub definition: Arc<BeanDefinition>,
}

impl BeanDefinitionHolder {
    pub fn new(bean_name: impl Into<String>, definition: Arc<BeanDefinition>) -> Self {
        Self {
            bean_name: bean_name.into(),
            definition,
        }
    }
}

/// 组件扫描应用到每个扫描得到的定义上的默认值
#[derive(Debug, Clone, Default)]
pub struct BeanDefinitionDefaults {
    pub lazy_init: bool,

    /// 自动装配候选者的名称模式（支持 `*` 通配符），为空时所有 Bean 都是候选者
    pub autowire_candidate_patterns: Vec<String>,
}

impl BeanDefinitionDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lazy_init(mut self, lazy_init: bool) -> Self {
        self.lazy_init = lazy_init;
        self
    }

    pub fn with_autowire_candidate_patterns(mut self, patterns: Vec<String>) -> Self {
        self.autowire_candidate_patterns = patterns;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TypeMetadata;

    #[derive(Debug, Default)]
    struct Counter {
        value: u32,
    }

    #[test]
    fn test_function_factory_creates_instances() {
        let factory = FunctionFactory::new(|| Ok(Counter { value: 7 }));
        let instance = factory.create().unwrap();
        assert_eq!(instance.downcast_ref::<Counter>().unwrap().value, 7);
        assert!(factory.type_name().ends_with("Counter"));
        assert_eq!(factory.type_id(), TypeId::of::<Counter>());
    }

    #[test]
    fn test_constructor_factory_without_constructor_fails() {
        let loaded = LoadedType::new(TypeMetadata::class("example::NoCtor"));
        let factory = ConstructorFactory::new(&loaded);
        assert!(matches!(
            factory.create(),
            Err(ContainerError::BeanCreationFailed(ref m)) if m.contains("example::NoCtor")
        ));
    }

    #[test]
    fn test_definition_from_loaded_type() {
        let catalog = TypeCatalog::new()
            .with_metadata(TypeMetadata::interface("example::FooService"));
        let loaded = LoadedType::new(
            TypeMetadata::class("example::FooServiceImpl").with_interface("example::FooService"),
        )
        .with_constructor(Counter::default);

        let definition = BeanDefinition::from_loaded_type(&loaded, &catalog);
        assert_eq!(definition.bean_class_name, "example::FooServiceImpl");
        assert!(definition.is_assignable_to("example::FooServiceImpl"));
        assert!(definition.is_assignable_to("example::FooService"));
        assert!(!definition.is_assignable_to("example::Other"));
        assert!(definition.is_singleton());
        assert!(definition.autowire_candidate);
        assert!(definition.factory.create().unwrap().is::<Counter>());
    }

    #[test]
    fn test_definition_builders() {
        let definition = BeanDefinition::new(
            "example::Counter",
            FunctionFactory::new(|| Ok(Counter::default())),
        )
        .with_scope(Scope::Prototype)
        .with_lazy(true)
        .with_primary(true)
        .with_role(BeanRole::Infrastructure)
        .with_assignable_type("example::Countable")
        .with_assignable_type("example::Countable");

        assert!(definition.is_prototype());
        assert!(definition.lazy);
        assert!(definition.primary);
        assert_eq!(definition.role, BeanRole::Infrastructure);
        assert_eq!(
            definition.assignable_types,
            vec!["example::Counter", "example::Countable"]
        );
    }
}
