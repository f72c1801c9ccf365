//! 类型目录
//!
//! 类型目录取代了类加载器与类路径：它把类型名映射到 [`LoadedType`]（元数据加上可选的
//! 无参构造函数），扫描器在其中查找候选组件，类型过滤器在其中解析父类型和元注解，
//! 声明式配置中出现的类名（过滤器、名称生成器、作用域解析器）也通过它加载。
//!
//! 目录可以由调用方显式构建，也可以收集通过 `inventory::submit!` 提交的
//! [`TypeRegistration`]。

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use regex::Regex;

use crate::constants::{
    COMPONENT_ANNOTATION, CONTROLLER_ANNOTATION, LAZY_ANNOTATION, PRIMARY_ANNOTATION,
    REPOSITORY_ANNOTATION, SCOPE_ANNOTATION, SERVICE_ANNOTATION,
};
use crate::error::{ContainerError, ContainerResult};
use crate::metadata::{AnnotationMetadata, TypeMetadata};
use crate::utils::naming::PATH_SEPARATOR;

/// 无参构造函数
pub type InstanceConstructor = Arc<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// 已加载的类型
#[derive(Clone)]
pub struct LoadedType {
    metadata: Arc<TypeMetadata>,
    constructor: Option<InstanceConstructor>,
    /// 构造出的实例所实现的策略能力（`Arc<S>` 的 TypeId 和策略名）
    capability: Option<(TypeId, &'static str)>,
}

impl LoadedType {
    pub fn new(metadata: TypeMetadata) -> Self {
        Self {
            metadata: Arc::new(metadata),
            constructor: None,
            capability: None,
        }
    }

    /// 设置无参构造函数
    pub fn with_constructor<T, F>(mut self, constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(move || Box::new(constructor()) as Box<dyn Any + Send + Sync>));
        self
    }

    /// 声明该类型实现了策略 `S`，构造函数返回 `Arc<S>`
    ///
    /// ```
    /// use std::sync::Arc;
    /// use sprig_core::catalog::LoadedType;
    /// use sprig_core::metadata::TypeMetadata;
    /// use sprig_core::type_filter::{RegexPatternTypeFilter, TypeFilter};
    ///
    /// let loaded = LoadedType::new(TypeMetadata::class("app::StubFilter"))
    ///     .with_strategy::<dyn TypeFilter, _>(|| {
    ///         Arc::new(RegexPatternTypeFilter::new(".*Stub.*").unwrap())
    ///     });
    ///
    /// assert!(loaded.implements::<dyn TypeFilter>());
    /// ```
    pub fn with_strategy<S, F>(mut self, constructor: F) -> Self
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<S> + Send + Sync + 'static,
    {
        self.constructor = Some(Arc::new(move || Box::new(constructor()) as Box<dyn Any + Send + Sync>));
        self.capability = Some((TypeId::of::<Arc<S>>(), std::any::type_name::<S>()));
        self
    }

    pub fn metadata(&self) -> &Arc<TypeMetadata> {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        self.metadata.name()
    }

    /// 是否有可用的无参构造函数
    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    pub fn constructor(&self) -> Option<&InstanceConstructor> {
        self.constructor.as_ref()
    }

    /// 是否实现了策略 `S`
    pub fn implements<S: ?Sized + 'static>(&self) -> bool {
        matches!(self.capability, Some((type_id, _)) if type_id == TypeId::of::<Arc<S>>())
    }

    /// 通过无参构造函数创建实例
    pub fn instantiate(&self) -> ContainerResult<Box<dyn Any + Send + Sync>> {
        match &self.constructor {
            Some(constructor) => Ok(constructor()),
            None => Err(ContainerError::BeanCreationFailed(format!(
                "No default constructor found for type [{}]",
                self.metadata.name()
            ))),
        }
    }
}

impl fmt::Debug for LoadedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedType")
            .field("name", &self.metadata.name())
            .field("kind", &self.metadata.kind())
            .field("instantiable", &self.is_instantiable())
            .field("capability", &self.capability.map(|(_, name)| name))
            .finish()
    }
}

/// 类型注册表项 - 用于 inventory 收集
///
/// ```ignore
/// sprig_core::inventory::submit! {
///     TypeRegistration::new("example::scannable::FooServiceImpl", || {
///         LoadedType::new(TypeMetadata::class("example::scannable::FooServiceImpl"))
///             .with_constructor(FooServiceImpl::default)
///     })
/// }
/// ```
pub struct TypeRegistration {
    pub name: &'static str,
    pub loader: fn() -> LoadedType,
}

impl TypeRegistration {
    pub const fn new(name: &'static str, loader: fn() -> LoadedType) -> Self {
        Self { name, loader }
    }
}

inventory::collect!(TypeRegistration);

/// 资源模式
///
/// 把基础包和资源模式（glob）组合成一个匹配类型路径的正则表达式。类型路径是把
/// `::` 替换为 `/` 后的类型名。glob 支持 `**`（任意层级）、`*`（单层内任意字符）
/// 和 `?`（单个字符）。
#[derive(Debug, Clone)]
pub struct ResourcePattern {
    pattern: String,
    regex: Regex,
}

impl ResourcePattern {
    pub fn new(base_package: &str, resource_pattern: &str) -> ContainerResult<Self> {
        let base_path = base_package.trim_end_matches(PATH_SEPARATOR).replace(PATH_SEPARATOR, "/");
        let pattern = if base_path.is_empty() {
            resource_pattern.to_string()
        } else {
            format!("{}/{}", base_path, resource_pattern.trim_start_matches('/'))
        };

        let regex = Regex::new(&format!("^{}$", glob_to_regex(&pattern))).map_err(|e| {
            ContainerError::Configuration(format!(
                "Invalid resource pattern '{}': {}",
                pattern, e
            ))
        })?;

        Ok(Self { pattern, regex })
    }

    /// 完整的 glob 模式，例如 `example/scannable/**/*`
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, type_name: &str) -> bool {
        self.regex.is_match(&type_name.replace(PATH_SEPARATOR, "/"))
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut regex = String::with_capacity(glob.len() * 2);
    let mut chars = glob.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    regex.push_str("(?:.*/)?");
                } else {
                    regex.push_str(".*");
                }
            }
            '*' => regex.push_str("[^/]*"),
            '?' => regex.push_str("[^/]"),
            other => regex.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    regex
}

/// 类型目录
pub struct TypeCatalog {
    types: RwLock<BTreeMap<String, LoadedType>>,
}

impl TypeCatalog {
    /// 创建包含内置注解类型的目录
    pub fn new() -> Self {
        let catalog = Self {
            types: RwLock::new(BTreeMap::new()),
        };
        catalog.register_builtin_annotations();
        catalog
    }

    /// 创建目录并收集所有通过 inventory 提交的类型
    pub fn from_inventory() -> Self {
        let catalog = Self::new();
        let mut total = 0;

        for registration in inventory::iter::<TypeRegistration> {
            tracing::trace!("Loading submitted type '{}'", registration.name);
            catalog.register((registration.loader)());
            total += 1;
        }

        tracing::debug!("Collected {} submitted type(s) into type catalog", total);
        catalog
    }

    fn register_builtin_annotations(&self) {
        let component_meta = || AnnotationMetadata::new(COMPONENT_ANNOTATION);

        self.register(LoadedType::new(TypeMetadata::annotation(COMPONENT_ANNOTATION)));
        for stereotype in [SERVICE_ANNOTATION, REPOSITORY_ANNOTATION, CONTROLLER_ANNOTATION] {
            self.register(LoadedType::new(
                TypeMetadata::annotation(stereotype).with_annotation(component_meta()),
            ));
        }
        for annotation in [SCOPE_ANNOTATION, LAZY_ANNOTATION, PRIMARY_ANNOTATION] {
            self.register(LoadedType::new(TypeMetadata::annotation(annotation)));
        }
    }

    /// 登记类型，返回被替换的旧登记（如果有）
    pub fn register(&self, loaded: LoadedType) -> Option<LoadedType> {
        let name = loaded.name().to_string();
        let previous = self.types.write().insert(name.clone(), loaded);
        if previous.is_some() {
            tracing::debug!("Replaced type '{}' in type catalog", name);
        } else {
            tracing::trace!("Registered type '{}' in type catalog", name);
        }
        previous
    }

    /// 链式登记类型
    pub fn with_type(self, loaded: LoadedType) -> Self {
        self.register(loaded);
        self
    }

    /// 链式登记只有元数据的类型
    pub fn with_metadata(self, metadata: TypeMetadata) -> Self {
        self.with_type(LoadedType::new(metadata))
    }

    /// 加载类型
    pub fn load_type(&self, name: &str) -> ContainerResult<LoadedType> {
        self.types
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ContainerError::TypeResolution {
                type_name: name.to_string(),
                message: format!("Class [{}] not found in type catalog", name),
            })
    }

    pub fn metadata(&self, name: &str) -> Option<Arc<TypeMetadata>> {
        self.types.read().get(name).map(|loaded| Arc::clone(loaded.metadata()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.read().is_empty()
    }

    /// 查找匹配资源模式的所有类型，按类型名排序
    pub fn find_candidate_types(&self, pattern: &ResourcePattern) -> Vec<Arc<TypeMetadata>> {
        let types = self.types.read();
        let candidates: Vec<_> = types
            .values()
            .filter(|loaded| pattern.matches(loaded.name()))
            .map(|loaded| Arc::clone(loaded.metadata()))
            .collect();

        tracing::trace!(
            "Resource pattern '{}' matched {} type(s)",
            pattern.pattern(),
            candidates.len()
        );
        candidates
    }

    /// 类型是否可以赋值给目标类型（自身、父类或任意层级的接口）
    pub fn is_assignable(&self, candidate: &TypeMetadata, target_type: &str) -> bool {
        candidate.name() == target_type
            || self
                .walk_supertypes(candidate)
                .iter()
                .any(|(name, _)| name == target_type)
    }

    /// 所有父类型（父类链和接口，传递闭包），广度优先顺序
    pub fn supertype_closure(&self, metadata: &TypeMetadata) -> Vec<String> {
        self.walk_supertypes(metadata)
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }

    /// 所有实现的接口（传递闭包）
    pub fn interface_closure(&self, metadata: &TypeMetadata) -> Vec<String> {
        self.walk_supertypes(metadata)
            .into_iter()
            .filter(|(_, is_interface)| *is_interface)
            .map(|(name, _)| name)
            .collect()
    }

    /// 广度优先遍历父类型，返回 (类型名, 是否为接口)
    ///
    /// 目录中不存在的父类型仍然出现在结果中，只是不再向上展开
    fn walk_supertypes(&self, metadata: &TypeMetadata) -> Vec<(String, bool)> {
        let mut visited = HashSet::new();
        let mut result = Vec::new();
        let mut queue = VecDeque::new();

        visited.insert(metadata.name().to_string());
        queue.push_back(Arc::new(metadata.clone()));

        while let Some(current) = queue.pop_front() {
            let supertypes = current
                .superclass()
                .map(|s| (s, false))
                .into_iter()
                .chain(current.interfaces().iter().map(|i| (i.as_str(), true)));

            for (name, declared_as_interface) in supertypes {
                if !visited.insert(name.to_string()) {
                    continue;
                }
                let known = self.metadata(name);
                let is_interface = known
                    .as_ref()
                    .map(|m| m.is_interface())
                    .unwrap_or(declared_as_interface);
                result.push((name.to_string(), is_interface));
                if let Some(known) = known {
                    queue.push_back(known);
                }
            }
        }

        result
    }

    /// 按类名实例化声明式配置中指定的策略
    ///
    /// `strategy_name` 只用于错误信息
    pub fn instantiate_strategy<S>(&self, class_name: &str, strategy_name: &str) -> ContainerResult<Arc<S>>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        let loaded = self.load_type(class_name).map_err(|_| {
            ContainerError::Configuration(format!(
                "Class [{}] for strategy [{}] not found",
                class_name, strategy_name
            ))
        })?;

        if !loaded.is_instantiable() {
            return Err(ContainerError::Configuration(format!(
                "Unable to instantiate class [{}] for strategy [{}]. A zero-argument constructor is required",
                class_name, strategy_name
            )));
        }

        if !loaded.implements::<S>() {
            return Err(ContainerError::Configuration(format!(
                "Provided class name must be an implementation of {}",
                strategy_name
            )));
        }

        let instance = loaded.instantiate()?;
        instance.downcast::<Arc<S>>().map(|strategy| *strategy).map_err(|_| {
            ContainerError::Configuration(format!(
                "Provided class name must be an implementation of {}",
                strategy_name
            ))
        })
    }
}

impl Default for TypeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCatalog")
            .field("types", &self.types.read().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TypeMetadata;

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct EnglishGreeter;

    impl Greeter for EnglishGreeter {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    fn sample_catalog() -> TypeCatalog {
        TypeCatalog::new()
            .with_metadata(TypeMetadata::interface("example::Repository"))
            .with_metadata(
                TypeMetadata::interface("example::CrudRepository")
                    .with_interface("example::Repository"),
            )
            .with_metadata(TypeMetadata::class("example::BaseDao").with_abstract(true))
            .with_metadata(
                TypeMetadata::class("example::dao::JdbcFooDao")
                    .with_superclass("example::BaseDao")
                    .with_interface("example::CrudRepository"),
            )
            .with_metadata(TypeMetadata::class("example::service::FooService"))
            .with_metadata(TypeMetadata::class("example::service::impl::FooServiceImpl"))
    }

    #[test]
    fn test_builtin_annotations_are_registered() {
        let catalog = TypeCatalog::new();
        let service = catalog.metadata(SERVICE_ANNOTATION).unwrap();
        assert!(service.is_annotation());
        assert!(service.has_annotation(COMPONENT_ANNOTATION));
        assert!(catalog.contains(SCOPE_ANNOTATION));
    }

    #[test]
    fn test_load_missing_type() {
        let catalog = TypeCatalog::new();
        let result = catalog.load_type("example::Missing");
        assert!(matches!(
            result,
            Err(ContainerError::TypeResolution { ref type_name, .. }) if type_name == "example::Missing"
        ));
    }

    #[test]
    fn test_resource_pattern_matching() {
        let pattern = ResourcePattern::new("example::service", "**/*").unwrap();
        assert_eq!(pattern.pattern(), "example/service/**/*");
        assert!(pattern.matches("example::service::FooService"));
        assert!(pattern.matches("example::service::impl::FooServiceImpl"));
        assert!(!pattern.matches("example::servicex::Foo"));
        assert!(!pattern.matches("example::dao::JdbcFooDao"));

        let shallow = ResourcePattern::new("example::service", "*").unwrap();
        assert!(shallow.matches("example::service::FooService"));
        assert!(!shallow.matches("example::service::impl::FooServiceImpl"));

        let suffix = ResourcePattern::new("example", "**/*Dao").unwrap();
        assert!(suffix.matches("example::dao::JdbcFooDao"));
        assert!(!suffix.matches("example::service::FooService"));
    }

    #[test]
    fn test_find_candidate_types_sorted() {
        let catalog = sample_catalog();
        let pattern = ResourcePattern::new("example::service", "**/*").unwrap();
        let names: Vec<_> = catalog
            .find_candidate_types(&pattern)
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["example::service::FooService", "example::service::impl::FooServiceImpl"]
        );
    }

    #[test]
    fn test_assignability_is_transitive() {
        let catalog = sample_catalog();
        let dao = catalog.metadata("example::dao::JdbcFooDao").unwrap();

        assert!(catalog.is_assignable(&dao, "example::dao::JdbcFooDao"));
        assert!(catalog.is_assignable(&dao, "example::BaseDao"));
        assert!(catalog.is_assignable(&dao, "example::CrudRepository"));
        assert!(catalog.is_assignable(&dao, "example::Repository"));
        assert!(!catalog.is_assignable(&dao, "example::service::FooService"));

        assert_eq!(
            catalog.interface_closure(&dao),
            vec!["example::CrudRepository", "example::Repository"]
        );
        assert_eq!(
            catalog.supertype_closure(&dao),
            vec!["example::BaseDao", "example::CrudRepository", "example::Repository"]
        );
    }

    #[test]
    fn test_instantiate_strategy() {
        let catalog = TypeCatalog::new()
            .with_type(
                LoadedType::new(TypeMetadata::class("example::EnglishGreeter"))
                    .with_strategy::<dyn Greeter, _>(|| Arc::new(EnglishGreeter)),
            )
            .with_type(
                LoadedType::new(TypeMetadata::class("example::NotAGreeter"))
                    .with_constructor(|| 42_u32),
            )
            .with_metadata(TypeMetadata::class("example::NoConstructor"));

        let greeter = catalog
            .instantiate_strategy::<dyn Greeter>("example::EnglishGreeter", "Greeter")
            .unwrap();
        assert_eq!(greeter.greet(), "hello");

        let wrong = catalog.instantiate_strategy::<dyn Greeter>("example::NotAGreeter", "Greeter");
        assert!(matches!(wrong, Err(ContainerError::Configuration(ref m)) if m.contains("must be an implementation")));

        let missing = catalog.instantiate_strategy::<dyn Greeter>("example::Missing", "Greeter");
        assert!(matches!(missing, Err(ContainerError::Configuration(ref m)) if m.contains("not found")));

        let no_ctor = catalog.instantiate_strategy::<dyn Greeter>("example::NoConstructor", "Greeter");
        assert!(matches!(no_ctor, Err(ContainerError::Configuration(ref m)) if m.contains("zero-argument constructor")));
    }
}
