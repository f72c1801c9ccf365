//! 早期引用代理
//!
//! [`EarlyBeanReference`] 是一个尚未解析的 Bean 的替身：它满足目标类型的类型检查，
//! 但只有在第一次真正的业务调用时才会注册（必要时）并实例化目标单例。
//!
//! 调用分派：
//! - `Display`：未解析时返回固定的诊断文本，不触发解析
//! - `equals` / `hash_code`：未解析时返回 `UnsupportedOperation`
//! - `invoke` / `invoke_as`：解析目标并委托
//! - `invoke_bean_method`：正在创建早期代理且尚未解析时，为返回类型再创建一个早期引用
//!
//! 解析成功后结果被缓存，之后所有调用都直接委托给同一个单例。解析期间同一线程
//! 再次通过该引用调用（目标的创建又依赖它自己）返回 `CircularDependency`。

use std::any::Any;
use std::cell::Cell;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::ReentrantMutex;

use sprig_core::catalog::TypeCatalog;
use sprig_core::constants::EARLY_BEAN_REFERENCE_PROXY_TYPE;
use sprig_core::error::{ContainerError, ContainerResult};
use sprig_core::metadata::TypeMetadata;
use sprig_core::utils::naming::short_type_name;

use crate::dependency::DependencyDescriptor;
use crate::proxy_creator::EarlyBeanReferenceProxyCreator;

/// 代理类名的后缀
pub const EARLY_BEAN_REFERENCE_PROXY_SUFFIX: &str = "$$EarlyBeanReferenceProxy";

/// 未解析的代理上调用身份相关方法时的错误信息
pub const IDENTITY_METHODS_UNSUPPORTED_MESSAGE: &str =
    "equals() and hashCode() methods on EarlyBeanReferenceProxy objects are not supported \
     as these methods cannot be reliably invoked before the underlying bean has been resolved";

/// 早期引用代理的标记
///
/// 调用方可以据此识别替身对象，而不必触发解析
pub trait EarlyBeanReferenceProxy: Send + Sync {
    /// 被代理的目标类型名
    fn target_type_name(&self) -> &str;

    /// 目标是否已经解析
    fn is_resolved(&self) -> bool;
}

/// 代理的父类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Superclass {
    /// 通用基类型，接口代理使用
    Object,
    /// 具体类代理以目标类作为父类
    Class(String),
}

/// 生成的代理类型的描述
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyClass {
    name: String,
    superclass: Superclass,
    interfaces: Vec<String>,
    /// 代理实例可以赋值给的所有类型
    assignable_types: Vec<String>,
}

impl ProxyClass {
    /// 为目标类型构造代理类描述
    ///
    /// 提供类型目录时，目标类型的所有父类型都计入可赋值类型
    pub fn for_type(target_type: &TypeMetadata, catalog: Option<&TypeCatalog>) -> Self {
        let name = format!("{}{}", target_type.name(), EARLY_BEAN_REFERENCE_PROXY_SUFFIX);

        let (superclass, mut interfaces) = if target_type.is_interface() || target_type.is_annotation() {
            (Superclass::Object, vec![target_type.name().to_string()])
        } else {
            (Superclass::Class(target_type.name().to_string()), Vec::new())
        };
        interfaces.push(EARLY_BEAN_REFERENCE_PROXY_TYPE.to_string());

        let mut assignable_types = vec![name.clone(), target_type.name().to_string()];
        match catalog {
            Some(catalog) => assignable_types.extend(catalog.supertype_closure(target_type)),
            None => assignable_types.extend(target_type.direct_supertypes().map(str::to_string)),
        }
        assignable_types.push(EARLY_BEAN_REFERENCE_PROXY_TYPE.to_string());
        let mut seen = HashSet::new();
        assignable_types.retain(|type_name| seen.insert(type_name.clone()));

        Self {
            name,
            superclass,
            interfaces,
            assignable_types,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> &Superclass {
        &self.superclass
    }

    /// 代理直接实现的接口（总是包含早期引用代理标记）
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// 代理实例可以赋值给的类型，不含重复项
    pub fn assignable_types(&self) -> &[String] {
        &self.assignable_types
    }

    /// 类型检查：代理实例能否当作 `type_name` 使用
    pub fn is_instance_of(&self, type_name: &str) -> bool {
        self.assignable_types.iter().any(|t| t == type_name)
    }
}

impl fmt::Display for ProxyClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// 解析得到的目标单例
#[derive(Clone)]
pub struct ResolvedTarget {
    pub bean_name: String,
    pub class_name: String,
    pub bean: Arc<dyn Any + Send + Sync>,
}

impl fmt::Debug for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedTarget")
            .field("bean_name", &self.bean_name)
            .field("class_name", &self.class_name)
            .finish()
    }
}

/// Bean 方法的返回值：早期引用或者委托调用的真实结果
#[derive(Debug)]
pub enum BeanMethodReturn<R> {
    Early(EarlyBeanReference),
    Value(R),
}

impl<R> BeanMethodReturn<R> {
    pub fn is_early(&self) -> bool {
        matches!(self, BeanMethodReturn::Early(_))
    }

    pub fn early(self) -> Option<EarlyBeanReference> {
        match self {
            BeanMethodReturn::Early(reference) => Some(reference),
            BeanMethodReturn::Value(_) => None,
        }
    }

    pub fn value(self) -> Option<R> {
        match self {
            BeanMethodReturn::Early(_) => None,
            BeanMethodReturn::Value(value) => Some(value),
        }
    }
}

/// 早期 Bean 引用
///
/// 克隆共享同一个解析结果
#[derive(Clone)]
pub struct EarlyBeanReference {
    proxy_class: Arc<ProxyClass>,
    target_type: Arc<TypeMetadata>,
    creator: EarlyBeanReferenceProxyCreator,
    target: Arc<OnceCell<ResolvedTarget>>,
    /// 串行化解析；同一线程可以重入，值表示解析是否正在进行
    resolving: Arc<ReentrantMutex<Cell<bool>>>,
}

impl EarlyBeanReference {
    pub(crate) fn new(
        proxy_class: ProxyClass,
        target_type: Arc<TypeMetadata>,
        creator: EarlyBeanReferenceProxyCreator,
    ) -> Self {
        Self {
            proxy_class: Arc::new(proxy_class),
            target_type,
            creator,
            target: Arc::new(OnceCell::new()),
            resolving: Arc::new(ReentrantMutex::new(Cell::new(false))),
        }
    }

    pub fn proxy_class(&self) -> &ProxyClass {
        &self.proxy_class
    }

    pub fn target_type(&self) -> &Arc<TypeMetadata> {
        &self.target_type
    }

    /// 解析目标单例，成功之前每次调用都会访问容器
    ///
    /// 访问容器时不持有缓存的初始化锁，目标创建过程中重入的调用得到
    /// `CircularDependency`，失败后引用保持未解析
    pub fn resolve(&self) -> ContainerResult<&ResolvedTarget> {
        if let Some(target) = self.target.get() {
            return Ok(target);
        }

        // 其它线程在这里等待，之后直接拿到缓存的结果
        let lock = self.resolving.lock();
        if let Some(target) = self.target.get() {
            return Ok(target);
        }
        let _in_progress = ResolutionGuard::enter(&lock, self.target_type.name())?;

        tracing::debug!(
            "Resolving early bean reference for type [{}]",
            self.target_type.name()
        );
        let resolved = self.creator.resolve_target(&self.target_type)?;
        Ok(self.target.get_or_init(|| resolved))
    }

    /// 已解析时返回目标 Bean 的名称
    pub fn resolved_bean_name(&self) -> Option<&str> {
        self.target.get().map(|target| target.bean_name.as_str())
    }

    /// 业务调用：解析目标后委托
    pub fn invoke<R, F>(&self, call: F) -> ContainerResult<R>
    where
        F: FnOnce(&(dyn Any + Send + Sync)) -> R,
    {
        let target = self.resolve()?;
        Ok(call(target.bean.as_ref()))
    }

    /// 以具体类型委托业务调用
    pub fn invoke_as<C, R, F>(&self, call: F) -> ContainerResult<R>
    where
        C: Any + Send + Sync,
        F: FnOnce(&C) -> R,
    {
        let target = self.resolve()?;
        let bean = target.bean.downcast_ref::<C>().ok_or_else(|| ContainerError::TypeMismatch {
            expected: std::any::type_name::<C>().to_string(),
            found: target.class_name.clone(),
        })?;
        Ok(call(bean))
    }

    /// 调用目标上的 Bean 方法
    ///
    /// 正在创建早期代理并且目标尚未解析时，不触发解析，而是为 `return_type`
    /// 创建一个新的早期引用
    pub fn invoke_bean_method<C, R, F>(
        &self,
        method: &str,
        return_type: &Arc<TypeMetadata>,
        call: F,
    ) -> ContainerResult<BeanMethodReturn<R>>
    where
        C: Any + Send + Sync,
        F: FnOnce(&C) -> R,
    {
        if self.creator.status().is_creating_early_proxies() && !self.is_resolved() {
            tracing::debug!(
                "Returning early bean reference for [{}] from bean method '{}' of type [{}]",
                return_type.name(),
                method,
                self.target_type.name()
            );
            let descriptor = DependencyDescriptor::new(Arc::clone(return_type), true, false)
                .with_declaring_member(format!("{}::{}", self.target_type.name(), method));
            return self.creator.create_proxy(&descriptor).map(BeanMethodReturn::Early);
        }

        self.invoke_as(call).map(BeanMethodReturn::Value)
    }

    /// 身份比较
    ///
    /// 未解析时返回 `UnsupportedOperation`；解析后比较目标实例的身份，
    /// 另一个引用尚未解析时视为不同
    pub fn equals(&self, other: &EarlyBeanReference) -> ContainerResult<bool> {
        let target = self.resolved_or_unsupported()?;
        Ok(other
            .target
            .get()
            .map(|other_target| Arc::ptr_eq(&target.bean, &other_target.bean))
            .unwrap_or(false))
    }

    /// 与一个真实 Bean 实例比较身份
    pub fn is_same_bean(&self, bean: &Arc<dyn Any + Send + Sync>) -> ContainerResult<bool> {
        let target = self.resolved_or_unsupported()?;
        Ok(Arc::ptr_eq(&target.bean, bean))
    }

    /// 身份哈希，只能在解析之后使用
    pub fn hash_code(&self) -> ContainerResult<u64> {
        let target = self.resolved_or_unsupported()?;
        Ok(identity_of(&target.bean) as u64)
    }

    fn resolved_or_unsupported(&self) -> ContainerResult<&ResolvedTarget> {
        self.target.get().ok_or_else(|| {
            ContainerError::UnsupportedOperation(IDENTITY_METHODS_UNSUPPORTED_MESSAGE.to_string())
        })
    }
}

struct ResolutionGuard<'a> {
    in_progress: &'a Cell<bool>,
}

impl<'a> ResolutionGuard<'a> {
    fn enter(in_progress: &'a Cell<bool>, type_name: &str) -> ContainerResult<Self> {
        if in_progress.replace(true) {
            return Err(ContainerError::CircularDependency(format!(
                "early bean reference to [{}] was invoked while its target was being created",
                type_name
            )));
        }
        Ok(Self { in_progress })
    }
}

impl Drop for ResolutionGuard<'_> {
    fn drop(&mut self) {
        self.in_progress.set(false);
    }
}

fn identity_of(bean: &Arc<dyn Any + Send + Sync>) -> usize {
    Arc::as_ptr(bean) as *const () as usize
}

impl EarlyBeanReferenceProxy for EarlyBeanReference {
    fn target_type_name(&self) -> &str {
        self.target_type.name()
    }

    fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }
}

impl fmt::Display for EarlyBeanReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target.get() {
            None => write!(
                f,
                "EarlyBeanReferenceProxy for bean of type {}",
                short_type_name(self.target_type.name())
            ),
            Some(target) => write!(f, "{}@{:x}", target.class_name, identity_of(&target.bean)),
        }
    }
}

impl fmt::Debug for EarlyBeanReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EarlyBeanReference")
            .field("proxy_class", &self.proxy_class.name())
            .field("resolved_bean_name", &self.resolved_bean_name())
            .finish()
    }
}

/// 如果对象是早期引用，返回它
pub fn as_early_reference(bean: &(dyn Any + Send + Sync)) -> Option<&EarlyBeanReference> {
    bean.downcast_ref::<EarlyBeanReference>()
}

/// 对象是否是早期引用
pub fn is_early_bean_reference(bean: &(dyn Any + Send + Sync)) -> bool {
    as_early_reference(bean).is_some()
}
