//! 类型元数据
//!
//! 描述扫描、过滤和代理创建所需要的类型信息。没有运行时反射，所有元数据都由
//! 调用方显式构建，并登记到 [`TypeCatalog`](crate::catalog::TypeCatalog) 中。

use std::collections::BTreeMap;
use std::fmt;

use crate::utils::naming;

/// 类型的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Interface,
    Annotation,
}

/// 无参构造函数的可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoArgConstructor {
    #[default]
    Public,
    /// 存在但不可访问，只有绕过访问检查的构造策略才能使用
    Private,
    /// 只有带参数的构造函数
    Missing,
}

/// 注解元数据：注解类型名加上字符串形式的属性
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationMetadata {
    name: String,
    attributes: BTreeMap<String, String>,
}

impl AnnotationMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// 设置属性
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 获取属性值
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }
}

/// 类型元数据
///
/// # 示例
///
/// ```
/// use sprig_core::metadata::{AnnotationMetadata, TypeMetadata};
///
/// let metadata = TypeMetadata::class("example::scannable::FooServiceImpl")
///     .with_interface("example::scannable::FooService")
///     .with_annotation(AnnotationMetadata::new("sprig::stereotype::Service"));
///
/// assert_eq!(metadata.short_name(), "FooServiceImpl");
/// assert_eq!(metadata.package_name(), "example::scannable");
/// assert!(metadata.is_concrete());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMetadata {
    name: String,
    kind: TypeKind,
    is_final: bool,
    is_abstract: bool,
    no_arg_constructor: NoArgConstructor,
    superclass: Option<String>,
    interfaces: Vec<String>,
    annotations: Vec<AnnotationMetadata>,
}

impl TypeMetadata {
    fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_final: false,
            is_abstract: false,
            no_arg_constructor: NoArgConstructor::Public,
            superclass: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
        }
    }

    /// 具体类（或抽象类，见 [`with_abstract`](Self::with_abstract)）
    pub fn class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKind::Class)
    }

    /// 接口
    pub fn interface(name: impl Into<String>) -> Self {
        let mut metadata = Self::new(name, TypeKind::Interface);
        metadata.is_abstract = true;
        metadata
    }

    /// 注解类型
    pub fn annotation(name: impl Into<String>) -> Self {
        let mut metadata = Self::new(name, TypeKind::Annotation);
        metadata.is_abstract = true;
        metadata
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    pub fn with_no_arg_constructor(mut self, constructor: NoArgConstructor) -> Self {
        self.no_arg_constructor = constructor;
        self
    }

    pub fn with_superclass(mut self, superclass: impl Into<String>) -> Self {
        self.superclass = Some(superclass.into());
        self
    }

    pub fn with_interface(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationMetadata) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// 完整类型名，例如 `example::scannable::FooService`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 最后一段类型名，例如 `FooService`
    pub fn short_name(&self) -> &str {
        naming::short_type_name(&self.name)
    }

    pub fn package_name(&self) -> &str {
        naming::package_name(&self.name)
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    pub fn is_annotation(&self) -> bool {
        self.kind == TypeKind::Annotation
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// 是否为可以直接实例化的具体类
    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Class && !self.is_abstract
    }

    pub fn no_arg_constructor(&self) -> NoArgConstructor {
        self.no_arg_constructor
    }

    pub fn superclass(&self) -> Option<&str> {
        self.superclass.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// 直接父类型：父类（如果有）加上直接实现的接口
    pub fn direct_supertypes(&self) -> impl Iterator<Item = &str> {
        self.superclass
            .as_deref()
            .into_iter()
            .chain(self.interfaces.iter().map(String::as_str))
    }

    pub fn annotations(&self) -> &[AnnotationMetadata] {
        &self.annotations
    }

    /// 是否直接标注了指定注解
    pub fn has_annotation(&self, annotation_name: &str) -> bool {
        self.annotations.iter().any(|a| a.name == annotation_name)
    }

    /// 获取直接标注的指定注解
    pub fn annotation_metadata(&self, annotation_name: &str) -> Option<&AnnotationMetadata> {
        self.annotations.iter().find(|a| a.name == annotation_name)
    }
}

impl fmt::Display for TypeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let metadata = TypeMetadata::class("example::scannable::FooServiceImpl");
        assert_eq!(metadata.name(), "example::scannable::FooServiceImpl");
        assert_eq!(metadata.short_name(), "FooServiceImpl");
        assert_eq!(metadata.package_name(), "example::scannable");
        assert_eq!(metadata.to_string(), "example::scannable::FooServiceImpl");
    }

    #[test]
    fn test_concreteness() {
        assert!(TypeMetadata::class("a::Concrete").is_concrete());
        assert!(!TypeMetadata::class("a::Abstract").with_abstract(true).is_concrete());
        assert!(!TypeMetadata::interface("a::Interface").is_concrete());
        assert!(!TypeMetadata::annotation("a::Annotation").is_concrete());
    }

    #[test]
    fn test_direct_supertypes() {
        let metadata = TypeMetadata::class("a::Impl")
            .with_superclass("a::Base")
            .with_interface("a::First")
            .with_interface("a::Second");

        let supertypes: Vec<_> = metadata.direct_supertypes().collect();
        assert_eq!(supertypes, vec!["a::Base", "a::First", "a::Second"]);
    }

    #[test]
    fn test_annotation_lookup() {
        let metadata = TypeMetadata::class("a::Impl").with_annotation(
            AnnotationMetadata::new("sprig::stereotype::Service").with_attribute("value", "myService"),
        );

        assert!(metadata.has_annotation("sprig::stereotype::Service"));
        assert!(!metadata.has_annotation("sprig::stereotype::Component"));
        assert_eq!(
            metadata
                .annotation_metadata("sprig::stereotype::Service")
                .and_then(|a| a.attribute("value")),
            Some("myService")
        );
    }
}
