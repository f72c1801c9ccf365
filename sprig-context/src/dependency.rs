use std::fmt;
use std::sync::Arc;

use sprig_core::catalog::TypeCatalog;
use sprig_core::error::ContainerResult;
use sprig_core::metadata::TypeMetadata;

/// 注入点描述：被请求的类型、声明它的成员以及 required / eager 标志
#[derive(Debug, Clone)]
pub struct DependencyDescriptor {
    dependency_type: Arc<TypeMetadata>,
    declaring_member: Option<String>,
    required: bool,
    eager: bool,
}

impl DependencyDescriptor {
    pub fn new(dependency_type: Arc<TypeMetadata>, required: bool, eager: bool) -> Self {
        Self {
            dependency_type,
            declaring_member: None,
            required,
            eager,
        }
    }

    /// 从类型目录中查找依赖类型，找不到时返回 `TypeResolution`
    pub fn for_type(catalog: &TypeCatalog, type_name: &str, required: bool, eager: bool) -> ContainerResult<Self> {
        let metadata = catalog.load_type(type_name)?.metadata().clone();
        Ok(Self::new(metadata, required, eager))
    }

    /// 声明注入点的成员，例如 `ConfigA::service_b`
    pub fn with_declaring_member(mut self, member: impl Into<String>) -> Self {
        self.declaring_member = Some(member.into());
        self
    }

    pub fn dependency_type(&self) -> &Arc<TypeMetadata> {
        &self.dependency_type
    }

    pub fn dependency_type_name(&self) -> &str {
        self.dependency_type.name()
    }

    pub fn declaring_member(&self) -> Option<&str> {
        self.declaring_member.as_deref()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_eager(&self) -> bool {
        self.eager
    }
}

impl fmt::Display for DependencyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.declaring_member {
            Some(member) => write!(f, "dependency of type [{}] at {}", self.dependency_type, member),
            None => write!(f, "dependency of type [{}]", self.dependency_type),
        }
    }
}
