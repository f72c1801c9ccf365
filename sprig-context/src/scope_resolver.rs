use sprig_core::bean::BeanDefinition;
use sprig_core::constants::SCOPE_ANNOTATION;
use sprig_core::error::ContainerResult;
use sprig_core::{Scope, ScopedProxyMode};

/// 声明式配置中 `scope-resolver` 策略的名称
pub const SCOPE_METADATA_RESOLVER_STRATEGY: &str = "sprig::context::ScopeMetadataResolver";

/// 作用域元数据：作用域和作用域代理模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeMetadata {
    pub scope: Scope,
    pub scoped_proxy_mode: ScopedProxyMode,
}

impl Default for ScopeMetadata {
    fn default() -> Self {
        Self {
            scope: Scope::Singleton,
            scoped_proxy_mode: ScopedProxyMode::No,
        }
    }
}

/// 作用域元数据解析器
pub trait ScopeMetadataResolver: Send + Sync {
    fn resolve_scope_metadata(&self, definition: &BeanDefinition) -> ContainerResult<ScopeMetadata>;
}

/// 读取 `Scope` 注解的解析器
///
/// 注解属性 `value` 是作用域名，`proxyMode` 是代理模式；`proxyMode` 缺省或为
/// `DEFAULT` 时使用解析器的默认代理模式。
#[derive(Debug, Clone)]
pub struct AnnotationScopeMetadataResolver {
    default_proxy_mode: ScopedProxyMode,
}

impl AnnotationScopeMetadataResolver {
    pub fn new() -> Self {
        Self {
            default_proxy_mode: ScopedProxyMode::No,
        }
    }

    /// 组件扫描上的 `scoped-proxy` 属性通过这里生效
    pub fn with_default_proxy_mode(mut self, mode: ScopedProxyMode) -> Self {
        self.default_proxy_mode = mode;
        self
    }

    pub fn default_proxy_mode(&self) -> ScopedProxyMode {
        self.default_proxy_mode
    }
}

impl Default for AnnotationScopeMetadataResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeMetadataResolver for AnnotationScopeMetadataResolver {
    fn resolve_scope_metadata(&self, definition: &BeanDefinition) -> ContainerResult<ScopeMetadata> {
        let annotation = definition
            .type_metadata
            .as_ref()
            .and_then(|metadata| metadata.annotation_metadata(SCOPE_ANNOTATION));

        let Some(annotation) = annotation else {
            return Ok(ScopeMetadata::default());
        };

        let scope = annotation.attribute("value").unwrap_or("").parse::<Scope>()?;
        let mut scoped_proxy_mode = match annotation.attribute("proxyMode") {
            Some(mode) => mode.parse::<ScopedProxyMode>()?,
            None => ScopedProxyMode::Default,
        };
        if scoped_proxy_mode == ScopedProxyMode::Default {
            scoped_proxy_mode = self.default_proxy_mode;
        }

        Ok(ScopeMetadata {
            scope,
            scoped_proxy_mode,
        })
    }
}
