//! 核心常量定义
//!
//! 内置注解的类型名、基础设施 Bean 的名称等，确保类型目录、过滤器和
//! 扫描器使用相同的标识符

/// 组件注解，扫描时默认的包含条件
pub const COMPONENT_ANNOTATION: &str = "sprig::stereotype::Component";

/// 以 Component 为元注解的派生注解
pub const SERVICE_ANNOTATION: &str = "sprig::stereotype::Service";
pub const REPOSITORY_ANNOTATION: &str = "sprig::stereotype::Repository";
pub const CONTROLLER_ANNOTATION: &str = "sprig::stereotype::Controller";

/// 所有带名称属性的 stereotype 注解
pub const STEREOTYPE_ANNOTATIONS: &[&str] = &[
    COMPONENT_ANNOTATION,
    SERVICE_ANNOTATION,
    REPOSITORY_ANNOTATION,
    CONTROLLER_ANNOTATION,
];

/// 作用域注解，属性 `value`（作用域名）与 `proxyMode`
pub const SCOPE_ANNOTATION: &str = "sprig::context::Scope";

/// 延迟初始化注解，属性 `value`（默认 "true"）
pub const LAZY_ANNOTATION: &str = "sprig::context::Lazy";

/// 首选 Bean 注解
pub const PRIMARY_ANNOTATION: &str = "sprig::context::Primary";

/// 所有早期引用代理都会实现的标记接口
pub const EARLY_BEAN_REFERENCE_PROXY_TYPE: &str = "sprig::context::EarlyBeanReferenceProxy";

/// 早期引用代理状态的基础设施 Bean 名称
pub const EARLY_BEAN_REFERENCE_PROXY_STATUS_BEAN_NAME: &str =
    "sprig.context.internalEarlyBeanReferenceProxyStatus";

/// 配置类处理器的基础设施 Bean 名称
pub const CONFIGURATION_ANNOTATION_PROCESSOR_BEAN_NAME: &str =
    "sprig.context.internalConfigurationAnnotationProcessor";

/// 作用域代理目标 Bean 的名称前缀
pub const SCOPED_TARGET_NAME_PREFIX: &str = "scopedTarget.";

/// 配置位置（例如 base-package）的分隔符
pub const CONFIG_LOCATION_DELIMITERS: &str = ",; \t\n";

/// 默认资源模式：匹配基础包下的所有类型
pub const DEFAULT_RESOURCE_PATTERN: &str = "**/*";
