//! 读取声明式配置时共享的上下文
//!
//! 持有 Bean 工厂、类型目录、Environment、问题报告器和事件多播器。

use std::fmt;
use std::sync::Arc;

use sprig_core::bean::BeanDefinitionDefaults;
use sprig_core::bean_factory::{BeanDefinitionRegistry, ConfigurableListableBeanFactory};
use sprig_core::catalog::TypeCatalog;
use sprig_core::config::Environment;
use sprig_core::error::{ContainerError, ContainerResult};
use sprig_core::event::{ApplicationEventMulticaster, SimpleApplicationEventMulticaster};

use crate::component_definition::{ComponentDefinition, ComponentRegisteredEvent};
use crate::problem::{LoggingProblemReporter, Problem, ProblemReporter};

/// 扫描定义默认的延迟初始化
pub const DEFAULT_LAZY_INIT_PROPERTY: &str = "sprig.beans.default-lazy-init";

/// 自动装配候选者的名称模式
pub const DEFAULT_AUTOWIRE_CANDIDATES_PROPERTY: &str = "sprig.beans.default-autowire-candidates";

pub struct ReaderContext {
    bean_factory: Arc<dyn ConfigurableListableBeanFactory>,
    catalog: Arc<TypeCatalog>,
    environment: Arc<Environment>,
    problem_reporter: Arc<dyn ProblemReporter>,
    event_multicaster: Arc<dyn ApplicationEventMulticaster>,
}

impl ReaderContext {
    pub fn new(bean_factory: Arc<dyn ConfigurableListableBeanFactory>, catalog: Arc<TypeCatalog>) -> Self {
        Self {
            bean_factory,
            catalog,
            environment: Arc::new(Environment::new()),
            problem_reporter: Arc::new(LoggingProblemReporter),
            event_multicaster: Arc::new(SimpleApplicationEventMulticaster::new()),
        }
    }

    pub fn with_environment(mut self, environment: Arc<Environment>) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_problem_reporter(mut self, reporter: Arc<dyn ProblemReporter>) -> Self {
        self.problem_reporter = reporter;
        self
    }

    pub fn with_event_multicaster(mut self, multicaster: Arc<dyn ApplicationEventMulticaster>) -> Self {
        self.event_multicaster = multicaster;
        self
    }

    pub fn bean_factory(&self) -> &Arc<dyn ConfigurableListableBeanFactory> {
        &self.bean_factory
    }

    pub fn registry(&self) -> &dyn BeanDefinitionRegistry {
        self.bean_factory.as_registry()
    }

    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.environment
    }

    pub fn event_multicaster(&self) -> &Arc<dyn ApplicationEventMulticaster> {
        &self.event_multicaster
    }

    /// 报告错误；报告器返回 `Err` 时调用方应中止当前声明
    pub fn error(
        &self,
        message: impl Into<String>,
        source: Option<&str>,
        cause: Option<&ContainerError>,
    ) -> ContainerResult<()> {
        let mut problem = Problem::new(message).with_source(source.map(str::to_string));
        if let Some(cause) = cause {
            problem = problem.with_cause(cause);
        }
        self.problem_reporter.error(problem)
    }

    pub fn warning(&self, message: impl Into<String>, source: Option<&str>) {
        self.problem_reporter
            .warning(Problem::new(message).with_source(source.map(str::to_string)));
    }

    pub fn fire_component_registered(&self, component: Arc<dyn ComponentDefinition>) {
        tracing::debug!("Firing component registered event for '{}'", component.name());
        self.event_multicaster
            .multicast_event(Arc::new(ComponentRegisteredEvent::new(component)));
    }

    /// 从 Environment 读取扫描定义的默认值
    pub fn bean_definition_defaults(&self) -> BeanDefinitionDefaults {
        BeanDefinitionDefaults::new()
            .with_lazy_init(self.environment.get_bool_or(DEFAULT_LAZY_INIT_PROPERTY, false))
            .with_autowire_candidate_patterns(
                self.environment
                    .get_string_array(DEFAULT_AUTOWIRE_CANDIDATES_PROPERTY)
                    .unwrap_or_default(),
            )
    }
}

impl fmt::Debug for ReaderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderContext")
            .field("catalog", &self.catalog)
            .field("environment", &self.environment)
            .field("listeners", &self.event_multicaster.listener_count())
            .finish()
    }
}
