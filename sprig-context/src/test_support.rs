//! 单元测试共用的类型目录

pub mod beans {
    use sprig_core::catalog::{LoadedType, TypeCatalog};
    use sprig_core::metadata::{NoArgConstructor, TypeMetadata};
    use std::sync::Arc;

    pub const I_TEST_BEAN: &str = "test::beans::ITestBean";
    pub const TEST_BEAN: &str = "test::beans::TestBean";
    pub const FINAL_BEAN: &str = "test::beans::FinalBean";
    pub const BEAN_MISSING_NO_ARG_CONSTRUCTOR: &str = "test::beans::BeanMissingNoArgConstructor";
    pub const BEAN_WITH_PRIVATE_NO_ARG_CONSTRUCTOR: &str = "test::beans::BeanWithPrivateNoArgConstructor";
    pub const COMPONENT_WITH_INTERFACE_BEAN_METHOD: &str = "test::beans::ComponentWithInterfaceBeanMethod";
    pub const COMPONENT_WITH_CONCRETE_BEAN_METHOD: &str = "test::beans::ComponentWithConcreteBeanMethod";

    pub trait ITestBean: Send + Sync {
        fn name(&self) -> &str;
    }

    #[derive(Debug, Clone, Default)]
    pub struct TestBean {
        name: String,
    }

    impl TestBean {
        pub fn named(name: &str) -> Self {
            Self { name: name.to_string() }
        }

        pub fn name(&self) -> &str {
            &self.name
        }
    }

    impl ITestBean for TestBean {
        fn name(&self) -> &str {
            &self.name
        }
    }

    #[derive(Debug, Default)]
    pub struct BeanWithPrivateNoArgConstructor;

    #[derive(Debug, Default)]
    pub struct ComponentWithInterfaceBeanMethod;

    impl ComponentWithInterfaceBeanMethod {
        pub fn a_bean_method(&self) -> Arc<dyn ITestBean> {
            Arc::new(TestBean::named("fromBeanMethod"))
        }

        pub fn normal_instance_method(&self) -> String {
            "normal".to_string()
        }
    }

    #[derive(Debug, Default)]
    pub struct ComponentWithConcreteBeanMethod;

    impl ComponentWithConcreteBeanMethod {
        pub fn a_bean_method(&self) -> TestBean {
            TestBean::named("fromBeanMethod")
        }
    }

    pub fn test_beans_catalog() -> TypeCatalog {
        TypeCatalog::new()
            .with_metadata(TypeMetadata::interface(I_TEST_BEAN))
            .with_type(
                LoadedType::new(TypeMetadata::class(TEST_BEAN).with_interface(I_TEST_BEAN))
                    .with_constructor(TestBean::default),
            )
            .with_metadata(TypeMetadata::class(FINAL_BEAN).with_final(true))
            .with_metadata(
                TypeMetadata::class(BEAN_MISSING_NO_ARG_CONSTRUCTOR)
                    .with_no_arg_constructor(NoArgConstructor::Missing),
            )
            .with_type(
                LoadedType::new(
                    TypeMetadata::class(BEAN_WITH_PRIVATE_NO_ARG_CONSTRUCTOR)
                        .with_no_arg_constructor(NoArgConstructor::Private),
                )
                .with_constructor(BeanWithPrivateNoArgConstructor::default),
            )
            .with_type(
                LoadedType::new(TypeMetadata::class(COMPONENT_WITH_INTERFACE_BEAN_METHOD))
                    .with_constructor(ComponentWithInterfaceBeanMethod::default),
            )
            .with_type(
                LoadedType::new(TypeMetadata::class(COMPONENT_WITH_CONCRETE_BEAN_METHOD))
                    .with_constructor(ComponentWithConcreteBeanMethod::default),
            )
    }
}

pub mod strategies {
    use std::sync::Arc;

    use sprig_core::bean::BeanDefinition;
    use sprig_core::bean_factory::BeanDefinitionRegistry;
    use sprig_core::catalog::{LoadedType, TypeCatalog};
    use sprig_core::error::ContainerResult;
    use sprig_core::metadata::TypeMetadata;
    use sprig_core::scope::Scope;
    use sprig_core::type_filter::TypeFilter;

    use crate::name_generator::{AnnotationBeanNameGenerator, BeanNameGenerator};
    use crate::scope_resolver::{ScopeMetadata, ScopeMetadataResolver};

    pub const STUB_TYPE_FILTER: &str = "example::strategies::StubTypeFilter";
    pub const NOT_A_FILTER: &str = "example::strategies::NotAFilter";
    pub const PREFIX_BEAN_NAME_GENERATOR: &str = "example::strategies::PrefixBeanNameGenerator";
    pub const PROTOTYPE_SCOPE_RESOLVER: &str = "example::strategies::PrototypeScopeResolver";

    /// 匹配短名称中包含 `Stub` 的类型
    pub struct StubTypeFilter;

    impl TypeFilter for StubTypeFilter {
        fn matches(&self, metadata: &TypeMetadata, _catalog: &TypeCatalog) -> ContainerResult<bool> {
            Ok(metadata.short_name().contains("Stub"))
        }
    }

    #[derive(Debug, Default)]
    pub struct NotAFilter;

    pub struct PrefixBeanNameGenerator;

    impl BeanNameGenerator for PrefixBeanNameGenerator {
        fn generate_bean_name(
            &self,
            definition: &BeanDefinition,
            _registry: &dyn BeanDefinitionRegistry,
        ) -> ContainerResult<String> {
            Ok(format!(
                "scanned-{}",
                AnnotationBeanNameGenerator::build_default_bean_name(definition)
            ))
        }
    }

    pub struct PrototypeScopeResolver;

    impl ScopeMetadataResolver for PrototypeScopeResolver {
        fn resolve_scope_metadata(&self, _definition: &BeanDefinition) -> ContainerResult<ScopeMetadata> {
            Ok(ScopeMetadata {
                scope: Scope::Prototype,
                ..ScopeMetadata::default()
            })
        }
    }

    pub fn register_strategies(catalog: TypeCatalog) -> TypeCatalog {
        catalog
            .with_type(
                LoadedType::new(TypeMetadata::class(STUB_TYPE_FILTER))
                    .with_strategy::<dyn TypeFilter, _>(|| Arc::new(StubTypeFilter)),
            )
            .with_type(LoadedType::new(TypeMetadata::class(NOT_A_FILTER)).with_constructor(NotAFilter::default))
            .with_type(
                LoadedType::new(TypeMetadata::class(PREFIX_BEAN_NAME_GENERATOR))
                    .with_strategy::<dyn BeanNameGenerator, _>(|| Arc::new(PrefixBeanNameGenerator)),
            )
            .with_type(
                LoadedType::new(TypeMetadata::class(PROTOTYPE_SCOPE_RESOLVER))
                    .with_strategy::<dyn ScopeMetadataResolver, _>(|| Arc::new(PrototypeScopeResolver)),
            )
    }
}

pub mod scannable {
    use sprig_core::catalog::{LoadedType, TypeCatalog};
    use sprig_core::constants::{
        COMPONENT_ANNOTATION, LAZY_ANNOTATION, PRIMARY_ANNOTATION, REPOSITORY_ANNOTATION, SCOPE_ANNOTATION,
        SERVICE_ANNOTATION,
    };
    use sprig_core::metadata::{AnnotationMetadata, TypeMetadata};

    use super::strategies;

    pub const FOO_SERVICE: &str = "example::scannable::FooService";
    pub const FOO_SERVICE_IMPL: &str = "example::scannable::FooServiceImpl";
    pub const FOO_DAO: &str = "example::scannable::FooDao";
    pub const STUB_FOO_DAO: &str = "example::scannable::StubFooDao";
    pub const SCOPED_BEAN: &str = "example::scannable::ScopedBean";
    pub const PROTOTYPE_BEAN: &str = "example::scannable::PrototypeBean";
    pub const NAMED_COMPONENT: &str = "example::scannable::NamedComponent";
    pub const ABSTRACT_COMPONENT: &str = "example::scannable::AbstractComponent";
    pub const LAZY_COMPONENT: &str = "example::scannable::LazyComponent";
    pub const NOT_A_COMPONENT: &str = "example::scannable::NotAComponent";
    pub const CUSTOM_STEREOTYPE: &str = "example::scannable::CustomStereotype";
    pub const CUSTOM_STEREOTYPE_BEAN: &str = "example::scannable::CustomStereotypeBean";
    pub const DEEP_BEAN: &str = "example::scannable::sub::DeepBean";
    pub const OTHER_COMPONENT: &str = "example::other::OtherComponent";

    #[derive(Debug, Default)]
    pub struct FooServiceImpl;

    #[derive(Debug, Default)]
    pub struct StubFooDao;

    #[derive(Debug, Default)]
    pub struct PrototypeBean {
        pub hits: u32,
    }

    #[derive(Debug, Default)]
    pub struct SimpleComponent;

    fn component(name: &str) -> LoadedType {
        LoadedType::new(TypeMetadata::class(name).with_annotation(AnnotationMetadata::new(COMPONENT_ANNOTATION)))
            .with_constructor(SimpleComponent::default)
    }

    pub fn scannable_catalog() -> TypeCatalog {
        let catalog = TypeCatalog::new()
            .with_metadata(TypeMetadata::interface(FOO_SERVICE))
            .with_metadata(TypeMetadata::interface(FOO_DAO))
            .with_metadata(TypeMetadata::interface(SCOPED_BEAN))
            .with_type(
                LoadedType::new(
                    TypeMetadata::class(FOO_SERVICE_IMPL)
                        .with_interface(FOO_SERVICE)
                        .with_annotation(AnnotationMetadata::new(SERVICE_ANNOTATION)),
                )
                .with_constructor(FooServiceImpl::default),
            )
            .with_type(
                LoadedType::new(
                    TypeMetadata::class(STUB_FOO_DAO)
                        .with_interface(FOO_DAO)
                        .with_annotation(AnnotationMetadata::new(REPOSITORY_ANNOTATION)),
                )
                .with_constructor(StubFooDao::default),
            )
            .with_type(
                LoadedType::new(
                    TypeMetadata::class(PROTOTYPE_BEAN)
                        .with_interface(SCOPED_BEAN)
                        .with_annotation(AnnotationMetadata::new(COMPONENT_ANNOTATION))
                        .with_annotation(AnnotationMetadata::new(SCOPE_ANNOTATION).with_attribute("value", "prototype")),
                )
                .with_constructor(PrototypeBean::default),
            )
            .with_type(
                LoadedType::new(TypeMetadata::class(NAMED_COMPONENT).with_annotation(
                    AnnotationMetadata::new(COMPONENT_ANNOTATION).with_attribute("value", "myNamedComponent"),
                ))
                .with_constructor(SimpleComponent::default),
            )
            .with_metadata(
                TypeMetadata::class(ABSTRACT_COMPONENT)
                    .with_abstract(true)
                    .with_annotation(AnnotationMetadata::new(COMPONENT_ANNOTATION)),
            )
            .with_type(
                LoadedType::new(
                    TypeMetadata::class(LAZY_COMPONENT)
                        .with_annotation(AnnotationMetadata::new(COMPONENT_ANNOTATION))
                        .with_annotation(AnnotationMetadata::new(LAZY_ANNOTATION))
                        .with_annotation(AnnotationMetadata::new(PRIMARY_ANNOTATION)),
                )
                .with_constructor(SimpleComponent::default),
            )
            .with_type(LoadedType::new(TypeMetadata::class(NOT_A_COMPONENT)).with_constructor(SimpleComponent::default))
            .with_metadata(
                TypeMetadata::annotation(CUSTOM_STEREOTYPE)
                    .with_annotation(AnnotationMetadata::new(COMPONENT_ANNOTATION)),
            )
            .with_type(
                LoadedType::new(TypeMetadata::class(CUSTOM_STEREOTYPE_BEAN).with_annotation(
                    AnnotationMetadata::new(CUSTOM_STEREOTYPE).with_attribute("value", "customBean"),
                ))
                .with_constructor(SimpleComponent::default),
            )
            .with_type(component(DEEP_BEAN))
            .with_type(component(OTHER_COMPONENT));

        strategies::register_strategies(catalog)
    }
}

pub const SUBMITTED_COMPONENT: &str = "example::inventory::SubmittedComponent";

fn submitted_component() -> sprig_core::catalog::LoadedType {
    sprig_core::catalog::LoadedType::new(
        sprig_core::metadata::TypeMetadata::class(SUBMITTED_COMPONENT).with_annotation(
            sprig_core::metadata::AnnotationMetadata::new(sprig_core::constants::COMPONENT_ANNOTATION),
        ),
    )
    .with_constructor(scannable::SimpleComponent::default)
}

inventory::submit! {
    sprig_core::catalog::TypeRegistration::new(SUBMITTED_COMPONENT, submitted_component)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sprig_core::bean_factory::{BeanDefinitionRegistry, DefaultListableBeanFactory};
    use sprig_core::catalog::TypeCatalog;

    use super::SUBMITTED_COMPONENT;
    use crate::reader_context::ReaderContext;
    use crate::scan_element::ComponentScanElement;
    use crate::scan_parser::ComponentScanBeanDefinitionParser;

    #[test]
    fn test_submitted_types_are_scannable() {
        let catalog = TypeCatalog::from_inventory();
        assert!(catalog.contains(SUBMITTED_COMPONENT));

        let bf = Arc::new(DefaultListableBeanFactory::new());
        let context = ReaderContext::new(bf.clone(), Arc::new(catalog));
        ComponentScanBeanDefinitionParser::new()
            .parse(&ComponentScanElement::new("example.inventory"), &context)
            .unwrap();

        assert!(bf.contains_bean_definition("submittedComponent"));
    }
}
