//! Integration tests for a complete analysis run.
//!
//! These tests drive the public API the way an analysis driver does: classes come from a
//! classpath, the context resolves them and builds the inheritance graph, passes query facts
//! and databases, and the cache is reset between runs.

use std::sync::Arc;

use jvmscope::{
    analysis::{CollectingErrorLogger, ErrorEvent},
    prelude::*,
};

fn widget_classpath() -> InMemoryClassPath {
    let classpath = InMemoryClassPath::new();
    classpath.add_class(ParsedClass::new("java/lang/Object").with_superclass(None));
    classpath.add_class(
        ParsedClass::new("java/lang/Comparable")
            .with_superclass(None)
            .with_access_flags(ClassAccessFlags::PUBLIC | ClassAccessFlags::INTERFACE),
    );

    let mut equals = MethodInfoBuilder::new(
        "app/Widget",
        "equals",
        "(Ljava/lang/Object;)Z",
        MethodAccessFlags::PUBLIC,
    );
    equals.set_variable_has_name(0);

    let mut identity = MethodInfoBuilder::new(
        "app/Widget",
        "self",
        "(Lapp/Widget;)Lapp/Widget;",
        MethodAccessFlags::PUBLIC | MethodAccessFlags::STATIC,
    );
    identity.set_is_identity();

    let mut fail = MethodInfoBuilder::new(
        "app/Widget",
        "fail",
        "(Ljava/lang/String;)V",
        MethodAccessFlags::PRIVATE | MethodAccessFlags::STATIC,
    );
    fail.set_is_unconditional_thrower()
        .set_thrown_exceptions(["java/lang/IllegalStateException"]);

    let mut access = MethodInfoBuilder::new(
        "app/Widget",
        "access$000",
        "(Lapp/Widget;)Ljava/lang/String;",
        MethodAccessFlags::STATIC | MethodAccessFlags::SYNTHETIC,
    );
    access.set_access_method_for_field("app/Widget", "name", "Ljava/lang/String;", false);

    classpath.add_class(
        ParsedClass::new("app/Widget")
            .with_interface("java/lang/Comparable")
            .with_source_file("Widget.java")
            .with_field("name", "Ljava/lang/String;", false)
            .with_method(equals)
            .with_method(identity)
            .with_method(fail)
            .with_method(access),
    );
    classpath.add_class(
        ParsedClass::new("app/SpecialWidget")
            .with_superclass(Some("app/Widget"))
            .with_source_file("SpecialWidget.java"),
    );
    classpath
}

fn start_run(config: AnalysisConfig) -> (CacheBackedContext, Arc<CollectingErrorLogger>) {
    let logger = Arc::new(CollectingErrorLogger::new());
    let cache = AnalysisCache::new(Arc::new(widget_classpath()), config)
        .with_error_logger(logger.clone());
    (CacheBackedContext::new(Arc::new(cache)), logger)
}

#[test]
fn full_run_builds_graph_and_facts() -> Result<()> {
    let (context, logger) = start_run(AnalysisConfig::default());
    let registry = context.cache().registry().clone();

    let widget = registry.class_descriptor("app.Widget")?;
    let special = registry.class_descriptor("app/SpecialWidget")?;
    registry.class_descriptor("java/lang/Object")?;
    registry.class_descriptor("java/lang/Comparable")?;
    registry.class_descriptor("lib/Absent")?;

    context.set_app_class_list(&[widget.clone(), special.clone()]);

    let subtypes = context.subtypes();
    assert!(subtypes.is_application_class(&widget));
    assert!(subtypes.is_application_class(&special));
    assert!(subtypes.is_subtype(&special, &registry.class_descriptor("java/lang/Comparable")?));
    assert_eq!(
        subtypes.vertex_kind(&registry.class_descriptor("java/lang/Object")?),
        Some(jvmscope::analysis::database::VertexKind::Library)
    );
    assert_eq!(logger.missing_classes(), vec!["lib/Absent"]);

    let info = context.lookup_class("app.Widget")?;
    let fail = info.find_method("fail", "(Ljava/lang/String;)V").unwrap();
    assert!(fail.is_unconditional_thrower());
    assert!(fail.is_private());
    assert_eq!(&*fail.thrown_exceptions()[0], "java/lang/IllegalStateException");

    let identity = info.find_method("self", "(Lapp/Widget;)Lapp/Widget;").unwrap();
    assert!(identity.is_identity());
    assert!(identity.is_return_type_reference_type());

    let access = info
        .find_method("access$000", "(Lapp/Widget;)Ljava/lang/String;")
        .unwrap();
    let field = access.access_method_for_field().unwrap();
    assert_eq!(field.name(), "name");
    assert_eq!(access.resolve_access_method_for_method(), *access.descriptor());

    let containing = fail.containing_class(context.cache()).unwrap();
    assert!(Arc::ptr_eq(&containing, &info));
    Ok(())
}

#[test]
fn synthetic_mask_derived_from_names() -> Result<()> {
    let (context, _) = start_run(AnalysisConfig::minimal());
    let info = context.lookup_class("app.Widget")?;

    // Only parameter 0 has a name, so every other slot is reported synthetic
    let equals = info.find_method("equals", "(Ljava/lang/Object;)Z").unwrap();
    assert!(!equals.is_variable_synthetic(0));
    assert!(equals.is_variable_synthetic(1));
    assert!(equals.is_variable_synthetic(63));
    assert!(!equals.is_variable_synthetic(64));

    // No names recorded at all: nothing is synthetic
    let fail = info.find_method("fail", "(Ljava/lang/String;)V").unwrap();
    assert!(!fail.is_variable_synthetic(0));
    Ok(())
}

#[test]
fn pass_zero_loads_annotation_databases() -> Result<()> {
    let (context, _) = start_run(AnalysisConfig::default());
    let info = context.lookup_class("app.Widget")?;
    let equals = info.find_method("equals", "(Ljava/lang/Object;)Z").unwrap();

    let before = equals.parameter_annotation_table();
    let nullness = context.nullness_database();
    assert_eq!(nullness.resolved_parameter_annotation(equals, 0), None);

    context.update_databases(0);
    context.update_databases(0);

    assert_eq!(
        nullness.resolved_parameter_annotation(equals, 0),
        Some(NullnessAnnotation::CheckForNull)
    );
    assert_eq!(equals.parameter_annotations(0).len(), 1);
    // The snapshot taken before the load is unchanged
    assert!(before.get(&0).is_none());
    Ok(())
}

#[test]
fn bridges_are_scoped_to_the_run() -> Result<()> {
    let (context, _) = start_run(AnalysisConfig::minimal());
    let info = context.lookup_class("app.Widget")?;
    let equals = info.find_method("equals", "(Ljava/lang/Object;)Z").unwrap();
    let identity = info.find_method("self", "(Lapp/Widget;)Lapp/Widget;").unwrap();

    assert!(context.bridge_to(equals.descriptor()).is_none());
    context.set_bridge_method(equals, identity);
    assert!(Arc::ptr_eq(&equals.bridge_to(&context).unwrap(), identity));

    let other = CacheBackedContext::new(Arc::new(AnalysisCache::new(
        Arc::new(widget_classpath()),
        AnalysisConfig::minimal(),
    )));
    assert!(equals.bridge_to(&other).is_none());
    Ok(())
}

#[test]
fn reset_isolates_runs() -> Result<()> {
    let (context, _) = start_run(AnalysisConfig::minimal());
    let cache = context.cache();
    let info = context.lookup_class("app.Widget")?;
    let fail = info.find_method("fail", "(Ljava/lang/String;)V").unwrap().clone();
    let graph = context.subtypes();
    assert!(fail.is_unconditional_thrower());

    cache.reset();

    assert!(!fail.is_unconditional_thrower());
    assert!(cache.indices().is_empty());
    assert!(!Arc::ptr_eq(&graph, &context.subtypes()));

    // Descriptors survive a reset; a new run rebuilds the facts
    let again = context.lookup_class("app.Widget")?;
    let fail_again = again.find_method("fail", "(Ljava/lang/String;)V").unwrap();
    assert_eq!(fail_again.descriptor(), fail.descriptor());
    assert!(fail_again.is_unconditional_thrower());
    Ok(())
}

#[test]
fn unsupported_operations_fail_fast() {
    let (context, logger) = start_run(AnalysisConfig::minimal());
    assert!(matches!(
        context.add_classpath_entry("extra.jar"),
        Err(Error::Unsupported(_))
    ));
    assert!(matches!(
        context.clear_class_context_cache(),
        Err(Error::Unsupported(_))
    ));
    assert!(logger.events().is_empty());

    context.lookup_failure_callback().log_error("reported");
    assert_eq!(logger.events(), vec![ErrorEvent::Error("reported".to_string())]);
}

#[test]
fn reset_drops_bridges_of_the_previous_run() -> Result<()> {
    let (context, _) = start_run(AnalysisConfig::minimal());
    let info = context.lookup_class("app.Widget")?;
    let equals = info.find_method("equals", "(Ljava/lang/Object;)Z").unwrap();
    let identity = info.find_method("self", "(Lapp/Widget;)Lapp/Widget;").unwrap();
    context.set_bridge_method(equals, identity);

    context.reset();

    let again = context.lookup_class("app.Widget")?;
    let equals_again = again.find_method("equals", "(Ljava/lang/Object;)Z").unwrap();
    assert_eq!(equals_again.descriptor(), equals.descriptor());
    assert!(equals_again.bridge_to(&context).is_none());
    assert!(context.bridge_from(identity.descriptor()).is_none());
    Ok(())
}

#[test]
fn nullness_answers_follow_annotations_after_index_clear() -> Result<()> {
    let (context, _) = start_run(AnalysisConfig::default());
    let info = context.lookup_class("app.Widget")?;
    let fail = info.find_method("fail", "(Ljava/lang/String;)V").unwrap();
    let nullness = context.nullness_database();
    assert_eq!(nullness.resolved_annotation(fail), None);

    context.cache().indices().clear();
    let check_for_null = context
        .cache()
        .registry()
        .class_descriptor("javax/annotation/CheckForNull")?;
    fail.add_annotation(AnnotationValue::new(check_for_null));

    assert_eq!(
        nullness.resolved_annotation(fail),
        Some(NullnessAnnotation::CheckForNull)
    );
    Ok(())
}
