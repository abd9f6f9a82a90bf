//! Integration tests for full registration passes
//!
//! Runs complete passes over realistic compilation units and checks:
//! - Open-decorator expansion across every closed instantiation
//! - Deterministic artifact text regardless of declaration order
//! - Blocking diagnostics refusing generation
//! - Options bindings and the graph export document

use pretty_assertions::assert_eq;
use wiregen_plan::{
    CompilationUnit, Constructor, ConstructorParam, ContractRef, DiagnosticCode, Lifetime,
    Marker, PlanError, Planner, PlannerConfig, PropertySymbol, ScalarKind, TypeSymbol,
    ValidationRule,
};

fn order_handler() -> TypeSymbol {
    TypeSymbol::new("billing.OrderHandler")
        .with_contract(ContractRef::generic("billing.IHandler", &["billing.Order"]))
        .with_constructor(Constructor::new(vec![ConstructorParam::service(
            "clock",
            ContractRef::new("billing.IClock"),
        )]))
        .with_marker(Marker::Lifetime(Lifetime::Singleton))
}

fn refund_handler() -> TypeSymbol {
    TypeSymbol::new("billing.RefundHandler")
        .with_contract(ContractRef::generic("billing.IHandler", &["billing.Refund"]))
        .with_constructor(Constructor::new(vec![]))
        .with_marker(Marker::Lifetime(Lifetime::Singleton))
}

fn system_clock() -> TypeSymbol {
    TypeSymbol::new("billing.SystemClock")
        .with_contract(ContractRef::new("billing.IClock"))
        .with_constructor(Constructor::new(vec![]))
        .with_marker(Marker::Lifetime(Lifetime::Singleton))
}

fn logging_decorator() -> TypeSymbol {
    TypeSymbol::new("billing.LoggingDecorator")
        .with_generic_params(&["T"])
        .with_contract(ContractRef::generic("billing.IHandler", &["T"]))
        .with_marker(Marker::DecorateOpen {
            target: "billing.IHandler".into(),
            arity: 1,
            order: 1,
        })
}

fn metrics_decorator() -> TypeSymbol {
    TypeSymbol::new("billing.MetricsDecorator")
        .with_generic_params(&["T"])
        .with_contract(ContractRef::generic("billing.IHandler", &["T"]))
        .with_marker(Marker::DecorateOpen {
            target: "billing.IHandler".into(),
            arity: 1,
            order: 2,
        })
}

fn retry_settings() -> TypeSymbol {
    TypeSymbol::new("billing.RetrySettings")
        .with_marker(Marker::Options {
            section: "Billing:Retry".to_string(),
            name: None,
            validate_on_start: true,
        })
        .with_property(
            PropertySymbol::new("Count", ScalarKind::Integer)
                .with_default()
                .with_rule(ValidationRule::Range {
                    min: Some(1.0),
                    max: Some(100.0),
                }),
        )
        .with_property(PropertySymbol::new("Enabled", ScalarKind::Boolean).with_default())
}

/// The order-handling unit, decorators deliberately declared out of order.
fn billing_unit() -> CompilationUnit {
    CompilationUnit::new("billing")
        .with_type(metrics_decorator())
        .with_type(order_handler())
        .with_type(retry_settings())
        .with_type(system_clock())
        .with_type(logging_decorator())
        .with_type(refund_handler())
}

#[test]
fn test_order_handling_scenario_end_to_end() {
    let outcome = Planner::default().plan(&billing_unit()).unwrap();

    assert!(outcome.findings.is_empty());
    assert_eq!(outcome.stats.injectables, 3);
    assert_eq!(outcome.stats.singletons, 3);
    assert_eq!(outcome.stats.decorators, 4);
    assert_eq!(outcome.stats.options, 1);

    // Open decorator definitions never register as injectables.
    assert!(outcome
        .plan
        .injectables
        .iter()
        .all(|d| !d.type_id.as_str().contains("Decorator")));

    // Order 2 wraps order 1 wraps the implementation, per closed contract.
    let wrapping: Vec<(&str, i32)> = outcome
        .plan
        .decorators_for("billing.IHandler<billing.Order>")
        .iter()
        .map(|d| (d.decorator_display.as_str(), d.order))
        .collect();
    assert_eq!(
        wrapping,
        vec![
            ("billing.LoggingDecorator<billing.Order>", 1),
            ("billing.MetricsDecorator<billing.Order>", 2),
        ]
    );
    assert_eq!(
        outcome
            .plan
            .decorators_for("billing.IHandler<billing.Refund>")
            .len(),
        2
    );
}

#[test]
fn test_emitted_artifact_carries_the_full_module_surface() {
    let outcome = Planner::default().plan(&billing_unit()).unwrap();
    let source = &outcome.artifacts.source;

    assert!(source.contains("pub const MODULE: &str = \"billing\";"));
    assert!(source.contains("TypeRecord::new(MODULE, \"billing.OrderHandler\")"));
    assert!(source.contains(".with_contract(\"billing.IHandler<billing.Order>\")"));
    assert!(source.contains("resolver.resolve(\"billing.IClock\"),"));

    // Wrap paths in the emitted shape, one per closed decorator.
    assert!(source.contains(
        "fn wrap_billing_logging_decorator_billing_order(inner: SharedInstance, _resolver: &dyn ServiceResolver) -> SharedInstance {"
    ));
    assert!(source.contains("Arc::new(billing::LoggingDecorator::<billing::Order>::new(inner))"));
    assert!(source.contains("Arc::new(billing::MetricsDecorator::<billing::Refund>::new(inner))"));

    // Inner decorator registered before outer within the contract group.
    let logging = source
        .find("\"billing.LoggingDecorator<billing.Order>\"")
        .unwrap();
    let metrics = source
        .find("\"billing.MetricsDecorator<billing.Order>\"")
        .unwrap();
    assert!(logging < metrics);

    // Options binding and startup validation.
    assert!(source.contains(
        "pub fn bind_billing_retry_settings(target: &mut billing::RetrySettings, source: &dyn ConfigSource) {"
    ));
    assert!(source.contains(
        "rules::range(\"Count\", source.value(\"Billing:Retry\", \"Count\").and_then(|v| coerce::float(&v)), Some(1.0), Some(100.0), &mut findings);"
    ));

    // Startup hook registering the module's accessors.
    assert!(source.contains(".with_decorators(decorator_registrations);"));
    assert!(source.contains("wiregen_runtime::inventory::submit!"));
}

#[test]
fn test_decorator_without_closed_instantiations_expands_to_nothing() {
    let unit = CompilationUnit::new("billing")
        .with_type(logging_decorator())
        .with_type(system_clock());

    let outcome = Planner::default().plan(&unit).unwrap();

    assert!(outcome.plan.decorators.is_empty());
    assert!(outcome.findings.is_empty());
    assert!(!outcome.artifacts.source.contains("decorator_registrations"));
}

#[test]
fn test_captive_disposable_dependency_blocks_generation() {
    let api = TypeSymbol::new("billing.Api")
        .with_constructor(Constructor::new(vec![ConstructorParam::service(
            "session",
            ContractRef::new("billing.ISession"),
        )]))
        .with_marker(Marker::Lifetime(Lifetime::Singleton));
    let session = TypeSymbol::new("billing.Session")
        .with_contract(ContractRef::new("billing.ISession"))
        .with_contract(ContractRef::new("billing.IDisposable"))
        .with_constructor(Constructor::new(vec![]))
        .with_marker(Marker::Lifetime(Lifetime::Scoped));
    let unit = CompilationUnit::new("billing")
        .with_type(api)
        .with_type(session);

    match Planner::default().plan(&unit) {
        Err(PlanError::BlockedByFindings { blocking, findings }) => {
            assert_eq!(blocking, 1);
            assert_eq!(findings[0].code, DiagnosticCode::CaptiveDisposable);
            assert!(findings[0].message.contains("billing.Api"));
            assert!(findings[0].message.contains("billing.Session"));
        }
        other => panic!("expected blocked pass, got {other:?}"),
    }
}

#[test]
fn test_declaration_order_never_changes_the_artifact() {
    let mut config = PlannerConfig::new().with_graph_export();
    config.emit.fixed_timestamp = Some("2024-01-01T00:00:00Z".to_string());
    let planner = Planner::new(config);

    let forward = planner.plan(&billing_unit()).unwrap();

    let mut reversed_unit = billing_unit();
    reversed_unit.types.reverse();
    let reversed = planner.plan(&reversed_unit).unwrap();

    assert_eq!(forward.artifacts.source, reversed.artifacts.source);
    assert_eq!(forward.artifacts.graph_export, reversed.artifacts.graph_export);
}

#[test]
fn test_graph_export_document_contents() {
    let mut config = PlannerConfig::new().with_graph_export();
    config.emit.fixed_timestamp = Some("2024-01-01T00:00:00Z".to_string());
    let outcome = Planner::new(config).plan(&billing_unit()).unwrap();

    let json = outcome.artifacts.graph_export.unwrap();
    let doc: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(doc["schemaVersion"], 1);
    assert_eq!(doc["generatedAt"], "2024-01-01T00:00:00Z");
    assert_eq!(doc["moduleName"], "billing");

    let services = doc["services"].as_array().unwrap();
    assert_eq!(services.len(), 3);
    let handler = services
        .iter()
        .find(|s| s["fullTypeName"] == "billing.OrderHandler")
        .unwrap();
    assert_eq!(handler["lifetime"], "singleton");
    assert_eq!(handler["dependencies"][0], "billing.IClock");
    assert_eq!(
        handler["decorators"][0],
        "billing.LoggingDecorator<billing.Order>"
    );
    assert_eq!(handler["metadata"]["isPlugin"], false);

    let stats = &doc["statistics"];
    assert_eq!(stats["totalServices"], 3);
    assert_eq!(stats["singletons"], 3);
    assert_eq!(stats["decorators"], 4);
    assert_eq!(stats["options"], 1);
    assert_eq!(stats["hostedServices"], 0);
}

#[test]
fn test_multi_unit_batch_plans_independently() {
    let billing = billing_unit();
    let audit = CompilationUnit::new("audit").with_type(
        TypeSymbol::new("audit.LogSink")
            .with_contract(ContractRef::new("audit.ISink"))
            .with_constructor(Constructor::new(vec![]))
            .with_marker(Marker::Lifetime(Lifetime::Transient)),
    );

    let outcomes = Planner::default().plan_many(&[billing, audit]).unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].plan.module, "billing");
    assert_eq!(outcomes[1].plan.module, "audit");
    // Each artifact names only its own module.
    assert!(outcomes[1]
        .artifacts
        .source
        .contains("pub const MODULE: &str = \"audit\";"));
    assert!(!outcomes[1].artifacts.source.contains("billing."));
}
