//! Symbol catalog builder
//!
//! First stage of a pass: filters the compilation unit down to the
//! registrable populations and folds declarative markers into descriptor
//! seeds. Later stages only ever consult the catalog, never the raw unit.
//!
//! Key rules:
//! - Eligibility: concrete, non-excluded, non-infrastructure types only
//! - Plugin-marked types become plugin descriptors, not injectables
//! - Options-marked types become binding seeds, not injectables
//! - Open decorators are collected even though open definitions are not
//!   directly constructible
//! - Every population is sorted by type id, so downstream output is
//!   independent of declaration order

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::errors::{PlanError, Result};
use crate::shared::cancel::CancelToken;
use crate::shared::models::{
    CompilationUnit, ContractRef, DiagnosticCode, Finding, InjectableDescriptor, Marker,
    OpenDecoratorDescriptor, PluginDescriptor, SourceLocation, TypeId, TypeSymbol,
};

/// A closed-type decorator declaration lifted off its marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedDecoratorUse {
    pub decorator: TypeId,
    pub target: ContractRef,
    pub location: SourceLocation,
}

/// An options-marked type awaiting binding-strategy selection.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionsSeed {
    pub target: TypeId,
    pub section: String,
    pub name: Option<String>,
    pub validate_on_start: bool,
    pub location: SourceLocation,
}

/// Output of stage 1: descriptor seeds plus the full symbol index the later
/// stages resolve against.
#[derive(Debug, Default)]
pub struct SymbolCatalog {
    pub module: String,
    /// Every declared type, eligible or not, by id.
    pub symbols: FxHashMap<TypeId, TypeSymbol>,
    /// Injectable seeds; contracts and lifetime are resolved by later stages.
    pub injectables: Vec<InjectableDescriptor>,
    pub plugins: Vec<PluginDescriptor>,
    pub open_decorators: Vec<OpenDecoratorDescriptor>,
    pub closed_decorators: Vec<ClosedDecoratorUse>,
    pub options_seeds: Vec<OptionsSeed>,
    pub findings: Vec<Finding>,
}

impl SymbolCatalog {
    pub fn symbol(&self, id: &TypeId) -> Option<&TypeSymbol> {
        self.symbols.get(id)
    }

    /// Decorated targets declared by a closed decorator type, used by the
    /// contract resolver to hold the anti-recursion invariant.
    pub fn decorated_targets(&self, id: &TypeId) -> Vec<&ContractRef> {
        self.closed_decorators
            .iter()
            .filter(|u| &u.decorator == id)
            .map(|u| &u.target)
            .collect()
    }
}

pub struct SymbolCatalogBuilder;

impl SymbolCatalogBuilder {
    /// Build the catalog for one compilation unit.
    ///
    /// Fails on input-model defects (duplicate type ids) and on cancellation;
    /// everything else is reported through findings.
    pub fn build(unit: &CompilationUnit, cancel: &CancelToken) -> Result<SymbolCatalog> {
        let mut catalog = SymbolCatalog {
            module: unit.module.clone(),
            ..SymbolCatalog::default()
        };

        for (completed, symbol) in unit.types.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PlanError::Cancelled { completed });
            }
            #[cfg(feature = "trace")]
            tracing::trace!(type_id = %symbol.id, "cataloging symbol");

            if catalog.symbols.contains_key(&symbol.id) {
                return Err(PlanError::invalid_input(format!(
                    "duplicate type '{}' in compilation unit",
                    symbol.id
                )));
            }
            catalog.symbols.insert(symbol.id.clone(), symbol.clone());

            Self::collect_decorator_markers(symbol, &mut catalog);

            if symbol.markers.iter().any(|m| matches!(m, Marker::Exclude)) {
                Self::report_markers_shadowed_by_exclude(symbol, &mut catalog.findings);
                continue;
            }
            if !Self::eligible(symbol) {
                continue;
            }

            Self::report_duplicate_lifetime_markers(symbol, &mut catalog.findings);

            if let Some(seed) = Self::options_seed(symbol) {
                catalog.options_seeds.push(seed);
                continue;
            }

            let roles = Self::plugin_roles(symbol);
            if !roles.is_empty() {
                catalog.plugins.push(Self::plugin_descriptor(symbol, roles));
                continue;
            }

            catalog.injectables.push(Self::injectable_seed(symbol));
        }

        // Declaration order must not leak into any downstream output.
        catalog.injectables.sort_by(|a, b| a.type_id.cmp(&b.type_id));
        catalog.plugins.sort_by(|a, b| a.type_id.cmp(&b.type_id));
        catalog
            .open_decorators
            .sort_by(|a, b| a.decorator.cmp(&b.decorator));
        catalog
            .closed_decorators
            .sort_by(|a, b| a.decorator.cmp(&b.decorator));
        catalog.options_seeds.sort_by(|a, b| a.target.cmp(&b.target));

        debug!(
            module = %catalog.module,
            injectables = catalog.injectables.len(),
            plugins = catalog.plugins.len(),
            open_decorators = catalog.open_decorators.len(),
            options = catalog.options_seeds.len(),
            "symbol catalog built"
        );
        Ok(catalog)
    }

    /// Concrete, constructible-by-the-container shape.
    fn eligible(symbol: &TypeSymbol) -> bool {
        !symbol.is_abstract
            && !symbol.is_generic_definition()
            && !symbol.is_exception
            && !symbol.is_marker_type
            && !symbol.is_synthesized
            && !symbol.is_nested_private
    }

    /// Decorator markers are collected for every symbol, eligible or not:
    /// open decorators are generic definitions by nature, and invalid
    /// declarations must still reach the expander's validation.
    fn collect_decorator_markers(symbol: &TypeSymbol, catalog: &mut SymbolCatalog) {
        for marker in &symbol.markers {
            match marker {
                Marker::DecorateOpen { target, arity, order } => {
                    catalog.open_decorators.push(OpenDecoratorDescriptor {
                        decorator: symbol.id.clone(),
                        decorator_arity: symbol.generic_arity(),
                        target: target.clone(),
                        target_arity: *arity,
                        order: *order,
                        location: symbol.location.clone(),
                    });
                }
                Marker::DecorateClosed { target } => {
                    catalog.closed_decorators.push(ClosedDecoratorUse {
                        decorator: symbol.id.clone(),
                        target: target.clone(),
                        location: symbol.location.clone(),
                    });
                }
                _ => {}
            }
        }
    }

    fn report_markers_shadowed_by_exclude(symbol: &TypeSymbol, findings: &mut Vec<Finding>) {
        for marker in &symbol.markers {
            if marker.is_registration_marker() {
                findings.push(Finding::new(
                    DiagnosticCode::RedundantMarker,
                    &[marker.name(), symbol.id.as_str(), "type is excluded"],
                    symbol.location.clone(),
                ));
            }
        }
    }

    fn report_duplicate_lifetime_markers(symbol: &TypeSymbol, findings: &mut Vec<Finding>) {
        let lifetimes = symbol
            .markers
            .iter()
            .filter(|m| matches!(m, Marker::Lifetime(_)))
            .count();
        if lifetimes > 1 {
            findings.push(Finding::new(
                DiagnosticCode::RedundantMarker,
                &[
                    "lifetime",
                    symbol.id.as_str(),
                    "multiple lifetime markers; the highest rank wins",
                ],
                symbol.location.clone(),
            ));
        }
    }

    fn options_seed(symbol: &TypeSymbol) -> Option<OptionsSeed> {
        symbol.markers.iter().find_map(|m| match m {
            Marker::Options {
                section,
                name,
                validate_on_start,
            } => Some(OptionsSeed {
                target: symbol.id.clone(),
                section: section.clone(),
                name: name.clone(),
                validate_on_start: *validate_on_start,
                location: symbol.location.clone(),
            }),
            _ => None,
        })
    }

    fn plugin_roles(symbol: &TypeSymbol) -> Vec<ContractRef> {
        let mut roles: Vec<ContractRef> = symbol
            .markers
            .iter()
            .filter_map(|m| match m {
                Marker::Plugin { role } => Some(role.clone()),
                _ => None,
            })
            .collect();
        roles.sort_by(|a, b| a.display().cmp(&b.display()));
        roles.dedup();
        roles
    }

    fn plugin_descriptor(symbol: &TypeSymbol, roles: Vec<ContractRef>) -> PluginDescriptor {
        PluginDescriptor {
            type_id: symbol.id.clone(),
            roles,
            factory: Self::factory_ref(symbol),
            tags: Self::tags(symbol),
            location: symbol.location.clone(),
        }
    }

    fn injectable_seed(symbol: &TypeSymbol) -> InjectableDescriptor {
        let factory = Self::factory_ref(symbol);
        let dependencies = if factory.is_some() {
            // An explicit factory is opaque; constructor parameters no longer
            // describe how the instance is produced.
            Vec::new()
        } else {
            symbol
                .registration_constructor()
                .map(|c| c.params.clone())
                .unwrap_or_default()
        };

        let mut descriptor = InjectableDescriptor::new(symbol.id.clone());
        // An explicit factory reference is a construction path just like a
        // resolvable constructor.
        descriptor.constructible = factory.is_some() || symbol.has_resolvable_constructor();
        descriptor.factory = factory;
        descriptor.tags = Self::tags(symbol);
        descriptor.factory_mode = symbol.markers.iter().find_map(|m| match m {
            Marker::Factory(mode) => Some(*mode),
            _ => None,
        });
        descriptor.dependencies = dependencies;
        descriptor.location = symbol.location.clone();
        descriptor
    }

    fn factory_ref(symbol: &TypeSymbol) -> Option<String> {
        symbol.markers.iter().find_map(|m| match m {
            Marker::FactoryRef(path) => Some(path.clone()),
            _ => None,
        })
    }

    fn tags(symbol: &TypeSymbol) -> Vec<String> {
        let mut tags: Vec<String> = symbol
            .markers
            .iter()
            .filter_map(|m| match m {
                Marker::Tag(tag) => Some(tag.clone()),
                _ => None,
            })
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{Constructor, ConstructorParam, Lifetime};

    fn unit_with(types: Vec<TypeSymbol>) -> CompilationUnit {
        CompilationUnit {
            module: "app".to_string(),
            types,
        }
    }

    fn build(unit: &CompilationUnit) -> SymbolCatalog {
        SymbolCatalogBuilder::build(unit, &CancelToken::new()).unwrap()
    }

    #[test]
    fn test_concrete_type_becomes_injectable() {
        let unit = unit_with(vec![TypeSymbol::new("app.OrderHandler")
            .with_contract(ContractRef::generic("app.IHandler", &["app.Order"]))
            .with_constructor(Constructor::new(vec![]))]);

        let catalog = build(&unit);
        assert_eq!(catalog.injectables.len(), 1);
        assert_eq!(catalog.injectables[0].type_id.as_str(), "app.OrderHandler");
    }

    #[test]
    fn test_infrastructure_shapes_are_skipped() {
        let mut abstract_type = TypeSymbol::new("app.HandlerBase");
        abstract_type.is_abstract = true;
        let mut exception = TypeSymbol::new("app.OrderError");
        exception.is_exception = true;
        let mut synthesized = TypeSymbol::new("app.Closure1");
        synthesized.is_synthesized = true;
        let mut nested = TypeSymbol::new("app.Outer.Inner");
        nested.is_nested_private = true;
        let generic = TypeSymbol::new("app.Wrapper").with_generic_params(&["T"]);

        let unit = unit_with(vec![abstract_type, exception, synthesized, nested, generic]);
        let catalog = build(&unit);
        assert!(catalog.injectables.is_empty());
        // symbols index still sees everything
        assert_eq!(catalog.symbols.len(), 5);
    }

    #[test]
    fn test_excluded_type_reports_shadowed_markers() {
        let unit = unit_with(vec![TypeSymbol::new("app.Hidden")
            .with_marker(Marker::Exclude)
            .with_marker(Marker::Lifetime(Lifetime::Singleton))]);

        let catalog = build(&unit);
        assert!(catalog.injectables.is_empty());
        assert_eq!(catalog.findings.len(), 1);
        assert_eq!(catalog.findings[0].code, DiagnosticCode::RedundantMarker);
        assert!(catalog.findings[0].message.contains("type is excluded"));
    }

    #[test]
    fn test_duplicate_lifetime_markers_warn() {
        let unit = unit_with(vec![TypeSymbol::new("app.Service")
            .with_marker(Marker::Lifetime(Lifetime::Scoped))
            .with_marker(Marker::Lifetime(Lifetime::Singleton))]);

        let catalog = build(&unit);
        assert_eq!(catalog.injectables.len(), 1);
        assert_eq!(catalog.findings.len(), 1);
        assert!(catalog.findings[0].message.contains("highest rank wins"));
    }

    #[test]
    fn test_plugin_marker_splits_population() {
        let unit = unit_with(vec![
            TypeSymbol::new("app.CsvImporter").with_marker(Marker::Plugin {
                role: ContractRef::new("app.IImporter"),
            }),
            TypeSymbol::new("app.Service"),
        ]);

        let catalog = build(&unit);
        assert_eq!(catalog.plugins.len(), 1);
        assert_eq!(catalog.injectables.len(), 1);
        assert!(catalog.plugins[0].serves(&ContractRef::new("app.IImporter")));
    }

    #[test]
    fn test_options_marker_seeds_binding() {
        let unit = unit_with(vec![TypeSymbol::new("app.RetryOptions").with_marker(
            Marker::Options {
                section: "Services:Retry".to_string(),
                name: None,
                validate_on_start: true,
            },
        )]);

        let catalog = build(&unit);
        assert!(catalog.injectables.is_empty());
        assert_eq!(catalog.options_seeds.len(), 1);
        assert_eq!(catalog.options_seeds[0].section, "Services:Retry");
        assert!(catalog.options_seeds[0].validate_on_start);
    }

    #[test]
    fn test_open_decorator_collected_from_generic_definition() {
        let unit = unit_with(vec![TypeSymbol::new("app.LoggingDecorator")
            .with_generic_params(&["T"])
            .with_marker(Marker::DecorateOpen {
                target: TypeId::new("app.IHandler"),
                arity: 1,
                order: 1,
            })]);

        let catalog = build(&unit);
        assert!(catalog.injectables.is_empty());
        assert_eq!(catalog.open_decorators.len(), 1);
        let deco = &catalog.open_decorators[0];
        assert_eq!(deco.decorator_arity, 1);
        assert_eq!(deco.target_arity, 1);
        assert_eq!(deco.order, 1);
    }

    #[test]
    fn test_injectable_with_factory_ref_drops_constructor_deps() {
        let unit = unit_with(vec![TypeSymbol::new("app.LegacyService")
            .with_marker(Marker::FactoryRef("app.legacy.make_service".to_string()))
            .with_constructor(Constructor::new(vec![ConstructorParam::service(
                "clock",
                ContractRef::new("app.IClock"),
            )]))]);

        let catalog = build(&unit);
        let descriptor = &catalog.injectables[0];
        assert_eq!(descriptor.factory.as_deref(), Some("app.legacy.make_service"));
        assert!(descriptor.dependencies.is_empty());
    }

    #[test]
    fn test_duplicate_type_id_is_input_defect() {
        let unit = unit_with(vec![
            TypeSymbol::new("app.Service"),
            TypeSymbol::new("app.Service"),
        ]);
        let result = SymbolCatalogBuilder::build(&unit, &CancelToken::new());
        assert!(matches!(result, Err(PlanError::InvalidInput(_))));
    }

    #[test]
    fn test_populations_sorted_regardless_of_declaration_order() {
        let unit = unit_with(vec![
            TypeSymbol::new("app.Zeta"),
            TypeSymbol::new("app.Alpha"),
            TypeSymbol::new("app.Mid"),
        ]);
        let catalog = build(&unit);
        let ids: Vec<&str> = catalog
            .injectables
            .iter()
            .map(|d| d.type_id.as_str())
            .collect();
        assert_eq!(ids, vec!["app.Alpha", "app.Mid", "app.Zeta"]);
    }

    #[test]
    fn test_cancellation_stops_catalog() {
        let token = CancelToken::new();
        token.cancel();
        let unit = unit_with(vec![TypeSymbol::new("app.Service")]);
        let result = SymbolCatalogBuilder::build(&unit, &token);
        assert!(matches!(result, Err(PlanError::Cancelled { .. })));
    }
}
