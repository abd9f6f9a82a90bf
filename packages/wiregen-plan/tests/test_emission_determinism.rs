//! Property-based tests for emission determinism
//!
//! The artifact contract is byte-stable output: declaration order, marker
//! noise and repeated passes must never change the rendered text.

use proptest::prelude::*;
use wiregen_plan::{
    CompilationUnit, Constructor, ContractRef, Lifetime, Marker, Planner, PlannerConfig,
    TypeSymbol,
};

/// One registrable symbol whose shape is driven by `bits`.
fn symbol_from(name: &str, bits: u8) -> TypeSymbol {
    let mut symbol =
        TypeSymbol::new(format!("det.{name}")).with_constructor(Constructor::new(vec![]));
    match bits & 0b11 {
        0 => {}
        1 => symbol = symbol.with_marker(Marker::Lifetime(Lifetime::Singleton)),
        2 => symbol = symbol.with_marker(Marker::Lifetime(Lifetime::Scoped)),
        _ => symbol = symbol.with_marker(Marker::Lifetime(Lifetime::Transient)),
    }
    if bits & 0b100 != 0 {
        symbol = symbol.with_contract(ContractRef::new(format!("det.I{name}")));
    }
    if bits & 0b1000 != 0 {
        symbol = symbol.with_marker(Marker::Tag("generated".to_string()));
    }
    if bits & 0b1_0000 != 0 {
        symbol = symbol.with_marker(Marker::Exclude);
    }
    symbol
}

fn unit_from(entries: &[(String, u8)]) -> CompilationUnit {
    let mut unit = CompilationUnit::new("det");
    for (name, bits) in entries {
        unit = unit.with_type(symbol_from(name, *bits));
    }
    unit
}

// Strategy for a unique, shuffled population of symbol shapes.
fn shuffled_entries() -> impl Strategy<Value = Vec<(String, u8)>> {
    prop::collection::btree_map("[a-z]{4,10}", any::<u8>(), 1..12)
        .prop_map(|m| m.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

fn pinned_planner() -> Planner {
    let mut config = PlannerConfig::new().with_graph_export();
    config.emit.fixed_timestamp = Some("2024-01-01T00:00:00Z".to_string());
    Planner::new(config)
}

proptest! {
    /// Property: declaration order never leaks into either artifact.
    #[test]
    fn prop_artifact_independent_of_declaration_order(entries in shuffled_entries()) {
        let planner = pinned_planner();

        let shuffled = planner.plan(&unit_from(&entries)).unwrap();

        let mut sorted = entries.clone();
        sorted.sort();
        let ordered = planner.plan(&unit_from(&sorted)).unwrap();

        prop_assert_eq!(&shuffled.artifacts.source, &ordered.artifacts.source);
        prop_assert_eq!(&shuffled.artifacts.graph_export, &ordered.artifacts.graph_export);
    }

    /// Property: planning the same unit twice is byte-identical.
    #[test]
    fn prop_repeated_passes_are_byte_identical(entries in shuffled_entries()) {
        let planner = pinned_planner();
        let unit = unit_from(&entries);

        let first = planner.plan(&unit).unwrap();
        let second = planner.plan(&unit).unwrap();

        prop_assert_eq!(&first.artifacts.source, &second.artifacts.source);
        prop_assert_eq!(&first.artifacts.graph_export, &second.artifacts.graph_export);
    }

    /// Property: marker noise on dependency-free symbols never refuses a pass.
    #[test]
    fn prop_marker_noise_never_blocks_generation(entries in shuffled_entries()) {
        let outcome = Planner::default().plan(&unit_from(&entries));
        prop_assert!(outcome.is_ok());
    }
}
