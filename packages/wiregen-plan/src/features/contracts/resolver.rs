//! Interface resolver
//!
//! Second stage of a pass: decides, per injectable, the contracts it
//! registers under. Every record always registers under its concrete type
//! identity; the resolved contract list is additional.
//!
//! Key rules:
//! - Host infrastructure contracts never become registration targets; the
//!   disposal ones instead flag the descriptor as disposable
//! - A restriction marker narrows the implemented set to exactly one
//!   contract, or excludes the type with a blocking finding
//! - A decorator never registers under a contract it decorates
//! - Provides lists append explicit contracts: required ones must be
//!   implemented, optional ones are kept only when implemented, collection
//!   and factory lists become provisions

use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::errors::{PlanError, Result};
use crate::features::catalog::SymbolCatalog;
use crate::shared::cancel::CancelToken;
use crate::shared::models::{
    ContractRef, DiagnosticCode, Finding, InjectableDescriptor, Marker, TypeId, TypeSymbol,
};

/// Simple names of contracts that can never be registration targets.
static DENIED_CONTRACTS: Lazy<FxHashSet<&'static str>> = Lazy::new(|| {
    ["IDisposable", "IAsyncDisposable", "Object"]
        .into_iter()
        .collect()
});

/// Simple names of the host disposal contracts.
static DISPOSAL_CONTRACTS: Lazy<FxHashSet<&'static str>> =
    Lazy::new(|| ["IDisposable", "IAsyncDisposable"].into_iter().collect());

pub struct InterfaceResolver;

impl InterfaceResolver {
    /// Resolve eligible contracts for every injectable in the catalog.
    ///
    /// Mutates descriptors in place; types excluded by a failed restriction
    /// are removed from the injectable population (their finding remains).
    pub fn resolve(catalog: &mut SymbolCatalog, cancel: &CancelToken) -> Result<Vec<Finding>> {
        let mut findings = Vec::new();
        let mut excluded: FxHashSet<TypeId> = FxHashSet::default();
        // Anti-recursion lookup: decorator type id -> targets it decorates.
        let mut decorated: FxHashMap<TypeId, Vec<ContractRef>> = FxHashMap::default();
        for decl in &catalog.closed_decorators {
            decorated
                .entry(decl.decorator.clone())
                .or_default()
                .push(decl.target.clone());
        }

        for (completed, descriptor) in catalog.injectables.iter_mut().enumerate() {
            if cancel.is_cancelled() {
                return Err(PlanError::Cancelled { completed });
            }
            let Some(symbol) = catalog.symbols.get(&descriptor.type_id) else {
                continue;
            };

            descriptor.is_disposable = symbol
                .contracts
                .iter()
                .any(|c| DISPOSAL_CONTRACTS.contains(c.open.simple_name()));

            let mut contracts = match Self::restricted_contract(symbol) {
                Some(Ok(contract)) => vec![contract],
                Some(Err(finding)) => {
                    findings.push(finding);
                    excluded.insert(descriptor.type_id.clone());
                    continue;
                }
                None => symbol.contracts.clone(),
            };

            Self::apply_provides(symbol, &mut contracts, descriptor, &mut findings);

            contracts.retain(|c| !DENIED_CONTRACTS.contains(c.open.simple_name()));
            if let Some(targets) = decorated.get(&descriptor.type_id) {
                contracts.retain(|c| !targets.contains(c));
            }

            contracts.sort_by(|a, b| a.display().cmp(&b.display()));
            contracts.dedup();
            descriptor.contracts = contracts;
        }

        catalog
            .injectables
            .retain(|d| !excluded.contains(&d.type_id));

        debug!(
            findings = findings.len(),
            excluded = excluded.len(),
            "contract resolution finished"
        );
        Ok(findings)
    }

    /// The restriction marker's outcome: the kept contract, or the blocking
    /// finding when the type does not implement what it names.
    fn restricted_contract(symbol: &TypeSymbol) -> Option<std::result::Result<ContractRef, Finding>> {
        let restrict = symbol.markers.iter().find_map(|m| match m {
            Marker::RestrictTo(contract) => Some(contract),
            _ => None,
        })?;

        if symbol.contracts.contains(restrict) {
            Some(Ok(restrict.clone()))
        } else {
            Some(Err(Finding::new(
                DiagnosticCode::ContractNotImplemented,
                &[symbol.id.as_str(), &restrict.display(), "restrict-to"],
                symbol.location.clone(),
            )))
        }
    }

    fn apply_provides(
        symbol: &TypeSymbol,
        contracts: &mut Vec<ContractRef>,
        descriptor: &mut InjectableDescriptor,
        findings: &mut Vec<Finding>,
    ) {
        for marker in &symbol.markers {
            let Marker::Provides {
                required,
                optional,
                collection,
                factory,
            } = marker
            else {
                continue;
            };

            for contract in required {
                if symbol.contracts.contains(contract) {
                    contracts.push(contract.clone());
                } else {
                    findings.push(Finding::new(
                        DiagnosticCode::ContractNotImplemented,
                        &[symbol.id.as_str(), &contract.display(), "provides"],
                        symbol.location.clone(),
                    ));
                }
            }
            for contract in optional {
                if symbol.contracts.contains(contract) {
                    contracts.push(contract.clone());
                }
            }

            descriptor.provisions.collection.extend(collection.iter().cloned());
            descriptor.provisions.factory.extend(factory.iter().cloned());
        }

        descriptor
            .provisions
            .collection
            .sort_by(|a, b| a.display().cmp(&b.display()));
        descriptor.provisions.collection.dedup();
        descriptor
            .provisions
            .factory
            .sort_by(|a, b| a.display().cmp(&b.display()));
        descriptor.provisions.factory.dedup();
    }
}
