//! Lifetime resolver
//!
//! Third stage of a pass. Precedence per descriptor:
//!
//! 1. explicit lifetime marker, highest rank winning when several
//! 2. the pluggable inference strategy
//! 3. Singleton, when the type has a resolvable construction path
//! 4. unresolved: the descriptor stays cataloged and registration is left
//!    to the runtime fallback chain

use tracing::debug;

use crate::errors::{PlanError, Result};
use crate::features::catalog::SymbolCatalog;
use crate::shared::cancel::CancelToken;
use crate::shared::models::{Lifetime, Marker, TypeSymbol};

/// Pluggable lifetime assignment for types without an explicit marker.
pub trait LifetimeInference: Send + Sync {
    fn infer(&self, symbol: &TypeSymbol) -> Option<Lifetime>;
}

/// Default strategy: no opinion, fall through to the Singleton default.
pub struct NoInference;

impl LifetimeInference for NoInference {
    fn infer(&self, _symbol: &TypeSymbol) -> Option<Lifetime> {
        None
    }
}

pub struct LifetimeResolver;

impl LifetimeResolver {
    pub fn resolve(
        catalog: &mut SymbolCatalog,
        inference: &dyn LifetimeInference,
        cancel: &CancelToken,
    ) -> Result<()> {
        let mut unresolved = 0usize;

        for (completed, descriptor) in catalog.injectables.iter_mut().enumerate() {
            if cancel.is_cancelled() {
                return Err(PlanError::Cancelled { completed });
            }
            let Some(symbol) = catalog.symbols.get(&descriptor.type_id) else {
                continue;
            };

            descriptor.lifetime = Self::explicit(symbol)
                .or_else(|| inference.infer(symbol))
                .or(if descriptor.constructible {
                    Some(Lifetime::Singleton)
                } else {
                    None
                });

            if descriptor.lifetime.is_none() {
                unresolved += 1;
            }
        }

        debug!(unresolved, "lifetime resolution finished");
        Ok(())
    }

    /// Highest-ranked explicit marker, when any.
    fn explicit(symbol: &TypeSymbol) -> Option<Lifetime> {
        symbol
            .markers
            .iter()
            .filter_map(|m| match m {
                Marker::Lifetime(lifetime) => Some(*lifetime),
                _ => None,
            })
            .max_by_key(|l| l.rank())
    }
}
