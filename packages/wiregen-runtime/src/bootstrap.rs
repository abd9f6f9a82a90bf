//! Process-wide bootstrap registry
//!
//! Generated modules contribute their accessor functions here, at link time
//! through `inventory::submit!` or dynamically through [`register`]. Readers
//! take a combined snapshot: every contribution's records, deduplicated by
//! type identity with the first contribution winning. The snapshot is cached
//! and the cache is invalidated on every new registration.
//!
//! [`with_override`] shadows the whole registry on the current thread so
//! concurrent tests can stage contributions without touching global state.

use std::cell::RefCell;

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tracing::info;

use crate::records::{DecoratorRecord, ModuleContribution, PluginRecord, TypeRecord};

inventory::collect!(ModuleContribution);

#[derive(Default)]
struct Registry {
    dynamic: Vec<ModuleContribution>,
    cache: Option<CombinedView>,
}

static REGISTRY: Lazy<Mutex<Registry>> = Lazy::new(|| Mutex::new(Registry::default()));

thread_local! {
    static OVERRIDE: RefCell<Option<Vec<ModuleContribution>>> = const { RefCell::new(None) };
}

/// Combined snapshot over every contribution.
#[derive(Debug, Clone, Default)]
pub struct CombinedView {
    pub types: Vec<TypeRecord>,
    pub plugins: Vec<PluginRecord>,
    /// All decorator wiring, sorted by contract then application order.
    pub decorators: Vec<DecoratorRecord>,
    /// Contributing module names, in contribution order.
    pub modules: Vec<&'static str>,
}

impl CombinedView {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.plugins.is_empty()
    }
}

/// Append one contribution to the process-wide registry.
pub fn register(contribution: ModuleContribution) {
    let mut registry = REGISTRY.lock();
    info!(module = contribution.module, "module contribution registered");
    registry.dynamic.push(contribution);
    registry.cache = None;
}

/// Snapshot the combined view.
///
/// A thread-local override takes precedence; otherwise link-time
/// contributions come first, then dynamic ones, and the result is cached
/// until the next [`register`] call.
pub fn combined() -> CombinedView {
    let overridden = OVERRIDE.with(|slot| slot.borrow().clone());
    if let Some(contributions) = overridden {
        return combine(&contributions);
    }

    let mut registry = REGISTRY.lock();
    if let Some(view) = &registry.cache {
        return view.clone();
    }
    let mut contributions: Vec<ModuleContribution> =
        inventory::iter::<ModuleContribution>.into_iter().copied().collect();
    contributions.extend(registry.dynamic.iter().copied());
    let view = combine(&contributions);
    registry.cache = Some(view.clone());
    view
}

/// Run `body` with `contributions` shadowing the global registry on this
/// thread. Nests; the previous override is restored afterwards.
pub fn with_override<T>(contributions: Vec<ModuleContribution>, body: impl FnOnce() -> T) -> T {
    let previous = OVERRIDE.with(|slot| slot.borrow_mut().replace(contributions));
    let result = body();
    OVERRIDE.with(|slot| *slot.borrow_mut() = previous);
    result
}

fn combine(contributions: &[ModuleContribution]) -> CombinedView {
    let mut view = CombinedView::default();
    let mut seen_types: FxHashSet<&'static str> = FxHashSet::default();
    let mut seen_plugins: FxHashSet<&'static str> = FxHashSet::default();

    for contribution in contributions {
        if !view.modules.contains(&contribution.module) {
            view.modules.push(contribution.module);
        }
        for record in contribution.type_records() {
            if seen_types.insert(record.type_name) {
                view.types.push(record);
            }
        }
        for record in contribution.plugin_records() {
            if seen_plugins.insert(record.type_name) {
                view.plugins.push(record);
            }
        }
        view.decorators.extend(contribution.decorator_records());
    }

    view.decorators.sort_by(|a, b| {
        a.contract
            .cmp(b.contract)
            .then_with(|| a.order.cmp(&b.order))
            .then_with(|| a.decorator.cmp(b.decorator))
    });
    view
}
