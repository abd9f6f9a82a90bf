/*
 * wiregen-runtime - Runtime support for generated registry modules
 *
 * Generated code depends on this crate alone:
 * - records/     : Descriptor records and the ServiceResolver seam the
 *                  emitted construction paths call into
 * - bootstrap/   : Process-wide contribution registry (inventory + dynamic),
 *                  combined first-wins snapshot, thread-local override
 * - registrar/   : Applies records to an external container (ServiceSink)
 * - plugins/     : Role/module/tag discovery over plugin records
 * - modules/     : Module enumeration with host-supplied ordering
 * - filter/      : Admission rules for unresolved-lifetime records
 * - fallback/    : Behavior when the bootstrap holds no contributions
 * - options/     : Configuration seam, scalar coercion, startup validation
 *
 * Everything here is reflection-free: string identities, fn pointers and
 * plain data, resolved at link time or explicit registration.
 */

pub mod bootstrap;
pub mod errors;
pub mod fallback;
pub mod filter;
pub mod modules;
pub mod options;
pub mod plugins;
pub mod records;
pub mod registrar;

// Generated modules submit contributions through this re-export, so hosts
// never add inventory themselves.
pub use inventory;

pub use bootstrap::CombinedView;
pub use errors::{Result, RuntimeError};
pub use fallback::FallbackPolicy;
pub use filter::TypeFilter;
pub use modules::ModuleProvider;
pub use options::{
    coerce, ensure_valid, rules, ConfigSource, MemoryConfigSource, Severity, ValidationFinding,
};
pub use plugins::{PluginCatalog, PluginQuery};
pub use records::{
    Construct, DecoratorRecord, ModuleContribution, PluginRecord, ServiceLifetime,
    ServiceResolver, SharedInstance, TypeRecord, Wrap,
};
pub use registrar::{RegistrationSummary, ServiceSink, TypeRegistrar};
