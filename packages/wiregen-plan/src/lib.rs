/*
 * wiregen-plan - Registration planner and registry code generator
 *
 * Feature-First Architecture:
 * - shared/      : Common models (symbols, descriptors, findings) + cancellation
 * - features/    : Vertical slices, one per stage (catalog -> contracts ->
 *                  lifetimes -> decorators -> options -> analyzers -> emission)
 * - pipeline/    : Orchestration over one or many compilation units
 * - config/      : Policy (analyzer switches, emit options, strictness)
 *
 * A pass is pure and synchronous: same unit + same configuration = same
 * artifact, byte for byte. Parallelism only ever spans units, never stages.
 */

pub mod config;
pub mod errors;
pub mod features;
pub mod pipeline;
pub mod shared;

pub use config::{AnalyzerControl, EmitConfig, PlannerConfig};
pub use errors::{PlanError, Result};
pub use features::emission::{EmittedArtifacts, GraphExportDocument, RegistryEmitter};
pub use features::lifetimes::{LifetimeInference, NoInference};
pub use pipeline::{PlanOutcome, PlanStats, Planner};
pub use shared::cancel::CancelToken;
pub use shared::models::{
    CompilationUnit, Constructor, ConstructorParam, ContractRef, DiagnosticCode, Finding,
    Lifetime, Marker, ParamKind, PropertySymbol, RegistrationPlan, ScalarKind, Severity,
    SourceLocation, TypeId, TypeSymbol, ValidationRule,
};
