//! Registry source emitter (stage 7)
//!
//! Renders a resolved plan into one generated Rust module that links
//! against `wiregen-runtime`: record accessors, synthesized construction
//! paths, factory surfaces, options bindings and the bootstrap hook.
//!
//! Determinism rule: every section is sorted by fully-qualified type name
//! (decorators by contract, then application order) before rendering, so
//! identical input produces byte-identical output regardless of the order
//! descriptors arrived in.

use rustc_hash::FxHashSet;

use crate::config::EmitConfig;
use crate::errors::Result;
use crate::shared::models::{
    BindingStrategy, DecoratorRegistration, InjectableDescriptor, Lifetime, OptionsDescriptor,
    ParamKind, PluginDescriptor, RegistrationPlan, ScalarKind, ValidationRule,
};

use super::graph_export::GraphExportDocument;
use super::source::SourceBuilder;

/// Lifetime groups in rendering order; unresolved descriptors trail.
const LIFETIME_GROUPS: [(Option<Lifetime>, &str); 4] = [
    (Some(Lifetime::Singleton), "// singleton"),
    (Some(Lifetime::Scoped), "// scoped"),
    (Some(Lifetime::Transient), "// transient"),
    (None, "// unresolved lifetime; the runtime fallback decides"),
];

/// Everything one emission produced.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedArtifacts {
    /// The generated registry module.
    pub source: String,
    /// JSON dependency-graph document, when enabled.
    pub graph_export: Option<String>,
}

pub struct RegistryEmitter;

impl RegistryEmitter {
    /// Render the source artifact, plus the graph export when configured.
    pub fn emit(plan: &RegistrationPlan, config: &EmitConfig) -> Result<EmittedArtifacts> {
        let source = Self::render(plan, config);
        let graph_export = if config.graph_export {
            Some(GraphExportDocument::build(plan, config.fixed_timestamp.as_deref()).to_json()?)
        } else {
            None
        };
        Ok(EmittedArtifacts {
            source,
            graph_export,
        })
    }

    /// Render the source artifact only.
    pub fn render(plan: &RegistrationPlan, config: &EmitConfig) -> String {
        let mut injectables: Vec<&InjectableDescriptor> = plan.injectables.iter().collect();
        injectables.sort_by(|a, b| a.type_id.cmp(&b.type_id));
        let mut plugins: Vec<&PluginDescriptor> = plan.plugins.iter().collect();
        plugins.sort_by(|a, b| a.type_id.cmp(&b.type_id));
        let mut decorators: Vec<&DecoratorRegistration> = plan.decorators.iter().collect();
        decorators.sort_by(|a, b| {
            a.contract
                .display()
                .cmp(&b.contract.display())
                .then_with(|| a.sort_key().cmp(&b.sort_key()))
        });
        let mut options: Vec<&OptionsDescriptor> = plan.options.iter().collect();
        options.sort_by(|a, b| a.target.cmp(&b.target));

        let mut src = SourceBuilder::new(config.indent.clone());
        if config.header {
            Self::header(&mut src, &plan.module);
        }
        Self::imports(&mut src, &injectables, &plugins, &decorators, &options, config);
        src.line(&format!("pub const MODULE: &str = {};", quoted(&plan.module)));
        src.blank();
        Self::injectable_accessor(&mut src, &injectables);
        src.blank();
        Self::plugin_accessor(&mut src, &plugins);
        if !decorators.is_empty() {
            src.blank();
            Self::decorator_accessor(&mut src, &decorators);
        }
        Self::construction_helpers(&mut src, &injectables, &plugins, &decorators);
        Self::factory_surfaces(&mut src, &injectables);
        Self::options_blocks(&mut src, &options);
        if config.startup_hook {
            Self::startup_hook(&mut src, !decorators.is_empty());
        }
        src.build()
    }

    fn header(src: &mut SourceBuilder, module: &str) {
        src.line(&format!(
            "// Generated by wiregen for module `{module}`. Do not edit by hand."
        ));
        src.line("// Regenerate by rerunning the planner over this module's sources.");
        src.blank();
    }

    fn imports(
        src: &mut SourceBuilder,
        injectables: &[&InjectableDescriptor],
        plugins: &[&PluginDescriptor],
        decorators: &[&DecoratorRegistration],
        options: &[&OptionsDescriptor],
        config: &EmitConfig,
    ) {
        let synthesized = injectables
            .iter()
            .any(|d| d.constructible && d.factory.is_none())
            || plugins.iter().any(|p| p.factory.is_none())
            || !decorators.is_empty();
        let needs_resolver = synthesized
            || injectables
                .iter()
                .any(|d| d.factory_mode.is_some() && d.constructible);

        if synthesized {
            src.line("use std::sync::Arc;");
            src.blank();
        }
        if config.startup_hook {
            src.line("use wiregen_runtime::bootstrap::{self, ModuleContribution};");
        }
        if let Some(line) = Self::options_import(options) {
            src.line(&line);
        }

        let mut names = vec!["PluginRecord", "TypeRecord"];
        if !decorators.is_empty() {
            names.push("DecoratorRecord");
        }
        if injectables.iter().any(|d| d.lifetime.is_some()) {
            names.push("ServiceLifetime");
        }
        if needs_resolver {
            names.push("ServiceResolver");
            names.push("SharedInstance");
        }
        names.sort_unstable();
        src.line(&format!(
            "use wiregen_runtime::records::{{{}}};",
            names.join(", ")
        ));
        src.blank();
    }

    fn options_import(options: &[&OptionsDescriptor]) -> Option<String> {
        let any_block = options
            .iter()
            .any(|o| !o.members.is_empty() || Self::has_validator(o));
        if !any_block {
            return None;
        }
        let uses_coerce = options.iter().any(|o| {
            o.members.iter().any(|m| {
                matches!(
                    m.scalar,
                    ScalarKind::Integer | ScalarKind::Float | ScalarKind::Boolean
                )
            }) || o
                .rules
                .iter()
                .any(|r| matches!(r.rule, ValidationRule::Range { .. }))
        });
        let has_validator = options.iter().any(|o| Self::has_validator(o));

        let mut names = Vec::new();
        if uses_coerce {
            names.push("coerce");
        }
        if has_validator {
            names.push("rules");
        }
        names.push("ConfigSource");
        if has_validator {
            names.push("ValidationFinding");
        }
        Some(format!(
            "use wiregen_runtime::options::{{{}}};",
            names.join(", ")
        ))
    }

    fn has_validator(options: &OptionsDescriptor) -> bool {
        options.validate_on_start && !options.rules.is_empty()
    }

    fn injectable_accessor(src: &mut SourceBuilder, injectables: &[&InjectableDescriptor]) {
        src.line("/// Injectable registrations of this module, grouped by lifetime.");
        src.line("pub fn injectable_types() -> Vec<TypeRecord> {");
        src.indent();
        if injectables.is_empty() {
            src.line("Vec::new()");
        } else {
            src.line(&format!(
                "let mut records = Vec::with_capacity({});",
                injectables.len()
            ));
            for (lifetime, comment) in LIFETIME_GROUPS {
                let group: Vec<_> = injectables
                    .iter()
                    .filter(|d| d.lifetime == lifetime)
                    .collect();
                if group.is_empty() {
                    continue;
                }
                src.blank();
                src.line(comment);
                for descriptor in group {
                    Self::type_record(src, descriptor);
                }
            }
            src.blank();
            src.line("records");
        }
        src.dedent();
        src.line("}");
    }

    fn type_record(src: &mut SourceBuilder, descriptor: &InjectableDescriptor) {
        let mut chain = Vec::new();
        if let Some(lifetime) = descriptor.lifetime {
            chain.push(format!(".with_lifetime(ServiceLifetime::{lifetime:?})"));
        }
        for contract in &descriptor.contracts {
            chain.push(format!(".with_contract({})", quoted(&contract.display())));
        }
        for contract in &descriptor.provisions.collection {
            chain.push(format!(
                ".with_collection_contract({})",
                quoted(&contract.display())
            ));
        }
        for contract in &descriptor.provisions.factory {
            chain.push(format!(
                ".with_factory_contract({})",
                quoted(&contract.display())
            ));
        }
        for tag in &descriptor.tags {
            chain.push(format!(".with_tag({})", quoted(tag)));
        }
        if let Some(construct) = Self::construct_ref(descriptor) {
            chain.push(format!(".with_construct({construct})"));
        }
        let head = format!("TypeRecord::new(MODULE, {})", quoted(descriptor.type_id.as_str()));
        Self::push_record(src, &head, &chain);
    }

    fn plugin_accessor(src: &mut SourceBuilder, plugins: &[&PluginDescriptor]) {
        src.line("/// Plugin registrations of this module.");
        src.line("pub fn plugin_types() -> Vec<PluginRecord> {");
        src.indent();
        if plugins.is_empty() {
            src.line("Vec::new()");
        } else {
            src.line(&format!(
                "let mut records = Vec::with_capacity({});",
                plugins.len()
            ));
            src.blank();
            for plugin in plugins {
                let mut chain = Vec::new();
                for role in &plugin.roles {
                    chain.push(format!(".with_role({})", quoted(&role.display())));
                }
                for tag in &plugin.tags {
                    chain.push(format!(".with_tag({})", quoted(tag)));
                }
                let construct = match &plugin.factory {
                    Some(path) => rust_path(path),
                    None => format!("construct_{}", ident(plugin.type_id.as_str())),
                };
                chain.push(format!(".with_construct({construct})"));
                let head =
                    format!("PluginRecord::new(MODULE, {})", quoted(plugin.type_id.as_str()));
                Self::push_record(src, &head, &chain);
            }
            src.blank();
            src.line("records");
        }
        src.dedent();
        src.line("}");
    }

    fn decorator_accessor(src: &mut SourceBuilder, decorators: &[&DecoratorRegistration]) {
        src.line("/// Decorator wiring, in application order per contract.");
        src.line("pub fn decorator_registrations() -> Vec<DecoratorRecord> {");
        src.indent();
        src.line(&format!(
            "let mut records = Vec::with_capacity({});",
            decorators.len()
        ));
        src.blank();
        for decorator in decorators {
            src.line("records.push(");
            src.indent();
            src.line("DecoratorRecord::new(");
            src.indent();
            src.line(&format!("{},", quoted(&decorator.contract.display())));
            src.line(&format!("{},", quoted(&decorator.decorator_display)));
            src.line(&format!("{},", decorator.order));
            src.dedent();
            src.line(")");
            src.line(&format!(
                ".with_wrap(wrap_{}),",
                ident(&decorator.decorator_display)
            ));
            src.dedent();
            src.line(");");
        }
        src.blank();
        src.line("records");
        src.dedent();
        src.line("}");
    }

    fn construction_helpers(
        src: &mut SourceBuilder,
        injectables: &[&InjectableDescriptor],
        plugins: &[&PluginDescriptor],
        decorators: &[&DecoratorRegistration],
    ) {
        let synthesized: Vec<_> = injectables
            .iter()
            .filter(|d| d.constructible && d.factory.is_none())
            .collect();
        let plugin_synth: Vec<_> = plugins.iter().filter(|p| p.factory.is_none()).collect();
        if synthesized.is_empty() && plugin_synth.is_empty() && decorators.is_empty() {
            return;
        }

        src.blank();
        src.line("// construction paths");
        for descriptor in synthesized {
            src.blank();
            Self::construct_fn(src, descriptor);
        }
        for plugin in plugin_synth {
            src.blank();
            Self::plugin_construct_fn(src, plugin);
        }
        // The same closed decorator can serve several contracts; one wrap
        // path covers them all.
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for decorator in decorators {
            let name = ident(&decorator.decorator_display);
            if !seen.insert(name.clone()) {
                continue;
            }
            src.blank();
            Self::wrap_fn(src, decorator, &name);
        }
    }

    fn construct_fn(src: &mut SourceBuilder, descriptor: &InjectableDescriptor) {
        let name = ident(descriptor.type_id.as_str());
        let path = rust_path(descriptor.type_id.as_str());
        let resolver = if descriptor.dependencies.is_empty() {
            "_resolver"
        } else {
            "resolver"
        };
        src.line(&format!(
            "fn construct_{name}({resolver}: &dyn ServiceResolver) -> SharedInstance {{"
        ));
        src.indent();
        if descriptor.dependencies.is_empty() {
            src.line(&format!("Arc::new({path}::new())"));
        } else {
            src.line(&format!("Arc::new({path}::new("));
            src.indent();
            for param in &descriptor.dependencies {
                if let Some(call) = Self::resolver_call(&param.kind) {
                    src.line(&format!("{call},"));
                }
            }
            src.dedent();
            src.line("))");
        }
        src.dedent();
        src.line("}");
    }

    fn plugin_construct_fn(src: &mut SourceBuilder, plugin: &PluginDescriptor) {
        let name = ident(plugin.type_id.as_str());
        let path = rust_path(plugin.type_id.as_str());
        src.line(&format!(
            "fn construct_{name}(_resolver: &dyn ServiceResolver) -> SharedInstance {{"
        ));
        src.indent();
        src.line(&format!("Arc::new({path}::new())"));
        src.dedent();
        src.line("}");
    }

    fn wrap_fn(src: &mut SourceBuilder, decorator: &DecoratorRegistration, name: &str) {
        let path = rust_path(decorator.decorator.as_str());
        // Closed decorators keep their plain id as the display; only expanded
        // open decorators take the contract's arguments as a turbofish.
        let turbofish = if decorator.decorator_display == decorator.decorator.as_str() {
            String::new()
        } else {
            let args: Vec<String> = decorator
                .contract
                .args
                .iter()
                .map(|a| rust_path(a))
                .collect();
            format!("::<{}>", args.join(", "))
        };
        src.line(&format!(
            "fn wrap_{name}(inner: SharedInstance, _resolver: &dyn ServiceResolver) -> SharedInstance {{"
        ));
        src.indent();
        src.line(&format!("Arc::new({path}{turbofish}::new(inner))"));
        src.dedent();
        src.line("}");
    }

    fn resolver_call(kind: &ParamKind) -> Option<String> {
        let (method, contract) = match kind {
            ParamKind::Service(c) => ("resolve", c),
            ParamKind::Collection(c) => ("resolve_all", c),
            ParamKind::Deferred(c) => ("resolve_deferred", c),
            ParamKind::Factory(c) => ("resolve_factory", c),
            ParamKind::Scalar(_) => return None,
        };
        Some(format!("resolver.{method}({})", quoted(&contract.display())))
    }

    fn construct_expr(descriptor: &InjectableDescriptor, resolver: &str) -> String {
        match &descriptor.factory {
            Some(path) => format!("{}({resolver})", rust_path(path)),
            None => format!("construct_{}({resolver})", ident(descriptor.type_id.as_str())),
        }
    }

    fn factory_surfaces(src: &mut SourceBuilder, injectables: &[&InjectableDescriptor]) {
        let factories: Vec<_> = injectables
            .iter()
            .filter(|d| d.factory_mode.is_some() && d.constructible)
            .collect();
        if factories.is_empty() {
            return;
        }

        src.blank();
        src.line("// factory surfaces");
        for descriptor in factories {
            let Some(mode) = descriptor.factory_mode else {
                continue;
            };
            let type_name = pascal(descriptor.type_id.as_str());
            if mode.emits_interface() {
                src.blank();
                src.line(&format!("/// Factory surface for `{}`.", descriptor.type_id));
                src.line(&format!("pub trait {type_name}Factory {{"));
                src.indent();
                src.line("fn create(&self) -> SharedInstance;");
                src.dedent();
                src.line("}");
                src.blank();
                src.line(&format!("pub struct Generated{type_name}Factory<'a> {{"));
                src.indent();
                src.line("pub resolver: &'a dyn ServiceResolver,");
                src.dedent();
                src.line("}");
                src.blank();
                src.line(&format!(
                    "impl {type_name}Factory for Generated{type_name}Factory<'_> {{"
                ));
                src.indent();
                src.line("fn create(&self) -> SharedInstance {");
                src.indent();
                src.line(&Self::construct_expr(descriptor, "self.resolver"));
                src.dedent();
                src.line("}");
                src.dedent();
                src.line("}");
            }
            if mode.emits_function() {
                src.blank();
                src.line(&format!(
                    "pub fn create_{}(resolver: &dyn ServiceResolver) -> SharedInstance {{",
                    ident(descriptor.type_id.as_str())
                ));
                src.indent();
                src.line(&Self::construct_expr(descriptor, "resolver"));
                src.dedent();
                src.line("}");
            }
        }
    }

    fn options_blocks(src: &mut SourceBuilder, options: &[&OptionsDescriptor]) {
        let rendered: Vec<_> = options
            .iter()
            .filter(|o| !o.members.is_empty() || Self::has_validator(o))
            .collect();
        if rendered.is_empty() {
            return;
        }

        src.blank();
        src.line("// options bindings");
        for descriptor in rendered {
            if !descriptor.members.is_empty() {
                src.blank();
                match descriptor.strategy {
                    BindingStrategy::SetProperties => Self::bind_fn(src, descriptor),
                    BindingStrategy::Construct => Self::build_fn(src, descriptor),
                }
            }
            if Self::has_validator(descriptor) {
                src.blank();
                Self::validate_fn(src, descriptor);
            }
        }
    }

    fn lookup(descriptor: &OptionsDescriptor, key: &str) -> String {
        format!(
            "source.value({}, {})",
            quoted(&descriptor.section),
            quoted(key)
        )
    }

    /// Key lookup with the member's coercion applied, `None` on parse failure.
    fn coerced_lookup(descriptor: &OptionsDescriptor, key: &str, scalar: &ScalarKind) -> String {
        let lookup = Self::lookup(descriptor, key);
        match scalar {
            ScalarKind::Text => lookup,
            ScalarKind::Integer => format!("{lookup}.and_then(|v| coerce::integer(&v))"),
            ScalarKind::Float => format!("{lookup}.and_then(|v| coerce::float(&v))"),
            ScalarKind::Boolean => format!("{lookup}.and_then(|v| coerce::boolean(&v))"),
            ScalarKind::Enum(ty) => format!(
                "{lookup}.and_then(|v| v.parse::<{}>().ok())",
                rust_path(ty.as_str())
            ),
            ScalarKind::Other(_) => lookup,
        }
    }

    fn bind_fn(src: &mut SourceBuilder, descriptor: &OptionsDescriptor) {
        src.line(&format!(
            "/// Binds `{}` from section `{}`.",
            descriptor.target, descriptor.section
        ));
        src.line(&format!(
            "pub fn bind_{}(target: &mut {}, source: &dyn ConfigSource) {{",
            ident(descriptor.target.as_str()),
            rust_path(descriptor.target.as_str())
        ));
        src.indent();
        for member in &descriptor.members {
            src.line(&format!(
                "if let Some(value) = {} {{",
                Self::coerced_lookup(descriptor, &member.key, &member.scalar)
            ));
            src.indent();
            src.line(&format!("target.{} = value;", ident(&member.member)));
            src.dedent();
            src.line("}");
        }
        src.dedent();
        src.line("}");
    }

    fn build_fn(src: &mut SourceBuilder, descriptor: &OptionsDescriptor) {
        let path = rust_path(descriptor.target.as_str());
        src.line(&format!(
            "/// Builds `{}` from section `{}`.",
            descriptor.target, descriptor.section
        ));
        src.line(&format!(
            "pub fn build_{}(source: &dyn ConfigSource) -> {path} {{",
            ident(descriptor.target.as_str())
        ));
        src.indent();
        src.line(&format!("{path} {{"));
        src.indent();
        for member in &descriptor.members {
            src.line(&format!(
                "{}: {}.unwrap_or_default(),",
                ident(&member.member),
                Self::coerced_lookup(descriptor, &member.key, &member.scalar)
            ));
        }
        src.dedent();
        src.line("}");
        src.dedent();
        src.line("}");
    }

    fn validate_fn(src: &mut SourceBuilder, descriptor: &OptionsDescriptor) {
        src.line(&format!(
            "/// Startup validation for `{}`.",
            descriptor.target
        ));
        src.line(&format!(
            "pub fn validate_{}(source: &dyn ConfigSource) -> Vec<ValidationFinding> {{",
            ident(descriptor.target.as_str())
        ));
        src.indent();
        src.line("let mut findings = Vec::new();");
        for member_rule in &descriptor.rules {
            let key = descriptor
                .binding_for(&member_rule.member)
                .map(|b| b.key.as_str())
                .unwrap_or(member_rule.member.as_str());
            let member = quoted(&member_rule.member);
            let lookup = Self::lookup(descriptor, key);
            let call = match &member_rule.rule {
                ValidationRule::Required => {
                    format!("rules::required({member}, {lookup}.as_deref(), &mut findings);")
                }
                ValidationRule::Range { min, max } => format!(
                    "rules::range({member}, {lookup}.and_then(|v| coerce::float(&v)), {min:?}, {max:?}, &mut findings);"
                ),
                ValidationRule::Length { min, max } => format!(
                    "rules::length({member}, {lookup}.as_deref(), {min:?}, {max:?}, &mut findings);"
                ),
                ValidationRule::Matches { pattern } => format!(
                    "rules::matches({member}, {lookup}.as_deref(), {}, &mut findings);",
                    quoted(pattern)
                ),
            };
            src.line(&call);
        }
        src.line("findings");
        src.dedent();
        src.line("}");
    }

    fn startup_hook(src: &mut SourceBuilder, has_decorators: bool) {
        src.blank();
        src.line("// bootstrap");
        src.blank();
        if has_decorators {
            src.line("const CONTRIBUTION: ModuleContribution =");
            src.indent();
            src.line("ModuleContribution::new(MODULE, injectable_types, plugin_types)");
            src.indent();
            src.line(".with_decorators(decorator_registrations);");
            src.dedent();
            src.dedent();
        } else {
            src.line("const CONTRIBUTION: ModuleContribution =");
            src.indent();
            src.line("ModuleContribution::new(MODULE, injectable_types, plugin_types);");
            src.dedent();
        }
        src.blank();
        src.line("/// Registers this module's accessors into the process-wide bootstrap.");
        src.line("pub fn register_module() {");
        src.indent();
        src.line("bootstrap::register(CONTRIBUTION);");
        src.dedent();
        src.line("}");
        src.blank();
        src.line("wiregen_runtime::inventory::submit! { CONTRIBUTION }");
    }

    fn construct_ref(descriptor: &InjectableDescriptor) -> Option<String> {
        if let Some(path) = &descriptor.factory {
            Some(rust_path(path))
        } else if descriptor.constructible {
            Some(format!("construct_{}", ident(descriptor.type_id.as_str())))
        } else {
            None
        }
    }

    fn push_record(src: &mut SourceBuilder, head: &str, chain: &[String]) {
        if chain.is_empty() {
            src.line(&format!("records.push({head});"));
            return;
        }
        src.line("records.push(");
        src.indent();
        src.line(head);
        src.indent();
        let last = chain.len() - 1;
        for (i, link) in chain.iter().enumerate() {
            if i == last {
                src.line(&format!("{link},"));
            } else {
                src.line(link);
            }
        }
        src.dedent();
        src.dedent();
        src.line(");");
    }
}

/// Snake identifier from a display name: `billing.OrderHandler` becomes
/// `billing_order_handler`, generic displays flatten their arguments.
fn ident(display: &str) -> String {
    let mut out = String::with_capacity(display.len() + 8);
    let mut prev_lower = false;
    for c in display.chars() {
        if c.is_ascii_alphanumeric() {
            if c.is_ascii_uppercase() {
                if prev_lower {
                    out.push('_');
                }
                out.push(c.to_ascii_lowercase());
                prev_lower = false;
            } else {
                out.push(c);
                prev_lower = true;
            }
        } else {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Pascal identifier from a qualified name: `billing.OrderHandler` becomes
/// `BillingOrderHandler`.
fn pascal(display: &str) -> String {
    let mut out = String::with_capacity(display.len());
    let mut boundary = true;
    for c in display.chars() {
        if c.is_ascii_alphanumeric() {
            if boundary {
                out.push(c.to_ascii_uppercase());
                boundary = false;
            } else {
                out.push(c);
            }
        } else {
            boundary = true;
        }
    }
    out
}

/// Dotted host path as a Rust path. Ids already using `::` pass through.
fn rust_path(id: &str) -> String {
    if id.contains("::") {
        id.to_string()
    } else {
        id.replace('.', "::")
    }
}

/// Rust string literal for embedded data, escaping handled by `Debug`.
fn quoted(s: &str) -> String {
    format!("{s:?}")
}
