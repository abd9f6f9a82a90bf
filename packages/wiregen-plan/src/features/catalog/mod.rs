//! Symbol catalog construction (stage 1)

mod builder;

pub use builder::{ClosedDecoratorUse, OptionsSeed, SymbolCatalog, SymbolCatalogBuilder};
