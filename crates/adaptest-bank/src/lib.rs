//! adaptest-bank — item bank loading, validation, and synthetic generation.
//!
//! Persistence is external to the core: this crate turns JSON item/parameter
//! files and TOML blueprint files into the core data model, flags data
//! integrity problems without failing the hot path, and can fabricate
//! reproducible synthetic banks for simulations.

pub mod generator;
pub mod parser;

pub use generator::{generate_bank, GeneratorConfig};
pub use parser::{
    load_blueprint, load_items, load_parameters, validate_bank, LoadedParameters,
    ValidationWarning,
};
