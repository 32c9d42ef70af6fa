pub mod config;
pub mod constants;
pub mod converter;
pub mod error;
pub mod files;
pub mod logging;
pub mod migrate;
pub mod property;
pub mod registry;
pub mod rules;

pub use converter::Converter;
pub use error::{ConvertError, Result};
pub use registry::{FrozenRegistry, TypeRegistry};
