//! Schema definitions for RON scripts

pub mod generator;

pub use generator::GeneratorTypeDef;
