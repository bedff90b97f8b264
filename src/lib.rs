//! dmdesc - dependency manager descriptor compiler
//!
//! dmdesc turns the annotations found on component classes (as reported by a
//! class scanner) into the line-oriented descriptors a dependency-injection
//! runtime reads at startup, together with the imported/exported service
//! names and optional configuration metadata.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer
//! - `config`: Configuration file loading and parsing
//! - `core`: Annotation collector and descriptor model
//! - `error`: Compile error taxonomy
//! - `pipeline`: Parallel multi-class builds

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod pipeline;
