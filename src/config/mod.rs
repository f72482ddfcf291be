//! Configuration management for pointer profiles
//!
//! - **profile**: document model, validation and bootstrap defaults
//! - **persistence** (crate root): where the document lives and how it is read

pub mod profile;

pub use profile::{ConfigStore, Configuration, Profile};
