//! Task processing: one input file in, one deobfuscated file out

pub mod deobfuscate;

pub use deobfuscate::{deobfuscate_task, ensure_api_key};
