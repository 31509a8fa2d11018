//! Configuration layers, their on-disk store and the task model

pub mod config;
pub mod models;
pub mod store;

pub use config::{ConfigOverrides, ModelParams, StoredConfig, merge};
pub use models::{DeobfuscateTask, DeobfuscationReport};
pub use store::ConfigStore;
