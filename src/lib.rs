pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::adapters::storage::LocalStorage;
pub use crate::config::StackConfig;
pub use crate::core::{document::StackDocument, etl::EtlEngine, pipeline::StackPipeline};
pub use crate::utils::error::{Result, StackError};
