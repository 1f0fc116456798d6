pub mod anchors;
pub mod annotate;
pub mod document;
pub mod emit;
pub mod etl;
pub mod pipeline;
pub mod volumes;

pub use crate::domain::model::{DynamicValues, RunSummary, StackFile, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
