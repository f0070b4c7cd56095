pub mod builder;
pub mod fc;
pub mod policy;

pub use builder::{ParseBuilder, DEFAULT_TRANSFORM_SUFFIXES};
