//! Tree rewrites shipped as visitor handlers.

pub mod merge;

pub use merge::{MergeKeyNormalizer, MergeOptions};
