pub mod source;

pub use source::{SyntheticVideoSource, VideoSource};
