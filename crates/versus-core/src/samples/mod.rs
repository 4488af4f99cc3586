//! Sample definitions
//!
//! Samples are the rows of the evaluation grid.

mod sample;
mod value;

pub use sample::{NamedArgs, Sample, SampleSet};
pub use value::{UNSERIALIZABLE, render_value, truncate};
