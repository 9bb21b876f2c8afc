//! Text primitives shared by every pipeline stage.
//!
//! # Responsibility
//! - Flatten heterogeneous model output into plain strings.
//! - Derive stemmed identity keys for concept names.
//! - Recover structured values from loosely formatted model replies.
//!
//! # Invariants
//! - Nothing in this module touches storage or the network.

pub mod json;
pub mod normalize;
pub mod stem;

pub use json::parse_lenient;
pub use normalize::{
    normalize_value, strip_answer_leak, word_count, NormalizeMode, Strictness, Text, TextError,
};
pub use stem::stem;
