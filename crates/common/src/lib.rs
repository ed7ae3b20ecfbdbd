//! Shared value types used by every shadowlock crate.

mod types;

pub use types::{Color, Transform};
