//! Driving compiled charts against external holders.

pub mod error;
pub mod holder;
pub mod machine;

pub use error::{HolderError, TransitionError, TransitionErrorKind};
pub use holder::StateHolder;
pub use machine::{Machine, DEFAULT_FIELD};
