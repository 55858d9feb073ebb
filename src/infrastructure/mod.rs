//! Infrastructure layer providing external service integrations.
//!
//! Durable state on disk, the text-completion service and the submission
//! back end live here.

pub mod persistence;
pub mod submission;
pub mod suggestions;

pub use persistence::*;
pub use submission::*;
pub use suggestions::*;
