//! Application layer managing state and workflows.
//!
//! This module coordinates between the domain layer and presentation layer:
//! the persisted draft, the step machine, the UI state and the background
//! work it starts.

pub mod draft;
pub mod events;
pub mod state;
pub mod supervisor;
pub mod tasks;
pub mod wizard;

pub use draft::*;
pub use events::*;
pub use state::*;
pub use supervisor::*;
pub use tasks::*;
pub use wizard::*;
