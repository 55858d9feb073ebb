pub mod models;
pub mod validation;
pub mod errors;

pub use models::*;
pub use validation::*;
pub use errors::*;
