// Application layer - use cases and orchestration on top of the domain rules
// and the repository.

pub mod error;
mod locks;
pub mod reporting;
mod service;

pub use error::*;
pub use locks::AccountLocks;
pub use reporting::*;
pub use service::*;
