// Import/export of ledger data in machine-readable formats

pub mod export;

pub use export::*;
