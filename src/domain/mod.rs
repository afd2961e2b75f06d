mod account;
mod ledger;
mod loan;
mod money;
mod report;
mod transaction;

pub use account::*;
pub use ledger::*;
pub use loan::*;
pub use money::*;
pub use report::*;
pub use transaction::*;
