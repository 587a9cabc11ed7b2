pub mod entry;
pub mod entry_type;
pub mod money;
pub mod recurring;

pub use entry::LedgerEntry;
pub use entry_type::{Classification, TypeRecord};
pub use money::Money;
pub use recurring::{Cadence, RecurringRule};
