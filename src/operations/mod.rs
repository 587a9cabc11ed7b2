pub mod add;
pub mod import;
pub mod reconcile;
pub mod recurring;
pub mod remove;
pub mod summary;
pub mod types;
