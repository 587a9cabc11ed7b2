pub mod connection;
pub mod repository;
pub mod rule_repository;
pub mod schema;
pub mod type_repository;
