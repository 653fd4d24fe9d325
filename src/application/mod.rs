pub mod envelope;
pub mod failure;
pub mod filter;
pub mod todo_service;
mod todo_service_tests;
