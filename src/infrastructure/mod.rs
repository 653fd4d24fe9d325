pub mod id;
pub mod memory_repo;
pub mod seed;
