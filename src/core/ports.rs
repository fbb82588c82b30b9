#[cfg(test)]
pub mod memory;
pub mod repository;
pub mod storer;
pub mod tokener;
