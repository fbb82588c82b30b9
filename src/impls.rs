pub mod storer;
pub mod tokener;
