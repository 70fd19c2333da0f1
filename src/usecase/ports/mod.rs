pub mod lookup;
pub mod repo;
