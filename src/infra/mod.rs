pub mod viacep;
pub mod xlsx;
