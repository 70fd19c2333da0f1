pub mod repo;
pub mod workbook;
