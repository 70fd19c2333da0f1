pub mod form_machine;
pub mod record_service;
