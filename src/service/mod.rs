pub mod auth_service;
pub mod cost_service;
pub mod file_id_service;
pub mod file_service;
pub mod naming_service;
pub mod token_service;
pub mod validation_service;
