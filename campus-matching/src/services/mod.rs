pub mod discovery_service;
pub mod profile_service;
pub mod request_service;
