pub mod expiry_scheduler;
pub mod file_storage;
pub mod settings_cache;
