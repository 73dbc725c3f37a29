pub mod backup_instance;
pub mod cloud_record;
pub mod config;
pub mod config_validator;
pub mod error;
pub mod snapshot;
