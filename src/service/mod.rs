pub mod cloud_registry;
pub mod cloud_remote;
pub mod cloud_source;
pub mod local_scan;
pub mod recency;
pub mod render;
pub mod timestamp;
