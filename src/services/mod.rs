pub mod audit_log;
pub mod classifier;
pub mod media_store;
pub mod post_index;
pub mod user_store;
