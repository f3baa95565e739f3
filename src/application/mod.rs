pub mod batcher;
pub mod key_pool;
pub mod services;
