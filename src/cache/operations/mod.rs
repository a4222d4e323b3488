pub mod memory;
pub mod redis;

pub use memory::MemoryRateLimitStore;
pub use redis::RedisRateLimitStore;
