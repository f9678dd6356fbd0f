#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`error`]: 전송 계층 에러 (`QueueError`)
//! - [`store`]: 큐 저장소 추상화 (`QueueStore` trait)
//! - [`redis_queue`]: Redis 구현 (`RedisQueue`)
//! - [`memory`]: 인메모리 구현 (`MemoryQueue`)
//! - [`claim`]: 처리 중 클레임 (`ClaimList`, `Claim`, `ClaimRelease`)

pub mod claim;
pub mod error;
pub mod memory;
pub mod redis_queue;
pub mod store;

pub use claim::{CLAIM_PREFIX, Claim, ClaimList, ClaimRelease};
pub use error::QueueError;
pub use memory::MemoryQueue;
pub use redis_queue::RedisQueue;
pub use store::QueueStore;
