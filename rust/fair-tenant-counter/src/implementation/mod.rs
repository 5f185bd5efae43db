mod memory;
mod tracking;

pub use memory::*;
pub use tracking::*;

#[cfg(all(feature = "redis", not(target_arch = "wasm32")))]
mod redis_store;

#[cfg(all(feature = "redis", not(target_arch = "wasm32")))]
pub use redis_store::*;
