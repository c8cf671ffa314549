pub mod connect;
pub mod matcher;
pub mod mem;
pub mod snapshot;
pub mod traits;

pub use connect::{connect, StoreUrl};
pub use mem::InMemoryStore;
pub use traits::*;
