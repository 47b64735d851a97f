pub mod memory;

pub use memory::{InMemoryJobStore, MemoryConfig};
