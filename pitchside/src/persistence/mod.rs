pub mod memory_polls;

pub use memory_polls::MemoryPollRepository;
