pub mod low_memory;

pub use low_memory::{LowMemoryHandler, LowMemoryNotifier, LowMemoryRegistration};
