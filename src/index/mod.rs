pub mod inverted;
pub mod view;

pub use inverted::MemoryIndex;
pub use view::{IndexOpener, IndexView};
