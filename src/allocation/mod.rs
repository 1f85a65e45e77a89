pub mod allocator;

pub use allocator::*;
