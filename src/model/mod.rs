pub mod capacity;
pub mod dependency;
pub mod estimate;
pub mod task;

pub use capacity::*;
pub use dependency::*;
pub use estimate::*;
pub use task::*;
