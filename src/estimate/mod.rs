pub mod fusion;
pub mod history;

pub use fusion::*;
pub use history::*;
