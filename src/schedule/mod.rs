pub mod conflicts;
pub mod critical_path;
pub mod tracks;

pub use conflicts::*;
pub use critical_path::*;
pub use tracks::*;
