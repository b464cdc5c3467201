pub mod file;
pub mod song;

pub use file::*;
pub use song::*;
