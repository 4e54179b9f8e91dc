pub mod import;
pub mod program;
pub mod util;

pub use import::*;
pub use program::*;
pub use util::*;
