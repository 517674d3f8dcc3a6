pub mod error;
pub mod run_state;
pub mod shader;
pub mod util;

#[cfg(windows)]
pub mod gfx;
#[cfg(windows)]
pub mod os;

pub use error::{Error, Result};
