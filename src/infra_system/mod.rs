mod os_entropy;
mod system_clock;

pub use os_entropy::*;
pub use system_clock::*;
