mod types;
pub use types::*;

mod memory;
pub use memory::{MemoryBackend, Op};

pub mod unifi;
pub use unifi::{Auth, Unifi, UnifiCfg};
