pub mod error;
pub use error::*;

pub mod provider;
pub mod reconciler;
pub mod record;

mod wrapper;
