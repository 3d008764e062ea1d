mod entry;
pub use entry::*;

mod resource;
pub use resource::*;

pub mod mapper;
pub use mapper::{to_record, to_resource};

pub type ZoneName = String;
