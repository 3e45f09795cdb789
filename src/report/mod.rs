pub mod html;
pub mod record;
pub mod store;

pub use record::{Hop, ProbeRecord};
pub use store::{History, Report};
