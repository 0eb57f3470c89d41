pub mod control;
pub mod control_result;

pub use control::{AcsAction, AcsControl};
pub use control_result::{AcsControlResult, AcsStatus};
