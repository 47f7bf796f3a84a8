pub mod common;
pub mod conflicts;
pub mod drain;
pub mod enqueue;
pub mod list;
pub mod status;
