//! Conflict detection, resolution and the per-user drain processor

mod detector;
mod processor;
mod resolver;

pub use detector::detect_conflicts;
pub use processor::SyncProcessor;
pub use resolver::resolve_conflicts;
