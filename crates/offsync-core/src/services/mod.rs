//! Service layer shared by offsync front ends

mod sync_service;

pub use sync_service::SyncService;
