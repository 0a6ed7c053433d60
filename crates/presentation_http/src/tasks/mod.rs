//! Background tasks

mod quota_purge;

pub use quota_purge::spawn_quota_purge_task;
