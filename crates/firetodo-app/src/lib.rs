/*
[INPUT]:  Public API exports for firetodo-app crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod auth_messages;
pub mod config;
pub mod notify;
pub mod session;
pub mod task;

// Re-export main types for convenience
pub use config::AppConfig;
pub use notify::{Notification, NotificationLevel, Notifier};
pub use session::{SessionError, SessionOptions, SessionSnapshot, TodoSession};
pub use task::{NewTask, Task, TaskPatch};
