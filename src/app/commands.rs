//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (bus topics,
//! scheduler) that the [`PropService`](super::service::PropService)
//! interprets and acts upon.

/// Commands that adapters and timers can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// A wiring document arrived on the settings topic (raw bytes).
    RemoteConfiguration(Vec<u8>),

    /// A command message arrived on the inbox topic.
    Command(String),

    /// The startup rescue timer fired.
    StartupRescue,

    /// Publish every data item.
    PublishAllData,
}
