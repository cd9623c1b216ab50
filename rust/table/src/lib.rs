//! Chat-channel table for Xì Dách.
//!
//! A [`SessionRegistry`] keeps one [`Session`] per channel and turns
//! [`TableRequest`]s from a chat transport into [`TableEvent`]s for it to
//! render. The transport itself (buttons, private messages, commands) lives
//! outside this crate.

pub mod announce;
pub mod errors;
pub mod events;
pub mod logging;
pub mod registry;
pub mod requests;
pub mod session;
pub mod settings;

pub use errors::{ActionError, ErrorSeverity, IntoRejection, Rejection};
pub use events::{AnnouncementKind, EventBus, EventSubscription, OfferedAction, TableEvent};
pub use logging::{LogEntry, TestLogSubscriber, init_logging, init_test_logging};
pub use registry::{SessionRegistry, ShuffleFactory};
pub use requests::{ActorId, ChannelKey, GameId, TableAction, TableRequest};
pub use session::{HandSnapshot, Session, SessionSnapshot, SessionState};
pub use settings::{SettingsError, TableSettings, ValueSource};
