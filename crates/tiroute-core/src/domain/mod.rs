//! Domain model (IDs, task records, envelopes, bus messages, errors).

pub mod envelope;
pub mod errors;
pub mod ids;
pub mod message;
pub mod section;
pub mod task;

pub use self::envelope::{ModuleRequest, RequestEnvelope};
pub use self::errors::{DecodeError, DispatchError, RegistryError, RoutingError, ValidationError};
pub use self::ids::TaskId;
pub use self::message::{
    ModuleReport, Notification, NotificationType, ReportNotification, RoutedMessage, UserMessage,
};
pub use self::section::Section;
pub use self::task::{NewTask, TaskParameters, TaskRecord};
