pub mod bundle;
pub mod error;
pub mod fields;
pub mod orchestrator;

pub use bundle::OperationBundle;
pub use error::{ErrorKind, ProtocolError, Result};
pub use fields::{Field, FieldMap};
pub use orchestrator::{error_fields, Action, Envelope, HybridCipher};
