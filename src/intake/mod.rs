//! File intake: the chosen file, its type check, and the read/decode pipeline.

mod file;
mod pipeline;
mod validator;

pub use file::{declared_type_for, ChosenFile};
pub use pipeline::{IntakePipeline, ReadCompletion, ReadError, ReadRequest};
pub use validator::{check_type, FileTypeError, ALLOWED_MIME_TYPES};
