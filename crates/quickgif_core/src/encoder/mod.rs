//! External encoder invocation.
//!
//! - [`command`] builds the literal argument vector
//! - [`supervisor`] launches the process, drains both pipes and waits for
//!   the exit status
//!
//! Arguments are always passed as a vector, never through a shell.

pub mod command;
pub mod supervisor;

pub use command::{scale_pad_filter, EncoderCommand};
pub use supervisor::{
    check_encoder, find_on_path, DiagnosticSink, EncoderOutcome, EncoderSupervisor,
};
