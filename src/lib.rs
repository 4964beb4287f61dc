pub mod config;

pub mod cmd;

pub use cmd::Command;

mod connection;

pub use connection::Connection;

pub mod frame;

pub use frame::Frame;

mod db;

pub use db::{Db, DbDropGuard};

mod ds;

mod executor;

pub mod persist;

pub mod server;

mod shutdown;

use shutdown::Shutdown;

mod store;

pub mod utils;

/// Default port that a carmine server listens on.
///
/// Used if no port is specified.
pub const DEFAULT_PORT: &str = "6380";

/// Error returned by most functions.
///
/// When writing a real application, one might want to consider a specialized
/// error handling crate or defining an error type as an `enum` of causes.
/// However, for our example, using a boxed `std::error::Error` is sufficient.
///
/// For performance reasons, boxing is avoided in any hot path. For example, in
/// `connection`, a custom error `enum` is defined. This is because the error is
/// hit and handled during normal execution when a malformed frame is received
/// on a socket. `std::error::Error` is implemented for `connection::Error`
/// which allows it to be converted to `Box<dyn std::error::Error>`.
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for carmine operations.
///
/// This is defined as a convenience.
pub type Result<T> = std::result::Result<T, Error>;
