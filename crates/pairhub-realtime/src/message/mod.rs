//! Wire protocol: frame types and the stable error-code space.

pub mod codes;
pub mod frames;

pub use codes::{CLOSE_AUTH_FAILURE, CLOSE_SUPERSEDED, ErrorCode};
pub use frames::ServerFrame;
