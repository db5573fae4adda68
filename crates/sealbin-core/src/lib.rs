//! sealbin-core: shared types for the sealbin zero-knowledge paste service
//!
//! The server only ever sees ciphertext. Everything that crosses the wire is
//! defined here: the base64url codec used for all binary fields, the JSON
//! request/response types, the configuration schema, and the error taxonomy
//! shared by client and server.

pub mod config;
pub mod encoding;
pub mod error;
pub mod wire;

pub use encoding::{decode, encode, DecodeError};
pub use error::{SealbinError, SealbinResult};
