//! GazeFlow wire protocol.
//!
//! This module contains:
//! - Varint and length-prefixed string primitives
//! - Sample payload parsing
//! - The connection state machine

pub mod client;
pub mod codec;
pub mod sample;

pub use client::{ClientConfig, ClientState, GazeSessionClient, ShutdownHandle};
pub use codec::{
    decode_length_prefixed_string, decode_varint, encode_length_prefixed_string, encode_varint,
};
pub use sample::{parse_sample, GazeSample};

/// Result format declared by the client right after connecting. Sent as-is,
/// without a length prefix.
pub const RESULT_FORMAT: &[u8; 3] = b"xml";

/// Default GazeFlow API port.
pub const DEFAULT_PORT: u16 = 43333;

/// Demo application key accepted by GazeFlow.
pub const DEFAULT_APP_KEY: &str = "AppKeyDemo";
