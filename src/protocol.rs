// CLASSIFICATION: COMMUNITY
// Filename: protocol.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Worker provider protocol message types.
//!
//! Every frame is a JSON array `[typeCode, payload]`. The type codes are
//! shared with provider implementations and must not be renumbered.

use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Descriptive key/value pairs a provider advertises when it registers.
pub type Attributes = Map<String, Value>;

/// Message type codes a provider may send before it is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u64)]
pub enum WorkerProviderMessageType {
    /// Registration request carrying the provider attributes.
    Register = 1,
}

impl WorkerProviderMessageType {
    /// Wire code for this message type.
    pub const fn code(self) -> u64 {
        self as u64
    }

    /// Map a wire code back to a known message type.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            1 => Some(Self::Register),
            _ => None,
        }
    }
}

/// Raw `[typeCode, payload]` envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub type_code: u64,
    pub payload: Value,
}

impl Envelope {
    pub fn new(kind: WorkerProviderMessageType, payload: Value) -> Self {
        Self { type_code: kind.code(), payload }
    }

    /// Decode a single text frame.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let value: Value = serde_json::from_str(frame.trim())?;
        let mut items = match value {
            Value::Array(items) if items.len() == 2 => items,
            Value::Array(items) => return Err(ProtocolError::Arity(items.len())),
            _ => return Err(ProtocolError::Arity(0)),
        };
        let payload = items.pop().unwrap_or(Value::Null);
        let type_code = items
            .pop()
            .and_then(|code| code.as_u64())
            .ok_or(ProtocolError::TypeCode)?;
        Ok(Self { type_code, payload })
    }

    /// Encode as a single text frame without a trailing newline.
    pub fn encode(&self) -> String {
        Value::Array(vec![Value::from(self.type_code), self.payload.clone()]).to_string()
    }
}

/// Decoded message from a connection that has not registered yet.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderMessage {
    /// Registration with the advertised attributes.
    Register(Attributes),
    /// A well-formed envelope the handshake does not act on.
    Unknown(u64),
}

impl ProviderMessage {
    /// Decode a text frame into a tagged message.
    ///
    /// A `register` frame whose payload is `null` registers with no
    /// attributes. Any other non-object payload is reported as
    /// [`ProviderMessage::Unknown`] so the handshake ignores it.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let envelope = Envelope::decode(frame)?;
        let message = match WorkerProviderMessageType::from_code(envelope.type_code) {
            Some(WorkerProviderMessageType::Register) => match envelope.payload {
                Value::Object(attributes) => Self::Register(attributes),
                Value::Null => Self::Register(Attributes::new()),
                _ => Self::Unknown(envelope.type_code),
            },
            None => Self::Unknown(envelope.type_code),
        };
        Ok(message)
    }

    /// Encode back into a wire frame.
    pub fn encode(&self) -> String {
        match self {
            Self::Register(attributes) => Envelope::new(
                WorkerProviderMessageType::Register,
                Value::Object(attributes.clone()),
            )
            .encode(),
            Self::Unknown(code) => Envelope {
                type_code: *code,
                payload: Value::Null,
            }
            .encode(),
        }
    }
}
