use serde::Serialize;

/// Successful boundary response carrying a payload.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Envelope<T> {
    pub payload: T,
    pub success: bool,
    pub message: String,
}

impl<T> Envelope<T> {
    pub fn ok(payload: T, message: impl Into<String>) -> Self {
        Self { payload, success: true, message: message.into() }
    }
}

/// Payload-less acknowledgement returned by deletion.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}

impl Ack {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }
}
