//! Request/response surface of the inspector.
//!
//! Clients talk to an [`InspectorServer`] with JSON messages framed by
//! `Content-Length` headers, the same framing the Debug Adapter Protocol uses.
//! Every request names a command and carries camelCase arguments:
//!
//! ```text
//! {"seq":1,"type":"request","command":"evaluate","arguments":{"expression":"answer"}}
//! ```
//!
//! Resolution failures answer with `success: false` and the failure text in
//! `message`. A program that raises still answers successfully; the body then
//! carries `wasThrown: true`.

pub mod messages;
pub mod server;
pub mod transport;

pub use messages::*;
pub use server::InspectorServer;
pub use transport::{FramedTransport, MAX_MESSAGE_SIZE, StdioTransport, Transport};

use serde::{Deserialize, Serialize};

/// A framed protocol message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProtocolMessage {
    /// Client to server.
    #[serde(rename = "request")]
    Request(Request),
    /// Server to client, answering one request.
    #[serde(rename = "response")]
    Response(Response),
    /// Server to client, unsolicited.
    #[serde(rename = "event")]
    Event(Event),
}

/// A command sent by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// Client sequence number.
    pub seq: i64,
    /// Command name.
    pub command: String,
    /// Command arguments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<serde_json::Value>,
}

/// The answer to one [`Request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// Server sequence number.
    pub seq: i64,
    /// Sequence number of the answered request.
    pub request_seq: i64,
    /// Whether the command succeeded.
    pub success: bool,
    /// The answered command.
    pub command: String,
    /// Failure description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Command result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

/// A notification from the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Server sequence number.
    pub seq: i64,
    /// Event name.
    pub event: String,
    /// Event payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl ProtocolMessage {
    /// The message's sequence number.
    #[must_use]
    pub fn seq(&self) -> i64 {
        match self {
            Self::Request(r) => r.seq,
            Self::Response(r) => r.seq,
            Self::Event(e) => e.seq,
        }
    }
}
