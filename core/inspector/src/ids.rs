//! Opaque identifiers handed to clients.
//!
//! Both id kinds are structured tokens that travel as JSON text, e.g.
//! `{"injectedScriptId":1,"id":7}` and `{"ordinal":0,"injectedScriptId":1}`.

use crate::InspectorError;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{fmt, str::FromStr};

/// Identifies one session context (one inspected world).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InjectedScriptId(pub u32);

impl fmt::Display for InjectedScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawObjectId {
    injected_script_id: u32,
    id: u64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCallFrameId {
    ordinal: usize,
    injected_script_id: u32,
}

/// A handle to a bound value: owning context plus local sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteObjectId {
    /// The context that owns the binding.
    pub injected_script_id: InjectedScriptId,
    /// The context-local sequence number.
    pub id: u64,
}

impl fmt::Display for RemoteObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"injectedScriptId\":{},\"id\":{}}}",
            self.injected_script_id, self.id
        )
    }
}

impl FromStr for RemoteObjectId {
    type Err = InspectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: RawObjectId = serde_json::from_str(s)
            .map_err(|_| InspectorError::MalformedObjectId(s.to_owned()))?;
        Ok(Self {
            injected_script_id: InjectedScriptId(raw.injected_script_id),
            id: raw.id,
        })
    }
}

/// Identifies a frame of the paused stack: owning context plus ordinal from the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallFrameId {
    /// 0 is the top frame.
    pub ordinal: usize,
    /// The context whose stack this frame belongs to.
    pub injected_script_id: InjectedScriptId,
}

impl fmt::Display for CallFrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"ordinal\":{},\"injectedScriptId\":{}}}",
            self.ordinal, self.injected_script_id
        )
    }
}

impl FromStr for CallFrameId {
    type Err = InspectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: RawCallFrameId = serde_json::from_str(s)
            .map_err(|_| InspectorError::MalformedCallFrameId(s.to_owned()))?;
        Ok(Self {
            ordinal: raw.ordinal,
            injected_script_id: InjectedScriptId(raw.injected_script_id),
        })
    }
}

macro_rules! textual_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(de::Error::custom)
            }
        }
    };
}

textual_serde!(RemoteObjectId);
textual_serde!(CallFrameId);
