//! Typed arguments and bodies of the protocol commands.

#![allow(missing_docs)]

use crate::{
    CallArgument, CallFrameProxy, FunctionDetails, InjectedScriptId, InternalPropertyDescriptor,
    PropertyDescriptor, RemoteObject,
};
use serde::{Deserialize, Serialize};

fn yes() -> bool {
    true
}

// ============================================================================
// Request Arguments
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapObjectArguments {
    pub value: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_group: Option<String>,
    #[serde(default = "yes")]
    pub can_access_inspected_window: bool,
    #[serde(default)]
    pub generate_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_script_id: Option<InjectedScriptId>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapCallFramesArguments {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_script_id: Option<InjectedScriptId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseObjectArguments {
    pub object_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseObjectGroupArguments {
    pub object_group: String,
    /// Releases the group in every context when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_script_id: Option<InjectedScriptId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesArguments {
    pub object_id: String,
    #[serde(default)]
    pub own_properties: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectIdArguments {
    pub object_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFunctionDetailsArguments {
    pub function_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateArguments {
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_group: Option<String>,
    #[serde(default)]
    pub include_command_line_api: bool,
    #[serde(default)]
    pub return_by_value: bool,
    #[serde(default)]
    pub generate_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_script_id: Option<InjectedScriptId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateOnCallFrameArguments {
    pub call_frame_id: String,
    pub expression: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_group: Option<String>,
    #[serde(default)]
    pub include_command_line_api: bool,
    #[serde(default)]
    pub return_by_value: bool,
    #[serde(default)]
    pub generate_preview: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFunctionOnArguments {
    pub object_id: String,
    pub function_declaration: String,
    #[serde(default)]
    pub arguments: Vec<CallArgument>,
    #[serde(default)]
    pub return_by_value: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestartFrameArguments {
    pub call_frame_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPrimitiveTypeCompletionsArguments {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_script_id: Option<InjectedScriptId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildArrayFragmentArguments {
    pub object_id: String,
    pub from_index: u32,
    pub to_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InjectModuleArguments {
    pub name: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_script_id: Option<InjectedScriptId>,
}

// ============================================================================
// Response Bodies
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteObjectResponseBody {
    pub result: RemoteObject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFramesResponseBody {
    pub call_frames: Vec<CallFrameProxy>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPropertiesResponseBody {
    pub result: Vec<PropertyDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInternalPropertiesResponseBody {
    pub result: Vec<InternalPropertyDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetFunctionDetailsResponseBody {
    pub details: FunctionDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionsResponseBody {
    pub completions: Vec<String>,
}

// ============================================================================
// Event Bodies
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextCreatedEventBody {
    pub injected_script_id: InjectedScriptId,
}
