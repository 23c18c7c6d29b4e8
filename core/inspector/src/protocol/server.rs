//! Command dispatch.

use super::{Event, ProtocolMessage, Request, Response, Transport, messages::*};
use crate::{
    CallFrameId, FrameRef, InjectedScript, InjectedScriptId, InjectedScriptManager,
    InspectorError, InspectorHost, ProtocolError, RemoteObjectId, Value,
};
use log::{debug, warn};
use rustc_hash::FxHashMap;
use serde::{Serialize, de::DeserializeOwned};
use std::io;

type HandlerResult = Result<Option<serde_json::Value>, ProtocolError>;

/// Serves protocol requests against a set of contexts.
#[derive(Debug)]
pub struct InspectorServer<H> {
    /// The attached contexts.
    manager: InjectedScriptManager<H>,

    /// Top frame of each context that is currently paused.
    paused: FxHashMap<InjectedScriptId, FrameRef>,

    /// Sequence number for responses and events
    seq: i64,
}

impl<H: InspectorHost> InspectorServer<H> {
    /// Creates a server over the contexts of `manager`.
    pub fn new(manager: InjectedScriptManager<H>) -> Self {
        Self {
            manager,
            paused: FxHashMap::default(),
            seq: 1,
        }
    }

    /// The attached contexts.
    pub fn manager(&self) -> &InjectedScriptManager<H> {
        &self.manager
    }

    /// The attached contexts, mutably.
    pub fn manager_mut(&mut self) -> &mut InjectedScriptManager<H> {
        &mut self.manager
    }

    /// Records that `context` is paused with `top` as its innermost frame.
    pub fn pause(&mut self, context: InjectedScriptId, top: FrameRef) {
        debug!("context {context} paused in {}", top.function_name());
        self.paused.insert(context, top);
    }

    /// Forgets the paused stack of `context`.
    pub fn resume(&mut self, context: InjectedScriptId) {
        if self.paused.remove(&context).is_some() {
            debug!("context {context} resumed");
        }
    }

    fn next_seq(&mut self) -> i64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    /// Serves requests from `transport` until the peer closes it.
    ///
    /// Each attached context is announced with a `contextCreated` event first.
    pub fn run<T: Transport>(&mut self, transport: &mut T) -> io::Result<()> {
        let ids: Vec<_> = self.manager.ids().collect();
        for injected_script_id in ids {
            let body = serde_json::to_value(ContextCreatedEventBody { injected_script_id })?;
            let event = self.create_event("contextCreated", Some(body));
            Self::send_message(&event, transport)?;
        }

        while let Some(text) = transport.read_message()? {
            let request = match serde_json::from_str::<ProtocolMessage>(&text) {
                Ok(ProtocolMessage::Request(request)) => request,
                Ok(other) => {
                    warn!("ignoring non-request message {}", other.seq());
                    continue;
                }
                Err(err) => {
                    warn!("discarding malformed message: {err}");
                    continue;
                }
            };

            let response = self.handle_request(request);
            Self::send_message(&response, transport)?;
        }

        debug!("client closed the connection");
        Ok(())
    }

    /// Handles one request and returns its response.
    pub fn handle_request(&mut self, request: Request) -> ProtocolMessage {
        debug!("dispatching {} (seq {})", request.command, request.seq);

        let result = match request.command.as_str() {
            "wrapObject" => self.handle_wrap_object(&request),
            "wrapCallFrames" => self.handle_wrap_call_frames(&request),
            "releaseObject" => self.handle_release_object(&request),
            "releaseObjectGroup" => self.handle_release_object_group(&request),
            "getProperties" => self.handle_get_properties(&request),
            "getInternalProperties" => self.handle_get_internal_properties(&request),
            "getFunctionDetails" => self.handle_get_function_details(&request),
            "evaluate" => self.handle_evaluate(&request),
            "evaluateOnCallFrame" => self.handle_evaluate_on_call_frame(&request),
            "callFunctionOn" => self.handle_call_function_on(&request),
            "restartFrame" => self.handle_restart_frame(&request),
            "getCompletions" => self.handle_get_completions(&request),
            "getPrimitiveTypeCompletions" => self.handle_get_primitive_type_completions(&request),
            "buildArrayFragment" => self.handle_build_array_fragment(&request),
            "buildObjectFragment" => self.handle_build_object_fragment(&request),
            "injectModule" => self.handle_inject_module(&request),
            other => Err(ProtocolError::UnknownCommand(other.to_owned())),
        };

        match result {
            Ok(body) => self.create_response(request.seq, &request.command, true, None, body),
            Err(err) => {
                debug!("{} failed: {err}", request.command);
                self.create_response(
                    request.seq,
                    &request.command,
                    false,
                    Some(err.to_string()),
                    None,
                )
            }
        }
    }

    fn context(
        &mut self,
        id: Option<InjectedScriptId>,
    ) -> Result<&mut InjectedScript<H>, InspectorError> {
        match id {
            Some(id) => self.manager.get_mut(id),
            None => self.manager.default_context(),
        }
    }

    fn owner(
        &mut self,
        object_id: &str,
    ) -> Result<(&mut InjectedScript<H>, RemoteObjectId), InspectorError> {
        let object_id: RemoteObjectId = object_id.parse()?;
        Ok((self.manager.for_object_id(&object_id)?, object_id))
    }

    fn paused_frame(
        &mut self,
        call_frame_id: &str,
    ) -> Result<(&mut InjectedScript<H>, FrameRef, CallFrameId), InspectorError> {
        let call_frame_id: CallFrameId = call_frame_id.parse()?;
        let top = self
            .paused
            .get(&call_frame_id.injected_script_id)
            .cloned()
            .ok_or(InspectorError::CallFrameNotFound)?;
        let script = self.manager.for_call_frame_id(&call_frame_id)?;
        Ok((script, top, call_frame_id))
    }

    fn handle_wrap_object(&mut self, request: &Request) -> HandlerResult {
        let args: WrapObjectArguments = parse_arguments(request)?;
        let script = self.context(args.injected_script_id)?;
        let value = Value::from_json(script.host(), &args.value);
        let result = script.wrap_object(
            &value,
            args.object_group.as_deref(),
            args.can_access_inspected_window,
            args.generate_preview,
        );
        body(&RemoteObjectResponseBody { result })
    }

    fn handle_wrap_call_frames(&mut self, request: &Request) -> HandlerResult {
        let args: WrapCallFramesArguments = parse_optional_arguments(request)?;
        let id = self.context(args.injected_script_id)?.id();
        let top = self.paused.get(&id).cloned();
        let call_frames = self.manager.get_mut(id)?.wrap_call_frames(top);
        body(&CallFramesResponseBody { call_frames })
    }

    fn handle_release_object(&mut self, request: &Request) -> HandlerResult {
        let args: ReleaseObjectArguments = parse_arguments(request)?;
        let Ok(object_id) = args.object_id.parse::<RemoteObjectId>() else {
            return Ok(None);
        };
        if let Ok(script) = self.manager.for_object_id(&object_id) {
            script.release_object(&object_id);
        }
        Ok(None)
    }

    fn handle_release_object_group(&mut self, request: &Request) -> HandlerResult {
        let args: ReleaseObjectGroupArguments = parse_arguments(request)?;
        match args.injected_script_id {
            Some(id) => self.manager.get_mut(id)?.release_object_group(&args.object_group),
            None => self.manager.release_object_group(&args.object_group),
        }
        Ok(None)
    }

    fn handle_get_properties(&mut self, request: &Request) -> HandlerResult {
        let args: GetPropertiesArguments = parse_arguments(request)?;
        let (script, object_id) = self.owner(&args.object_id)?;
        let result = script.get_properties(&object_id, args.own_properties)?;
        body(&GetPropertiesResponseBody { result })
    }

    fn handle_get_internal_properties(&mut self, request: &Request) -> HandlerResult {
        let args: ObjectIdArguments = parse_arguments(request)?;
        let (script, object_id) = self.owner(&args.object_id)?;
        let result = script.get_internal_properties(&object_id)?;
        body(&GetInternalPropertiesResponseBody { result })
    }

    fn handle_get_function_details(&mut self, request: &Request) -> HandlerResult {
        let args: GetFunctionDetailsArguments = parse_arguments(request)?;
        let (script, function_id) = self.owner(&args.function_id)?;
        let details = script.get_function_details(&function_id)?;
        body(&GetFunctionDetailsResponseBody { details })
    }

    fn handle_evaluate(&mut self, request: &Request) -> HandlerResult {
        let args: EvaluateArguments = parse_arguments(request)?;
        let script = self.context(args.injected_script_id)?;
        let result = script.evaluate(
            &args.expression,
            args.object_group.as_deref(),
            args.include_command_line_api,
            args.return_by_value,
            args.generate_preview,
        );
        body(&result)
    }

    fn handle_evaluate_on_call_frame(&mut self, request: &Request) -> HandlerResult {
        let args: EvaluateOnCallFrameArguments = parse_arguments(request)?;
        let (script, top, call_frame_id) = self.paused_frame(&args.call_frame_id)?;
        let result = script.evaluate_on_call_frame(
            &top,
            &call_frame_id,
            &args.expression,
            args.object_group.as_deref(),
            args.include_command_line_api,
            args.return_by_value,
            args.generate_preview,
        )?;
        body(&result)
    }

    fn handle_call_function_on(&mut self, request: &Request) -> HandlerResult {
        let args: CallFunctionOnArguments = parse_arguments(request)?;
        let (script, object_id) = self.owner(&args.object_id)?;
        let result = script.call_function_on(
            &object_id,
            &args.function_declaration,
            &args.arguments,
            args.return_by_value,
        )?;
        body(&result)
    }

    fn handle_restart_frame(&mut self, request: &Request) -> HandlerResult {
        let args: RestartFrameArguments = parse_arguments(request)?;
        let (script, top, call_frame_id) = self.paused_frame(&args.call_frame_id)?;
        script.restart_frame(&top, &call_frame_id)?;
        let call_frames = script.wrap_call_frames(Some(top));
        body(&CallFramesResponseBody { call_frames })
    }

    fn handle_get_completions(&mut self, request: &Request) -> HandlerResult {
        let args: ObjectIdArguments = parse_arguments(request)?;
        let (script, object_id) = self.owner(&args.object_id)?;
        let completions = script.get_completions(&object_id)?;
        body(&CompletionsResponseBody { completions })
    }

    fn handle_get_primitive_type_completions(&mut self, request: &Request) -> HandlerResult {
        let args: GetPrimitiveTypeCompletionsArguments = parse_arguments(request)?;
        let script = self.context(args.injected_script_id)?;
        let completions = script.get_primitive_type_completions(&args.type_name);
        body(&CompletionsResponseBody { completions })
    }

    fn handle_build_array_fragment(&mut self, request: &Request) -> HandlerResult {
        let args: BuildArrayFragmentArguments = parse_arguments(request)?;
        let (script, object_id) = self.owner(&args.object_id)?;
        let result = script.build_array_fragment(&object_id, args.from_index, args.to_index)?;
        body(&RemoteObjectResponseBody { result })
    }

    fn handle_build_object_fragment(&mut self, request: &Request) -> HandlerResult {
        let args: ObjectIdArguments = parse_arguments(request)?;
        let (script, object_id) = self.owner(&args.object_id)?;
        let result = script.build_object_fragment(&object_id)?;
        body(&RemoteObjectResponseBody { result })
    }

    fn handle_inject_module(&mut self, request: &Request) -> HandlerResult {
        let args: InjectModuleArguments = parse_arguments(request)?;
        let script = self.context(args.injected_script_id)?;
        let instance = script.inject_module(&args.name, &args.source)?;
        let result = script.wrap(&instance, None, false, false);
        body(&RemoteObjectResponseBody { result })
    }

    /// Creates a response message
    fn create_response(
        &mut self,
        request_seq: i64,
        command: &str,
        success: bool,
        message: Option<String>,
        body: Option<serde_json::Value>,
    ) -> ProtocolMessage {
        ProtocolMessage::Response(Response {
            seq: self.next_seq(),
            request_seq,
            success,
            command: command.to_owned(),
            message,
            body,
        })
    }

    /// Creates an event message
    pub fn create_event(
        &mut self,
        event: &str,
        body: Option<serde_json::Value>,
    ) -> ProtocolMessage {
        ProtocolMessage::Event(Event {
            seq: self.next_seq(),
            event: event.to_owned(),
            body,
        })
    }

    /// Sends a protocol message
    fn send_message<T: Transport>(message: &ProtocolMessage, transport: &mut T) -> io::Result<()> {
        let json = serde_json::to_string(message)?;
        transport.write_message(&json)
    }
}

fn parse_arguments<T: DeserializeOwned>(request: &Request) -> Result<T, ProtocolError> {
    serde_json::from_value(
        request
            .arguments
            .clone()
            .unwrap_or(serde_json::Value::Null),
    )
    .map_err(ProtocolError::InvalidArguments)
}

fn parse_optional_arguments<T: DeserializeOwned + Default>(
    request: &Request,
) -> Result<T, ProtocolError> {
    match &request.arguments {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(_) => parse_arguments(request),
    }
}

fn body<T: Serialize>(value: &T) -> HandlerResult {
    serde_json::to_value(value)
        .map(Some)
        .map_err(ProtocolError::Serialize)
}
