use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::commands::{CommandError, ViewerCommand};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    #[serde(default)]
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Resource managing bidirectional RPC communication between the page and the viewer.
/// Handles both request-response patterns and notification broadcasting.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the page without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    /// Queue response for transmission to the page.
    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }
}

/// Plugin establishing the postMessage RPC layer for iframe embedding.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_event::<ViewerCommand>()
            .add_systems(PreUpdate, (process_incoming_messages, handle_rpc_messages).chain())
            .add_systems(Last, send_outgoing_messages);

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();

            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    let Some(window) = window() else {
        error!("Window object not available, RPC listener not registered");
        return;
    };
    if let Err(e) =
        window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
    {
        error!("Failed to register message listener: {:?}", e);
        return;
    }

    // Ownership passes to JS for the lifetime of the page.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

/// Resource wrapping thread-safe message queue for WASM event handling.
#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Event representing incoming RPC message from the page.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut commands: EventWriter<ViewerCommand>,
) {
    for event in events.read() {
        rpc_interface.send_notification(
            "debug_message",
            serde_json::json!({
                "message": format!("Received RPC: {}", event.content)
            }),
        );

        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                if let Some(response) = handle_rpc_request(&request, &mut commands) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                rpc_interface.send_notification(
                    "debug_message",
                    serde_json::json!({
                        "message": format!("Parse error: {}", parse_error)
                    }),
                );
            }
        }
    }
}

/// Decode a request into a viewer command and dispatch it.
///
/// Notifications (no id) are dispatched too but never answered.
fn handle_rpc_request(
    request: &RpcRequest,
    commands: &mut EventWriter<ViewerCommand>,
) -> Option<RpcResponse> {
    let result = dispatch(request, commands);
    let id = request.id.clone()?;

    Some(match result {
        Ok(result_value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    })
}

fn dispatch(
    request: &RpcRequest,
    commands: &mut EventWriter<ViewerCommand>,
) -> Result<serde_json::Value, RpcError> {
    let command = ViewerCommand::from_rpc(&request.method, &request.params).map_err(|e| {
        warn!("Rejected RPC {}: {}", request.method, e);
        RpcError::from(e)
    })?;

    debug!("RPC {} dispatched as {:?}", request.method, command);
    commands.write(command);

    Ok(serde_json::json!({
        "success": true,
        "method": request.method
    }))
}

/// Send queued notifications and responses to the page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

/// Send serialized message to the parent window.
fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn method_not_found(method: &str) -> Self {
        Self {
            code: -32601,
            message: "Method not found".to_string(),
            data: Some(serde_json::json!({ "method": method })),
        }
    }

    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }
}

impl From<CommandError> for RpcError {
    fn from(error: CommandError) -> Self {
        match error {
            CommandError::UnknownMethod(method) => RpcError::method_not_found(&method),
            CommandError::InvalidParams(message) => RpcError::invalid_params(&message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::RunSystemOnce;

    fn run(message: &str) -> (Vec<ViewerCommand>, Vec<RpcResponse>) {
        let mut world = World::new();
        world.init_resource::<WebRpcInterface>();
        world.init_resource::<Events<IncomingRpcMessage>>();
        world.init_resource::<Events<ViewerCommand>>();
        world.send_event(IncomingRpcMessage {
            content: message.to_string(),
        });

        world
            .run_system_once(handle_rpc_messages)
            .expect("rpc handler runs");

        let commands = world
            .resource_mut::<Events<ViewerCommand>>()
            .drain()
            .collect();
        let responses = world
            .resource_mut::<WebRpcInterface>()
            .outgoing_responses
            .drain(..)
            .collect();
        (commands, responses)
    }

    #[test]
    fn requests_dispatch_and_answer() {
        let (commands, responses) =
            run(r#"{"jsonrpc":"2.0","method":"reset_view","params":null,"id":7}"#);
        assert_eq!(commands, vec![ViewerCommand::ResetView]);
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].id, Some(serde_json::json!(7)));
        assert!(responses[0].error.is_none());
    }

    #[test]
    fn notifications_dispatch_silently() {
        let (commands, responses) = run(r#"{"jsonrpc":"2.0","method":"render"}"#);
        assert_eq!(commands, vec![ViewerCommand::Render]);
        assert!(responses.is_empty());
    }

    #[test]
    fn errors_carry_json_rpc_codes() {
        let (commands, responses) = run(r#"{"jsonrpc":"2.0","method":"fly","params":{},"id":1}"#);
        assert!(commands.is_empty());
        assert_eq!(responses[0].error.as_ref().map(|e| e.code), Some(-32601));

        let (_, responses) = run(
            r#"{"jsonrpc":"2.0","method":"grey_out_sections","params":{"sections":"x"},"id":2}"#,
        );
        assert_eq!(responses[0].error.as_ref().map(|e| e.code), Some(-32602));
    }
}
