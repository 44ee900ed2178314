//! JSON-RPC 2.0 communication layer between the proofreading page and the viewer.
//!
//! The viewer runs inside an iframe. The page drives it with JSON-RPC calls
//! over `postMessage`; the viewer answers requests and pushes notifications
//! back to the parent window.
//!
//! ## Message Flow
//!
//! ```text
//! Page (Parent Window)  <──postMessage──>  Viewer (iframe)
//!        │                                        │
//!        ├─ Request (with ID) ──────────────────> │
//!        │                                        ├─ Decode to ViewerCommand
//!        │ <───────────────── Response (with ID) ─┤
//!        │                                        │
//!        ├─ Notification (no ID) ───────────────> ├─ Decode, no response
//!        │                                        │
//!        │ <────────── Notification (no ID) ─────┤
//! ```
//!
//! Every accepted call becomes a [`commands::ViewerCommand`] event. The
//! systems owning camera, synapse, section and render state read those events
//! in the same frame, so the following render already reflects the change.
//!
//! ## Adding New RPC Methods
//!
//! 1. Add a variant to `ViewerCommand`.
//! 2. Decode its params in `ViewerCommand::from_rpc`:
//!
//! ```rust,ignore
//! "your_method_name" => {
//!     let parsed: YourParams = parse(params, "'field'")?;
//!     Ok(ViewerCommand::YourCommand(parsed.field))
//! }
//! ```
//!
//! 3. Match the variant in the system that owns the affected state.
//!
//! ## Calling From the Page
//!
//! ```typescript
//! viewer.contentWindow.postMessage(JSON.stringify({
//!   jsonrpc: "2.0",
//!   method: "update_synapse",
//!   params: { id: "412_96_1033", colour: "green", persist: true },
//!   id: 1
//! }), "*");
//! ```
//!
//! ## Sending Notifications from the Viewer
//!
//! ```rust,ignore
//! fn your_system(mut rpc: ResMut<WebRpcInterface>) {
//!     rpc.send_notification("event_name", json!({ "data": "value" }));
//! }
//! ```
//!
//! ## Error Handling
//!
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//!
//! Malformed messages are reported through `debug_message` notifications.
//!
//! ## Methods
//!
//! ### Viewport
//! - `resize {width, height}`: Debounced canvas resize
//! - `render`: Request a redraw
//! - `set_post_processing {enabled}`: Toggle the depth-of-field composite
//!
//! ### Camera
//! - `reset_view`: Return to the default pose
//! - `reset_around_first_neuron`: Reframe the first loaded skeleton
//!
//! ### Synapses
//! - `update_synapse {id | index, position?, colour?, size?, persist}`
//! - `select_synapses {ids}`: Highlight and refocus
//!
//! ### Sections
//! - `grey_out_sections {sections}`
//! - `select_section {section}`: Highlight and refocus, `null` clears
//! - `set_abstraction_threshold {threshold}`
//! - `navigate_to_section {section}`: Lock check, then page lookup
//!
//! ### Skeleton
//! - `reload_skeleton`: Fetch and replace the skeleton
//!
//! ### Notifications sent
//! `camera_changed`, `abstraction_position`, `skeleton_loaded`,
//! `navigate_to_page`, `metadata_locked`, `alert`, `loading_progress`,
//! `debug_message`.

/// Decoding of JSON-RPC method calls into typed viewer commands.
pub mod commands;

/// JSON-RPC 2.0 bidirectional communication system for iframe embedding.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
