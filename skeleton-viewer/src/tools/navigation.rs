use bevy::prelude::*;

use crate::engine::loading::fetch::{FetchCompleted, FetchQueue, FetchRequest};
use crate::error::ViewerError;
use crate::rpc::commands::ViewerCommand;
use crate::rpc::web_rpc::WebRpcInterface;

/// Read the lock endpoint's answer: a JSON bool, a `{"locked": ..}` object or bare text.
pub fn parse_lock_response(body: &str) -> Result<bool, ViewerError> {
    let trimmed = body.trim();
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Bool(locked)) => Ok(locked),
        Ok(serde_json::Value::Object(fields)) => fields
            .get("locked")
            .or_else(|| fields.get("is_locked"))
            .and_then(serde_json::Value::as_bool)
            .ok_or_else(|| ViewerError::Payload(format!("lock response {}", trimmed))),
        _ => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(ViewerError::Payload(format!("lock response {}", trimmed))),
        },
    }
}

/// Read the first-page endpoint's answer: a page number, bare or as `{"page": n}`.
pub fn parse_page_response(body: &str) -> Result<u64, ViewerError> {
    let trimmed = body.trim();
    let page = match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(fields)) => fields.get("page").and_then(|page| {
            page.as_u64()
                .or_else(|| page.as_str().and_then(|text| text.parse().ok()))
        }),
        Ok(serde_json::Value::String(text)) => text.trim().parse().ok(),
        Ok(value) => value.as_u64(),
        Err(_) => trimmed.trim_matches('"').parse().ok(),
    };
    page.ok_or_else(|| ViewerError::Payload(format!("page response {}", trimmed)))
}

pub fn handle_navigation_commands(
    mut events: EventReader<ViewerCommand>,
    fetch_queue: Res<FetchQueue>,
) {
    for command in events.read() {
        if let ViewerCommand::NavigateToSection(section) = command {
            fetch_queue.start(FetchRequest::MetadataLock { section: *section });
        }
    }
}

/// Lock check, then first-page lookup, then tell the page where to go.
pub fn handle_navigation_fetches(
    mut completed: EventReader<FetchCompleted>,
    fetch_queue: Res<FetchQueue>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    for FetchCompleted(completion) in completed.read() {
        match (&completion.request, &completion.result) {
            (FetchRequest::MetadataLock { section }, Ok(body)) => match parse_lock_response(body)
            {
                Ok(true) => {
                    info!("Metadata locked, not navigating to section {}", section);
                    rpc_interface.send_notification(
                        "metadata_locked",
                        serde_json::json!({ "section": section }),
                    );
                }
                Ok(false) => {
                    fetch_queue.start(FetchRequest::SectionFirstPage { section: *section });
                }
                Err(e) => error!("Section {} navigation aborted: {}", section, e),
            },
            (FetchRequest::SectionFirstPage { section }, Ok(body)) => {
                match parse_page_response(body) {
                    Ok(page) => rpc_interface.send_notification(
                        "navigate_to_page",
                        serde_json::json!({ "section": section, "page": page }),
                    ),
                    Err(e) => error!("Section {} navigation aborted: {}", section, e),
                }
            }
            (FetchRequest::MetadataLock { .. } | FetchRequest::SectionFirstPage { .. }, Err(e)) => {
                error!("{}", e);
            }
            (FetchRequest::Skeleton, _) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_response_shapes() {
        assert!(parse_lock_response("true").unwrap());
        assert!(!parse_lock_response(" false\n").unwrap());
        assert!(parse_lock_response("True").unwrap());
        assert!(parse_lock_response(r#"{"locked": true}"#).unwrap());
        assert!(!parse_lock_response(r#"{"is_locked": false}"#).unwrap());
        assert!(parse_lock_response("maybe").is_err());
    }

    #[test]
    fn page_response_shapes() {
        assert_eq!(parse_page_response("12").unwrap(), 12);
        assert_eq!(parse_page_response(r#"{"page": 3}"#).unwrap(), 3);
        assert_eq!(parse_page_response(r#"{"page": "8"}"#).unwrap(), 8);
        assert_eq!(parse_page_response(r#""5""#).unwrap(), 5);
        assert!(parse_page_response("-").is_err());
    }
}
