use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use crate::constants::path::{
    METADATA_LOCK_ENDPOINT, SECTION_FIRST_PAGE_ENDPOINT, SWC_ENDPOINT,
};
use crate::error::{FetchPriority, ViewerError};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen_futures::JsFuture;

/// Text resources the viewer pulls from the proofreading server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchRequest {
    Skeleton,
    MetadataLock { section: usize },
    SectionFirstPage { section: usize },
}

impl FetchRequest {
    pub fn url(&self) -> String {
        match self {
            FetchRequest::Skeleton => SWC_ENDPOINT.to_string(),
            FetchRequest::MetadataLock { .. } => METADATA_LOCK_ENDPOINT.to_string(),
            FetchRequest::SectionFirstPage { section } => {
                format!("{}{}", SECTION_FIRST_PAGE_ENDPOINT, section)
            }
        }
    }

    pub fn priority(&self) -> FetchPriority {
        match self {
            FetchRequest::Skeleton => FetchPriority::Primary,
            FetchRequest::MetadataLock { .. } | FetchRequest::SectionFirstPage { .. } => {
                FetchPriority::Background
            }
        }
    }

    fn failure(&self, reason: impl Into<String>) -> ViewerError {
        ViewerError::FetchFailure {
            url: self.url(),
            reason: reason.into(),
            priority: self.priority(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchCompletion {
    pub request: FetchRequest,
    pub result: Result<String, ViewerError>,
}

/// Finished fetch, delivered on the frame after the response arrived.
#[derive(Event, Debug, Clone)]
pub struct FetchCompleted(pub FetchCompletion);

/// Completion queue shared with in-flight fetches. The frame loop never waits on it.
#[derive(Resource, Clone, Default)]
pub struct FetchQueue {
    completions: Arc<Mutex<Vec<FetchCompletion>>>,
}

impl FetchQueue {
    pub fn start(&self, request: FetchRequest) {
        debug!("Fetching {}", request.url());

        #[cfg(target_arch = "wasm32")]
        {
            let queue = self.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let result = fetch_text(&request.url())
                    .await
                    .map_err(|reason| request.failure(reason));
                queue.complete(FetchCompletion { request, result });
            });
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = read_native(&request.url()).map_err(|reason| request.failure(reason));
            self.complete(FetchCompletion { request, result });
        }
    }

    pub fn complete(&self, completion: FetchCompletion) {
        if let Ok(mut queue) = self.completions.lock() {
            queue.push(completion);
        }
    }

    pub fn drain(&self) -> Vec<FetchCompletion> {
        if let Ok(mut queue) = self.completions.lock() {
            std::mem::take(&mut *queue)
        } else {
            Vec::new()
        }
    }
}

#[cfg(target_arch = "wasm32")]
async fn fetch_text(url: &str) -> Result<String, String> {
    let window = web_sys::window().ok_or_else(|| "window object not available".to_string())?;

    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("{:?}", e))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|_| "fetch did not return a Response".to_string())?;

    if !response.ok() {
        return Err(format!("HTTP {}", response.status()));
    }

    let text = response.text().map_err(|e| format!("{:?}", e))?;
    JsFuture::from(text)
        .await
        .map_err(|e| format!("{:?}", e))?
        .as_string()
        .ok_or_else(|| "response body is not text".to_string())
}

/// Serve endpoints from files under the native server root.
#[cfg(not(target_arch = "wasm32"))]
fn read_native(url: &str) -> Result<String, String> {
    use crate::constants::path::NATIVE_SERVER_ROOT;

    let path = std::path::Path::new(NATIVE_SERVER_ROOT).join(url.trim_start_matches('/'));
    std::fs::read_to_string(&path).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn drain_fetch_completions(queue: Res<FetchQueue>, mut completed: EventWriter<FetchCompleted>) {
    for completion in queue.drain() {
        completed.write(FetchCompleted(completion));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_and_priorities() {
        assert_eq!(FetchRequest::Skeleton.url(), "/get_swc");
        assert_eq!(FetchRequest::Skeleton.priority(), FetchPriority::Primary);
        assert_eq!(
            FetchRequest::SectionFirstPage { section: 4 }.url(),
            "/retrieve_first_page_of_section/4"
        );
        assert_eq!(
            FetchRequest::MetadataLock { section: 4 }.priority(),
            FetchPriority::Background
        );
    }

    #[test]
    fn primary_failures_block() {
        let error = FetchRequest::Skeleton.failure("HTTP 500");
        assert!(error.is_blocking());
        assert!(!FetchRequest::MetadataLock { section: 0 }
            .failure("HTTP 500")
            .is_blocking());
    }

    #[test]
    fn queue_drains_in_arrival_order() {
        let queue = FetchQueue::default();
        let shared = queue.clone();
        shared.complete(FetchCompletion {
            request: FetchRequest::MetadataLock { section: 1 },
            result: Ok("false".into()),
        });
        shared.complete(FetchCompletion {
            request: FetchRequest::Skeleton,
            result: Ok(String::new()),
        });

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].request, FetchRequest::MetadataLock { section: 1 });
        assert!(queue.drain().is_empty());
    }
}
