/// SWC text of the neuron under review.
pub const SWC_ENDPOINT: &str = "/get_swc";

/// Whether the section metadata is locked by another reviewer.
pub const METADATA_LOCK_ENDPOINT: &str = "/is_metadata_locked";

/// Prefix of the first-page lookup; the section index is appended.
pub const SECTION_FIRST_PAGE_ENDPOINT: &str = "/retrieve_first_page_of_section/";

/// Page data JSON, relative to the asset root.
pub const PAGE_DATA_PATH: &str = "page_data.json";

/// Directory standing in for the web server on native builds.
pub const NATIVE_SERVER_ROOT: &str = "assets/server";

pub const CANVAS_SELECTOR: &str = "#skeleton-viewer";
