//! API paths of the analysis service.

pub const CHECK_STATUS: &str = "/api/check_status";
pub const PREVIEW_PAGES: &str = "/api/preview_pages";
pub const ANALYZE: &str = "/api/analyze";
pub const ANALYZE_GEMINI: &str = "/api/analyze_gemini";

/// Multipart field holding the PDF in every upload
pub const PDF_FIELD: &str = "pdf";

pub fn visualize_path(job_id: &str, page: u32) -> String {
    format!("/api/visualize/{}/{page}", urlencoding::encode(job_id))
}

pub fn download_annotated_path(job_id: &str, page: u32) -> String {
    format!(
        "/api/download_annotated_pdf/{}/{page}",
        urlencoding::encode(job_id)
    )
}

pub fn export_path(job_id: &str) -> String {
    format!("/api/export/{}", urlencoding::encode(job_id))
}

/// Join a server base URL and an API path without doubling slashes.
pub fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
