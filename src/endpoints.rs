//! The API endpoints URIs.

/// The route for downloading the current user's PDF report.
pub const EXPORT_PDF: &str = "/api/export";
/// The route for the current user's income and expense totals.
pub const SUMMARY: &str = "/api/summary";
