//! Exports a user's records as a PDF report.
//!
//! Records are split into fixed-size [Batch]es per kind. Every batch, plus
//! the header and footer, is rendered to its own PDF fragment by a job on the
//! blocking thread pool, and the fragments are merged in [FragmentId] order
//! once every job has reported back.

mod assemble;
mod batch;
mod dispatch;
mod export;
mod pdf;
mod render;
mod work_area;

pub use batch::{Batch, plan_batches};
pub use export::{ExportState, REPORT_FILE_NAME, export_pdf_endpoint, generate_report};
pub use work_area::FragmentId;
