//! Generates a user's PDF report and serves it over HTTP.

use std::{num::NonZeroU64, path::Path, sync::Arc};

use axum::{
    Extension,
    extract::{FromRef, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use time_tz::Tz;
use tokio::task::{JoinError, spawn_blocking};

use crate::{
    AppState, Error, ReportConfig, UserID,
    record::{RecordKind, RecordStore, SqliteRecordStore},
    report::{
        assemble::assemble,
        batch::{Batch, plan_batches},
        dispatch::{Job, run_jobs},
        render::{render_chunk, render_footer, render_header},
        work_area::{FragmentId, WorkArea, write_fragment},
    },
    summary::Summary,
    timezone::require_timezone,
};

/// The name the report is downloaded as.
pub const REPORT_FILE_NAME: &str = "financial-report.pdf";

/// What an export will render, read from the store before any rendering
/// starts.
#[derive(Debug, Clone, PartialEq)]
struct ReportPlan {
    summary: Summary,
    batches: Vec<Batch>,
}

impl ReportPlan {
    fn new<S>(store: &S, owner: UserID, page_size: NonZeroU64) -> Result<Self, Error>
    where
        S: RecordStore + ?Sized,
    {
        let summary = Summary::compute(store, owner)?;

        let mut batches = Vec::new();
        for kind in RecordKind::ALL {
            let count = store.count(owner, kind)?;
            batches.extend(plan_batches(kind, count, page_size));
        }

        Ok(Self { summary, batches })
    }
}

/// Render every record owned by `owner` into a single PDF report.
///
/// The report is a header with the owner's totals, their income, their
/// expenses and a closing footer. Each batch of records is rendered by its
/// own job on the blocking thread pool and written to a work area private to
/// this export. The work area is deleted before this function returns,
/// whether or not the export succeeds.
///
/// # Errors
/// Fails if the timezone in `config` is invalid, the store cannot be read, a
/// record has no source/category, the fragments cannot be merged, the work
/// area cannot be used, or rendering takes longer than
/// [ReportConfig::export_timeout]. No partial report is ever returned.
#[tracing::instrument(skip(store, config))]
pub async fn generate_report<S>(
    store: Arc<S>,
    owner: UserID,
    config: &ReportConfig,
) -> Result<Vec<u8>, Error>
where
    S: RecordStore + 'static,
{
    let timezone = require_timezone(&config.local_timezone)?;

    let plan_store = store.clone();
    let page_size = config.page_size;
    let plan = spawn_blocking(move || ReportPlan::new(plan_store.as_ref(), owner, page_size))
        .await
        .map_err(task_error)??;

    tracing::info!(
        "exporting report with {} batch(es) of up to {page_size} records",
        plan.batches.len()
    );

    let work_area = WorkArea::create(&config.work_root)?;
    let jobs = build_jobs(plan, store, owner, timezone, work_area.path());

    let result = async {
        let fragments = run_jobs(
            jobs,
            config.max_workers,
            config.export_timeout,
            config.shutdown_grace,
        )
        .await?;

        spawn_blocking(move || assemble(fragments))
            .await
            .map_err(task_error)?
    }
    .await;

    work_area.close();

    match &result {
        Ok(pdf) => tracing::info!("exported report of {} bytes", pdf.len()),
        Err(error) => tracing::error!("could not export report: {error}"),
    }

    result
}

fn build_jobs<S>(
    plan: ReportPlan,
    store: Arc<S>,
    owner: UserID,
    timezone: &'static Tz,
    dir: &Path,
) -> Vec<Job>
where
    S: RecordStore + 'static,
{
    let mut jobs: Vec<Job> = Vec::with_capacity(plan.batches.len() + 2);

    let summary = plan.summary;
    let header_dir = dir.to_owned();
    jobs.push(Box::new(move || {
        write_fragment(&header_dir, FragmentId::Header, &render_header(&summary)?)
    }));

    let footer_dir = dir.to_owned();
    jobs.push(Box::new(move || {
        write_fragment(&footer_dir, FragmentId::Footer, &render_footer()?)
    }));

    for batch in plan.batches {
        let store = store.clone();
        let dir = dir.to_owned();

        jobs.push(Box::new(move || {
            let records = store.find_page(owner, batch.kind, batch.offset, batch.limit)?;
            let pdf = render_chunk(&batch, &records, timezone)?;
            let id = FragmentId::Chunk {
                kind: batch.kind,
                offset: batch.offset,
            };

            write_fragment(&dir, id, &pdf)
        }));
    }

    jobs
}

fn task_error(error: JoinError) -> Error {
    Error::TaskError(error.to_string())
}

/// The state needed to export a report.
#[derive(Debug, Clone)]
pub struct ExportState {
    /// The store holding the user's records.
    pub record_store: Arc<SqliteRecordStore>,
    /// The settings for generating reports.
    pub config: Arc<ReportConfig>,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            record_store: state.record_store.clone(),
            config: state.report_config.clone(),
        }
    }
}

/// A route handler that responds with the user's report as a PDF download.
///
/// On failure, responds with a 500 and a JSON body of the form
/// `{"message": "...", "error": "..."}`.
pub async fn export_pdf_endpoint(
    State(state): State<ExportState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    match generate_report(state.record_store, user_id, &state.config).await {
        Ok(pdf) => (
            [
                (CONTENT_TYPE, "application/pdf".to_owned()),
                (
                    CONTENT_DISPOSITION,
                    format!("attachment; filename={REPORT_FILE_NAME}"),
                ),
            ],
            pdf,
        )
            .into_response(),
        Err(error) => error.into_json_response("Something went wrong while generating PDF"),
    }
}
