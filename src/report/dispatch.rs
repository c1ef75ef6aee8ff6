//! Runs the render jobs of an export on the blocking thread pool.

use std::time::Duration;

use tokio::task::JoinSet;

use crate::{Error, report::work_area::Fragment};

/// A unit of work that renders one fragment of a report.
///
/// Jobs share no mutable state. Each one reports back exactly once, through
/// its return value.
pub type Job = Box<dyn FnOnce() -> Result<Fragment, Error> + Send + 'static>;

/// Run `jobs` with at most `max_workers` running at once and collect their
/// fragments.
///
/// The fragments are returned in completion order; it is up to the caller to
/// put them in document order.
///
/// # Errors
/// Fails with the first error reported by a job, [Error::TaskError] if a job
/// panics, or [Error::ExportTimeout] if the jobs do not all finish within
/// `timeout`. On failure, jobs that have not started are dropped, and
/// running jobs are given `grace` to finish before they are detached. Any
/// fragments that were produced are deleted.
pub async fn run_jobs(
    jobs: Vec<Job>,
    max_workers: usize,
    timeout: Duration,
    grace: Duration,
) -> Result<Vec<Fragment>, Error> {
    let mut tasks = JoinSet::new();

    let result = tokio::time::timeout(timeout, collect(&mut tasks, jobs, max_workers))
        .await
        .unwrap_or(Err(Error::ExportTimeout(timeout)));

    if result.is_err() {
        shut_down(tasks, grace).await;
    }

    result
}

async fn collect(
    tasks: &mut JoinSet<Result<Fragment, Error>>,
    jobs: Vec<Job>,
    max_workers: usize,
) -> Result<Vec<Fragment>, Error> {
    let span = tracing::Span::current();
    let max_workers = max_workers.max(1);
    let mut fragments = Vec::with_capacity(jobs.len());
    let mut pending = jobs.into_iter();

    loop {
        while tasks.len() < max_workers {
            let Some(job) = pending.next() else {
                break;
            };
            let span = span.clone();
            tasks.spawn_blocking(move || span.in_scope(job));
        }

        let Some(joined) = tasks.join_next().await else {
            break;
        };

        let fragment = joined.map_err(|error| Error::TaskError(error.to_string()))??;
        tracing::debug!("rendered fragment {:?}", fragment.id());
        fragments.push(fragment);
    }

    Ok(fragments)
}

/// Stop waiting on `tasks`, giving running tasks `grace` to finish so that
/// their fragments are dropped (and deleted) here.
async fn shut_down(mut tasks: JoinSet<Result<Fragment, Error>>, grace: Duration) {
    if tasks.is_empty() {
        return;
    }

    // Blocking tasks cannot be interrupted once they start, this only stops
    // queued tasks from starting.
    tasks.abort_all();

    let drained = tokio::time::timeout(grace, async {
        while tasks.join_next().await.is_some() {}
    })
    .await;

    if drained.is_err() {
        tracing::warn!(
            "{} report task(s) still running after {grace:?}, detaching them",
            tasks.len()
        );
        tasks.detach_all();
    }
}
