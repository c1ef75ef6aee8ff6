//! The totals of a user's income and expenses.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    AppState, Error, UserID,
    record::{LabelTotal, RecordKind, RecordStore, SqliteRecordStore},
};

/// A user's total income and expenses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// The sum of all income.
    pub total_income: f64,
    /// The sum of all expenses.
    pub total_expenses: f64,
    /// Total income minus total expenses.
    #[serde(rename = "currentBalance")]
    pub balance: f64,
}

impl Summary {
    /// Create a summary from the totals, deriving the balance.
    pub fn new(total_income: f64, total_expenses: f64) -> Self {
        Self {
            total_income,
            total_expenses,
            balance: total_income - total_expenses,
        }
    }

    /// Sum the records owned by `owner`.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read.
    pub fn compute<S>(store: &S, owner: UserID) -> Result<Self, Error>
    where
        S: RecordStore + ?Sized,
    {
        let total_income = store.aggregate_sum(owner, RecordKind::Income)?;
        let total_expenses = store.aggregate_sum(owner, RecordKind::Expense)?;

        Ok(Self::new(total_income, total_expenses))
    }
}

/// The state needed to summarise a user's records.
#[derive(Debug, Clone)]
pub struct SummaryState {
    /// The store holding the user's records.
    pub record_store: Arc<SqliteRecordStore>,
}

impl FromRef<AppState> for SummaryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            record_store: state.record_store.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    summary: Summary,
    expenses_by_category: Vec<LabelTotal>,
    income_by_source: Vec<LabelTotal>,
}

/// A route handler that responds with the user's totals, and their expenses
/// and income broken down by category and source.
pub async fn get_summary(
    State(state): State<SummaryState>,
    Extension(user_id): Extension<UserID>,
) -> Response {
    let store = state.record_store;

    let response = tokio::task::spawn_blocking(move || -> Result<SummaryResponse, Error> {
        Ok(SummaryResponse {
            summary: Summary::compute(store.as_ref(), user_id)?,
            expenses_by_category: store.sum_by_label(user_id, RecordKind::Expense)?,
            income_by_source: store.sum_by_label(user_id, RecordKind::Income)?,
        })
    })
    .await
    .map_err(|error| Error::TaskError(error.to_string()))
    .and_then(|result| result);

    match response {
        Ok(response) => Json(response).into_response(),
        Err(error) => error.into_json_response("Something went wrong while fetching summary"),
    }
}
