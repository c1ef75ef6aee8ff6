//! Renders the header, footer and record batches of a report as standalone
//! PDF documents.

use time_tz::{OffsetDateTimeExt, Tz};

use crate::{
    Error,
    record::Record,
    report::{
        batch::Batch,
        pdf::{Align, Font, PdfWriter},
    },
    summary::Summary,
};

/// The report title printed at the top of the header.
pub const REPORT_TITLE: &str = "Financial Report";

/// The disclaimer printed at the bottom of the footer.
pub const FOOTER_TEXT: &str =
    "This report was generated automatically by the Expense Tracker system.";

/// Once the cursor passes this distance from the top of the page, the next
/// record line goes on a new page.
const PAGE_BREAK_THRESHOLD: f32 = 700.0;

/// Render the report title and the user's totals.
///
/// # Errors
/// Returns [Error::RenderError] if the PDF cannot be encoded.
pub fn render_header(summary: &Summary) -> Result<Vec<u8>, Error> {
    let mut writer = PdfWriter::new();

    writer.text(REPORT_TITLE, Font::Bold, 24.0, Align::Center);
    writer.move_down(1.0, 24.0);

    writer.text("Financial Summary", Font::Bold, 16.0, Align::Left);
    writer.move_down(0.5, 16.0);

    for (name, amount) in [
        ("Total Income", summary.total_income),
        ("Total Expenses", summary.total_expenses),
        ("Current Balance", summary.balance),
    ] {
        writer.text(
            &format!("{name}: {}", format_currency(amount)),
            Font::Regular,
            12.0,
            Align::Left,
        );
    }

    writer.finish()
}

/// Render the disclaimer line near the bottom margin of a page.
///
/// # Errors
/// Returns [Error::RenderError] if the PDF cannot be encoded.
pub fn render_footer() -> Result<Vec<u8>, Error> {
    let mut writer = PdfWriter::new();
    writer.text_at_bottom(FOOTER_TEXT, Font::Regular, 8.0, Align::Center);
    writer.finish()
}

/// Render the records of one batch.
///
/// `records` must be the records in the batch's window, in report order.
/// Each line is numbered by the record's rank across all records of the
/// batch's kind, so the numbering continues from one batch to the next.
/// Labels are drawn in a Latin-1 font, so any other characters print as '?'.
///
/// # Errors
/// Returns [Error::MissingLabel] if any record has no source/category, or
/// [Error::RenderError] if the PDF cannot be encoded.
pub fn render_chunk(
    batch: &Batch,
    records: &[Record],
    timezone: &Tz,
) -> Result<Vec<u8>, Error> {
    let mut writer = PdfWriter::new();

    writer.text(
        &format!(
            "{} Details (Batch starting at {})",
            batch.kind.to_string().to_uppercase(),
            batch.offset
        ),
        Font::Bold,
        14.0,
        Align::Center,
    );
    writer.move_down(1.0, 14.0);

    for (index, record) in records.iter().enumerate() {
        let rank = batch.offset + index as u64 + 1;
        let line = format_record_line(rank, record, timezone)?;

        writer.text(&line, Font::Regular, 10.0, Align::Left);

        if writer.cursor() > PAGE_BREAK_THRESHOLD && index + 1 < records.len() {
            writer.add_page();
        }
    }

    tracing::debug!(
        "rendered {} {} record(s) from offset {} on {} page(s)",
        records.len(),
        batch.kind,
        batch.offset,
        writer.page_count()
    );

    writer.finish()
}

/// Format a record as `"<rank>. $<amount> - <LABEL> (<M/D/YYYY>)"`.
///
/// The date is the record's creation date in `timezone`, using the offset in
/// effect at that moment.
///
/// # Errors
/// Returns [Error::MissingLabel] if the record has no source/category.
pub fn format_record_line(rank: u64, record: &Record, timezone: &Tz) -> Result<String, Error> {
    let label = record.label()?.to_uppercase();
    let date = record.created_at.to_timezone(timezone).date();

    Ok(format!(
        "{rank}. {} - {label} ({}/{}/{})",
        format_currency(record.amount),
        u8::from(date.month()),
        date.day(),
        date.year()
    ))
}

/// Format `amount` to two decimal places after a dollar sign, e.g. `$-5.00`.
fn format_currency(amount: f64) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod render_tests {
    use time::{OffsetDateTime, macros::datetime};
    use time_tz::Tz;

    use crate::{
        Error,
        record::{Record, RecordDetail, RecordKind},
        report::{
            batch::Batch,
            render::{
                FOOTER_TEXT, format_record_line, render_chunk, render_footer, render_header,
            },
        },
        summary::Summary,
        test_utils::page_texts,
        timezone::require_timezone,
    };

    fn utc() -> &'static Tz {
        require_timezone("Etc/UTC").unwrap()
    }

    fn auckland() -> &'static Tz {
        require_timezone("Pacific/Auckland").unwrap()
    }

    fn expense(id: i64, amount: f64, category: Option<&str>) -> Record {
        expense_at(id, amount, category, datetime!(2025-03-04 23:30:00 UTC))
    }

    fn expense_at(
        id: i64,
        amount: f64,
        category: Option<&str>,
        created_at: OffsetDateTime,
    ) -> Record {
        Record {
            id,
            amount,
            created_at,
            detail: RecordDetail::Expense {
                category: category.map(str::to_owned),
            },
        }
    }

    #[test]
    fn record_line_uses_rank_label_and_local_date() {
        let record = expense(1, 12.5, Some("Groceries"));

        let line = format_record_line(2001, &record, auckland());

        assert_eq!(line, Ok("2001. $12.50 - GROCERIES (3/5/2025)".to_owned()));
    }

    #[test]
    fn record_date_uses_offset_in_effect_on_that_day() {
        let summer = expense_at(1, 1.0, Some("rent"), datetime!(2025-01-15 11:30 UTC));
        let winter = expense_at(2, 1.0, Some("rent"), datetime!(2025-07-15 11:30 UTC));

        assert_eq!(
            format_record_line(1, &summer, auckland()),
            Ok("1. $1.00 - RENT (1/16/2025)".to_owned())
        );
        assert_eq!(
            format_record_line(2, &winter, auckland()),
            Ok("2. $1.00 - RENT (7/15/2025)".to_owned())
        );
    }

    #[test]
    fn record_line_without_label_fails() {
        let record = expense(9, 1.0, None);

        let line = format_record_line(1, &record, utc());

        assert_eq!(
            line,
            Err(Error::MissingLabel {
                kind: RecordKind::Expense,
                record_id: 9
            })
        );
    }

    #[test]
    fn header_shows_totals() {
        let pdf = render_header(&Summary::new(1500.0, 250.25)).unwrap();

        let lines: Vec<String> = page_texts(&pdf).into_iter().flatten().collect();

        assert_eq!(
            lines,
            vec![
                "Financial Report",
                "Financial Summary",
                "Total Income: $1500.00",
                "Total Expenses: $250.25",
                "Current Balance: $1249.75",
            ]
        );
    }

    #[test]
    fn negative_balance_keeps_dollar_sign_first() {
        let pdf = render_header(&Summary::new(0.0, 5.0)).unwrap();

        let lines: Vec<String> = page_texts(&pdf).into_iter().flatten().collect();

        assert_eq!(lines.last().map(String::as_str), Some("Current Balance: $-5.00"));
    }

    #[test]
    fn footer_has_one_line() {
        let pages = page_texts(&render_footer().unwrap());

        assert_eq!(pages, vec![vec![FOOTER_TEXT.to_owned()]]);
    }

    #[test]
    fn chunk_numbers_lines_from_batch_offset() {
        let batch = Batch {
            kind: RecordKind::Expense,
            offset: 4000,
            limit: 2000,
        };
        let records = vec![expense(1, 3.0, Some("rent")), expense(2, 4.0, Some("food"))];

        let lines: Vec<String> = page_texts(&render_chunk(&batch, &records, utc()).unwrap())
            .into_iter()
            .flatten()
            .collect();

        assert_eq!(
            lines,
            vec![
                "EXPENSE Details (Batch starting at 4000)",
                "4001. $3.00 - RENT (3/4/2025)",
                "4002. $4.00 - FOOD (3/4/2025)",
            ]
        );
    }

    #[test]
    fn long_chunks_span_several_pages() {
        let batch = Batch {
            kind: RecordKind::Expense,
            offset: 0,
            limit: 200,
        };
        let records: Vec<Record> = (0..200).map(|i| expense(i, 1.0, Some("x"))).collect();

        let pages = page_texts(&render_chunk(&batch, &records, utc()).unwrap());

        assert!(pages.len() > 1);
        assert_eq!(pages.iter().map(Vec::len).sum::<usize>(), 201);
    }

    #[test]
    fn chunk_with_malformed_record_fails() {
        let batch = Batch {
            kind: RecordKind::Expense,
            offset: 0,
            limit: 2000,
        };
        let records = vec![expense(1, 3.0, Some("rent")), expense(2, 4.0, None)];

        let result = render_chunk(&batch, &records, utc());

        assert_eq!(
            result,
            Err(Error::MissingLabel {
                kind: RecordKind::Expense,
                record_id: 2
            })
        );
    }
}
