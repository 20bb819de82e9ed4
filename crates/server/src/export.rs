//! CSV and printable-HTML renderings of provider reports.

use axum::http::{header, HeaderMap, HeaderValue};
use shared_types::{AppError, ProviderSummary, ReportRow};

const CSV_HEADER: [&str; 7] = [
    "id",
    "title",
    "status",
    "priority",
    "quoted_price",
    "sla_deadline",
    "created_at",
];

pub fn requests_csv(rows: &[ReportRow]) -> Result<String, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let fail = |e: csv::Error| {
        tracing::error!(error = %e, "CSV export failed");
        AppError::internal("Failed to build CSV export")
    };

    writer.write_record(CSV_HEADER).map_err(fail)?;
    for row in rows {
        let price = row.quoted_price.map(|p| format!("{p:.2}")).unwrap_or_default();
        writer
            .write_record([
                row.id.as_str(),
                row.title.as_str(),
                row.status.as_str(),
                row.priority.as_str(),
                price.as_str(),
                row.sla_deadline.as_str(),
                row.created_at.as_str(),
            ])
            .map_err(fail)?;
    }

    let bytes = writer.into_inner().map_err(|e| {
        tracing::error!(error = %e, "CSV flush failed");
        AppError::internal("Failed to build CSV export")
    })?;
    String::from_utf8(bytes).map_err(|_| AppError::internal("CSV export is not valid UTF-8"))
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Printable right-to-left report page.
pub fn requests_html(title: &str, summary: &ProviderSummary, rows: &[ReportRow]) -> String {
    let mut body = String::new();
    for row in rows {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&row.title),
            escape_html(&row.status),
            escape_html(&row.priority),
            row.quoted_price.map(|p| format!("{p:.2}")).unwrap_or_else(|| "-".into()),
            escape_html(&row.sla_deadline),
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="ar" dir="rtl">
<head><meta charset="utf-8"><title>{title}</title>
<style>body{{font-family:sans-serif}}table{{border-collapse:collapse;width:100%}}td,th{{border:1px solid #ccc;padding:4px}}</style>
</head>
<body>
<h1>{title}</h1>
<p>Requests: {total} | Revenue: {revenue:.2} | Commission: {commission:.2} | Provider share: {share:.2} | Minutes: {minutes}</p>
<table>
<thead><tr><th>Title</th><th>Status</th><th>Priority</th><th>Price</th><th>SLA deadline</th></tr></thead>
<tbody>
{body}</tbody>
</table>
</body>
</html>
"#,
        title = escape_html(title),
        total = summary.total_requests,
        revenue = summary.completed_revenue,
        commission = summary.commission,
        share = summary.provider_share,
        minutes = summary.total_minutes,
    )
}

/// Headers for a downloadable export.
pub fn attachment_headers(content_type: &'static str, file_name: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    let safe: String = file_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect();
    if let Ok(v) = HeaderValue::from_str(&format!("attachment; filename=\"{safe}\"")) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    headers
}
