//! HTML pages for the upload service.

use crate::types::{SummaryTable, SUMMARY_COLUMNS};

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; margin: 2rem; color: #1f2937; }
h1 { font-size: 1.4rem; }
form { margin-bottom: 1.5rem; }
.error { color: #b91c1c; margin: 1rem 0; }
table.data { border-collapse: collapse; }
table.data th, table.data td { border: 1px solid #d1d5db; padding: 4px 10px; }
table.data th { background: #2563eb; color: #fff; }
table.data td.num { text-align: right; }
table.data tr.total td { font-weight: bold; }
"#;

/// Escape text for use inside HTML element content and attribute values.
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

fn upload_form(action: &str, label: &str) -> String {
    format!(
        r#"<form action="{action}" method="post" enctype="multipart/form-data">
<input type="file" name="file" accept=".xlsx,.xlsm,.xls">
<button type="submit">{label}</button>
</form>
"#,
        action = escape_html(action),
        label = escape_html(label),
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
        title = escape_html(title),
    )
}

fn forms() -> String {
    let mut body = String::from("<h1>Upload DATA CONTROL workbook</h1>\n");
    body.push_str(&upload_form("/upload", "Show summary"));
    body.push_str(&upload_form("/", "Download summaryloket.xlsx"));
    body
}

/// Upload form, optionally with an error message above it.
pub fn upload_page(error: Option<&str>) -> String {
    let mut body = forms();
    if let Some(msg) = error {
        body.push_str(&format!(
            "<p class=\"error\">An error occurred: {}</p>\n",
            escape_html(msg)
        ));
    }
    page("Loket Summary", &body)
}

/// Summary table markup: header row, office rows, bold "Total" row.
pub fn summary_table_html(table: &SummaryTable) -> String {
    let mut html = String::from("<table class=\"data\">\n<thead>\n<tr>");
    for header in SUMMARY_COLUMNS {
        html.push_str(&format!("<th>{}</th>", escape_html(header)));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    let last = table.offices.len();
    for (i, row) in table.rows().enumerate() {
        if i == last {
            html.push_str("<tr class=\"total\">");
        } else {
            html.push_str("<tr>");
        }
        html.push_str(&format!("<td>{}</td>", escape_html(&row.office)));
        for value in row.counts() {
            html.push_str(&format!("<td class=\"num\">{}</td>", value));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

/// Upload form followed by the rendered summary.
pub fn summary_page(table: &SummaryTable) -> String {
    let mut body = forms();
    body.push_str("<h2>Summary</h2>\n");
    body.push_str(&summary_table_html(table));
    body.push_str(&format!(
        "<p>Generated {}</p>\n",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    ));
    page("Summary", &body)
}
