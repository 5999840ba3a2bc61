//! Output Formatters Implementation
//!
//! 各出力フォーマットの実装を提供するモジュール。

use std::io::Write;

use unicode_width::UnicodeWidthStr;

use super::DashboardView;
use crate::aggregate::Bucket;
use crate::api::FilterDimension;
use crate::error::PrepDeckError;

/// ダッシュボードのタイトル
pub const DASHBOARD_TITLE: &str = "Culinary Production Dashboard";

/// Markdown形式のフォーマッター
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    pub fn render<W: Write>(
        &self,
        view: &DashboardView,
        writer: &mut W,
    ) -> Result<(), PrepDeckError> {
        writeln!(writer, "# {}", DASHBOARD_TITLE)?;
        writeln!(writer)?;

        let filters: Vec<String> = FilterDimension::ALL
            .iter()
            .map(|dim| format!("{} = {}", dim.label(), view.selection.get(*dim)))
            .collect();
        writeln!(writer, "Filters: {}", escape_markdown(&filters.join(", ")))?;
        writeln!(writer)?;
        writeln!(writer, "Showing {} rows", view.row_count)?;
        writeln!(writer)?;

        // KPI
        writeln!(writer, "## KPIs")?;
        writeln!(writer)?;
        let kpis = &view.kpis;
        let kpi_rows = vec![
            vec!["Line Items".to_string(), kpis.total_lines.to_string()],
            vec!["Total Qty".to_string(), format_number(kpis.total_qty)],
            vec![
                "Unique Menu Items".to_string(),
                kpis.unique_menu_items.to_string(),
            ],
            vec!["Scheduled".to_string(), kpis.scheduled.to_string()],
            vec!["Unscheduled".to_string(), kpis.unscheduled.to_string()],
            vec![
                "Unassigned Producer".to_string(),
                kpis.unassigned_producer.to_string(),
            ],
        ];
        write_table(writer, &["Metric", "Value"], &kpi_rows)?;

        // チャート系列
        let top = view.top_n;
        let series = &view.series;
        write_series(
            writer,
            "Items by Day",
            ["Day", "Count"],
            &series.items_by_day,
            "No day values found (or filtered out).",
        )?;
        write_series(
            writer,
            &format!("Qty by Producer (Top {})", top),
            ["Producer", "Qty"],
            &series.qty_by_producer,
            "No producer/qty values found.",
        )?;
        let category = view.category_column.as_str();
        write_series(
            writer,
            &format!("{} Breakdown", category),
            [category, "Count"],
            &series.category_breakdown,
            &format!("No {} values found.", category.to_lowercase()),
        )?;
        write_series(
            writer,
            &format!("Items by Event (Top {})", top),
            ["Event", "Count"],
            &series.items_by_event,
            "No event values found.",
        )?;

        // プレビュー
        writeln!(writer)?;
        writeln!(writer, "## Data Preview")?;
        writeln!(writer)?;
        if view.preview.is_empty() || view.columns.is_empty() {
            writeln!(writer, "_Upload an Excel file to see rows._")?;
        } else {
            let header: Vec<&str> = view.columns.iter().map(String::as_str).collect();
            let rows: Vec<Vec<String>> = view
                .preview
                .iter()
                .map(|record| {
                    record
                        .values()
                        .iter()
                        .map(|value| value.to_string())
                        .collect()
                })
                .collect();
            write_table(writer, &header, &rows)?;
            writeln!(writer)?;
            writeln!(
                writer,
                "_Showing first {} of {} rows_",
                view.preview.len(),
                view.row_count
            )?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// JSON形式のフォーマッター
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn render<W: Write>(
        &self,
        view: &DashboardView,
        writer: &mut W,
    ) -> Result<(), PrepDeckError> {
        serde_json::to_writer_pretty(&mut *writer, view)?;
        writeln!(writer)?;
        writer.flush()?;

        Ok(())
    }
}

/// チャート系列を見出し付きのテーブルとして出力
fn write_series<W: Write>(
    writer: &mut W,
    title: &str,
    header: [&str; 2],
    buckets: &[Bucket],
    empty_message: &str,
) -> Result<(), PrepDeckError> {
    writeln!(writer)?;
    writeln!(writer, "## {}", title)?;
    writeln!(writer)?;

    if buckets.is_empty() {
        writeln!(writer, "_{}_", empty_message)?;
        return Ok(());
    }

    let rows: Vec<Vec<String>> = buckets
        .iter()
        .map(|bucket| vec![bucket.key.clone(), format_number(bucket.value)])
        .collect();
    write_table(writer, &header, &rows)
}

/// Markdownテーブルを出力
///
/// 列幅は表示幅（全角文字は2）で揃えます。セル内容はエスケープされます。
fn write_table<W: Write>(
    writer: &mut W,
    header: &[&str],
    rows: &[Vec<String>],
) -> Result<(), PrepDeckError> {
    let header: Vec<String> = header.iter().map(|h| escape_markdown(h.trim())).collect();
    let rows: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| escape_markdown(c.trim())).collect())
        .collect();

    let col_widths = calculate_column_widths(&header, &rows);

    write_row(writer, &header, &col_widths)?;
    writeln!(writer, "{}", generate_separator(&col_widths))?;
    for row in &rows {
        write_row(writer, row, &col_widths)?;
    }

    Ok(())
}

fn write_row<W: Write>(
    writer: &mut W,
    cells: &[String],
    col_widths: &[usize],
) -> Result<(), PrepDeckError> {
    write!(writer, "|")?;
    for (col_idx, &width) in col_widths.iter().enumerate() {
        let content = cells.get(col_idx).map(String::as_str).unwrap_or("");
        let content_width = content.width();

        write!(writer, " {}", content)?;
        if content_width < width {
            write!(writer, "{}", " ".repeat(width - content_width))?;
        }
        write!(writer, " |")?;
    }
    writeln!(writer)?;
    Ok(())
}

/// 列幅を計算
///
/// 各列の最大表示幅を返します。最小幅は3文字（区切り行の最小幅）です。
fn calculate_column_widths(header: &[String], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = header.iter().map(|h| h.width().max(3)).collect();

    for row in rows {
        for (col_idx, cell) in row.iter().enumerate().take(widths.len()) {
            widths[col_idx] = widths[col_idx].max(cell.width());
        }
    }

    widths
}

/// ヘッダー区切り行を生成
fn generate_separator(col_widths: &[usize]) -> String {
    let mut parts = vec!["|".to_string()];

    for &width in col_widths {
        // セルの前後のスペース（各1文字）+ セル幅分のハイフン
        parts.push("-".repeat(width + 2));
        parts.push("|".to_string());
    }

    parts.join("")
}

/// Markdownの特殊文字をエスケープ
fn escape_markdown(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('|', "\\|")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

/// 数値の表示（整数値は小数点なし）
fn format_number(value: f64) -> String {
    format!("{}", value)
}
