//! Workbook Parser
//!
//! calamineを使用してワークブックの最初のシートをデータセットに変換します。

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::PrepDeckError;
use crate::security::SecurityConfig;
use crate::types::{CellValue, Dataset};

/// 空のヘッダーセルに割り当てる列名
const EMPTY_HEADER: &str = "__EMPTY";

/// ワークブックパーサー
///
/// calamineのラッパーとして、バイト列からデータセットを生成します。
/// 対応形式はcalamineの自動判別に従います（xlsx, xlsm, xlsb, xls, ods）。
///
/// 読み込むのは最初のシートのみです。2枚目以降のシートは無視されます。
#[derive(Debug, Clone, Default)]
pub struct WorkbookParser {
    security: SecurityConfig,
}

impl WorkbookParser {
    /// デフォルトの制限値でパーサーを作成
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_limits(security: SecurityConfig) -> Self {
        Self { security }
    }

    /// バイト列をパースしてデータセットを生成
    ///
    /// # 引数
    ///
    /// * `bytes` - スプレッドシートファイルの内容
    ///
    /// # 戻り値
    ///
    /// * `Ok(Dataset)` - パースに成功した場合（シートが無い、または空の場合は空のデータセット）
    /// * `Err(PrepDeckError::Parse)` - スプレッドシートとして読み込めない場合
    /// * `Err(PrepDeckError::SecurityViolation)` - 入力サイズやシート寸法が上限を超える場合
    pub fn parse(&self, bytes: &[u8]) -> Result<Dataset, PrepDeckError> {
        self.security.check_input_size(bytes.len())?;

        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

        let sheet_names = workbook.sheet_names();
        if sheet_names.len() > 1 {
            log::debug!(
                "workbook has {} sheets; only '{}' is read",
                sheet_names.len(),
                sheet_names[0]
            );
        }

        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => {
                log::debug!("workbook has no sheets; returning an empty dataset");
                return Ok(Dataset::empty());
            }
        };

        self.range_to_dataset(&range)
    }

    /// シートの使用範囲をデータセットに変換
    fn range_to_dataset(&self, range: &Range<Data>) -> Result<Dataset, PrepDeckError> {
        let (height, width) = range.get_size();
        self.security.check_dimensions(height, width)?;

        let mut rows = range.rows();
        let header_row = match rows.next() {
            Some(row) => row,
            None => return Ok(Dataset::empty()),
        };
        let columns = header_names(header_row);

        let mut records = Vec::with_capacity(height.saturating_sub(1));
        let mut skipped = 0usize;
        for row in rows {
            if row.iter().all(|cell| matches!(cell, Data::Empty)) {
                skipped += 1;
                continue;
            }
            records.push(row.iter().map(convert_cell).collect());
        }

        log::debug!(
            "parsed {} columns and {} records ({} blank rows skipped)",
            columns.len(),
            records.len(),
            skipped
        );

        Ok(Dataset::new(columns, records))
    }
}

/// ヘッダー行から一意な列名を生成
///
/// 空のヘッダーは`__EMPTY`になり、重複する名前には`_1`, `_2`, …の
/// サフィックスが付きます。
fn header_names(row: &[Data]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(row.len());
    let mut names = Vec::with_capacity(row.len());

    for cell in row {
        let base = match convert_cell(cell).to_string() {
            text if text.is_empty() => EMPTY_HEADER.to_string(),
            text => text,
        };

        let mut name = base.clone();
        let mut counter = 0;
        while seen.contains(&name) {
            counter += 1;
            name = format!("{}_{}", base, counter);
        }

        seen.insert(name.clone());
        names.push(name);
    }

    names
}

/// calamineのセル値を変換
fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::String(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                CellValue::Number(dt.as_f64())
            } else {
                dt.as_datetime()
                    .map(CellValue::Date)
                    .unwrap_or_else(|| CellValue::Number(dt.as_f64()))
            }
        }
        Data::DateTimeIso(s) => parse_iso_datetime(s)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::String(s.clone())),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(e.to_string()),
    }
}

/// ISO 8601形式の日時文字列を解析（ODSの日付セル）
fn parse_iso_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
}
