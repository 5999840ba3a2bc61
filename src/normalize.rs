//! Date Normalizer Module
//!
//! 異なる表現の日付値（日時セル、シリアル値、自由形式の文字列）を
//! `YYYY-MM-DD`形式の暦日に正規化するモジュール。
//! 解釈できない値はエラーにせず`None`を返します。

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

use crate::types::CellValue;

/// シリアル値25569 = 1970-01-01（UNIXエポック）
const UNIX_EPOCH_SERIAL: f64 = 25569.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// 日付と時刻を含む文字列の書式（上から順に試行）
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
];

/// 日付のみの文字列の書式（上から順に試行）
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%A, %B %d, %Y",
    "%a, %b %d, %Y",
    "%a %b %d %Y",
];

/// 2桁の年がこの値以上なら19xx年、未満なら20xx年
const SHORT_YEAR_PIVOT: i32 = 50;

/// セル値を暦日に正規化
///
/// # 引数
///
/// * `value` - 正規化するセル値
///
/// # 戻り値
///
/// * `Some(NaiveDate)` - 暦日として解釈できた場合
/// * `None` - 空値、または暦日として解釈できない場合
///
/// # 変換規則
///
/// - 日時セル: 日付部分をそのまま使用
/// - 数値: スプレッドシートのシリアル値（1900年システム）として解釈
/// - 文字列: 一般的な日付書式として解釈
/// - 論理値: 常に`None`
pub fn normalize_date(value: &CellValue) -> Option<NaiveDate> {
    let date = match value {
        CellValue::Null | CellValue::Bool(_) => None,
        CellValue::Date(dt) => Some(dt.date()),
        CellValue::Number(n) => serial_to_date(*n),
        CellValue::String(s) => parse_date_string(s),
    }?;

    // 固定幅（YYYY-MM-DD）で表現できる年のみ受け付ける
    if (0..=9999).contains(&date.year()) {
        Some(date)
    } else {
        None
    }
}

/// セル値を`YYYY-MM-DD`形式の文字列に正規化
///
/// 同じ入力に対して常に同じ出力を返す純粋関数です。
///
/// # 使用例
///
/// ```rust
/// use prepdeck::{to_iso_date, CellValue};
///
/// assert_eq!(to_iso_date(&CellValue::Number(45658.0)).as_deref(), Some("2025-01-01"));
/// assert_eq!(to_iso_date(&CellValue::from("March 5, 2024")).as_deref(), Some("2024-03-05"));
/// assert_eq!(to_iso_date(&CellValue::from("TBD")), None);
/// ```
pub fn to_iso_date(value: &CellValue) -> Option<String> {
    normalize_date(value).map(|date| date.format("%Y-%m-%d").to_string())
}

/// シリアル値を暦日に変換
///
/// # エポックシステム
///
/// ミリ秒 = round((シリアル値 - 25569) × 86,400,000) をUTCのタイムスタンプとして
/// 解釈し、日付部分を取り出します。この変換では1900年のうるう年バグを補正しないため、
/// 起点は1899年12月30日になります。
///
/// - シリアル値0 = 1899-12-30（1900年1月1日の2日前）
/// - シリアル値1 = 1899-12-31
/// - シリアル値25569 = 1970-01-01
///
/// 61以降のシリアル値はスプレッドシート上の表示と一致します。
pub(crate) fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }

    let millis = ((serial - UNIX_EPOCH_SERIAL) * MILLIS_PER_DAY).round();
    // i64の範囲外はタイムスタンプとして無効
    if millis.abs() >= i64::MAX as f64 {
        return None;
    }

    DateTime::<Utc>::from_timestamp_millis(millis as i64).map(|dt| dt.date_naive())
}

/// 自由形式の日付文字列を暦日に変換
///
/// オフセット付きのタイムスタンプはUTCに変換してから日付部分を取り出します。
/// オフセットなしの日時はそのまま日付部分を使用します。
fn parse_date_string(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
    {
        return Some(dt.date());
    }

    // "3/5/24" を 0024年ではなく 2024年として解釈する
    if let Some((month, day, short_year)) = split_short_year(s) {
        let year = if short_year >= SHORT_YEAR_PIVOT {
            1900 + short_year
        } else {
            2000 + short_year
        };
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// `M/D/YY`（または`M-D-YY`）を(月, 日, 2桁の年)に分解
fn split_short_year(s: &str) -> Option<(u32, u32, i32)> {
    let parts: Vec<&str> = s.split(['/', '-']).collect();
    let is_digits = |p: &str, min: usize, max: usize| {
        (min..=max).contains(&p.len()) && p.chars().all(|c| c.is_ascii_digit())
    };

    if parts.len() != 3
        || !is_digits(parts[0], 1, 2)
        || !is_digits(parts[1], 1, 2)
        || !is_digits(parts[2], 2, 2)
    {
        return None;
    }

    Some((
        parts[0].parse().ok()?,
        parts[1].parse().ok()?,
        parts[2].parse().ok()?,
    ))
}
