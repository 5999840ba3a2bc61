//! Types Module
//!
//! クレート全体で使用する共通データ型を定義するモジュール。
//! スプレッドシートの列構成は事前に決まらないため、行はヘッダー名から
//! タグ付きスカラー値への順序付きマッピングとして表現します。

use std::fmt;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// 列に存在しないキーを参照したときに返す値
static NULL: CellValue = CellValue::Null;

/// セルの値を表す列挙型
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 空セル
    Null,

    /// 論理値
    Bool(bool),

    /// 数値（f64）
    Number(f64),

    /// 文字列
    String(String),

    /// 日時（ワークブック内で日付書式が設定されたセル）
    Date(NaiveDateTime),
}

impl CellValue {
    /// 値が空かどうかを判定
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// 前後の空白を除いた表示文字列
    ///
    /// 空セルは空文字列になります。カテゴリ値の比較とフォールバック判定は
    /// すべてこの文字列に対して行います。
    pub fn trimmed_text(&self) -> String {
        match self {
            CellValue::String(s) => s.trim().to_string(),
            other => other.to_string().trim().to_string(),
        }
    }

    /// 数値への強制変換
    ///
    /// 集計で使用する変換規則です。変換できない値は0として扱い、
    /// 行が集計から落ちることはありません。
    ///
    /// - 空セル → 0
    /// - 論理値 → 1 / 0
    /// - 数値 → そのまま（NaN・無限大は0）
    /// - 文字列 → 前後の空白を除いて数値として解釈（空文字列・解釈不能は0）
    /// - 日時 → 0
    pub fn as_number(&self) -> f64 {
        let value = match self {
            CellValue::Null | CellValue::Date(_) => 0.0,
            CellValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            CellValue::Number(n) => *n,
            CellValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(0.0)
                }
            }
        };

        if value.is_finite() {
            value
        } else {
            0.0
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::String(s) => f.write_str(s),
            CellValue::Date(dt) => {
                if dt.time() == NaiveTime::MIN {
                    write!(f, "{}", dt.format("%Y-%m-%d"))
                } else if dt.nanosecond() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.3f"))
                }
            }
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_none(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::Date(dt) => {
                serializer.serialize_str(&dt.format("%Y-%m-%dT%H:%M:%S").to_string())
            }
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::Date(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value.and_time(NaiveTime::MIN))
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Null)
    }
}

/// スプレッドシートの1行
///
/// ヘッダー行で宣言されたすべての列を、ヘッダーの順序で保持します。
/// 空セルは省略されず`CellValue::Null`として格納されます。
/// 列名のリストは同じデータセット内のすべての行で共有されます。
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    columns: Arc<[String]>,
    values: Vec<CellValue>,
}

impl Record {
    pub(crate) fn new(columns: Arc<[String]>, mut values: Vec<CellValue>) -> Self {
        values.resize(columns.len(), CellValue::Null);
        Self { columns, values }
    }

    /// 指定された列の値を取得
    ///
    /// 列が存在しない場合は`None`を返します。
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .position(|name| name == column)
            .map(|idx| &self.values[idx])
    }

    /// 指定された列の値を取得（列が存在しない場合は`Null`）
    pub fn value(&self, column: &str) -> &CellValue {
        self.get(column).unwrap_or(&NULL)
    }

    /// 指定された列の値を、前後の空白を除いた文字列として取得
    pub fn text(&self, column: &str) -> String {
        self.value(column).trimmed_text()
    }

    /// 列名のリスト（ヘッダー順）
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 値のリスト（ヘッダー順）
    pub fn values(&self) -> &[CellValue] {
        &self.values
    }

    /// (列名, 値)のペアをヘッダー順に走査
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// 読み込まれたスプレッドシート全体
///
/// 元の行順を保持した`Record`の列です。一度構築されたら変更されず、
/// 新しいアップロードのたびに丸ごと置き換えられます。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    /// 列名と行の値からデータセットを構築
    ///
    /// 各行は列数に合わせて切り詰め、または`Null`で埋められるため、
    /// すべての行が同じキー集合を持つことが保証されます。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use prepdeck::{CellValue, Dataset};
    ///
    /// let dataset = Dataset::new(
    ///     ["Producer", "Qty"],
    ///     vec![
    ///         vec!["Chef A".into(), 5.0.into()],
    ///         vec!["Chef B".into()],
    ///     ],
    /// );
    /// assert_eq!(dataset.len(), 2);
    /// assert_eq!(dataset.records()[1].value("Qty"), &CellValue::Null);
    /// ```
    pub fn new<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: Vec<Vec<CellValue>>,
    ) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let shared: Arc<[String]> = columns.clone().into();
        let records = rows
            .into_iter()
            .map(|values| Record::new(Arc::clone(&shared), values))
            .collect();

        Self { columns, records }
    }

    /// 列も行も持たない空のデータセット
    pub fn empty() -> Self {
        Self::default()
    }

    /// 列名のリスト（ヘッダー順）
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 行のリスト（元の行順）
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
