//! Filter State Module
//!
//! 絞り込み次元ごとの選択状態と、データセットから導出される選択肢を扱うモジュール。

use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::aggregate::category_text;
use crate::api::{ColumnMapping, FallbackLabels, FilterDimension};
use crate::types::{Dataset, Record};

/// 「絞り込みなし」を表す選択肢のラベル
pub const ALL_LABEL: &str = "All";

/// 1つの絞り込み次元の選択状態
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    /// 絞り込みなし
    #[default]
    All,

    /// 特定のカテゴリ値（大文字小文字を区別して完全一致）
    Value(String),
}

impl Selection {
    /// 選択肢のラベルから選択状態を生成
    ///
    /// `"All"`は絞り込みなしとして扱います。
    pub fn from_label(label: &str) -> Self {
        if label == ALL_LABEL {
            Selection::All
        } else {
            Selection::Value(label.to_string())
        }
    }

    /// 選択肢のラベル
    pub fn label(&self) -> &str {
        match self {
            Selection::All => ALL_LABEL,
            Selection::Value(v) => v,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    /// カテゴリ値が選択に一致するか
    pub fn matches(&self, category: &str) -> bool {
        match self {
            Selection::All => true,
            Selection::Value(v) => v == category,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Selection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl From<&str> for Selection {
    fn from(label: &str) -> Self {
        Selection::from_label(label)
    }
}

/// 絞り込み条件
///
/// 各次元は「All」または特定の値を選択します。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FilterSelection {
    event: Selection,
    producer: Selection,
}

impl FilterSelection {
    /// すべての次元が「All」の絞り込み条件
    pub fn new() -> Self {
        Self::default()
    }

    /// 次元の選択状態を取得
    pub fn get(&self, dimension: FilterDimension) -> &Selection {
        match dimension {
            FilterDimension::Event => &self.event,
            FilterDimension::Producer => &self.producer,
        }
    }

    /// 次元の選択状態を変更
    pub fn set(&mut self, dimension: FilterDimension, selection: impl Into<Selection>) {
        let selection = selection.into();
        match dimension {
            FilterDimension::Event => self.event = selection,
            FilterDimension::Producer => self.producer = selection,
        }
    }

    /// 次元の選択状態を変更した新しい絞り込み条件を返す
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use prepdeck::{FilterDimension, FilterSelection};
    ///
    /// let selection = FilterSelection::new()
    ///     .with(FilterDimension::Event, "Gala")
    ///     .with(FilterDimension::Producer, "All");
    /// assert!(!selection.is_unfiltered());
    /// ```
    pub fn with(mut self, dimension: FilterDimension, selection: impl Into<Selection>) -> Self {
        self.set(dimension, selection);
        self
    }

    /// すべての次元が「All」かどうか
    pub fn is_unfiltered(&self) -> bool {
        FilterDimension::ALL
            .iter()
            .all(|dim| self.get(*dim).is_all())
    }

    /// 行が絞り込み条件に一致するか
    ///
    /// 「All」以外の次元すべてについて、フォールバック置換後のカテゴリ値が
    /// 選択値と完全に一致する場合に一致とみなします。
    pub fn matches(
        &self,
        record: &Record,
        columns: &ColumnMapping,
        labels: &FallbackLabels,
    ) -> bool {
        FilterDimension::ALL.iter().all(|dim| {
            let selection = self.get(*dim);
            selection.is_all() || selection.matches(&category_of(record, *dim, columns, labels))
        })
    }

    /// 新しいデータセットで選択できない値を「All」に戻した絞り込み条件を返す
    pub fn revalidate(
        &self,
        dataset: &Dataset,
        columns: &ColumnMapping,
        labels: &FallbackLabels,
    ) -> Self {
        let mut result = self.clone();
        for dim in FilterDimension::ALL {
            if let Selection::Value(value) = self.get(dim) {
                let still_present = dataset
                    .iter()
                    .any(|record| category_of(record, dim, columns, labels) == *value);
                if !still_present {
                    log::debug!(
                        "{} selection '{}' is not present in the new dataset; resetting to All",
                        dim.label(),
                        value
                    );
                    result.set(dim, Selection::All);
                }
            }
        }
        result
    }
}

/// 次元の選択肢を導出
///
/// データセット内に現れるフォールバック置換後のカテゴリ値を重複なく
/// 辞書順（バイト順）に並べ、先頭に「All」を付けて返します。
///
/// # 使用例
///
/// ```rust
/// use prepdeck::{available_values, ColumnMapping, Dataset, FallbackLabels, FilterDimension};
///
/// let dataset = Dataset::new(["Producer"], vec![vec!["Chef B".into()], vec![prepdeck::CellValue::Null]]);
/// let values = available_values(
///     &dataset,
///     FilterDimension::Producer,
///     &ColumnMapping::default(),
///     &FallbackLabels::default(),
/// );
/// assert_eq!(values, vec!["All", "Chef B", "Unassigned"]);
/// ```
pub fn available_values(
    dataset: &Dataset,
    dimension: FilterDimension,
    columns: &ColumnMapping,
    labels: &FallbackLabels,
) -> Vec<String> {
    let distinct: BTreeSet<String> = dataset
        .iter()
        .map(|record| category_of(record, dimension, columns, labels))
        .collect();

    std::iter::once(ALL_LABEL.to_string())
        .chain(distinct)
        .collect()
}

/// 行のカテゴリ値（空の場合はフォールバックラベル）
fn category_of(
    record: &Record,
    dimension: FilterDimension,
    columns: &ColumnMapping,
    labels: &FallbackLabels,
) -> String {
    category_text(
        record,
        columns.column_for(dimension),
        labels.label_for(dimension),
    )
}
