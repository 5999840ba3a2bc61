//! Public API Types
//!
//! 公開APIで使用する設定型・列挙型を定義するモジュール。

use serde::Serialize;

/// 集計で参照する列名の対応表
///
/// どの列も必須ではありません。存在しない列は空セルとして扱われ、
/// カテゴリ値はフォールバックラベルに、数量は0になります。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    /// イベント（絞り込み・イベント別件数）
    pub event: String,

    /// 担当者（絞り込み・担当者別数量）
    pub producer: String,

    /// 作業日
    pub day: String,

    /// 数量
    pub quantity: String,

    /// メニュー品目（品目数のカウントで優先）
    pub menu_item: String,

    /// 品目（メニュー品目が空の場合に使用）
    pub item: String,

    /// 内訳チャートのカテゴリ
    pub category: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            event: "Event".to_string(),
            producer: "Producer".to_string(),
            day: "Day".to_string(),
            quantity: "Qty".to_string(),
            menu_item: "Menu Item".to_string(),
            item: "Item".to_string(),
            category: "Kosher Type".to_string(),
        }
    }
}

impl ColumnMapping {
    /// 絞り込み次元に対応する列名
    pub fn column_for(&self, dimension: FilterDimension) -> &str {
        match dimension {
            FilterDimension::Event => &self.event,
            FilterDimension::Producer => &self.producer,
        }
    }
}

/// 空のカテゴリ値の代わりに使用するラベル
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackLabels {
    /// イベントが空の場合
    pub event: String,

    /// 担当者が空の場合
    pub producer: String,

    /// カテゴリが空の場合
    pub category: String,

    /// メニュー品目・品目のどちらも空の場合
    pub menu_item: String,
}

impl Default for FallbackLabels {
    fn default() -> Self {
        Self {
            event: "Unknown".to_string(),
            producer: "Unassigned".to_string(),
            category: "Unknown".to_string(),
            menu_item: "\u{2014}".to_string(),
        }
    }
}

impl FallbackLabels {
    /// 絞り込み次元に対応するフォールバックラベル
    pub fn label_for(&self, dimension: FilterDimension) -> &str {
        match dimension {
            FilterDimension::Event => &self.event,
            FilterDimension::Producer => &self.producer,
        }
    }
}

/// 絞り込み次元
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterDimension {
    /// イベント
    Event,

    /// 担当者
    Producer,
}

impl FilterDimension {
    /// すべての絞り込み次元（表示順）
    pub const ALL: [FilterDimension; 2] = [FilterDimension::Event, FilterDimension::Producer];

    /// 表示名
    pub fn label(&self) -> &'static str {
        match self {
            FilterDimension::Event => "Event",
            FilterDimension::Producer => "Producer",
        }
    }
}

/// データセット置き換え時の絞り込み条件の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum ReloadPolicy {
    /// 絞り込み条件をそのまま維持する
    ///
    /// 新しいデータセットに存在しない値が選択されたままの場合、
    /// 絞り込み結果は0行になります（エラーにはなりません）。
    Keep,

    /// すべての次元を「All」に戻す
    Reset,

    /// 新しいデータセットに存在しない値を選択している次元のみ「All」に戻す（デフォルト）
    #[default]
    Revalidate,
}

/// 出力フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum OutputFormat {
    /// Markdown形式（デフォルト）
    ///
    /// KPI、各チャート系列、プレビュー行をMarkdownテーブルとして出力します。
    #[default]
    Markdown,

    /// JSON形式
    ///
    /// ダッシュボードビュー全体をJSONオブジェクトとして出力します。
    Json,
}
