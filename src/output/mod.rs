//! Output Format Module
//!
//! Strategy Patternによる出力フォーマットの抽象化を提供するモジュール。

mod formatters;

use serde::Serialize;
use std::io::Write;

use crate::aggregate::{DashboardSeries, KpiSummary};
use crate::error::PrepDeckError;
use crate::filter::FilterSelection;
use crate::types::Record;

pub use formatters::*;

/// 出力対象のダッシュボードビュー
///
/// 絞り込み後の行から計算したKPI・チャート系列と、先頭数行のプレビューを保持します。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// 適用した絞り込み条件
    pub selection: FilterSelection,

    /// 絞り込み後の行数
    pub row_count: usize,

    /// 上位N件系列の件数
    pub top_n: usize,

    pub kpis: KpiSummary,

    pub series: DashboardSeries,

    /// 内訳チャートのカテゴリ列名（パネルの見出しに使用）
    pub category_column: String,

    /// 列名のリスト（ヘッダー順）
    pub columns: Vec<String>,

    /// プレビュー行（絞り込み後の先頭から最大`preview_rows`件）
    pub preview: Vec<Record>,
}

/// 出力フォーマッター（Strategy Pattern）
///
/// 各出力フォーマット（Markdown, JSON）をenumとして表現します。
#[derive(Debug, Clone, Copy)]
pub enum OutputFormatter {
    Markdown,
    Json,
}

impl OutputFormatter {
    /// 出力フォーマットからフォーマッターを生成
    pub fn from_format(format: crate::api::OutputFormat) -> Self {
        match format {
            crate::api::OutputFormat::Markdown => OutputFormatter::Markdown,
            crate::api::OutputFormat::Json => OutputFormatter::Json,
        }
    }

    /// ビューを指定されたフォーマットで出力する
    ///
    /// # 引数
    ///
    /// * `view` - 出力するダッシュボードビュー
    /// * `writer` - 出力先のライター
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 出力に成功した場合
    /// * `Err(PrepDeckError)` - 書き込みまたはシリアライズに失敗した場合
    pub fn render<W: Write>(
        &self,
        view: &DashboardView,
        writer: &mut W,
    ) -> Result<(), PrepDeckError> {
        match self {
            OutputFormatter::Markdown => MarkdownFormatter.render(view, writer),
            OutputFormatter::Json => JsonFormatter.render(view, writer),
        }
    }
}
