//! Builder Module
//!
//! Fluent Builder APIを提供し、`Dashboard`インスタンスを段階的に構築する。

use std::io::{Read, Write};

use crate::aggregate::{build_series, compute_kpis, filter_rows, DashboardSeries, KpiSummary};
use crate::api::{ColumnMapping, FallbackLabels, FilterDimension, OutputFormat, ReloadPolicy};
use crate::error::PrepDeckError;
use crate::filter::{available_values, FilterSelection};
use crate::output::{DashboardView, OutputFormatter};
use crate::parser::WorkbookParser;
use crate::security::SecurityConfig;
use crate::state::{DashboardState, LoadOutcome, LoadTicket};
use crate::types::{Dataset, Record};

/// プレビュー行数のデフォルト値
pub const DEFAULT_PREVIEW_ROWS: usize = 25;

/// ダッシュボードの設定を保持する内部構造体
#[derive(Debug, Clone)]
pub(crate) struct DashboardConfig {
    /// 列名の対応表
    pub columns: ColumnMapping,

    /// フォールバックラベル
    pub labels: FallbackLabels,

    /// 上位N件系列の件数
    pub top_n: usize,

    /// プレビュー行数
    pub preview_rows: usize,

    /// データセット置き換え時の絞り込み条件の扱い
    pub reload_policy: ReloadPolicy,

    /// 出力フォーマット
    pub output_format: OutputFormat,

    /// 入力制限
    pub security: SecurityConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            labels: FallbackLabels::default(),
            top_n: crate::aggregate::DEFAULT_TOP_N,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            reload_policy: ReloadPolicy::default(),
            output_format: OutputFormat::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl DashboardConfig {
    fn validate(&self) -> Result<(), PrepDeckError> {
        let columns = [
            ("event", &self.columns.event),
            ("producer", &self.columns.producer),
            ("day", &self.columns.day),
            ("quantity", &self.columns.quantity),
            ("menu_item", &self.columns.menu_item),
            ("item", &self.columns.item),
            ("category", &self.columns.category),
        ];
        for (name, column) in columns {
            if column.trim().is_empty() {
                return Err(PrepDeckError::Config(format!(
                    "Column name for '{}' must not be empty",
                    name
                )));
            }
        }

        let labels = [
            ("event", &self.labels.event),
            ("producer", &self.labels.producer),
            ("category", &self.labels.category),
            ("menu_item", &self.labels.menu_item),
        ];
        for (name, label) in labels {
            if label.trim().is_empty() {
                return Err(PrepDeckError::Config(format!(
                    "Fallback label for '{}' must not be empty",
                    name
                )));
            }
        }

        if self.top_n == 0 {
            return Err(PrepDeckError::Config(
                "top_n must be greater than 0".to_string(),
            ));
        }
        if self.preview_rows == 0 {
            return Err(PrepDeckError::Config(
                "preview_rows must be greater than 0".to_string(),
            ));
        }

        self.security.validate()
    }
}

/// Fluent Builder APIを提供する構造体
///
/// `Dashboard`インスタンスを段階的に構築するためのビルダーです。
/// すべての設定項目にデフォルト値が設定されており、必要な設定のみをオーバーライドできます。
///
/// # 使用例
///
/// ```rust
/// use prepdeck::{DashboardBuilder, OutputFormat, ReloadPolicy};
///
/// # fn main() -> Result<(), prepdeck::PrepDeckError> {
/// let dashboard = DashboardBuilder::new()
///     .with_top_n(5)
///     .with_reload_policy(ReloadPolicy::Reset)
///     .with_output_format(OutputFormat::Json)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DashboardBuilder {
    /// 内部設定（構築中）
    config: DashboardConfig,
}

impl Default for DashboardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardBuilder {
    /// デフォルト設定を持つビルダーインスタンスを生成する
    ///
    /// # デフォルト設定
    ///
    /// - 列名: `Event`, `Producer`, `Day`, `Qty`, `Menu Item`, `Item`, `Kosher Type`
    /// - フォールバック: `Unknown`, `Unassigned`, `Unknown`, `—`
    /// - 上位N件: 12
    /// - プレビュー行数: 25
    /// - 再読み込み時: 存在しない選択値のみ「All」に戻す
    /// - 出力フォーマット: Markdown
    pub fn new() -> Self {
        Self {
            config: DashboardConfig::default(),
        }
    }

    /// 集計で参照する列名を設定する
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use prepdeck::{ColumnMapping, DashboardBuilder};
    ///
    /// let builder = DashboardBuilder::new().with_columns(ColumnMapping {
    ///     quantity: "Quantity".to_string(),
    ///     ..ColumnMapping::default()
    /// });
    /// ```
    pub fn with_columns(mut self, columns: ColumnMapping) -> Self {
        self.config.columns = columns;
        self
    }

    /// フォールバックラベルを設定する
    pub fn with_labels(mut self, labels: FallbackLabels) -> Self {
        self.config.labels = labels;
        self
    }

    /// 担当者別・イベント別系列の上位件数を設定する
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.config.top_n = top_n;
        self
    }

    /// プレビュー行数を設定する
    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.config.preview_rows = rows;
        self
    }

    /// データセット置き換え時の絞り込み条件の扱いを設定する
    pub fn with_reload_policy(mut self, policy: ReloadPolicy) -> Self {
        self.config.reload_policy = policy;
        self
    }

    /// 出力フォーマットを設定する
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.config.output_format = format;
        self
    }

    /// 入力ファイルの最大サイズ（バイト）を設定する
    pub fn with_max_input_size(mut self, bytes: u64) -> Self {
        self.config.security.max_input_file_size = bytes;
        self
    }

    /// シートの最大行数・最大列数を設定する
    pub fn with_sheet_limits(mut self, max_rows: usize, max_columns: usize) -> Self {
        self.config.security.max_rows = max_rows;
        self.config.security.max_columns = max_columns;
        self
    }

    /// 設定を検証し、`Dashboard`インスタンスを生成する
    ///
    /// # 戻り値
    ///
    /// * `Ok(Dashboard)`: 設定が有効な場合
    /// * `Err(PrepDeckError::Config)`: 設定が無効な場合（例: 空の列名、`top_n == 0`）
    pub fn build(self) -> Result<Dashboard, PrepDeckError> {
        self.config.validate()?;
        Ok(Dashboard::new(self.config))
    }
}

/// ダッシュボードのファサード
///
/// パース、絞り込み、集計、出力をまとめたメインエントリーポイントです。
/// `DashboardBuilder`を使用して構築された設定に基づいて処理を実行します。
///
/// # 使用例
///
/// ```rust,no_run
/// use prepdeck::{DashboardBuilder, FilterDimension, FilterSelection};
///
/// # fn main() -> Result<(), prepdeck::PrepDeckError> {
/// let dashboard = DashboardBuilder::new().build()?;
/// let bytes = std::fs::read("schedule.xlsx")?;
/// let dataset = dashboard.parse(&bytes)?;
///
/// let selection = FilterSelection::new().with(FilterDimension::Event, "Gala");
/// let view = dashboard.summarize(&dataset, &selection);
/// print!("{}", dashboard.render_to_string(&view)?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Dashboard {
    /// ダッシュボード設定
    config: DashboardConfig,

    /// ワークブックパーサー
    parser: WorkbookParser,
}

impl Dashboard {
    pub(crate) fn new(config: DashboardConfig) -> Self {
        Self {
            parser: WorkbookParser::with_limits(config.security.clone()),
            config,
        }
    }

    /// 列名の対応表
    pub fn columns(&self) -> &ColumnMapping {
        &self.config.columns
    }

    /// フォールバックラベル
    pub fn labels(&self) -> &FallbackLabels {
        &self.config.labels
    }

    pub fn top_n(&self) -> usize {
        self.config.top_n
    }

    pub fn preview_rows(&self) -> usize {
        self.config.preview_rows
    }

    pub fn reload_policy(&self) -> ReloadPolicy {
        self.config.reload_policy
    }

    pub fn output_format(&self) -> OutputFormat {
        self.config.output_format
    }

    /// スプレッドシートのバイト列をパース
    pub fn parse(&self, bytes: &[u8]) -> Result<Dataset, PrepDeckError> {
        self.parser.parse(bytes)
    }

    /// リーダーから読み込んでパース
    ///
    /// 入力サイズの上限を超えた時点で読み込みを打ち切り、
    /// `PrepDeckError::SecurityViolation`を返します。
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Dataset, PrepDeckError> {
        let limit = self.config.security.max_input_file_size;
        let mut buffer = Vec::new();
        reader.take(limit.saturating_add(1)).read_to_end(&mut buffer)?;
        self.parser.parse(&buffer)
    }

    /// 次元の選択肢（先頭は「All」）
    pub fn available_values(&self, dataset: &Dataset, dimension: FilterDimension) -> Vec<String> {
        available_values(dataset, dimension, &self.config.columns, &self.config.labels)
    }

    /// 絞り込み条件に一致する行（元の順序を維持）
    pub fn filter<'a>(&self, dataset: &'a Dataset, selection: &FilterSelection) -> Vec<&'a Record> {
        filter_rows(
            dataset.iter(),
            selection,
            &self.config.columns,
            &self.config.labels,
        )
    }

    /// KPIサマリーを計算
    pub fn kpis(&self, rows: &[&Record]) -> KpiSummary {
        compute_kpis(rows, &self.config.columns, &self.config.labels)
    }

    /// チャート系列を計算
    pub fn series(&self, rows: &[&Record]) -> DashboardSeries {
        build_series(
            rows,
            &self.config.columns,
            &self.config.labels,
            self.config.top_n,
        )
    }

    /// 絞り込みから集計までを実行し、ダッシュボードビューを生成
    ///
    /// データセットや絞り込み条件が変わるたびに呼び出し、すべて再計算します。
    pub fn summarize(&self, dataset: &Dataset, selection: &FilterSelection) -> DashboardView {
        let rows = self.filter(dataset, selection);
        log::debug!(
            "summarizing {} of {} records",
            rows.len(),
            dataset.len()
        );

        DashboardView {
            selection: selection.clone(),
            row_count: rows.len(),
            top_n: self.config.top_n,
            kpis: self.kpis(&rows),
            series: self.series(&rows),
            category_column: self.config.columns.category.clone(),
            columns: dataset.columns().to_vec(),
            preview: rows
                .iter()
                .take(self.config.preview_rows)
                .map(|record| (*record).clone())
                .collect(),
        }
    }

    /// 現在の状態からダッシュボードビューを生成
    pub fn summarize_state(&self, state: &DashboardState) -> DashboardView {
        self.summarize(state.dataset(), state.selection())
    }

    /// ビューを設定された出力フォーマットで書き出す
    pub fn render<W: Write>(&self, view: &DashboardView, mut writer: W) -> Result<(), PrepDeckError> {
        OutputFormatter::from_format(self.config.output_format).render(view, &mut writer)
    }

    /// ビューを設定された出力フォーマットの文字列に変換
    pub fn render_to_string(&self, view: &DashboardView) -> Result<String, PrepDeckError> {
        let mut buffer = Vec::new();
        self.render(view, &mut buffer)?;

        let result = String::from_utf8(buffer).map_err(|e| {
            PrepDeckError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })?;

        Ok(result)
    }

    /// この設定の列名・ラベルを使用する空の状態を作成
    pub fn new_state(&self) -> DashboardState {
        DashboardState::new(self.config.columns.clone(), self.config.labels.clone())
    }

    /// バイト列をパースし、設定された再読み込みポリシーで状態に適用
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use prepdeck::{DashboardBuilder, LoadOutcome};
    ///
    /// # fn main() -> Result<(), prepdeck::PrepDeckError> {
    /// let dashboard = DashboardBuilder::new().build()?;
    /// let mut state = dashboard.new_state();
    ///
    /// let ticket = state.begin_load();
    /// let outcome = dashboard.complete_load(&mut state, ticket, b"not a workbook");
    /// assert!(matches!(outcome, LoadOutcome::Rejected(_)));
    /// assert!(state.dataset().is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub fn complete_load(
        &self,
        state: &mut DashboardState,
        ticket: LoadTicket,
        bytes: &[u8],
    ) -> LoadOutcome {
        let result = self.parse(bytes);
        state.complete_load(ticket, result, self.config.reload_policy)
    }
}
