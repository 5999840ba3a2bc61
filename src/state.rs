//! Dashboard State Module
//!
//! 有効なデータセットと絞り込み条件、および読み込み世代を管理するモジュール。
//!
//! 読み込みは`begin_load`で世代番号を発行し、`complete_load`で結果を適用します。
//! 適用されるのは最後に開始された読み込みのみで、それより古い読み込みの結果は破棄されます。

use crate::aggregate::filter_rows;
use crate::api::{ColumnMapping, FallbackLabels, FilterDimension, ReloadPolicy};
use crate::error::PrepDeckError;
use crate::filter::{FilterSelection, Selection};
use crate::types::{Dataset, Record};

/// 読み込みの世代を表すチケット
///
/// `DashboardState::begin_load`でのみ発行され、`complete_load`で消費されます。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    /// 世代番号
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// 読み込み完了時の結果
#[derive(Debug)]
pub enum LoadOutcome {
    /// 新しいデータセットが有効になった
    Applied,

    /// より新しい読み込みが開始されていたため、結果を破棄した
    Superseded,

    /// 最新の読み込みが失敗した（以前のデータセットが有効なまま）
    Rejected(PrepDeckError),
}

impl LoadOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, LoadOutcome::Applied)
    }
}

/// ダッシュボードの状態
///
/// データセットと絞り込み条件の組を保持します。データセットの置き換えは
/// `replace_dataset`（または`complete_load`）による1回の遷移で行われ、
/// 中途半端な状態が外から観測されることはありません。
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    dataset: Dataset,
    selection: FilterSelection,
    columns: ColumnMapping,
    labels: FallbackLabels,
    latest_generation: u64,
    applied_generation: u64,
}

impl DashboardState {
    /// 空のデータセットと「All」の絞り込み条件で状態を作成
    ///
    /// `columns`と`labels`は`ReloadPolicy::Revalidate`で選択肢を
    /// 再計算する際に使用します。
    pub fn new(columns: ColumnMapping, labels: FallbackLabels) -> Self {
        Self {
            dataset: Dataset::empty(),
            selection: FilterSelection::new(),
            columns,
            labels,
            latest_generation: 0,
            applied_generation: 0,
        }
    }

    /// 有効なデータセット
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// 現在の絞り込み条件
    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    /// 最後に発行された世代番号（未発行の場合は0）
    pub fn latest_generation(&self) -> u64 {
        self.latest_generation
    }

    /// 現在のデータセットを適用した世代番号（未適用の場合は0）
    pub fn applied_generation(&self) -> u64 {
        self.applied_generation
    }

    /// 絞り込み条件を変更
    pub fn set_filter(&mut self, dimension: FilterDimension, selection: impl Into<Selection>) {
        self.selection.set(dimension, selection);
    }

    /// 現在の絞り込み条件に一致する行
    pub fn filtered(&self) -> Vec<&Record> {
        filter_rows(
            self.dataset.iter(),
            &self.selection,
            &self.columns,
            &self.labels,
        )
    }

    /// データセットを置き換えた新しい状態を返す
    ///
    /// 絞り込み条件の扱いは`policy`に従います。
    ///
    /// # 使用例
    ///
    /// ```rust
    /// use prepdeck::{DashboardState, Dataset, FilterDimension, ReloadPolicy, Selection};
    ///
    /// let mut state = DashboardState::default();
    /// state.set_filter(FilterDimension::Producer, "Chef Z");
    ///
    /// let smaller = Dataset::new(["Producer"], vec![vec!["Chef A".into()]]);
    /// let state = state.replace_dataset(smaller, ReloadPolicy::Revalidate);
    /// assert_eq!(state.selection().get(FilterDimension::Producer), &Selection::All);
    /// ```
    pub fn replace_dataset(mut self, dataset: Dataset, policy: ReloadPolicy) -> Self {
        self.install(dataset, policy);
        self
    }

    /// 新しい読み込みを開始し、その世代のチケットを発行
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_generation += 1;
        log::debug!("load generation {} started", self.latest_generation);
        LoadTicket {
            generation: self.latest_generation,
        }
    }

    /// 読み込み結果を適用
    ///
    /// # 戻り値
    ///
    /// * `LoadOutcome::Applied` - `ticket`が最新で、パースに成功した場合
    /// * `LoadOutcome::Superseded` - `ticket`より新しい読み込みが開始されている場合、
    ///   または同じ世代の結果がすでに適用されている場合
    /// * `LoadOutcome::Rejected` - `ticket`が最新で、パースに失敗した場合
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Dataset, PrepDeckError>,
        policy: ReloadPolicy,
    ) -> LoadOutcome {
        if ticket.generation != self.latest_generation {
            log::warn!(
                "discarding result of load generation {} (latest is {})",
                ticket.generation,
                self.latest_generation
            );
            return LoadOutcome::Superseded;
        }
        if ticket.generation <= self.applied_generation {
            log::warn!(
                "load generation {} has already been applied",
                ticket.generation
            );
            return LoadOutcome::Superseded;
        }

        match result {
            Ok(dataset) => {
                self.install(dataset, policy);
                self.applied_generation = ticket.generation;
                log::debug!(
                    "load generation {} applied ({} records)",
                    ticket.generation,
                    self.dataset.len()
                );
                LoadOutcome::Applied
            }
            Err(err) => {
                log::warn!(
                    "load generation {} failed; keeping the previous dataset: {}",
                    ticket.generation,
                    err
                );
                LoadOutcome::Rejected(err)
            }
        }
    }

    fn install(&mut self, dataset: Dataset, policy: ReloadPolicy) {
        self.selection = match policy {
            ReloadPolicy::Keep => self.selection.clone(),
            ReloadPolicy::Reset => FilterSelection::new(),
            ReloadPolicy::Revalidate => {
                self.selection
                    .revalidate(&dataset, &self.columns, &self.labels)
            }
        };
        self.dataset = dataset;
    }
}
