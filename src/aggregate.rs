//! Aggregation Engine Module
//!
//! 絞り込み、グループ別件数・合計、上位N件の抽出、KPIの算出を行うモジュール。
//! すべて入力行に対する純粋関数で、キャッシュは持ちません。
//! データセットや絞り込み条件が変わるたびに全件を1パスで再計算します。

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::api::{ColumnMapping, FallbackLabels};
use crate::filter::FilterSelection;
use crate::normalize::to_iso_date;
use crate::types::{CellValue, Record};

/// 上位N件の系列で使用するデフォルトの件数
pub const DEFAULT_TOP_N: usize = 12;

/// グループ集計の1区分
///
/// `key`はフォールバック置換後のカテゴリ値、`value`は件数または合計です。
/// 1回の集計内でキーは一意です。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub value: f64,
}

impl Bucket {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// KPIサマリー
///
/// 絞り込み後の行から毎回すべて再計算されます。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    /// 行数
    pub total_lines: usize,

    /// 数量の合計（数値でない値は0）
    pub total_qty: f64,

    /// メニュー品目の種類数
    pub unique_menu_items: usize,

    /// 作業日が日付として解釈できる行数
    pub scheduled: usize,

    /// 作業日が空、または解釈できない行数
    pub unscheduled: usize,

    /// 担当者が空の行数
    pub unassigned_producer: usize,
}

/// チャート用の集計系列
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardSeries {
    /// 日別件数（日付の昇順、件数制限なし）
    pub items_by_day: Vec<Bucket>,

    /// 担当者別数量（降順、上位N件）
    pub qty_by_producer: Vec<Bucket>,

    /// カテゴリ別件数（降順、件数制限なし）
    pub category_breakdown: Vec<Bucket>,

    /// イベント別件数（降順、上位N件）
    pub items_by_event: Vec<Bucket>,
}

/// フォールバック置換付きのカテゴリ値を返すキー関数を生成
///
/// フィールドの値を前後の空白を除いた文字列にし、空であれば
/// `fallback`を返します。絞り込みとグループ集計で同じ置換規則を使用します。
pub fn category_key<'a>(column: &'a str, fallback: &'a str) -> impl Fn(&Record) -> String + 'a {
    move |record: &Record| category_text(record, column, fallback)
}

pub(crate) fn category_text(record: &Record, column: &str, fallback: &str) -> String {
    let text = record.text(column);
    if text.is_empty() {
        fallback.to_string()
    } else {
        text
    }
}

/// 絞り込み条件に一致する行を元の順序で返す
///
/// すべての次元が「All」の場合は入力をそのまま返します。
pub fn filter_rows<'a, I>(
    records: I,
    selection: &FilterSelection,
    columns: &ColumnMapping,
    labels: &FallbackLabels,
) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
{
    records
        .into_iter()
        .filter(|record| selection.matches(record, columns, labels))
        .collect()
}

/// キーごとの行数を集計
///
/// 区分は最初に現れた順に並びます。
pub fn group_count<'a, I, K>(rows: I, key_fn: K) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Record>,
    K: Fn(&Record) -> String,
{
    accumulate(rows, key_fn, |_| 1.0)
}

/// キーごとに値の合計を集計
///
/// `value_fn`の結果は数値に強制変換されます。数値でない値・空値は0として
/// 加算され、行が除外されることはありません。
///
/// # 使用例
///
/// ```rust
/// use prepdeck::{category_key, group_sum, Bucket, Dataset};
///
/// let dataset = Dataset::new(
///     ["Producer", "Qty"],
///     vec![
///         vec!["Chef A".into(), 5.0.into()],
///         vec!["Chef A".into(), 3.0.into()],
///     ],
/// );
/// let buckets = group_sum(&dataset, category_key("Producer", "Unassigned"), |r| r.value("Qty"));
/// assert_eq!(buckets, vec![Bucket::new("Chef A", 8.0)]);
/// ```
pub fn group_sum<'a, I, K, V>(rows: I, key_fn: K, value_fn: V) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Record>,
    K: Fn(&Record) -> String,
    V: Fn(&Record) -> &CellValue,
{
    accumulate(rows, key_fn, |record| value_fn(record).as_number())
}

fn accumulate<'a, I, K, A>(rows: I, key_fn: K, amount: A) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Record>,
    K: Fn(&Record) -> String,
    A: Fn(&Record) -> f64,
{
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<Bucket> = Vec::new();

    for record in rows {
        let key = key_fn(record);
        let value = amount(record);
        match index.get(&key) {
            Some(&idx) => buckets[idx].value += value,
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(Bucket { key, value });
            }
        }
    }

    buckets
}

/// 値の降順に安定ソート（同値は最初に現れた順を維持）
pub fn sort_descending(buckets: &mut [Bucket]) {
    // -0.0と0.0は同値として扱う
    buckets.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
}

/// 値の降順に安定ソートし、先頭`n`件を返す
pub fn top_n(mut buckets: Vec<Bucket>, n: usize) -> Vec<Bucket> {
    sort_descending(&mut buckets);
    buckets.truncate(n);
    buckets
}

/// 日別件数
///
/// 日付として解釈できない行は含めません。日付文字列の昇順に並べ、
/// 件数制限はしません。
pub fn items_by_day<'a, I>(rows: I, day_column: &str) -> Vec<Bucket>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts: HashMap<String, f64> = HashMap::new();
    for record in rows {
        if let Some(day) = to_iso_date(record.value(day_column)) {
            *counts.entry(day).or_insert(0.0) += 1.0;
        }
    }

    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(key, value)| Bucket { key, value })
        .collect();
    buckets.sort_by(|a, b| a.key.cmp(&b.key));
    buckets
}

/// KPIサマリーを算出
pub fn compute_kpis(
    rows: &[&Record],
    columns: &ColumnMapping,
    labels: &FallbackLabels,
) -> KpiSummary {
    let total_lines = rows.len();

    let total_qty: f64 = rows
        .iter()
        .map(|record| record.value(&columns.quantity).as_number())
        .sum();

    // メニュー品目 → 品目 → プレースホルダーの優先順
    let unique_menu_items = rows
        .iter()
        .map(|record| {
            let menu_item = record.text(&columns.menu_item);
            if !menu_item.is_empty() {
                return menu_item;
            }
            category_text(record, &columns.item, &labels.menu_item)
        })
        .collect::<HashSet<String>>()
        .len();

    let scheduled = rows
        .iter()
        .filter(|record| to_iso_date(record.value(&columns.day)).is_some())
        .count();

    let unassigned_producer = rows
        .iter()
        .filter(|record| record.text(&columns.producer).is_empty())
        .count();

    KpiSummary {
        total_lines,
        total_qty,
        unique_menu_items,
        scheduled,
        unscheduled: total_lines - scheduled,
        unassigned_producer,
    }
}

/// チャート用の4系列を算出
///
/// # 引数
///
/// * `rows` - 絞り込み後の行
/// * `columns` - 列名の対応表
/// * `labels` - フォールバックラベル
/// * `limit` - 担当者別・イベント別系列の上位件数
pub fn build_series(
    rows: &[&Record],
    columns: &ColumnMapping,
    labels: &FallbackLabels,
    limit: usize,
) -> DashboardSeries {
    let items_by_day = items_by_day(rows.iter().copied(), &columns.day);

    let qty_by_producer = top_n(
        group_sum(
            rows.iter().copied(),
            category_key(&columns.producer, &labels.producer),
            |record| record.value(&columns.quantity),
        ),
        limit,
    );

    let mut category_breakdown = group_count(
        rows.iter().copied(),
        category_key(&columns.category, &labels.category),
    );
    sort_descending(&mut category_breakdown);

    let items_by_event = top_n(
        group_count(
            rows.iter().copied(),
            category_key(&columns.event, &labels.event),
        ),
        limit,
    );

    DashboardSeries {
        items_by_day,
        qty_by_producer,
        category_breakdown,
        items_by_event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::FilterDimension;
    use crate::types::Dataset;
    use chrono::NaiveDate;

    fn schedule() -> Dataset {
        Dataset::new(
            ["Event", "Producer", "Day", "Qty", "Menu Item", "Item", "Kosher Type"],
            vec![
                vec![
                    "Gala".into(),
                    "Chef A".into(),
                    45658.0.into(),
                    5.0.into(),
                    "Salmon".into(),
                    CellValue::Null,
                    "Meat".into(),
                ],
                vec![
                    "Gala".into(),
                    "Chef A".into(),
                    "2025-01-02".into(),
                    3.0.into(),
                    CellValue::Null,
                    "Bread".into(),
                    "Pareve".into(),
                ],
                vec![
                    "Brunch".into(),
                    CellValue::Null,
                    "TBD".into(),
                    "x".into(),
                    CellValue::Null,
                    CellValue::Null,
                    CellValue::Null,
                ],
                vec![
                    CellValue::Null,
                    "Chef B".into(),
                    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().into(),
                    "4".into(),
                    "Salmon".into(),
                    CellValue::Null,
                    "Meat".into(),
                ],
            ],
        )
    }

    fn all_rows(dataset: &Dataset) -> Vec<&Record> {
        dataset.iter().collect()
    }

    #[test]
    fn test_filter_rows_all_returns_input_in_order() {
        let data = schedule();
        let rows = filter_rows(
            &data,
            &FilterSelection::new(),
            &ColumnMapping::default(),
            &FallbackLabels::default(),
        );
        assert_eq!(rows.len(), data.len());
        for (filtered, original) in rows.iter().zip(data.iter()) {
            assert!(std::ptr::eq(*filtered, original));
        }
    }

    #[test]
    fn test_filter_rows_by_event_and_producer() {
        let data = schedule();
        let selection = FilterSelection::new()
            .with(FilterDimension::Event, "Gala")
            .with(FilterDimension::Producer, "Chef A");
        let rows = filter_rows(
            &data,
            &selection,
            &ColumnMapping::default(),
            &FallbackLabels::default(),
        );
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_filter_rows_fallback_event() {
        let data = schedule();
        let selection = FilterSelection::new().with(FilterDimension::Event, "Unknown");
        let rows = filter_rows(
            &data,
            &selection,
            &ColumnMapping::default(),
            &FallbackLabels::default(),
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("Producer"), "Chef B");
    }

    #[test]
    fn test_group_count_first_seen_order() {
        let data = schedule();
        let buckets = group_count(&data, category_key("Event", "Unknown"));
        assert_eq!(
            buckets,
            vec![
                Bucket::new("Gala", 2.0),
                Bucket::new("Brunch", 1.0),
                Bucket::new("Unknown", 1.0),
            ]
        );
    }

    #[test]
    fn test_group_sum_coerces_values() {
        let data = schedule();
        let buckets = group_sum(&data, category_key("Producer", "Unassigned"), |r| {
            r.value("Qty")
        });
        assert_eq!(
            buckets,
            vec![
                Bucket::new("Chef A", 8.0),
                Bucket::new("Unassigned", 0.0),
                Bucket::new("Chef B", 4.0),
            ]
        );
    }

    #[test]
    fn test_group_sum_missing_column() {
        let data = schedule();
        let buckets = group_sum(&data, category_key("Nope", "Unknown"), |r| {
            r.value("Nope")
        });
        assert_eq!(buckets, vec![Bucket::new("Unknown", 0.0)]);
    }

    #[test]
    fn test_top_n_truncates_and_keeps_first_seen_ties() {
        let buckets: Vec<Bucket> = (0..20)
            .map(|i| Bucket::new(format!("k{}", i), if i % 2 == 0 { 1.0 } else { 2.0 }))
            .collect();

        let top = top_n(buckets, 12);
        assert_eq!(top.len(), 12);
        let keys: Vec<&str> = top.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["k1", "k3", "k5", "k7", "k9", "k11", "k13", "k15", "k17", "k19", "k0", "k2"]
        );
    }

    #[test]
    fn test_sort_descending_treats_signed_zeros_as_ties() {
        let mut buckets = vec![
            Bucket::new("A", -0.0),
            Bucket::new("B", 0.0),
            Bucket::new("C", 1.0),
        ];
        sort_descending(&mut buckets);
        let keys: Vec<&str> = buckets.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(keys, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_top_n_shorter_than_limit() {
        let top = top_n(vec![Bucket::new("a", 1.0), Bucket::new("b", 3.0)], 12);
        assert_eq!(top, vec![Bucket::new("b", 3.0), Bucket::new("a", 1.0)]);
    }

    #[test]
    fn test_items_by_day_sorted_ascending() {
        let data = schedule();
        let buckets = items_by_day(&data, "Day");
        assert_eq!(
            buckets,
            vec![Bucket::new("2025-01-01", 2.0), Bucket::new("2025-01-02", 1.0)]
        );
    }

    #[test]
    fn test_compute_kpis() {
        let data = schedule();
        let kpis = compute_kpis(
            &all_rows(&data),
            &ColumnMapping::default(),
            &FallbackLabels::default(),
        );

        assert_eq!(
            kpis,
            KpiSummary {
                total_lines: 4,
                total_qty: 12.0,
                // Salmon, Bread, —
                unique_menu_items: 3,
                scheduled: 3,
                unscheduled: 1,
                unassigned_producer: 1,
            }
        );
    }

    #[test]
    fn test_compute_kpis_empty() {
        let kpis = compute_kpis(&[], &ColumnMapping::default(), &FallbackLabels::default());
        assert_eq!(kpis, KpiSummary::default());
    }

    #[test]
    fn test_kpi_total_qty_scenario() {
        // 数量 = [2, 空, "x"] の合計は2
        let data = Dataset::new(
            ["Qty"],
            vec![vec![2.0.into()], vec![CellValue::Null], vec!["x".into()]],
        );
        let kpis = compute_kpis(
            &all_rows(&data),
            &ColumnMapping::default(),
            &FallbackLabels::default(),
        );
        assert_eq!(kpis.total_qty, 2.0);
        assert_eq!(kpis.total_lines, 3);
    }

    #[test]
    fn test_build_series() {
        let data = schedule();
        let series = build_series(
            &all_rows(&data),
            &ColumnMapping::default(),
            &FallbackLabels::default(),
            DEFAULT_TOP_N,
        );

        assert_eq!(series.items_by_day.len(), 2);
        assert_eq!(series.qty_by_producer[0], Bucket::new("Chef A", 8.0));
        assert_eq!(
            series.category_breakdown,
            vec![
                Bucket::new("Meat", 2.0),
                Bucket::new("Pareve", 1.0),
                Bucket::new("Unknown", 1.0),
            ]
        );
        assert_eq!(series.items_by_event[0], Bucket::new("Gala", 2.0));
    }

    #[test]
    fn test_build_series_respects_limit() {
        let rows: Vec<Vec<CellValue>> = (0..30)
            .map(|i| vec![format!("Event {}", i).into()])
            .collect();
        let data = Dataset::new(["Event"], rows);
        let series = build_series(
            &all_rows(&data),
            &ColumnMapping::default(),
            &FallbackLabels::default(),
            DEFAULT_TOP_N,
        );
        assert_eq!(series.items_by_event.len(), 12);
        assert_eq!(series.qty_by_producer.len(), 1);
    }

    // プロパティベーステスト
    #[allow(unused_doc_comments)]
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn dataset_from(rows: &[(u8, i32)]) -> Dataset {
            Dataset::new(
                ["Producer", "Qty"],
                rows.iter()
                    .map(|(p, q)| {
                        let producer = if *p == 0 {
                            CellValue::Null
                        } else {
                            CellValue::from(format!("Chef {}", p))
                        };
                        vec![producer, CellValue::from(*q as i64)]
                    })
                    .collect(),
            )
        }

        fn as_map(buckets: Vec<Bucket>) -> std::collections::BTreeMap<String, i64> {
            buckets
                .into_iter()
                .map(|b| (b.key, b.value as i64))
                .collect()
        }

        #[allow(unused_doc_comments)]
        /// 行の並び替えで集計結果（区分ごとの合計）は変わらない
        proptest! {
            #[test]
            fn test_grouping_is_permutation_invariant(
                rows in proptest::collection::vec((0u8..5, -1000i32..1000), 0..60),
                seed in any::<u64>(),
            ) {
                let mut shuffled = rows.clone();
                // 決定的な並び替え
                let len = shuffled.len();
                if len > 1 {
                    for i in (1..len).rev() {
                        let j = (seed.wrapping_mul(i as u64 + 7) % (i as u64 + 1)) as usize;
                        shuffled.swap(i, j);
                    }
                }

                let a = dataset_from(&rows);
                let b = dataset_from(&shuffled);
                let key = || category_key("Producer", "Unassigned");

                prop_assert_eq!(
                    as_map(group_count(&a, key())),
                    as_map(group_count(&b, key()))
                );
                prop_assert_eq!(
                    as_map(group_sum(&a, key(), |r| r.value("Qty"))),
                    as_map(group_sum(&b, key(), |r| r.value("Qty")))
                );
            }
        }

        #[allow(unused_doc_comments)]
        /// グループ別合計は絞り込み後の行を過不足なく分割する
        proptest! {
            #[test]
            fn test_group_sum_partitions_total(
                rows in proptest::collection::vec((0u8..5, -1000i32..1000), 0..60),
                pick in 0u8..5,
            ) {
                let data = dataset_from(&rows);
                let columns = ColumnMapping::default();
                let labels = FallbackLabels::default();
                let producer = if pick == 0 {
                    "Unassigned".to_string()
                } else {
                    format!("Chef {}", pick)
                };
                let selection =
                    FilterSelection::new().with(FilterDimension::Producer, producer.as_str());

                let filtered = filter_rows(&data, &selection, &columns, &labels);
                let grouped: f64 = group_sum(
                    filtered.iter().copied(),
                    category_key("Producer", "Unassigned"),
                    |r| r.value("Qty"),
                )
                .iter()
                .map(|b| b.value)
                .sum();
                let direct: f64 = filtered.iter().map(|r| r.value("Qty").as_number()).sum();
                let counted: f64 = group_count(filtered.iter().copied(), category_key("Producer", "Unassigned"))
                    .iter()
                    .map(|b| b.value)
                    .sum();

                prop_assert_eq!(grouped, direct);
                prop_assert_eq!(counted as usize, filtered.len());
            }
        }

        #[allow(unused_doc_comments)]
        /// 上位N件は12件以下で、残りのどの区分よりも小さくない
        proptest! {
            #[test]
            fn test_top_n_keeps_largest(values in proptest::collection::vec(0u16..50, 0..40)) {
                let buckets: Vec<Bucket> = values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| Bucket::new(format!("k{}", i), *v as f64))
                    .collect();
                let top = top_n(buckets.clone(), DEFAULT_TOP_N);

                prop_assert!(top.len() <= DEFAULT_TOP_N);
                prop_assert_eq!(top.len(), buckets.len().min(DEFAULT_TOP_N));
                let min_kept = top.iter().map(|b| b.value).fold(f64::INFINITY, f64::min);
                for b in buckets.iter().filter(|b| !top.contains(b)) {
                    prop_assert!(b.value <= min_kept);
                }
                for pair in top.windows(2) {
                    prop_assert!(pair[0].value >= pair[1].value);
                }
            }
        }
    }
}
