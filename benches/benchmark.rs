//! パフォーマンスベンチマーク
//!
//! このモジュールは、prepdeckクレートのパフォーマンスを測定するためのベンチマークを提供します。
//!
//! 実装するベンチマーク:
//! - パース: 生成したスケジュールのワークブックをデータセットに変換
//! - 集計: 絞り込みからKPI・チャート系列の計算まで（絞り込み変更ごとの再計算）
//! - 出力: Markdown形式への変換
//!
//! ワークブックは実行時にメモリ上で生成するため、フィクスチャファイルは不要です。

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use prepdeck::{DashboardBuilder, FilterDimension, FilterSelection};
use rust_xlsxwriter::{Format, Workbook, XlsxError};

/// 指定された行数のスケジュールを生成
fn generate_schedule(rows: u32) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");

    let headers = ["Event", "Producer", "Day", "Qty", "Menu Item", "Kosher Type"];
    for (col, header) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, *header)?;
    }

    for i in 0..rows {
        let row = i + 1;
        worksheet.write_string(row, 0, &format!("Event{}", i % 40))?;
        if i % 11 != 0 {
            worksheet.write_string(row, 1, &format!("Chef{}", i % 25))?;
        }
        worksheet.write_number_with_format(row, 2, f64::from(45658 + i % 90), &date_format)?;
        worksheet.write_number(row, 3, f64::from(i % 7))?;
        worksheet.write_string(row, 4, &format!("Dish{}", i % 300))?;
        worksheet.write_string(row, 5, ["Meat", "Dairy", "Pareve"][(i % 3) as usize])?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn benchmark_parse(c: &mut Criterion) {
    let dashboard = DashboardBuilder::new().build().unwrap();

    let mut group = c.benchmark_group("parse");
    group.sample_size(10);

    for rows in [1_000u32, 10_000] {
        let data = generate_schedule(rows).unwrap();
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &data, |b, data| {
            b.iter(|| black_box(dashboard.parse(black_box(data)).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_summarize(c: &mut Criterion) {
    let dashboard = DashboardBuilder::new().build().unwrap();
    let data = generate_schedule(10_000).unwrap();
    let dataset = dashboard.parse(&data).unwrap();

    let mut group = c.benchmark_group("summarize");
    group.throughput(Throughput::Elements(dataset.len() as u64));

    group.bench_function("unfiltered", |b| {
        let selection = FilterSelection::new();
        b.iter(|| black_box(dashboard.summarize(black_box(&dataset), &selection)));
    });

    group.bench_function("filtered_by_event_and_producer", |b| {
        let selection = FilterSelection::new()
            .with(FilterDimension::Event, "Event7")
            .with(FilterDimension::Producer, "Chef7");
        b.iter(|| black_box(dashboard.summarize(black_box(&dataset), &selection)));
    });

    group.finish();
}

fn benchmark_render(c: &mut Criterion) {
    let dashboard = DashboardBuilder::new().build().unwrap();
    let data = generate_schedule(10_000).unwrap();
    let dataset = dashboard.parse(&data).unwrap();
    let view = dashboard.summarize(&dataset, &FilterSelection::new());

    c.bench_function("render_markdown", |b| {
        b.iter(|| black_box(dashboard.render_to_string(black_box(&view)).unwrap()));
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(std::time::Duration::from_secs(10))
        .warm_up_time(std::time::Duration::from_secs(3));
    targets = benchmark_parse, benchmark_summarize, benchmark_render
}

criterion_main!(benches);
