use std::hint::black_box;

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, Criterion};

use grainstat::aggregation::Aggregation;
use grainstat::grain::{time_grain, DateFormat, TimeGrain};
use grainstat::stats::{average, percentage};

fn accumulate(surveys: usize) -> Aggregation {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
    let mut data = Aggregation::new();
    for i in 0..surveys {
        let taken = start + chrono::Duration::hours(i as i64);
        let label = time_grain(&taken, TimeGrain::Week, DateFormat::Iso);
        let bucket = data.bucket(&label);
        bucket.declare_attribute("ratios");
        bucket.add_value("ratios", (i % 25) as f64 / 25.0).unwrap();
    }
    data
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let taken = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(9, 30, 0).unwrap();
    c.bench_function("time grain week", |b| {
        b.iter(|| time_grain(black_box(&taken), TimeGrain::Week, DateFormat::Iso))
    });
    c.bench_function("time grain long month", |b| {
        b.iter(|| time_grain(black_box(&taken), TimeGrain::Month, DateFormat::Long))
    });

    c.bench_function("accumulate 1k", |b| b.iter(|| accumulate(black_box(1_000))));
    c.bench_function("accumulate 100k", |b| b.iter(|| accumulate(black_box(100_000))));

    let data = accumulate(100_000);
    c.bench_function("reduce 100k", |b| {
        b.iter(|| {
            data.iter()
                .filter_map(|(label, bucket)| {
                    average(bucket.values("ratios")).map(|rate| (label, percentage(rate, 4)))
                })
                .count()
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
