use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use epiwatch::aggregate::{hotspots, regional_summary};
use epiwatch::replay::windows;
use epiwatch::{CaseRecord, Counts, Filter, QueryStore, Table};
use geo::Point;

const REGIONS: [&str; 6] = ["Lagos", "Abuja", "Kano", "Ibadan", "Enugu", "Jos"];
const DISEASES: [&str; 3] = ["Cholera", "Measles", "Malaria"];

fn synthetic_table(n: usize) -> Table {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let rows = (0..n)
        .map(|i| {
            let region = REGIONS[i % REGIONS.len()];
            let date = (start + chrono::Duration::days((i / 50) as i64))
                .and_hms_opt(0, 0, 0)
                .unwrap();
            let counts = Counts::new((i % 97) as i64, (i % 31) as i64, (i % 7) as i64);
            let lat = 4.0 + (i % REGIONS.len()) as f64;
            let lon = 3.0 + (i % REGIONS.len()) as f64 * 0.5;
            CaseRecord::new(date, region, DISEASES[i % DISEASES.len()], counts)
                .with_location(Point::new(lon, lat))
        })
        .collect();
    Table::new(rows, true)
}

fn bench_replay_windows(c: &mut Criterion) {
    let mut group = c.benchmark_group("replay_windows");
    let table = synthetic_table(100_000);

    for chunk_size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(table.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("window_summary", chunk_size),
            chunk_size,
            |b, &chunk_size| {
                b.iter(|| {
                    let mut total = 0i64;
                    for window in windows(black_box(&table), chunk_size).unwrap() {
                        total += window
                            .summary()
                            .iter()
                            .map(|c| c.new_cases)
                            .sum::<i64>();
                    }
                    total
                })
            },
        );
    }

    group.finish();
}

fn bench_filter_and_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_and_aggregate");
    let table = synthetic_table(100_000);

    let from = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
    let filter = Filter::new()
        .regions(["Lagos", "Kano"])
        .diseases(["Cholera"])
        .date_range(from, to);

    group.bench_function("filter", |b| {
        b.iter(|| table.filter(black_box(&filter)).len())
    });

    group.bench_function("regional_summary", |b| {
        b.iter(|| regional_summary(black_box(&table)))
    });

    group.bench_function("hotspots", |b| b.iter(|| hotspots(black_box(&table))));

    group.finish();
}

fn bench_query_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_store");

    for n in [1_000, 10_000].iter() {
        let table = synthetic_table(*n);
        group.throughput(Throughput::Elements(*n as u64));
        group.bench_with_input(BenchmarkId::new("register", n), &table, |b, table| {
            let store = QueryStore::memory().unwrap();
            b.iter(|| store.register_table(black_box(table)).unwrap())
        });
    }

    let store = QueryStore::memory().unwrap();
    store.register_table(&synthetic_table(10_000)).unwrap();
    group.bench_function("group_by_region", |b| {
        b.iter(|| {
            store
                .run_query(black_box(
                    "SELECT region, SUM(new_cases) AS total_cases FROM data GROUP BY region",
                ))
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_replay_windows,
    bench_filter_and_aggregate,
    bench_query_store
);
criterion_main!(benches);
