/*!
# Query Benchmarks

Measures how long it takes to turn a DataTables request into the three SQL statements.
No database is involved.

```bash
cargo bench --bench query_benchmarks
```

HTML reports are generated in `target/criterion/report/index.html`.
*/

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use sea_orm::DatabaseBackend;
use std::hint::black_box;
use tablecrate::{ColumnSpec, DataTable, QuerySet, QueryStage, RequestParameters};

fn wide_table(columns: usize) -> DataTable {
    DataTable::new(
        "person",
        (0..columns).map(|i| ColumnSpec::new(format!("col_{i}"))),
    )
    .filter("deleted_at IS NULL")
}

fn request(search: &str) -> RequestParameters {
    RequestParameters::from_form_values([
        ("draw", "1"),
        ("start", "20"),
        ("length", "10"),
        ("search[value]", search),
        ("order[0][column]", "1"),
        ("order[0][dir]", "desc"),
    ])
    .unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("QuerySet::build");
    let params = request("alice");

    for columns in [3, 12, 48] {
        let table = wide_table(columns);
        group.bench_with_input(BenchmarkId::new("columns", columns), &table, |b, table| {
            b.iter(|| QuerySet::build(black_box(table), black_box(&params)).unwrap());
        });
    }

    let grouped = wide_table(12).group_by("col_1");
    group.bench_function("grouped", |b| {
        b.iter(|| QuerySet::build(black_box(&grouped), black_box(&params)).unwrap());
    });

    group.finish();
}

fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("QuerySet::statement");
    let queries = QuerySet::build(&wide_table(12), &request("alice")).unwrap();

    for backend in [DatabaseBackend::MySql, DatabaseBackend::Postgres] {
        group.bench_with_input(
            BenchmarkId::new("page", format!("{backend:?}")),
            &backend,
            |b, backend| b.iter(|| queries.statement(QueryStage::Page, *backend)),
        );
    }

    group.finish();
}

fn configure_criterion() -> Criterion {
    Criterion::default()
        .sample_size(50)
        .warm_up_time(std::time::Duration::from_secs(1))
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_build, bench_bind
}
criterion_main!(benches);
