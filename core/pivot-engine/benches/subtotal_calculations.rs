use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use engine::{CellValue, Table};
use pivot_engine::{
    group_aggregate, AggregateOptions, AggregationType, SubtotalDefinition,
    SubtotaledPivotBuilder, ValueAggregation,
};

const REGIONS: [&str; 4] = ["North", "South", "East", "West"];

fn build_sales_table(rows: usize) -> Table {
    let data = (0..rows).map(|i| {
        vec![
            CellValue::text(REGIONS[i % REGIONS.len()]),
            CellValue::text(format!("Store_{:03}", i % 250)),
            CellValue::text(format!("Product_{:02}", i % 40)),
            CellValue::Number((i % 12) as f64 + 1.0),
            CellValue::Number((i * 7 % 1000) as f64 / 10.0),
        ]
    });
    Table::with_rows(["Region", "Store", "Product", "Month", "Sales"], data).unwrap()
}

fn bench_group_aggregate(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_aggregate");
    let keys: Vec<String> = ["Region", "Store", "Product"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let values = ValueAggregation::new("Sales", AggregationType::Sum);
    let options = AggregateOptions::default();

    for rows in [10_000usize, 100_000] {
        let table = build_sales_table(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &table, |b, table| {
            b.iter(|| group_aggregate(black_box(table), &keys, &values, &options).unwrap())
        });
    }
    group.finish();
}

fn bench_subtotals(c: &mut Criterion) {
    let mut group = c.benchmark_group("pivot_with_subtotals");
    let table = build_sales_table(100_000);

    for levels in 1..=4 {
        let def = SubtotalDefinition::new(
            ["Region", "Store", "Product", "Month"],
            "Sales",
            vec![AggregationType::Sum, AggregationType::Mean],
            levels,
        );
        group.bench_with_input(BenchmarkId::new("levels", levels), &def, |b, def| {
            b.iter(|| {
                SubtotaledPivotBuilder::new(black_box(&table), def)
                    .build()
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_group_aggregate, bench_subtotals);
criterion_main!(benches);
