//! Performance benchmarks for the wage tax engine.
//!
//! This benchmark suite covers:
//! - A single monthly wage tax computation
//! - A computation with other payments (three extra tariff passes)
//! - The 2024 December settlement (two full pipelines)
//! - The complete gross to net composition
//! - A batch of 1000 employees across all tax classes
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use chrono::Month;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use lohnsteuer_engine::calculation::{NetWageRequest, compute_net_wage, compute_wage_tax};
use lohnsteuer_engine::config::ConfigLoader;
use lohnsteuer_engine::models::{PayPeriod, PayPeriodInputs, TaxClass, TaxpayerProfile};

/// Creates a class I profile with the average additional health rate.
fn create_profile(year: u16, class: TaxClass) -> TaxpayerProfile {
    let mut profile = TaxpayerProfile::new(year, class, 1985);
    profile.health_additional_rate = Decimal::new(25, 1);
    profile
}

/// Benchmark: Single monthly computation.
fn bench_single_month(c: &mut Criterion) {
    let loader = ConfigLoader::builtin().unwrap();
    let constants = loader.year(2025).unwrap();
    let profile = create_profile(2025, TaxClass::I);
    let inputs = PayPeriodInputs::new(PayPeriod::Month, 500_000);

    c.bench_function("single_month", |b| {
        b.iter(|| black_box(compute_wage_tax(&profile, black_box(&inputs), constants)))
    });
}

/// Benchmark: Monthly computation with an other payment.
fn bench_other_payment(c: &mut Criterion) {
    let loader = ConfigLoader::builtin().unwrap();
    let constants = loader.year(2025).unwrap();
    let mut profile = create_profile(2025, TaxClass::I);
    profile.carry_forward.annual_wage = 4_800_000;
    let mut inputs = PayPeriodInputs::new(PayPeriod::Month, 400_000);
    inputs.special.other = 500_000;

    c.bench_function("other_payment", |b| {
        b.iter(|| black_box(compute_wage_tax(&profile, black_box(&inputs), constants)))
    });
}

/// Benchmark: 2024 December computation running both tariffs.
fn bench_december_settlement(c: &mut Criterion) {
    let loader = ConfigLoader::builtin().unwrap();
    let constants = loader.year(2024).unwrap();
    let mut profile = create_profile(2024, TaxClass::I);
    profile.month = Month::December;
    let inputs = PayPeriodInputs::new(PayPeriod::Month, 500_000);

    c.bench_function("december_settlement", |b| {
        b.iter(|| black_box(compute_wage_tax(&profile, black_box(&inputs), constants)))
    });
}

/// Benchmark: Gross to net including validation and insurance.
fn bench_net_wage(c: &mut Criterion) {
    let loader = ConfigLoader::builtin().unwrap();
    let request = NetWageRequest::new(
        create_profile(2025, TaxClass::I),
        PayPeriodInputs::new(PayPeriod::Month, 500_000),
    );

    c.bench_function("net_wage", |b| {
        b.iter(|| black_box(compute_net_wage(black_box(&request), &loader).unwrap()))
    });
}

/// Benchmark: Batch of 1000 employees.
fn bench_batch_1000(c: &mut Criterion) {
    let loader = ConfigLoader::builtin().unwrap();
    let requests: Vec<NetWageRequest> = (0..1000u64)
        .map(|i| {
            let class = TaxClass::try_from((i % 6) as u8 + 1).unwrap();
            NetWageRequest::new(
                create_profile(2025, class),
                PayPeriodInputs::new(PayPeriod::Month, 150_000 + i * 1_000),
            )
        })
        .collect();

    let mut group = c.benchmark_group("batch_processing");
    group.throughput(Throughput::Elements(1000));
    group.bench_function("batch_1000", |b| {
        b.iter(|| {
            let results: Vec<_> = requests
                .iter()
                .map(|request| compute_net_wage(request, &loader).unwrap())
                .collect();
            black_box(results)
        })
    });
    group.finish();
}

/// Benchmark: All statutory years to compare table sizes and feature sets.
fn bench_years(c: &mut Criterion) {
    let loader = ConfigLoader::builtin().unwrap();
    let mut group = c.benchmark_group("years");

    for year in loader.years() {
        let constants = loader.year(year).unwrap();
        let profile = create_profile(year, TaxClass::I);
        let inputs = PayPeriodInputs::new(PayPeriod::Month, 500_000);
        group.bench_with_input(BenchmarkId::new("year", year), &year, |b, _| {
            b.iter(|| black_box(compute_wage_tax(&profile, black_box(&inputs), constants)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_single_month,
    bench_other_payment,
    bench_december_settlement,
    bench_net_wage,
    bench_batch_1000,
    bench_years,
);
criterion_main!(benches);
