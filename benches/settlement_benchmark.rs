use criterion::{black_box, criterion_group, criterion_main, Criterion};
use split_engine::settlement::{
    aggregate_balances, direct_reimbursements, suggested_reimbursements,
};
use split_engine::simulation::expense_generator::{generate_random_expenses, ExpenseNetworkConfig};

fn config(participant_count: usize, expense_count: usize) -> ExpenseNetworkConfig {
    ExpenseNetworkConfig {
        participant_count,
        expense_count,
        seed: Some(42),
        ..Default::default()
    }
}

fn bench_aggregate_100_expenses(c: &mut Criterion) {
    let set = generate_random_expenses(&config(10, 100));

    c.bench_function("aggregate_100_expenses", |b| {
        b.iter(|| aggregate_balances(black_box(&set)))
    });
}

fn bench_simplified_100_participants(c: &mut Criterion) {
    let set = generate_random_expenses(&config(100, 1_000));
    let balances = match aggregate_balances(&set) {
        Ok(balances) => balances,
        Err(e) => panic!("generated expenses must aggregate: {e}"),
    };

    c.bench_function("simplified_100_participants", |b| {
        b.iter(|| suggested_reimbursements(black_box(&balances)))
    });
}

fn bench_direct_100_participants(c: &mut Criterion) {
    let set = generate_random_expenses(&config(100, 1_000));

    c.bench_function("direct_100_participants", |b| {
        b.iter(|| direct_reimbursements(black_box(&set)))
    });
}

fn bench_simplified_1000_participants(c: &mut Criterion) {
    let set = generate_random_expenses(&config(1_000, 5_000));
    let balances = match aggregate_balances(&set) {
        Ok(balances) => balances,
        Err(e) => panic!("generated expenses must aggregate: {e}"),
    };

    c.bench_function("simplified_1000_participants", |b| {
        b.iter(|| suggested_reimbursements(black_box(&balances)))
    });
}

criterion_group!(
    benches,
    bench_aggregate_100_expenses,
    bench_simplified_100_participants,
    bench_direct_100_participants,
    bench_simplified_1000_participants
);
criterion_main!(benches);
