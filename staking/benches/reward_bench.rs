use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use gdao_ledger::{GenesisConfig, Ledger};
use gdao_staking::{accrued_reward, StakingEngine, SECONDS_PER_YEAR};
use gdao_types::{Address, Timestamp, TokenAmount};

fn bench_accrued_reward(c: &mut Criterion) {
    let principal = TokenAmount::from_tokens(5000);
    c.bench_function("accrued_reward", |b| {
        b.iter(|| {
            black_box(accrued_reward(
                black_box(principal),
                black_box(2500),
                black_box(SECONDS_PER_YEAR),
            ))
        });
    });
}

fn bench_positions_of(c: &mut Criterion) {
    let mut group = c.benchmark_group("positions_of");

    for position_count in [1u64, 10, 100, 1000] {
        let user = Address::new("staker");
        let config = GenesisConfig::default()
            .with_allocation(user.clone(), TokenAmount::from_tokens(1000 * position_count));
        let mut ledger = Ledger::genesis(&config).unwrap();
        let mut engine = StakingEngine::with_default_pools();
        for i in 0..position_count {
            engine
                .stake(&mut ledger, &user, 1, TokenAmount::from_tokens(1000), Timestamp::new(i))
                .unwrap();
        }
        let now = Timestamp::new(SECONDS_PER_YEAR);

        group.bench_with_input(
            BenchmarkId::new("pending_rewards", position_count),
            &position_count,
            |b, _| {
                b.iter(|| black_box(engine.positions_of(black_box(&user), black_box(now))));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_accrued_reward, bench_positions_of);
criterion_main!(benches);
