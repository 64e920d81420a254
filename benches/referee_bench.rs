use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::collections::BTreeSet;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use warlight::board::{apply_fog, FogLevel, Map, MoveOrder, Owner, Region, RegionId, RoundingMode, SuperRegion};
use warlight::moves::Move;
use warlight::protocol::parse_moves;
use warlight::resolve::{resolve_attacks, resolve_battle, CombatParams, MoveQueue, RoundLog};

const SIDE: RegionId = 10;

/// A SIDE x SIDE grid, one bonus per row. The west half belongs to bot1,
/// the east half to bot2.
fn grid_map() -> Map {
    let id = |row: RegionId, col: RegionId| row * SIDE + col + 1;
    let mut regions = Vec::new();
    for row in 0..SIDE {
        for col in 0..SIDE {
            let mut neighbors = BTreeSet::new();
            if row > 0 {
                neighbors.insert(id(row - 1, col));
            }
            if row + 1 < SIDE {
                neighbors.insert(id(row + 1, col));
            }
            if col > 0 {
                neighbors.insert(id(row, col - 1));
            }
            if col + 1 < SIDE {
                neighbors.insert(id(row, col + 1));
            }
            let mut region = Region::new(id(row, col), format!("r{}c{}", row, col), neighbors);
            region.owner = Owner::Player(if col < SIDE / 2 { "bot1" } else { "bot2" }.to_string());
            region.armies = 8;
            regions.push(region);
        }
    }
    let bonuses = (0..SIDE)
        .map(|row| SuperRegion::new(row + 1, format!("row{}", row), 2, (0..SIDE).map(|c| id(row, c)).collect()))
        .collect();
    Map::new("grid", regions, bonuses).unwrap()
}

fn params(luck: f64) -> CombatParams {
    CombatParams {
        offensive_kill_ratio: 0.6,
        defensive_kill_ratio: 0.7,
        luck,
        rounding: RoundingMode::WeightedRandom,
    }
}

fn bench_battle(c: &mut Criterion) {
    let mut group = c.benchmark_group("battle");
    for luck in [0.0, 0.18, 1.0] {
        let params = params(luck);
        let mut rng = SmallRng::seed_from_u64(1);
        group.bench_function(format!("luck_{}", luck), |b| {
            b.iter(|| resolve_battle(black_box(40), black_box(25), &params, &mut rng))
        });
    }
    group.finish();
}

fn bench_fog(c: &mut Criterion) {
    let map = grid_map();
    c.bench_function("apply_fog_grid_100", |b| {
        b.iter(|| apply_fog(black_box(&map), "bot1", FogLevel::Heavy))
    });
}

/// Every frontier region of both players attacks straight across.
fn frontier_attacks() -> [Vec<Move>; 2] {
    let west = SIDE / 2 - 1;
    let mut attacks = [Vec::new(), Vec::new()];
    for row in 0..SIDE {
        let left = row * SIDE + west + 1;
        attacks[0].push(Move::attack_transfer("bot1", left, left + 1, 7));
        attacks[1].push(Move::attack_transfer("bot2", left + 1, left, 7));
    }
    attacks
}

fn bench_attack_phase(c: &mut Criterion) {
    let map = grid_map();
    let params = params(0.18);
    c.bench_function("attack_phase_20_moves", |b| {
        b.iter_batched(
            || {
                let mut queue = MoveQueue::new(MoveOrder::Cycle, 0);
                let [one, two] = frontier_attacks();
                queue.extend(0, one);
                queue.extend(1, two);
                (map.clone(), queue, SmallRng::seed_from_u64(9))
            },
            |(mut map, mut queue, mut rng)| {
                let mut log = RoundLog::default();
                resolve_attacks(
                    &mut map,
                    &mut queue,
                    ["bot1", "bot2"],
                    &params,
                    &mut rng,
                    &mut log,
                    &mut |_, _| {},
                );
                log
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_parse_moves(c: &mut Criterion) {
    let reply = (1..=100)
        .map(|i| format!("bot1 attack/transfer {} {} 3", i, i + 1))
        .collect::<Vec<_>>()
        .join(",");
    c.bench_function("parse_100_moves", |b| {
        b.iter(|| parse_moves(black_box(&reply), "bot1", 100))
    });
}

criterion_group!(benches, bench_battle, bench_fog, bench_attack_phase, bench_parse_moves);
criterion_main!(benches);
