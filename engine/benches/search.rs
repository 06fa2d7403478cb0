use std::sync::atomic::AtomicBool;

use criterion::{criterion_group, criterion_main, Criterion};
use pathfinder_engine::cache::ChunkCache;
use pathfinder_engine::config::PathfinderConfig;
use pathfinder_engine::generator::{FlatWorldGenerator, WalledWorldGenerator};
use pathfinder_engine::geometry::{BlockPos, NodePos, Size};
use pathfinder_engine::search::find_path;

fn flat_world_long_hop(c: &mut Criterion) {
    let cache = ChunkCache::new(0);
    let generator = FlatWorldGenerator;
    let cancel = AtomicBool::new(false);
    let config = PathfinderConfig::default();

    c.bench_function("find_path flat world 200 blocks", |b| {
        b.iter(|| {
            let start = NodePos::new(Size::X1, BlockPos::new(0, 64, 0));
            let goal = BlockPos::new(200, 64, 0);
            find_path(start, goal, &cache, &generator, &cancel, &config, None).unwrap()
        })
    });
}

fn walled_world_forces_shrinking(c: &mut Criterion) {
    let cache = ChunkCache::new(0);
    let generator = WalledWorldGenerator { floor_y: 63, wall_x: 8, doorway_z: 5 };
    let cancel = AtomicBool::new(false);
    let config = PathfinderConfig::default();

    c.bench_function("find_path walled world through doorway", |b| {
        b.iter(|| {
            let start = NodePos::new(Size::X1, BlockPos::new(0, 64, 0));
            let goal = BlockPos::new(16, 64, 5);
            find_path(start, goal, &cache, &generator, &cancel, &config, None).unwrap()
        })
    });
}

criterion_group!(benches, flat_world_long_hop, walled_world_forces_shrinking);
criterion_main!(benches);
