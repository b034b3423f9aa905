//! Performance benchmarks for smartbird

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use smartbird::checkpoint::Checkpoint;
use smartbird::encoder::{Encoder, StateEncoder};
use smartbird::neural::Controller;
use smartbird::{Config, Game, Population, Preset};

fn controller_for(config: &Config, seed: u64) -> Controller {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Controller::random(
        config.controller_shape(),
        config.network.activation,
        config.network.decision,
        &mut rng,
    )
}

fn benchmark_game_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("game_step");

    for preset in [Preset::Classic, Preset::Revisit] {
        let config = Config::preset(preset);
        group.bench_with_input(BenchmarkId::new("preset", format!("{:?}", preset)), &config, |b, config| {
            let mut game = Game::new(config.game.clone(), 42);
            let mut tick = 0u64;
            b.iter(|| {
                if game.is_over() {
                    game = Game::new(config.game.clone(), tick);
                }
                tick += 1;
                game.step(black_box(tick % 9 == 0))
            });
        });
    }

    group.finish();
}

fn benchmark_controller_forward(c: &mut Criterion) {
    let classic = Config::classic();
    let net = controller_for(&classic, 1);
    let inputs = [120.0, -30.0, 170.0];

    c.bench_function("controller_forward_distances", |b| {
        b.iter(|| net.forward(black_box(&inputs)));
    });

    let revisit = Config::revisit();
    let net = controller_for(&revisit, 2);
    let inputs = vec![0.5; revisit.controller_shape().inputs];

    c.bench_function("controller_forward_pixels", |b| {
        b.iter(|| net.forward(black_box(&inputs)));
    });
}

fn benchmark_pixel_encode(c: &mut Criterion) {
    let config = Config::revisit();
    let mut encoder = Encoder::from_kind(&config.network.encoder, config.game.win_width, config.game.win_height);
    let game = Game::new(config.game.clone(), 7);
    let mut out = Vec::with_capacity(encoder.input_size());

    c.bench_function("pixel_encode", |b| {
        b.iter(|| encoder.encode(black_box(&game), &mut out));
    });
}

fn benchmark_mutation(c: &mut Criterion) {
    let config = Config::revisit();
    let mutation = config.evolution.mutation.clone();
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    c.bench_function("mutation_rank_table", |b| {
        let mut net = controller_for(&config, 3);
        b.iter(|| net.mutate(&mutation, 2, 0, &mut rng));
    });
}

fn benchmark_checkpoint(c: &mut Criterion) {
    let config = Config::revisit();
    let mut population = Population::new(config.evolution.capacity);
    for i in 0..config.evolution.capacity {
        let net = controller_for(&config, i as u64);
        population.insert(net.snapshot(i as i64 * 100)).unwrap();
    }
    let checkpoint = Checkpoint::new(1, 8, 42, &population);

    c.bench_function("checkpoint_serialize", |b| {
        b.iter(|| bincode::serialize(black_box(&checkpoint)).unwrap());
    });

    let serialized = bincode::serialize(&checkpoint).unwrap();

    c.bench_function("checkpoint_deserialize", |b| {
        b.iter(|| {
            let _: Checkpoint = bincode::deserialize(black_box(&serialized)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    benchmark_game_step,
    benchmark_controller_forward,
    benchmark_pixel_encode,
    benchmark_mutation,
    benchmark_checkpoint,
);

criterion_main!(benches);
