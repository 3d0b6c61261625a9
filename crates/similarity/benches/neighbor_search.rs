//! Benchmarks for matrix construction and brute-force neighbour search
//!
//! Run with: cargo bench --package similarity
//!
//! Uses a synthetic rating set roughly the size of MovieLens "latest-small".

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use data_loader::Rating;
use similarity::{build_rating_matrix, SimilarityIndex, Thresholds};

fn synthetic_ratings() -> Vec<Rating> {
    let mut ratings = Vec::with_capacity(100_000);
    for user in 1..=600u32 {
        for step in 0..160u32 {
            let movie = (user * 31 + step * 17) % 9_000 + 1;
            let rating = ((user + movie) % 10) as f32 / 2.0 + 0.5;
            ratings.push(Rating::new(movie, user, rating));
        }
    }
    ratings
}

fn bench_build_matrix(c: &mut Criterion) {
    let ratings = synthetic_ratings();
    c.bench_function("build_rating_matrix", |b| {
        b.iter(|| {
            let built = build_rating_matrix(black_box(&ratings), Thresholds::new(10, 50)).unwrap();
            black_box(built)
        })
    });
}

fn bench_neighbors(c: &mut Criterion) {
    let ratings = synthetic_ratings();
    let (matrix, _) = build_rating_matrix(&ratings, Thresholds::new(10, 50))
        .expect("synthetic data survives filtering")
        .into_parts();
    let index = SimilarityIndex::fit(matrix, 20).unwrap();

    c.bench_function("neighbors_k21", |b| {
        b.iter(|| {
            let hits = index.neighbors(black_box(0), black_box(21)).unwrap();
            black_box(hits)
        })
    });
}

criterion_group!(benches, bench_build_matrix, bench_neighbors);
criterion_main!(benches);
