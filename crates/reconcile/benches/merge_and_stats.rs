//! Benchmarks for the merge and the stats aggregator
//!
//! Run with: cargo bench --package reconcile
//!
//! Uses synthetic rows so no seed directory is needed.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reconcile::{compute_stats, merge_reviews};
use review_store::adapters::millis_to_datetime;
use review_store::{LegacyReviewRow, PrimaryReviewRow};

const PRIMARY_ROWS: usize = 20_000;
const LEGACY_ROWS: usize = 10_000;

fn synthetic_primary() -> Vec<PrimaryReviewRow> {
    (0..PRIMARY_ROWS)
        .map(|i| PrimaryReviewRow {
            id: format!("p{}", i),
            movie_id: 1,
            author_id: format!("user{}", i % 5_000),
            author_name: format!("User {}", i % 5_000),
            stars: (i % 5 + 1) as u8,
            text: "Solid film.".to_string(),
            sentiment: None,
            confidence: None,
            liked_by: Default::default(),
            disliked_by: Default::default(),
            like_count: 0,
            dislike_count: 0,
            // Spread over roughly three years
            created_at: millis_to_datetime(1_600_000_000_000 + (i as i64 * 7_919 % 100_000) * 1_000_000),
        })
        .collect()
}

fn synthetic_legacy() -> Vec<LegacyReviewRow> {
    (0..LEGACY_ROWS)
        .map(|i| LegacyReviewRow {
            movie_id: 1,
            user_id: (i % 3 != 0).then(|| format!("old{}", i)),
            user_name: None,
            rating: (i % 10) as f32 / 2.0,
            review_text: "Saw it twice.".to_string(),
            sentiment: Some("POSITIVE".to_string()),
            score: Some(0.8),
            timestamp_ms: 1_500_000_000_000 + i as i64 * 3_600_000,
        })
        .collect()
}

fn bench_merge(c: &mut Criterion) {
    let primary = synthetic_primary();
    let legacy = synthetic_legacy();

    c.bench_function("merge_reviews_30k", |b| {
        b.iter(|| {
            let merged = merge_reviews(black_box(primary.clone()), black_box(legacy.clone()));
            black_box(merged)
        })
    });
}

fn bench_stats(c: &mut Criterion) {
    let reviews = merge_reviews(synthetic_primary(), synthetic_legacy());

    c.bench_function("compute_stats_30k", |b| {
        b.iter(|| black_box(compute_stats(black_box(&reviews))))
    });
}

criterion_group!(benches, bench_merge, bench_stats);
criterion_main!(benches);
