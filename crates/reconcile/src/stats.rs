//! Rating and activity statistics over a reconciled review set.
//!
//! Rust concept: rayon `fold` + `reduce`
//! Each worker thread folds its share of reviews into a private accumulator,
//! then the partial accumulators are merged pairwise. No locks needed.

use rayon::prelude::*;
use review_store::{Review, MAX_STARS};
use serde::Serialize;
use std::collections::BTreeMap;

/// Review count for one calendar period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodCount {
    /// "YYYY-MM" or "YYYY-MM-DD"
    pub period: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStats {
    pub total_reviews: usize,
    /// 0.0 for an empty set
    pub average_rating: f64,
    /// Index `stars - 1`
    pub rating_distribution: [u32; MAX_STARS as usize],
    /// Ascending by period
    pub reviews_by_month: Vec<PeriodCount>,
    /// Ascending by period
    pub reviews_by_day: Vec<PeriodCount>,
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    star_sum: u64,
    distribution: [u32; MAX_STARS as usize],
    by_month: BTreeMap<String, u32>,
    by_day: BTreeMap<String, u32>,
}

impl Accumulator {
    fn add(mut self, review: &Review) -> Self {
        self.count += 1;
        self.star_sum += review.star_rating as u64;

        if (1..=MAX_STARS).contains(&review.star_rating) {
            self.distribution[(review.star_rating - 1) as usize] += 1;
        }

        let month = review.created_at.format("%Y-%m").to_string();
        let day = review.created_at.format("%Y-%m-%d").to_string();
        *self.by_month.entry(month).or_insert(0) += 1;
        *self.by_day.entry(day).or_insert(0) += 1;
        self
    }

    fn merge(mut self, other: Self) -> Self {
        self.count += other.count;
        self.star_sum += other.star_sum;
        for (bucket, n) in self.distribution.iter_mut().zip(other.distribution) {
            *bucket += n;
        }
        for (period, n) in other.by_month {
            *self.by_month.entry(period).or_insert(0) += n;
        }
        for (period, n) in other.by_day {
            *self.by_day.entry(period).or_insert(0) += n;
        }
        self
    }
}

fn to_periods(map: BTreeMap<String, u32>) -> Vec<PeriodCount> {
    map.into_iter()
        .map(|(period, count)| PeriodCount { period, count })
        .collect()
}

/// Compute statistics for `reviews`. Pure; ordering of the input is irrelevant.
pub fn compute_stats(reviews: &[Review]) -> ReviewStats {
    let acc = reviews
        .par_iter()
        .fold(Accumulator::default, Accumulator::add)
        .reduce(Accumulator::default, Accumulator::merge);

    let average_rating = if acc.count == 0 {
        0.0
    } else {
        acc.star_sum as f64 / acc.count as f64
    };

    ReviewStats {
        total_reviews: acc.count,
        average_rating,
        rating_distribution: acc.distribution,
        reviews_by_month: to_periods(acc.by_month),
        reviews_by_day: to_periods(acc.by_day),
    }
}
