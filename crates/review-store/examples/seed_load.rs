use review_store::SeedData;
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data/reviews");

    println!("Loading review seed data...\n");

    let start = Instant::now();
    let seed = SeedData::load_from_dir(data_dir).expect("Failed to load seed data");
    let elapsed = start.elapsed();

    let total = seed.primary.len() + seed.legacy.len();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Primary reviews: {}", seed.primary.len());
    println!("Legacy reviews: {}", seed.legacy.len());
    println!("Movies: {}", seed.movies.len());
    println!(
        "\nPerformance: {:.0} reviews/second",
        total as f64 / elapsed.as_secs_f64()
    );
}
