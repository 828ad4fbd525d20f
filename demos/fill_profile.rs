//! Fill a vector with random insertions and print the resulting tree
//! geometry and throughput.
//!
//! ```sh
//! cargo run --release --example fill_profile
//! ```

use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use dynbits::BitVector;

fn main() {
    let capacity = 1 << 22;
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut bv = BitVector::new(capacity).unwrap();

    let start = Instant::now();
    while !bv.is_full() {
        let position = rng.gen_range(0..=bv.size());
        bv.insert(position, rng.gen()).unwrap();
    }
    let elapsed = start.elapsed();

    println!("{:#?}", bv);
    println!(
        "inserted {} bits in {:.2?} ({:.0} inserts/s)",
        bv.size(),
        elapsed,
        bv.size() as f64 / elapsed.as_secs_f64()
    );
}
