use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Index split that keeps the class ratio in both halves.
///
/// Each class is shuffled with a `seed`ed RNG and contributes
/// `round(count * test_fraction)` rows to the test half, at least one when the
/// class has two or more rows and never all of them. Indices come back sorted.
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(labels.len());
    let mut test = Vec::new();

    for class in [0u8, 1u8] {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == class)
            .map(|(idx, _)| idx)
            .collect();
        indices.shuffle(&mut rng);

        let count = indices.len();
        let mut n_test = (count as f64 * test_fraction).round() as usize;
        if count >= 2 {
            n_test = n_test.clamp(1, count - 1);
        } else {
            n_test = 0;
        }

        test.extend_from_slice(&indices[..n_test]);
        train.extend_from_slice(&indices[n_test..]);
    }

    train.sort_unstable();
    test.sort_unstable();
    (train, test)
}
