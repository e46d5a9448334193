#![allow(clippy::unwrap_used, reason = "fuzz assertions want direct panics")]
//! Seeded random-word fuzzing of the classification pipeline.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{NielsenThurstonType, nielsen_thurston_type, s_1_1};

fn random_word(rng: &mut StdRng, length: usize) -> String {
    let letters = ['a', 'b', 'A', 'B'];
    (0..length).map(|_| letters[rng.random_range(0..letters.len())]).collect()
}

/// Every short word over the torus generators classifies without a
/// panic, and pseudo-Anosov answers come with a verified eigenvector.
#[test]
fn fuzz_classification_of_short_torus_words() {
    let mut rng = StdRng::seed_from_u64(0x5eed_cafe);
    let surface = s_1_1();
    for _ in 0..12 {
        let length = rng.random_range(1..=5);
        let word = random_word(&mut rng, length);
        let kind = nielsen_thurston_type(&surface, &word)
            .unwrap_or_else(|e| panic!("classification of {:?} failed: {}", word, e));
        match kind {
            NielsenThurstonType::Periodic(order) => {
                let encoding = surface.mapping_class(&word).unwrap();
                assert_eq!(encoding.order(), order, "order mismatch for {:?}", word);
            }
            NielsenThurstonType::Reducible => {}
            NielsenThurstonType::PseudoAnosov(invariant) => {
                let encoding = surface.mapping_class(&word).unwrap();
                let image = encoding.apply(&invariant.lamination).unwrap();
                for (weight, image_weight) in
                    invariant.lamination.geometric().iter().zip(image.geometric().iter())
                {
                    assert_eq!(
                        &(weight * &invariant.dilatation),
                        image_weight,
                        "eigen identity fails for {:?}",
                        word
                    );
                }
                // A certified dilatation is strictly bigger than one.
                let above = invariant.dilatation.add_integer(&(-1).into());
                assert_eq!(above.sign().unwrap(), std::cmp::Ordering::Greater);
            }
        }
    }
}
