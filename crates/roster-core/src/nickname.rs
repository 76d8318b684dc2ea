//! Random nickname generation.

use rand::Rng;
use rand::seq::IndexedRandom;

const ADJECTIVES: &[&str] = &[
    "clever", "jolly", "brave", "sly", "gentle", "quiet", "swift", "bold", "calm", "eager",
    "fierce", "lucky", "merry", "nimble", "proud", "witty",
];

const ANIMALS: &[&str] = &[
    "panda", "fox", "raccoon", "koala", "lion", "otter", "badger", "heron", "lynx", "marten",
    "owl", "puffin", "seal", "tapir", "wolf", "yak",
];

/// Generate a nickname of the form `{adjective}_{animal}_{number}`.
///
/// The output always satisfies the nickname validation rules.
pub fn generate_nickname() -> String {
    let mut rng = rand::rng();
    let adjective = ADJECTIVES.choose(&mut rng).copied().unwrap_or("quiet");
    let animal = ANIMALS.choose(&mut rng).copied().unwrap_or("fox");
    let number: u16 = rng.random_range(0..1000);
    format!("{adjective}_{animal}_{number}")
}
