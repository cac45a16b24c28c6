use rand::Rng;

const ADJECTIVES: [&str; 5] = ["Happy", "Clever", "Swift", "Brave", "Gentle"];
const NOUNS: [&str; 5] = ["Tiger", "Dolphin", "Eagle", "Panda", "Wolf"];

/// A random `<Adjective><Noun>` name such as `SwiftPanda`.
pub fn generate_display_name() -> String {
    let mut rng = rand::thread_rng();
    let adjective = ADJECTIVES[rng.gen_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.gen_range(0..NOUNS.len())];
    format!("{adjective}{noun}")
}
