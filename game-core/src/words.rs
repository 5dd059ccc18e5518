use rand::Rng;
use std::collections::HashSet;

/// Curated secret words that work well for the game. Themed around
/// cyberpunk/tech but also includes common objects.
pub const SECRET_WORDS: &[&str] = &[
    // Cyberpunk / Tech
    "hacker", "cyborg", "android", "hologram", "matrix",
    "neon", "chrome", "synth", "glitch", "virus",
    "laser", "plasma", "quantum", "binary", "pixel",
    "drone", "robot", "avatar", "firewall", "bitcoin",
    "server", "arcade", "console", "joystick", "keyboard",
    "monitor", "circuit", "antenna", "satellite", "radar",
    // Animals
    "dragon", "phoenix", "unicorn", "kraken", "serpent",
    "tiger", "falcon", "wolf", "panther", "cobra",
    "dolphin", "octopus", "scorpion", "spider", "beetle",
    // Places
    "casino", "subway", "rooftop", "alley", "warehouse",
    "temple", "fortress", "pyramid", "bunker", "tower",
    "bridge", "tunnel", "harbor", "factory", "stadium",
    // Objects
    "diamond", "crystal", "mirror", "shadow", "blade",
    "helmet", "shield", "gauntlet", "compass", "lantern",
    "whistle", "umbrella", "hammer", "anchor", "hourglass",
    // Food & Drinks
    "coffee", "whiskey", "sushi", "burger", "pizza",
    "chocolate", "vanilla", "cinnamon", "wasabi", "honey",
    // Nature
    "thunder", "lightning", "tornado", "volcano", "glacier",
    "meteor", "eclipse", "aurora", "tsunami", "avalanche",
    // Abstract / Concepts
    "phantom", "specter", "enigma", "paradox", "illusion",
    "chaos", "harmony", "velocity", "gravity", "infinity",
    // Music / Art
    "rhythm", "melody", "symphony", "canvas", "sculpture",
    "graffiti", "tattoo", "mosaic", "origami", "kaleidoscope",
];

/// How many filtered draws to attempt before giving up on exclusions.
const EXCLUDE_RETRY_BUDGET: usize = 100;

/// Source of secret words for new rounds.
pub struct WordList {
    words: Vec<String>,
}

impl Default for WordList {
    fn default() -> Self {
        Self::new(SECRET_WORDS.iter().map(|w| w.to_string()).collect())
    }
}

impl WordList {
    /// Builds a word list from the given words. Blank entries are dropped;
    /// an empty input falls back to the built-in list so a draw always
    /// succeeds.
    pub fn new(words: Vec<String>) -> Self {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Self::default();
        }

        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Returns a uniformly random word.
    pub fn random_word(&self) -> String {
        let mut rng = rand::rng();
        self.words[rng.random_range(0..self.words.len())].clone()
    }

    /// Returns a random word not contained in `used`. Falls back to an
    /// unfiltered pick if no fresh word is found within the retry budget.
    pub fn random_word_excluding(&self, used: &HashSet<String>) -> String {
        for _ in 0..EXCLUDE_RETRY_BUDGET {
            let word = self.random_word();
            if !used.contains(&word) {
                return word;
            }
        }
        self.random_word()
    }
}
