// src/session/difficulty.rs

use std::fmt;

use rand::{Rng, SeedableRng, rngs::StdRng};

/// Display-only difficulty tag. Has no effect on scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Uniformly picks a label per question. Same seed, same labels.
pub fn assign(seed: u64, count: usize) -> Vec<Difficulty> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| Difficulty::ALL[rng.gen_range(0..Difficulty::ALL.len())])
        .collect()
}
