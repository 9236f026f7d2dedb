//! Stream signature decoding.
//!
//! Ciphered stream URLs carry a scrambled signature that must be unscrambled
//! before the URL plays. The scrambling changes with the video host's player
//! releases, so the algorithm is data: a version number and an ordered list
//! of array operations, loadable from JSON.

use serde::{Deserialize, Serialize};

/// One operation on the signature's characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CipherStep {
    /// Reverse the whole array.
    Reverse,
    /// Exchange the first element with the one at `index % len`.
    Swap { index: usize },
    /// Drop the first `count` elements.
    Splice { count: usize },
}

impl CipherStep {
    fn apply(self, chars: &mut Vec<char>) {
        match self {
            CipherStep::Reverse => chars.reverse(),
            CipherStep::Swap { index } => {
                if !chars.is_empty() {
                    let len = chars.len();
                    chars.swap(0, index % len);
                }
            }
            CipherStep::Splice { count } => {
                let count = count.min(chars.len());
                chars.drain(..count);
            }
        }
    }
}

/// Turns a scrambled signature into the one the stream URL expects.
pub trait SignatureDecoder: Send + Sync {
    fn version(&self) -> u32;

    fn decode(&self, signature: &str) -> String;
}

/// A versioned list of [`CipherStep`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureAlgorithm {
    pub version: u32,
    pub steps: Vec<CipherStep>,
}

impl SignatureAlgorithm {
    /// The first known algorithm: reverse, swap 24, reverse, swap 41,
    /// reverse, swap 2.
    pub fn v1() -> Self {
        Self {
            version: 1,
            steps: vec![
                CipherStep::Reverse,
                CipherStep::Swap { index: 24 },
                CipherStep::Reverse,
                CipherStep::Swap { index: 41 },
                CipherStep::Reverse,
                CipherStep::Swap { index: 2 },
            ],
        }
    }
}

impl Default for SignatureAlgorithm {
    fn default() -> Self {
        Self::v1()
    }
}

impl SignatureDecoder for SignatureAlgorithm {
    fn version(&self) -> u32 {
        self.version
    }

    fn decode(&self, signature: &str) -> String {
        let mut chars: Vec<char> = signature.chars().collect();
        for step in &self.steps {
            step.apply(&mut chars);
        }
        chars.into_iter().collect()
    }
}
