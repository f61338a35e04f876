//! Domain Services
//!
//! Pure domain logic for challenge generation.

use rand::Rng;

/// Smallest operand
pub const OPERAND_MIN: u8 = 1;
/// Largest operand
pub const OPERAND_MAX: u8 = 10;

/// `a + b` question with both operands in `[OPERAND_MIN, OPERAND_MAX]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticChallenge {
    pub a: u8,
    pub b: u8,
}

impl ArithmeticChallenge {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            a: rng.random_range(OPERAND_MIN..=OPERAND_MAX),
            b: rng.random_range(OPERAND_MIN..=OPERAND_MAX),
        }
    }

    /// Expected reply as stored
    pub fn answer(&self) -> String {
        (u16::from(self.a) + u16::from(self.b)).to_string()
    }

    /// Question text shown to the user
    pub fn question(&self) -> String {
        format!("What is {} + {}?", self.a, self.b)
    }
}
