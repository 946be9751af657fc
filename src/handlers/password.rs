use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

pub const DEFAULT_LENGTH: usize = 12;
pub const MAX_LENGTH: usize = 128;

const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &str = "0123456789";
const PUNCTUATION: &str = r##"!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~"##;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl Strength {
    fn from_score(score: u8) -> Self {
        match score.min(4) {
            0 => Strength::VeryWeak,
            1 => Strength::Weak,
            2 => Strength::Moderate,
            3 => Strength::Strong,
            _ => Strength::VeryStrong,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strength::VeryWeak => "Very Weak",
            Strength::Weak => "Weak",
            Strength::Moderate => "Moderate",
            Strength::Strong => "Strong",
            Strength::VeryStrong => "Very Strong",
        }
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Number of satisfied checks: length >= 8, lowercase, uppercase, digit,
/// punctuation.
pub fn score(password: &str) -> u8 {
    let checks = [
        password.chars().count() >= 8,
        password.chars().any(char::is_lowercase),
        password.chars().any(char::is_uppercase),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| c.is_ascii_punctuation()),
    ];
    checks.iter().filter(|&&ok| ok).count() as u8
}

pub fn strength(password: &str) -> Strength {
    Strength::from_score(score(password))
}

/// Letters, digits and ASCII punctuation, in that order.
pub fn alphabet() -> Vec<char> {
    LETTERS.chars().chain(DIGITS.chars()).chain(PUNCTUATION.chars()).collect()
}

pub fn generate(length: usize) -> String {
    generate_with(&mut rand::thread_rng(), length)
}

/// Draw `length` characters uniformly from [`alphabet`], capped at
/// [`MAX_LENGTH`]. Nothing forces every character class to appear.
pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    let chars = alphabet();
    (0..length.min(MAX_LENGTH))
        .filter_map(|_| chars.choose(rng).copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn all_classes_is_very_strong() {
        assert_eq!(score("Ab1!abcd"), 5);
        assert_eq!(strength("Ab1!abcd"), Strength::VeryStrong);
    }

    #[test]
    fn score_counts_each_predicate() {
        assert_eq!(score(""), 0);
        assert_eq!(strength(""), Strength::VeryWeak);
        assert_eq!(score("abcdefg"), 1);
        assert_eq!(strength("abcdefg").label(), "Weak");
        assert_eq!(score("abcdefgh"), 2);
        assert_eq!(strength("abcdefgh").label(), "Moderate");
        assert_eq!(score("Abcdefgh"), 3);
        assert_eq!(strength("Abcdefgh").label(), "Strong");
    }

    #[test]
    fn four_and_five_share_top_label() {
        assert_eq!(score("Abcdefg1"), 4);
        assert_eq!(strength("Abcdefg1"), Strength::VeryStrong);
    }

    #[test]
    fn alphabet_matches_ascii_printables() {
        let chars = alphabet();
        assert_eq!(chars.len(), 94);
        assert!(chars.iter().all(|c| c.is_ascii_graphic()));
    }

    #[test]
    fn generated_password_has_requested_length() {
        assert_eq!(generate(DEFAULT_LENGTH).chars().count(), 12);
        assert_eq!(generate(0), "");
        assert_eq!(generate(40).chars().count(), 40);
        assert_eq!(generate(usize::MAX).chars().count(), MAX_LENGTH);
    }

    #[test]
    fn generated_chars_come_from_alphabet() {
        let mut rng = StdRng::seed_from_u64(7);
        let chars = alphabet();
        let password = generate_with(&mut rng, MAX_LENGTH);
        assert!(password.chars().all(|c| chars.contains(&c)));
    }
}
