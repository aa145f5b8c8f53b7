//! Password strength scoring.
//!
//! One point each for: at least 8 characters, at least 12 characters, a
//! lowercase letter, an uppercase letter, a digit, a character that is not
//! an ASCII letter or digit. Minus one if any character appears three or
//! more times in a row. A password made only of digits scores 0.
//!
//! Feedback is always computed in full, independent of the score. An empty
//! password gets a single line asking for one.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const FEEDBACK_LENGTH: &str = "Use at least 8 characters";
pub const FEEDBACK_LOWERCASE: &str = "Add lowercase letters";
pub const FEEDBACK_UPPERCASE: &str = "Add uppercase letters";
pub const FEEDBACK_DIGIT: &str = "Add numbers";
pub const FEEDBACK_SPECIAL: &str = "Add special characters";
pub const FEEDBACK_REPEATED: &str = "Avoid repeated characters";
pub const FEEDBACK_DIGITS_ONLY: &str = "Do not use only numbers";
pub const FEEDBACK_REQUIRED: &str = "Password is required";

/// Strength bucket derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrengthLabel {
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl StrengthLabel {
    /// `<= 2` weak, `3..=4` medium, `5` strong, above that very strong.
    #[must_use]
    pub fn for_score(score: i32) -> Self {
        match score {
            i32::MIN..=2 => Self::Weak,
            3..=4 => Self::Medium,
            5 => Self::Strong,
            _ => Self::VeryStrong,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weak => "weak",
            Self::Medium => "medium",
            Self::Strong => "strong",
            Self::VeryStrong => "very-strong",
        }
    }
}

impl fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of scoring a password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordStrength {
    pub score: i32,
    pub label: StrengthLabel,
    pub feedback: Vec<String>,
}

fn has_run_of_three(password: &str) -> bool {
    let chars: Vec<char> = password.chars().collect();
    chars.windows(3).any(|w| w[0] == w[1] && w[1] == w[2])
}

/// Scores a password. Identical input always yields identical output.
#[must_use]
pub fn score(password: &str) -> PasswordStrength {
    if password.is_empty() {
        return PasswordStrength {
            score: 0,
            label: StrengthLabel::Weak,
            feedback: vec![FEEDBACK_REQUIRED.to_string()],
        };
    }

    let length = password.chars().count();
    let long_enough = length >= 8;
    let very_long = length >= 12;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());
    let repeated = has_run_of_three(password);
    let digits_only = password.chars().all(|c| c.is_ascii_digit());

    let mut score = [long_enough, very_long, has_lower, has_upper, has_digit, has_special]
        .into_iter()
        .filter(|&met| met)
        .count() as i32;
    if repeated {
        score -= 1;
    }
    if digits_only {
        score = 0;
    }

    let feedback = [
        (!long_enough, FEEDBACK_LENGTH),
        (!has_lower, FEEDBACK_LOWERCASE),
        (!has_upper, FEEDBACK_UPPERCASE),
        (!has_digit, FEEDBACK_DIGIT),
        (!has_special, FEEDBACK_SPECIAL),
        (repeated, FEEDBACK_REPEATED),
        (digits_only, FEEDBACK_DIGITS_ONLY),
    ]
    .into_iter()
    .filter_map(|(missing, message)| missing.then(|| message.to_string()))
    .collect();

    PasswordStrength {
        score,
        label: StrengthLabel::for_score(score),
        feedback,
    }
}
