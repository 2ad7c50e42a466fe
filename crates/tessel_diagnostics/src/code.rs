//! Stable identifiers such as `E301` or `L002`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Family a code belongs to. Each family has its own letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// `E`: the run failed.
    Error,
    /// `W`: recovered anomaly.
    Warning,
    /// `P`: clustering progress.
    Pack,
    /// `L`: cluster placement progress.
    Place,
    /// `N`: run summary.
    Note,
}

impl Category {
    /// Letter printed in front of the number.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Pack => 'P',
            Category::Place => 'L',
            Category::Note => 'N',
        }
    }
}

/// Family plus number. Prints as the family letter and three digits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// Family letter.
    pub category: Category,
    /// Number within the family.
    pub number: u16,
}

impl DiagnosticCode {
    /// Usable in `const` items so each stage can declare its codes up front.
    pub const fn new(category: Category, number: u16) -> Self {
        DiagnosticCode { category, number }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
