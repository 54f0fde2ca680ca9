//! Birth/survival rule sets and `B3/S23`-style rulestrings.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A set of neighbor counts, stored as a 9-bit mask over 0..=8.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RuleSet(u16);

impl RuleSet {
    pub const EMPTY: RuleSet = RuleSet(0);

    pub fn from_counts(counts: &[u8]) -> Self {
        let mut set = RuleSet::EMPTY;
        for &count in counts {
            set.insert(count);
        }
        set
    }

    /// Add a neighbor count to the set. Counts above 8 cannot occur on an
    /// 8-neighbor topology and are ignored.
    pub fn insert(&mut self, count: u8) {
        if count <= 8 {
            self.0 |= 1 << count;
        }
    }

    #[inline]
    pub fn contains(self, count: u8) -> bool {
        count <= 8 && self.0 & (1 << count) != 0
    }

    pub fn counts(self) -> impl Iterator<Item = u8> {
        (0..=8).filter(move |&count| self.contains(count))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// A full transition rule: which neighbor counts birth a dead cell and which
/// keep a live cell alive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rule {
    pub born: RuleSet,
    pub survive: RuleSet,
}

impl Rule {
    /// Conway's original rule, `B3/S23`.
    pub const CONWAY: Rule = Rule {
        born: RuleSet(1 << 3),
        survive: RuleSet(1 << 2 | 1 << 3),
    };
}

impl Default for Rule {
    fn default() -> Self {
        Rule::CONWAY
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("B")?;
        for count in self.born.counts() {
            write!(f, "{count}")?;
        }
        f.write_str("/S")?;
        for count in self.survive.counts() {
            write!(f, "{count}")?;
        }
        Ok(())
    }
}

/// The rulestring could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid rulestring {0:?} (expected the B3/S23 form)")]
pub struct ParseRuleError(String);

impl FromStr for Rule {
    type Err = ParseRuleError;

    /// Parse the conventional `B<digits>/S<digits>` form, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseRuleError(s.to_string());
        let (born_part, survive_part) = s.split_once('/').ok_or_else(invalid)?;
        let born_digits = born_part
            .strip_prefix(['B', 'b'])
            .ok_or_else(invalid)?;
        let survive_digits = survive_part
            .strip_prefix(['S', 's'])
            .ok_or_else(invalid)?;

        let mut rule = Rule {
            born: RuleSet::EMPTY,
            survive: RuleSet::EMPTY,
        };
        for ch in born_digits.chars() {
            let count = ch.to_digit(10).filter(|&d| d <= 8).ok_or_else(invalid)?;
            rule.born.insert(count as u8);
        }
        for ch in survive_digits.chars() {
            let count = ch.to_digit(10).filter(|&d| d <= 8).ok_or_else(invalid)?;
            rule.survive.insert(count as u8);
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::{Rule, RuleSet};

    #[test]
    fn conway_contains_expected_counts() {
        let rule = Rule::CONWAY;
        assert!(rule.survive.contains(2));
        assert!(rule.survive.contains(3));
        assert!(!rule.survive.contains(4));
        assert!(rule.born.contains(3));
        assert!(!rule.born.contains(2));
    }

    #[test]
    fn rulestring_round_trip() {
        assert_eq!("B3/S23".parse::<Rule>().unwrap(), Rule::CONWAY);
        assert_eq!(Rule::CONWAY.to_string(), "B3/S23");

        let highlife: Rule = "b36/s23".parse().unwrap();
        assert!(highlife.born.contains(6));
        assert_eq!(highlife.to_string(), "B36/S23");
    }

    #[test]
    fn malformed_rulestrings_are_rejected() {
        assert!("B3S23".parse::<Rule>().is_err());
        assert!("3/23".parse::<Rule>().is_err());
        assert!("B9/S23".parse::<Rule>().is_err());
        assert!("B3/S2x".parse::<Rule>().is_err());
    }

    #[test]
    fn counts_above_eight_are_ignored() {
        let mut set = RuleSet::EMPTY;
        set.insert(9);
        assert!(set.is_empty());
        assert_eq!(RuleSet::from_counts(&[0, 8]).counts().collect::<Vec<_>>(), [0, 8]);
    }
}
