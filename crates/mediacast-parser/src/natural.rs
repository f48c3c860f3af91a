//! Natural ("human") ordering of filenames.
//!
//! A name is split into alternating text and digit runs, always starting and
//! ending with a (possibly empty) text run. Digit runs compare by numeric
//! value, text runs compare case-insensitively.

use std::cmp::Ordering;

/// Sort key for natural ordering.
///
/// ```
/// use mediacast_parser::NaturalKey;
///
/// let mut names = vec!["Episode 10", "Episode 2", "Episode 10b"];
/// names.sort_by_key(|name| NaturalKey::new(name));
/// assert_eq!(names, ["Episode 2", "Episode 10", "Episode 10b"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct NaturalKey(Vec<Chunk>);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Chunk {
    Text(String),
    Number(Digits),
}

/// ASCII digits with leading zeros removed.
///
/// Compared by length first, so arbitrarily long runs order by value
/// without parsing into a fixed-width integer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Digits(String);

impl Ord for Digits {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for Digits {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl NaturalKey {
    /// Build the key for a name.
    pub fn new(text: &str) -> Self {
        let mut chunks = Vec::new();
        let mut rest = text;

        loop {
            let text_end = rest
                .find(|c: char| c.is_ascii_digit())
                .unwrap_or(rest.len());
            chunks.push(Chunk::Text(rest[..text_end].to_lowercase()));
            rest = &rest[text_end..];
            if rest.is_empty() {
                break;
            }

            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            let digits = rest[..digits_end].trim_start_matches('0');
            chunks.push(Chunk::Number(Digits(digits.to_string())));
            rest = &rest[digits_end..];
        }

        Self(chunks)
    }
}

/// Compare two names in natural order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    NaturalKey::new(a).cmp(&NaturalKey::new(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(natural_cmp("Episode 2", "Episode 10"), Ordering::Less);
        assert_eq!(natural_cmp("Episode 10", "Episode 10b"), Ordering::Less);
        assert_eq!(natural_cmp("Ep9", "Ep10"), Ordering::Less);
        assert_eq!(natural_cmp("Ep10", "Ep9"), Ordering::Greater);
    }

    #[test]
    fn text_compares_case_insensitively() {
        assert_eq!(natural_cmp("alpha", "Beta"), Ordering::Less);
        assert_eq!(natural_cmp("Show 1", "show 1"), Ordering::Equal);
    }

    #[test]
    fn leading_zeros_are_ignored() {
        assert_eq!(natural_cmp("Show 007", "Show 7"), Ordering::Equal);
        assert_eq!(natural_cmp("Show 000", "Show 1"), Ordering::Less);
    }

    #[test]
    fn huge_numbers_do_not_overflow() {
        let small = "clip 99999999999999999999999";
        let large = "clip 100000000000000000000000";
        assert_eq!(natural_cmp(small, large), Ordering::Less);
    }

    #[test]
    fn key_alternates_text_and_numbers() {
        let key = NaturalKey::new("a1b22");
        assert_eq!(
            key.0,
            vec![
                Chunk::Text("a".into()),
                Chunk::Number(Digits("1".into())),
                Chunk::Text("b".into()),
                Chunk::Number(Digits("22".into())),
                Chunk::Text(String::new()),
            ]
        );

        let key = NaturalKey::new("12");
        assert_eq!(key.0.first(), Some(&Chunk::Text(String::new())));
    }

    #[test]
    fn sorts_a_season() {
        let mut names = vec![
            "Show 10.mkv",
            "show 1.mkv",
            "Show 2.mkv",
            "Show 02b.mkv",
        ];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, ["show 1.mkv", "Show 2.mkv", "Show 02b.mkv", "Show 10.mkv"]);
    }

    #[test]
    fn empty_string() {
        assert_eq!(NaturalKey::new("").0, vec![Chunk::Text(String::new())]);
        assert_eq!(natural_cmp("", "a"), Ordering::Less);
    }
}
