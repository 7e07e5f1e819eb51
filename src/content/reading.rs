//! Reading time estimation

use super::ContentSection;

/// Count whitespace-separated words
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Total words over every section body
pub fn content_words(sections: &[ContentSection]) -> usize {
    sections
        .iter()
        .map(|section| count_words(&section.body.as_text()))
        .sum()
}

/// Minutes to read, rounded up. Empty content takes 0 minutes.
pub fn reading_minutes(words: usize, words_per_minute: usize) -> usize {
    words.div_ceil(words_per_minute.max(1))
}

/// Format the estimate as "<N> min"
pub fn reading_time(sections: &[ContentSection], words_per_minute: usize) -> String {
    let minutes = reading_minutes(content_words(sections), words_per_minute);
    format!("{} min", minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{Block, RichField, RichText};

    fn section(words: usize) -> ContentSection {
        let text = vec!["palavra"; words].join(" ");
        ContentSection {
            heading: "h".to_string(),
            body: RichField::Structured(RichText(vec![Block::new("paragraph", &text)])),
        }
    }

    #[test]
    fn test_count_words() {
        assert_eq!(count_words("  one two\tthree\n four  "), 4);
        assert_eq!(count_words(""), 0);
    }

    #[test]
    fn test_exact_rate_is_one_minute() {
        assert_eq!(reading_time(&[section(200)], 200), "1 min");
    }

    #[test]
    fn test_rounds_up() {
        assert_eq!(reading_time(&[section(201)], 200), "2 min");
        assert_eq!(reading_time(&[section(150), section(51)], 200), "2 min");
    }

    #[test]
    fn test_zero_words() {
        assert_eq!(reading_time(&[], 200), "0 min");
        assert_eq!(reading_time(&[section(0)], 200), "0 min");
    }

    #[test]
    fn test_blocks_do_not_merge_words() {
        let body = RichField::Structured(RichText(vec![
            Block::new("paragraph", "end"),
            Block::new("paragraph", "start"),
        ]));
        let sections = vec![ContentSection {
            heading: String::new(),
            body,
        }];
        assert_eq!(content_words(&sections), 2);
    }
}
