//! Reading time estimation
//!
//! Minutes to read = words / reading speed, rounded up. The speed is a
//! policy setting (`reading.words_per_minute`), 200 by default.

use std::num::NonZeroUsize;

use super::ContentSection;
use crate::prismic::rich_text;

/// Average reading speed assumed when none is configured
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadingTime {
    words_per_minute: NonZeroUsize,
}

const DEFAULT_SPEED: NonZeroUsize = match NonZeroUsize::new(DEFAULT_WORDS_PER_MINUTE) {
    Some(speed) => speed,
    None => panic!("default reading speed must be positive"),
};

impl Default for ReadingTime {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_SPEED,
        }
    }
}

impl ReadingTime {
    /// `None` when `words_per_minute` is zero
    pub fn new(words_per_minute: usize) -> Option<Self> {
        NonZeroUsize::new(words_per_minute).map(|words_per_minute| Self { words_per_minute })
    }

    pub fn words_per_minute(&self) -> usize {
        self.words_per_minute.get()
    }

    /// `ceil(words / words_per_minute)`; zero words read in zero minutes
    pub fn minutes_for_words(&self, words: usize) -> usize {
        words.div_ceil(self.words_per_minute.get())
    }

    /// Estimated minutes for a whole post
    pub fn estimate(&self, sections: &[ContentSection]) -> usize {
        self.minutes_for_words(count_words(sections))
    }
}

/// Whitespace-separated words across every section body
pub fn count_words(sections: &[ContentSection]) -> usize {
    sections
        .iter()
        .map(|section| rich_text::as_text(&section.body).split_whitespace().count())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prismic::RichTextBlock;

    fn section(paragraphs: &[&str]) -> ContentSection {
        ContentSection {
            heading: "Heading words are not counted".to_string(),
            body: paragraphs.iter().map(|p| RichTextBlock::paragraph(*p)).collect(),
        }
    }

    fn words(n: usize) -> String {
        vec!["palavra"; n].join(" ")
    }

    #[test]
    fn test_minutes_for_words() {
        let reading = ReadingTime::default();
        assert_eq!(reading.words_per_minute(), 200);
        assert_eq!(reading.minutes_for_words(0), 0);
        assert_eq!(reading.minutes_for_words(1), 1);
        assert_eq!(reading.minutes_for_words(200), 1);
        assert_eq!(reading.minutes_for_words(201), 2);
        assert_eq!(reading.minutes_for_words(400), 2);
    }

    #[test]
    fn test_minutes_match_ceiling_for_all_counts() {
        let reading = ReadingTime::default();
        for w in 0..2_000usize {
            let expected = (w as f64 / 200.0).ceil() as usize;
            assert_eq!(reading.minutes_for_words(w), expected, "words = {}", w);
        }
    }

    #[test]
    fn test_configurable_speed() {
        assert!(ReadingTime::new(0).is_none());
        let fast = ReadingTime::new(300).unwrap();
        assert_eq!(fast.minutes_for_words(301), 2);
        assert_eq!(fast.minutes_for_words(300), 1);
    }

    #[test]
    fn test_count_words_across_sections() {
        let sections = vec![
            section(&["Lorem ipsum dolor", "sit amet"]),
            section(&["  consectetur\n adipiscing\telit  "]),
        ];
        assert_eq!(count_words(&sections), 8);
    }

    #[test]
    fn test_empty_post_reads_in_zero_minutes() {
        let reading = ReadingTime::default();
        assert_eq!(reading.estimate(&[]), 0);
        assert_eq!(reading.estimate(&[section(&[]), section(&[""])]), 0);
    }

    #[test]
    fn test_estimate_rounds_up() {
        let reading = ReadingTime::default();
        let sections = vec![section(&[words(150).as_str()]), section(&[words(51).as_str()])];
        assert_eq!(count_words(&sections), 201);
        assert_eq!(reading.estimate(&sections), 2);
    }
}
