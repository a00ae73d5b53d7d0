use crate::config::GroupingConfig;
use crate::subtitle::srt::SubtitleSpan;

/// Consecutive spans shown together as one on-screen line.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitlePhrase {
    text: String,
    start: f64,
    end: f64,
}

impl SubtitlePhrase {
    #[cfg(test)]
    pub(crate) fn new(text: &str, start: f64, end: f64) -> Self {
        Self {
            text: text.to_string(),
            start,
            end,
        }
    }

    fn from_run(run: &[SubtitleSpan]) -> Self {
        let text = run.iter().map(SubtitleSpan::text).collect::<Vec<_>>().join(" ");
        Self {
            text,
            start: run[0].start(),
            end: run[run.len() - 1].end(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    /// Whether the phrase is on screen at `t`; the end is exclusive.
    pub fn contains(&self, t: f64) -> bool {
        self.start <= t && t < self.end
    }
}

/// Merge spans into phrases of at most `max_words` words, breaking early on silences
/// longer than `max_gap`. A single span longer than `max_words` stays whole.
pub fn group_spans(spans: &[SubtitleSpan], config: &GroupingConfig) -> Vec<SubtitlePhrase> {
    let mut phrases = Vec::new();
    let Some((first, rest)) = spans.split_first() else {
        return phrases;
    };

    let mut run_start = 0;
    let mut word_count = first.word_count();
    let mut run_end = first.end();

    for (offset, span) in rest.iter().enumerate() {
        let index = offset + 1;
        let gap = span.start() - run_end;
        let words = span.word_count();

        if word_count + words > config.max_words || gap > config.max_gap {
            phrases.push(SubtitlePhrase::from_run(&spans[run_start..index]));
            run_start = index;
            word_count = words;
        } else {
            word_count += words;
        }
        run_end = span.end();
    }
    phrases.push(SubtitlePhrase::from_run(&spans[run_start..]));
    phrases
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, start: f64, end: f64) -> SubtitleSpan {
        SubtitleSpan::new(text, start, end).unwrap()
    }

    fn grouping(max_words: usize, max_gap: f64) -> GroupingConfig {
        GroupingConfig { max_words, max_gap }
    }

    fn words(n: usize, start: f64) -> Vec<SubtitleSpan> {
        (0..n)
            .map(|i| {
                let t = start + i as f64 * 0.3;
                span(&format!("w{}", i), t, t + 0.3)
            })
            .collect()
    }

    #[test]
    fn empty_input_gives_no_phrases() {
        assert!(group_spans(&[], &GroupingConfig::default()).is_empty());
    }

    #[test]
    fn single_span_is_single_phrase() {
        let phrases = group_spans(&[span("hello there", 1.0, 2.0)], &GroupingConfig::default());
        assert_eq!(
            phrases,
            vec![SubtitlePhrase::new("hello there", 1.0, 2.0)]
        );
    }

    #[test]
    fn splits_on_word_limit() {
        let phrases = group_spans(&words(20, 0.0), &grouping(8, 1.0));
        let counts: Vec<usize> = phrases.iter().map(|p| p.text().split_whitespace().count()).collect();
        assert_eq!(counts, [8, 8, 4]);
        assert!((phrases[1].start() - phrases[0].end()).abs() < 1e-9);
        assert!((phrases[2].end() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn splits_on_gap() {
        let spans = vec![
            span("so", 0.0, 0.4),
            span("anyway", 0.5, 1.0),
            span("later", 2.5, 3.0),
            span("that", 3.0, 3.2),
        ];
        let phrases = group_spans(&spans, &grouping(8, 1.0));
        assert_eq!(phrases.len(), 2);
        assert_eq!(phrases[0].text(), "so anyway");
        assert_eq!((phrases[0].start(), phrases[0].end()), (0.0, 1.0));
        assert_eq!(phrases[1].text(), "later that");
    }

    #[test]
    fn gap_equal_to_threshold_does_not_split() {
        let spans = vec![span("a", 0.0, 1.0), span("b", 2.0, 3.0)];
        assert_eq!(group_spans(&spans, &grouping(8, 1.0)).len(), 1);
    }

    #[test]
    fn oversized_span_stands_alone() {
        let spans = vec![
            span("one", 0.0, 0.5),
            span("this caption has far too many words in it", 0.5, 3.0),
            span("two", 3.0, 3.5),
        ];
        let phrases = group_spans(&spans, &grouping(3, 1.0));
        let texts: Vec<&str> = phrases.iter().map(|p| p.text()).collect();
        assert_eq!(texts, ["one", "this caption has far too many words in it", "two"]);
    }

    #[test]
    fn max_words_one_gives_one_phrase_per_span() {
        let spans = words(7, 2.0);
        let phrases = group_spans(&spans, &grouping(1, 10.0));
        assert_eq!(phrases.len(), spans.len());
        for (phrase, span) in phrases.iter().zip(&spans) {
            assert_eq!(phrase.text(), span.text());
            assert_eq!((phrase.start(), phrase.end()), (span.start(), span.end()));
        }
    }

    #[test]
    fn joined_phrases_reproduce_span_text() {
        let mut spans = words(13, 0.0);
        spans.push(span("after a pause", 10.0, 11.0));
        spans.extend(words(5, 11.0));
        let phrases = group_spans(&spans, &grouping(4, 0.5));

        let joined_phrases = phrases.iter().map(|p| p.text()).collect::<Vec<_>>().join(" ");
        let joined_spans = spans.iter().map(|s| s.text()).collect::<Vec<_>>().join(" ");
        assert_eq!(joined_phrases, joined_spans);
        assert!(phrases.iter().all(|p| p.text().split_whitespace().count() <= 4));
    }

    #[test]
    fn contains_is_half_open() {
        let phrase = SubtitlePhrase::new("x", 1.0, 2.0);
        assert!(phrase.contains(1.0));
        assert!(phrase.contains(1.999));
        assert!(!phrase.contains(2.0));
        assert!(!phrase.contains(0.5));
    }
}
