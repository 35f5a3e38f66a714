/*!
 * Tests for the segment normalizer public API
 */

use subclean::normalizer::{
    Cue, RawSegment, SegmentNormalizer, StageOrder, TICKS_PER_SECOND, normalize, render_srt,
};
use subclean::subtitle_processor::parse_srt_string;

/// A long segment with almost no text is a phantom and disappears
#[test]
fn test_normalize_withPhantomSegment_shouldProduceNoCues() {
    let normalizer = SegmentNormalizer::default();

    let cues = normalizer.normalize(&[RawSegment::new(0.0, 1500.0, "hi")]);

    assert!(cues.is_empty());
}

/// An oversized six-word segment becomes two three-word cues meeting at 6s
#[test]
fn test_normalize_withOversizedSegment_shouldSplitInTwo() {
    let normalizer = SegmentNormalizer::default();

    let cues = normalizer.normalize(&[RawSegment::new(0.0, 1200.0, "the quick brown fox jumps over")]);

    assert_eq!(cues.len(), 2);
    assert_eq!(cues[0].word_count(), 3);
    assert_eq!(cues[1].word_count(), 3);
    assert_eq!(cues[1].start / TICKS_PER_SECOND, 6.0);
}

/// Halves that are still too long are discarded after the split
#[test]
fn test_normalize_withHalvesStillOversized_shouldDiscardThem() {
    let cues = normalize(&[RawSegment::new(0.0, 2500.0, "one two three four")], 10.0);

    assert!(cues.is_empty());
}

/// Single-word segments cannot be split and survive either stage order
#[test]
fn test_normalize_withOversizedSingleWord_shouldKeepInBothOrders() {
    let raw = vec![RawSegment::new(0.0, 1500.0, "Supercalifragilisticexpialidocious")];

    for order in [StageOrder::SplitThenValidate, StageOrder::ValidateThenSplit] {
        let cues = SegmentNormalizer::new(10.0).with_stage_order(order).normalize(&raw);
        assert_eq!(cues.len(), 1, "stage order {:?}", order);
    }
}

/// Mixed input keeps order and drops only the junk
#[test]
fn test_normalize_withMixedSegments_shouldPreserveOrder() {
    let raw = vec![
        RawSegment::new(0.0, 200.0, " Good evening. "),
        RawSegment::new(200.0, 220.0, "uh"),
        RawSegment::new(250.0, 2000.0, "..."),
        RawSegment::new(2100.0, 2400.0, "Welcome back."),
    ];

    let cues = normalize(&raw, 10.0);

    let texts: Vec<&str> = cues.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["Good evening.", "Welcome back."]);
}

/// Rendered output parses back to the same timings and text
#[test]
fn test_normalizeToSrt_shouldParseBack() {
    let raw = vec![
        RawSegment::new(12.0, 345.0, "First line"),
        RawSegment::new(400.0, 1600.0, "a sentence that runs long enough to split"),
    ];

    let srt = SegmentNormalizer::default().normalize_to_srt(&raw);
    let subtitles = parse_srt_string(&srt).unwrap();

    assert_eq!(subtitles.len(), 3);
    assert_eq!(subtitles[0].index, 1);
    assert_eq!(subtitles[0].text, "First line");
    assert!((subtitles[0].start - 0.12).abs() < 1e-9);
    assert!((subtitles[2].end - 16.0).abs() < 1e-9);
}

/// Cues with sub-millisecond tick fractions are rounded when rendered
#[test]
fn test_renderSrt_withFractionalTicks_shouldRoundToMillisecond() {
    let srt = render_srt(&[Cue::new(33.3333, 66.6666, "Rounded")]);

    assert_eq!(srt, "1\n00:00:00,333 --> 00:00:00,667\nRounded\n");
}
