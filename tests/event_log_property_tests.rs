//! Property-based tests for event log recording
//!
//! However the output of a pass is chopped into chunks, the stored events
//! must be the same single-line messages as when it arrives in one piece.

use bootline::event::{SourceTag, Timestamp};
use bootline::event_log::Run;
use proptest::prelude::*;

/// Arm a run, then feed `chunks` 1µs apart (well inside the window)
fn record_chunks(chunks: &[&[u8]]) -> Run {
    let mut run = Run::new(0);
    run.record(SourceTag::Trace, Timestamp::from_nanos(0), b"launch");
    for (i, chunk) in chunks.iter().enumerate() {
        let ts = Timestamp::from_nanos(1_000 * (i as u64 + 1));
        run.record(SourceTag::Appliance, ts, chunk);
    }
    run
}

fn messages(run: &Run) -> Vec<String> {
    run.events().iter().map(|e| e.message.clone()).collect()
}

/// Split `payload` at the given (sorted, deduplicated) cut points
fn cut<'a>(payload: &'a [u8], cuts: &[usize]) -> Vec<&'a [u8]> {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (payload.len() + 1)).collect();
    points.sort_unstable();
    points.dedup();

    let mut chunks = Vec::new();
    let mut from = 0;
    for point in points {
        chunks.push(&payload[from..point]);
        from = point;
    }
    chunks.push(&payload[from..]);
    chunks
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_chunking_does_not_change_messages(
        lines in prop::collection::vec("[a-z \r]{0,12}", 1..8),
        terminated in any::<bool>(),
        cuts in prop::collection::vec(any::<usize>(), 0..10),
    ) {
        let mut payload = lines.join("\n");
        if terminated {
            payload.push('\n');
        }
        let payload = payload.into_bytes();

        let whole = record_chunks(&[&payload]);
        let pieces = record_chunks(&cut(&payload, &cuts));

        prop_assert_eq!(messages(&whole), messages(&pieces));
    }

    #[test]
    fn prop_messages_are_single_lines(
        chunks in prop::collection::vec(prop::collection::vec(
            prop_oneof![Just(b'\n'), Just(b'\r'), Just(b'x'), Just(b' ')], 0..20), 0..12),
    ) {
        let refs: Vec<&[u8]> = chunks.iter().map(Vec::as_slice).collect();
        let run = record_chunks(&refs);

        for event in run.events() {
            prop_assert!(!event.message.contains('\n'));
            prop_assert!(!event.message.ends_with('\r'));
        }
    }

    #[test]
    fn prop_timestamps_non_decreasing(
        chunks in prop::collection::vec("[a-z\n]{0,10}", 0..12),
        gaps in prop::collection::vec(0u64..30_000_000, 12),
    ) {
        let mut run = Run::new(0);
        let mut now = 0;
        run.record(SourceTag::Trace, Timestamp::from_nanos(now), b"launch");
        for (chunk, gap) in chunks.iter().zip(&gaps) {
            now += gap;
            run.record(SourceTag::Appliance, Timestamp::from_nanos(now), chunk.as_bytes());
        }

        for pair in run.events().windows(2) {
            prop_assert!(pair[0].timestamp <= pair[1].timestamp);
        }
    }
}
