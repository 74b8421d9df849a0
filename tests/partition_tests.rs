// Unit tests for segment planning: logical coverage, overlap handling,
// and degenerate inputs.

use lectern::plan_segments;

#[test]
fn test_plans_example_lecture_with_trailing_second() {
    // 1801s at 600s chunks with 5s overlap: three full segments plus a
    // one-second tail.
    let plans = plan_segments(1801.0, 600.0, 5.0);

    assert_eq!(plans.len(), 4);

    let logical: Vec<(f64, f64)> = plans.iter().map(|p| (p.start_secs, p.end_secs)).collect();
    assert_eq!(
        logical,
        vec![
            (0.0, 600.0),
            (600.0, 1200.0),
            (1200.0, 1800.0),
            (1800.0, 1801.0)
        ]
    );

    // Segment 2 starts at 1200 with only 601s of audio left, so its decode
    // window is clamped below chunk + overlap.
    let decode: Vec<f64> = plans.iter().map(|p| p.decode_secs).collect();
    assert_eq!(decode, vec![605.0, 605.0, 601.0, 1.0]);
}

#[test]
fn test_logical_coverage_has_no_gaps_or_overlap() {
    let cases = [
        (1801.0, 600.0, 5.0),
        (600.0, 600.0, 5.0),
        (599.9, 600.0, 5.0),
        (3600.0, 600.0, 0.0),
        (100.0, 7.0, 2.5),
    ];

    for (total, chunk, overlap) in cases {
        let plans = plan_segments(total, chunk, overlap);

        assert_eq!(
            plans.len(),
            (total / chunk).ceil() as usize,
            "segment count for total={total} chunk={chunk}"
        );

        assert_eq!(plans[0].start_secs, 0.0);
        assert_eq!(plans.last().unwrap().end_secs, total);

        for pair in plans.windows(2) {
            // Segment i's logical end is segment i+1's logical start.
            assert_eq!(pair[0].end_secs, pair[1].start_secs);
            assert_eq!(pair[1].index, pair[0].index + 1);
        }

        for plan in &plans {
            assert!(plan.decode_secs <= chunk + overlap);
            assert!(plan.decode_secs >= plan.end_secs - plan.start_secs);
            // The tail segment decodes exactly what remains.
            if total - plan.start_secs < chunk + overlap {
                assert_eq!(plan.decode_secs, total - plan.start_secs);
            }
        }
    }
}

#[test]
fn test_zero_and_negative_duration_plan_nothing() {
    assert!(plan_segments(0.0, 600.0, 5.0).is_empty());
    assert!(plan_segments(-10.0, 600.0, 5.0).is_empty());
}

#[test]
fn test_exact_multiple_has_no_stub_segment() {
    let plans = plan_segments(1200.0, 600.0, 5.0);
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[1].end_secs, 1200.0);
    // No overlap remains past the end of the audio.
    assert_eq!(plans[1].decode_secs, 600.0);
}

#[test]
fn test_overlap_extends_decode_but_not_logical_end() {
    let plans = plan_segments(1800.0, 600.0, 30.0);
    assert_eq!(plans.len(), 3);
    assert_eq!(plans[0].end_secs, 600.0);
    assert_eq!(plans[0].decode_secs, 630.0);
    // Consecutive starts advance by the chunk size, not chunk + overlap.
    assert_eq!(plans[1].start_secs, 600.0);
}
