//! Scoring and quantization properties.

use llmbench_engine::score::weight;
use llmbench_engine::{overall_score, quantize_fp8, BaselineTable, Metric, ResultsRecord};
use proptest::prelude::*;

fn record(values: [f64; 6]) -> ResultsRecord {
    let [fp32, fp16, fp8, int8, int4, mem_bw] = values;
    ResultsRecord { fp32, fp16, fp8, int8, int4, mem_bw, skipped: vec![] }
}

#[test]
fn baseline_record_scores_exactly_100() {
    let b = BaselineTable::REFERENCE;
    let r = record([b.fp32, b.fp16, b.fp8, b.int8, b.int4, b.mem_bw]);
    assert_eq!(overall_score(&r, &b), 100.0);
}

#[test]
fn all_zero_record_scores_zero() {
    assert_eq!(overall_score(&ResultsRecord::default(), &BaselineTable::REFERENCE), 0.0);
}

#[test]
fn accelerator_scenario_scores_75() {
    let baseline = BaselineTable {
        mem_bw: 50.0,
        fp32: 100.0,
        fp16: 200.0,
        fp8: 400.0,
        int8: 400.0,
        int4: 800.0,
    };
    let r = record([100.0, 200.0, 400.0, 0.0, 0.0, 50.0]);
    assert_eq!(overall_score(&r, &baseline), 75.0);
}

#[test]
fn reference_baseline_values() {
    let b = BaselineTable::default();
    assert_eq!(
        [b.mem_bw, b.fp32, b.fp16, b.fp8, b.int8, b.int4],
        [50.0, 100.0, 200.0, 400.0, 400.0, 800.0]
    );
}

proptest! {
    /// Changing one field changes the score by weight·Δ/baseline, independent
    /// of the other fields.
    #[test]
    fn score_is_linear_per_field(
        values in prop::array::uniform6(0.0f64..1e4),
        idx in 0usize..6,
        delta in 0.0f64..1e4,
    ) {
        let baseline = BaselineTable::REFERENCE;
        let metric = Metric::ALL[idx];
        let before = record(values);
        let mut bumped = values;
        bumped[idx] += delta;
        let after = record(bumped);

        let diff = overall_score(&after, &baseline) - overall_score(&before, &baseline);
        let want = weight(metric) * delta / baseline.get(metric);
        let tol = 1e-9 * (1.0 + overall_score(&after, &baseline));
        prop_assert!((diff - want).abs() <= tol, "metric={} diff={} want={}", metric, diff, want);
    }

    #[test]
    fn score_scales_with_uniform_multiplier(
        values in prop::array::uniform6(0.0f64..1e3),
        k in 0.0f64..10.0,
    ) {
        let baseline = BaselineTable::REFERENCE;
        let scaled = record(values.map(|v| v * k));
        let want = k * overall_score(&record(values), &baseline);
        let got = overall_score(&scaled, &baseline);
        prop_assert!((got - want).abs() <= 1e-9 * (1.0 + want.abs()));
    }

    #[test]
    fn quantize_matches_definition(v in -4.0f32..4.0) {
        let want = (v * 127.0).round_ties_even().clamp(-128.0, 127.0) / 127.0;
        prop_assert_eq!(quantize_fp8(v), want);
    }

    #[test]
    fn quantize_error_bounded_in_unit_interval(v in -1.0f32..=1.0) {
        prop_assert!((quantize_fp8(v) - v).abs() <= 1.0 / 127.0);
    }
}
