//! Property-based tests for the probe policy and input validation.
//!
//! Uses `proptest` to verify invariants across many random inputs.

use std::collections::BTreeSet;

use proptest::prelude::*;

use mega_launch_cli::domain::job::{format_watermark, parse_watermark, validate_job_id};
use mega_launch_cli::domain::{LogPattern, evaluate_ports, parse_show, validate_unit_name};

fn ports() -> impl Strategy<Value = BTreeSet<u16>> {
    prop::collection::btree_set(1u16..2048, 0..8)
}

// ============================================================================
// evaluate_ports() property tests
// ============================================================================

proptest! {
    /// With a known pid, the probe passes exactly when every expected port listens.
    #[test]
    fn prop_pid_probe_is_subset_test(pid in 1u32.., expected in ports(), observed in ports()) {
        let check = evaluate_ports(Some(pid), &expected, observed.clone());
        prop_assert_eq!(check.passed == 1, expected.is_subset(&observed));
        prop_assert_eq!(check.observed, observed);
    }

    /// Host-wide, a partial or full overlap narrows the report and never passes.
    #[test]
    fn prop_host_wide_overlap_never_passes(expected in ports(), observed in ports()) {
        let overlap: BTreeSet<u16> = expected.intersection(&observed).copied().collect();
        let check = evaluate_ports(None, &expected, observed.clone());
        if overlap.is_empty() {
            prop_assert_eq!(check.passed, 1);
            prop_assert_eq!(check.observed, observed);
        } else {
            prop_assert_eq!(check.passed, 0);
            prop_assert_eq!(check.observed, overlap);
        }
    }

    /// Pid 0 is the same as no pid.
    #[test]
    fn prop_zero_pid_is_host_wide(expected in ports(), observed in ports()) {
        prop_assert_eq!(
            evaluate_ports(Some(0), &expected, observed.clone()),
            evaluate_ports(None, &expected, observed)
        );
    }
}

// ============================================================================
// Name, id and watermark validation
// ============================================================================

proptest! {
    /// Names with a glob metacharacter anywhere are rejected.
    #[test]
    fn prop_glob_names_rejected(
        head in "[a-z0-9-]{0,10}",
        glob in prop::sample::select(vec!['*', '?', '[']),
        tail in "[a-z0-9.-]{0,10}",
    ) {
        let name = format!("{head}{glob}{tail}");
        prop_assert!(validate_unit_name(&name).is_err(), "accepted glob name: {}", name);
    }

    /// Ordinary unit names, including template instances, are accepted.
    #[test]
    fn prop_plain_names_accepted(name in "[a-z][a-z0-9_-]{0,20}(@[a-z0-9]{1,8})?(\\.service)?") {
        prop_assert!(validate_unit_name(&name).is_ok(), "rejected: {}", name);
    }

    /// Job ids never contain a path separator once validated.
    #[test]
    fn prop_job_ids_with_separator_rejected(a in "[a-z0-9]{0,8}", b in "[a-z0-9]{0,8}") {
        let id = format!("{a}/{b}");
        prop_assert!(validate_job_id(&id).is_err());
    }

    /// A watermark survives formatting to microsecond precision.
    #[test]
    fn prop_watermark_round_trips(secs in 0i64..4_000_000_000, micros in 0u32..1_000_000) {
        let at = chrono::DateTime::from_timestamp(secs, micros * 1_000).expect("in range");
        prop_assert_eq!(parse_watermark(&format_watermark(at)), Some(at));
    }
}

// ============================================================================
// Parsing never panics
// ============================================================================

proptest! {
    #[test]
    fn prop_show_parser_total(text in "\\PC{0,200}") {
        let _ = parse_show(&text);
    }

    /// Any pattern either compiles or is rejected, never panics.
    #[test]
    fn prop_log_pattern_total(pattern in "\\PC{0,20}", line in "\\PC{0,40}") {
        if let Ok(p) = LogPattern::new(&pattern) {
            let _ = p.is_match(&line);
        }
    }
}
