//! Pure darts scoring rules.
//!
//! Stateless policy over a single throw: value computation, bust and
//! checkout detection, throw validity, plus display and checkout-route
//! helpers. Everything here is a pure function of its arguments.

use crate::errors::{Error, Result};
use crate::scoring::models::Multiplier;

/// Bull's-eye target number.
pub const BULL: u8 = 25;

/// Highest score finishable with three darts (T20 T20 D25).
pub const MAX_CHECKOUT: u32 = 170;

/// Outcome of evaluating one throw against the pre-throw score.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ThrowOutcome {
    pub value: u32,
    pub bust: bool,
    pub checkout: bool,
}

/// Scored value of a dart. The bull counts 25 single, 50 double; a miss
/// (target 0) counts nothing.
pub fn dart_value(multiplier: Multiplier, target: u8) -> u32 {
    if target == BULL {
        return match multiplier {
            Multiplier::Double => 50,
            _ => 25,
        };
    }
    u32::from(multiplier.value()) * u32::from(target)
}

/// Whether a multiplier/target combination can occur on a real board.
/// Bull takes single or double only; a miss is always recorded single.
pub fn is_valid_dart(multiplier: Multiplier, target: u8) -> bool {
    match target {
        BULL => multiplier != Multiplier::Treble,
        0 => multiplier == Multiplier::Single,
        1..=20 => true,
        _ => false,
    }
}

/// Bust: the throw would leave the score negative, exactly 1, or zero
/// without finishing on a double.
pub fn is_bust(current_score: u32, value: u32, multiplier: Multiplier) -> bool {
    let Some(new_score) = current_score.checked_sub(value) else {
        return true;
    };
    new_score == 1 || (new_score == 0 && multiplier != Multiplier::Double)
}

/// Checkout: the throw reduces the score to exactly zero via a double
/// (the 50 bull counts as a double).
pub fn is_checkout(current_score: u32, value: u32, multiplier: Multiplier) -> bool {
    current_score == value && multiplier == Multiplier::Double
}

/// Whether a score can be finished with the darts in hand: minimum
/// checkout is 2 (double 1), maximum 170.
pub fn is_checkable(score: u32) -> bool {
    (2..=MAX_CHECKOUT).contains(&score)
}

/// Validate a throw and evaluate its value, bust and checkout flags
/// against the pre-throw score.
pub fn evaluate(current_score: u32, multiplier: Multiplier, target: u8) -> Result<ThrowOutcome> {
    if !is_valid_dart(multiplier, target) {
        return Err(Error::InvalidDart {
            multiplier: multiplier.value(),
            target,
        });
    }
    let value = dart_value(multiplier, target);
    Ok(ThrowOutcome {
        value,
        bust: is_bust(current_score, value, multiplier),
        checkout: is_checkout(current_score, value, multiplier),
    })
}

/// Three-dart average for a scored total.
pub fn three_dart_average(total_scored: u32, darts_thrown: u32) -> f64 {
    if darts_thrown == 0 {
        return 0.0;
    }
    f64::from(total_scored) / f64::from(darts_thrown) * 3.0
}

/// Checkout success rate as a percentage.
pub fn checkout_percentage(successful: u32, attempts: u32) -> f64 {
    if attempts == 0 {
        return 0.0;
    }
    f64::from(successful) / f64::from(attempts) * 100.0
}

/// Highest total still scorable with the darts left in a turn.
pub fn max_possible_score(darts_remaining: u8) -> u32 {
    // T20 is the best single dart.
    u32::from(darts_remaining) * 60
}

/// Conventional notation for a throw: "T20", "D16", "5", "25", "D25",
/// "0" for a miss.
pub fn format_dart(multiplier: Multiplier, target: u8) -> String {
    if target == 0 {
        return "0".to_string();
    }
    if target == BULL {
        return match multiplier {
            Multiplier::Double => "D25".to_string(),
            _ => "25".to_string(),
        };
    }
    match multiplier {
        Multiplier::Single => target.to_string(),
        Multiplier::Double => format!("D{target}"),
        Multiplier::Treble => format!("T{target}"),
    }
}

/// Suggested routes for finishing a score, empty when none is listed.
pub fn suggested_checkouts(score: u32) -> &'static [&'static str] {
    match score {
        170 => &["T20 T20 D25"],
        167 => &["T20 T19 D25"],
        164 => &["T20 T18 D25"],
        161 => &["T20 T17 D25"],
        160 => &["T20 T20 D20"],
        158 => &["T20 T20 D19"],
        157 => &["T20 T19 D20"],
        156 => &["T20 T20 D18"],
        155 => &["T20 T19 D19"],
        154 => &["T20 T18 D20"],
        153 => &["T20 T19 D18"],
        152 => &["T20 T20 D16"],
        151 => &["T20 T17 D20"],
        150 => &["T20 T18 D18"],
        149 => &["T20 T19 D16"],
        148 => &["T20 T20 D14"],
        147 => &["T20 T17 D18"],
        146 => &["T20 T18 D16"],
        145 => &["T20 T19 D14"],
        144 => &["T20 T20 D12"],
        143 => &["T20 T17 D16"],
        142 => &["T20 T14 D20"],
        141 => &["T20 T19 D12"],
        140 => &["T20 T20 D10"],
        139 => &["T20 T13 D20"],
        138 => &["T20 T18 D12"],
        137 => &["T20 T19 D10"],
        136 => &["T20 T20 D8"],
        135 => &["T20 T17 D12"],
        134 => &["T20 T14 D16"],
        133 => &["T20 T19 D8"],
        132 => &["T20 T16 D12"],
        131 => &["T20 T13 D16"],
        130 => &["T20 T18 D8"],
        129 => &["T19 T16 D12"],
        128 => &["T18 T14 D16"],
        127 => &["T20 T17 D8"],
        126 => &["T19 T19 D6"],
        125 => &["T20 T19 D4"],
        124 => &["T20 T16 D8"],
        123 => &["T19 T16 D9"],
        122 => &["T18 T18 D7"],
        121 => &["T20 T11 D14"],
        120 => &["T20 20 D20"],
        100 => &["T20 D20"],
        80 => &["T20 D10"],
        60 => &["20 D20"],
        50 => &["10 D20", "D25"],
        40 => &["D20"],
        36 => &["D18"],
        32 => &["D16"],
        20 => &["D10"],
        16 => &["D8"],
        12 => &["D6"],
        10 => &["D5"],
        8 => &["D4"],
        6 => &["D3"],
        4 => &["D2"],
        2 => &["D1"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_dart_values() {
        assert_eq!(dart_value(Multiplier::Treble, 20), 60);
        assert_eq!(dart_value(Multiplier::Double, 16), 32);
        assert_eq!(dart_value(Multiplier::Single, BULL), 25);
        assert_eq!(dart_value(Multiplier::Double, BULL), 50);
        assert_eq!(dart_value(Multiplier::Single, 0), 0);
    }

    #[test]
    fn test_validity() {
        assert!(is_valid_dart(Multiplier::Treble, 20));
        assert!(is_valid_dart(Multiplier::Single, BULL));
        assert!(is_valid_dart(Multiplier::Double, BULL));
        assert!(!is_valid_dart(Multiplier::Treble, BULL));
        assert!(is_valid_dart(Multiplier::Single, 0));
        assert!(!is_valid_dart(Multiplier::Double, 0));
        assert!(!is_valid_dart(Multiplier::Single, 21));
    }

    #[test]
    fn test_double_twenty_checks_out_forty() {
        let outcome = evaluate(40, Multiplier::Double, 20).unwrap();
        assert_eq!(outcome.value, 40);
        assert!(outcome.checkout);
        assert!(!outcome.bust);
    }

    #[test]
    fn test_leaving_one_is_a_bust() {
        let outcome = evaluate(2, Multiplier::Single, 1).unwrap();
        assert_eq!(outcome.value, 1);
        assert!(outcome.bust);
        assert!(!outcome.checkout);
    }

    #[test]
    fn test_plain_scoring_throw() {
        let outcome = evaluate(36, Multiplier::Single, 20).unwrap();
        assert_eq!(outcome.value, 20);
        assert!(!outcome.bust);
        assert!(!outcome.checkout);
    }

    #[test]
    fn test_zero_without_double_is_a_bust() {
        let outcome = evaluate(60, Multiplier::Treble, 20).unwrap();
        assert!(outcome.bust);
        assert!(!outcome.checkout);
    }

    #[test]
    fn test_going_negative_is_a_bust() {
        let outcome = evaluate(10, Multiplier::Treble, 20).unwrap();
        assert!(outcome.bust);
    }

    #[test]
    fn test_bull_double_checks_out_fifty() {
        let outcome = evaluate(50, Multiplier::Double, BULL).unwrap();
        assert_eq!(outcome.value, 50);
        assert!(outcome.checkout);
    }

    #[test]
    fn test_invalid_dart_rejected() {
        assert!(matches!(
            evaluate(100, Multiplier::Treble, BULL),
            Err(Error::InvalidDart {
                multiplier: 3,
                target: BULL
            })
        ));
    }

    #[test]
    fn test_checkable_range() {
        assert!(!is_checkable(1));
        assert!(is_checkable(2));
        assert!(is_checkable(170));
        assert!(!is_checkable(171));
    }

    #[test]
    fn test_averages() {
        assert_eq!(three_dart_average(180, 3), 180.0);
        assert_eq!(three_dart_average(0, 0), 0.0);
        assert_eq!(checkout_percentage(1, 4), 25.0);
        assert_eq!(checkout_percentage(0, 0), 0.0);
    }

    #[test]
    fn test_format_dart() {
        assert_eq!(format_dart(Multiplier::Treble, 20), "T20");
        assert_eq!(format_dart(Multiplier::Double, 16), "D16");
        assert_eq!(format_dart(Multiplier::Single, 5), "5");
        assert_eq!(format_dart(Multiplier::Single, BULL), "25");
        assert_eq!(format_dart(Multiplier::Double, BULL), "D25");
        assert_eq!(format_dart(Multiplier::Single, 0), "0");
    }

    #[test]
    fn test_suggested_checkouts() {
        assert_eq!(suggested_checkouts(170), &["T20 T20 D25"]);
        assert_eq!(suggested_checkouts(50), &["10 D20", "D25"]);
        assert!(suggested_checkouts(169).is_empty());
        assert!(suggested_checkouts(1).is_empty());
    }

    proptest! {
        // A checkout is never simultaneously a bust, and every checkout
        // comes from a checkable score.
        #[test]
        fn test_checkout_and_bust_are_exclusive(
            score in 2u32..=501,
            target in 1u8..=20,
        ) {
            for multiplier in [Multiplier::Single, Multiplier::Double, Multiplier::Treble] {
                let value = dart_value(multiplier, target);
                let checkout = is_checkout(score, value, multiplier);
                let bust = is_bust(score, value, multiplier);
                prop_assert!(!(checkout && bust));
                if checkout {
                    prop_assert!(is_checkable(score));
                }
            }
        }

        // A non-bust throw never leaves the score at 1 or below 0.
        #[test]
        fn test_non_bust_leaves_playable_score(
            score in 2u32..=501,
            target in 0u8..=20,
        ) {
            let value = dart_value(Multiplier::Treble, target);
            if !is_bust(score, value, Multiplier::Treble) {
                let remaining = score - value;
                prop_assert!(remaining != 1);
            }
        }
    }
}
