/// Logistic sigmoid, `1 / (1 + e^-x)`. Maps any real input into (0, 1).
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert_relative_eq!(sigmoid(2.0), 0.880_797_077_977_882_3, epsilon = 1e-12);
        assert_relative_eq!(sigmoid(-2.0), 1.0 - sigmoid(2.0), epsilon = 1e-12);
        // saturates instead of overflowing
        assert_eq!(sigmoid(f64::INFINITY), 1.0);
        assert_eq!(sigmoid(f64::NEG_INFINITY), 0.0);
    }

    proptest! {
        #[test]
        fn proptest_sigmoid_strictly_inside_unit_interval(x in -30.0f64..30.0) {
            let y = sigmoid(x);
            prop_assert!(y > 0.0 && y < 1.0);
        }

        #[test]
        fn proptest_sigmoid_is_monotonic(a in -30.0f64..30.0, b in -30.0f64..30.0) {
            if a < b {
                prop_assert!(sigmoid(a) <= sigmoid(b));
            }
        }
    }
}
