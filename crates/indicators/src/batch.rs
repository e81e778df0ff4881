use crate::eval::Eval;
use crate::instance::IndicatorInstance;

/// Drive `instance` over `observations` in order.
///
/// The output is index-aligned with the input: position `i` holds the result of
/// the `i`-th observation. An error does not stop the run; the remaining
/// positions report the latched error.
pub fn evaluate(instance: &mut IndicatorInstance, observations: &[f64]) -> Vec<Eval> {
    observations.iter().map(|&x| instance.advance(x)).collect()
}

/// Flatten results to absent-value markers for feature assembly.
pub fn values(results: &[Eval]) -> Vec<Option<f64>> {
    results.iter().map(Eval::value).collect()
}

/// Counts of each outcome in a result series, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalSummary {
    pub ready: usize,
    pub not_ready: usize,
    pub errors: usize,
}

impl EvalSummary {
    pub fn from_results(results: &[Eval]) -> Self {
        results.iter().fold(Self::default(), |mut acc, r| {
            match r {
                Eval::Ready(_) => acc.ready += 1,
                Eval::NotReady => acc.not_ready += 1,
                Eval::Error(_) => acc.errors += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.ready + self.not_ready + self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::EvalError;
    use crate::{assert_approx, create, Params};

    fn period(n: i64) -> Params {
        Params::new().with("period", n)
    }

    #[test]
    fn test_sma_scenario() {
        let mut sma = create("SimpleMovingAverage", &period(3)).unwrap();
        let out = evaluate(&mut sma, &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(
            out,
            vec![
                Eval::NotReady,
                Eval::NotReady,
                Eval::Ready(2.0),
                Eval::Ready(3.0),
                Eval::Ready(4.0)
            ]
        );
    }

    #[test]
    fn test_ema_scenario() {
        let mut ema = create("ExponentialMovingAverage", &period(2)).unwrap();
        let out = evaluate(&mut ema, &[2.0, 4.0, 6.0, 8.0]);
        assert_eq!(out[0], Eval::NotReady);
        assert_eq!(out[1], Eval::Ready(3.0));
        assert_approx(out[2].value().unwrap(), 5.0);
        assert_approx(out[3].value().unwrap(), 7.0);
    }

    #[test]
    fn test_rsi_scenario() {
        let mut rsi = create("RelativeStrengthIndex", &period(2)).unwrap();
        let out = evaluate(&mut rsi, &[1.0, 2.0, 1.0, 2.0]);
        assert_eq!(
            out,
            vec![Eval::NotReady, Eval::NotReady, Eval::Ready(50.0), Eval::Ready(75.0)]
        );
    }

    #[test]
    fn test_error_keeps_length() {
        let mut sma = create("SimpleMovingAverage", &period(2)).unwrap();
        let out = evaluate(&mut sma, &[1.0, 2.0, f64::NAN, 4.0, 5.0]);
        assert_eq!(out.len(), 5);
        assert_eq!(out[1], Eval::Ready(1.5));
        assert!(out[2..]
            .iter()
            .all(|r| *r == Eval::Error(EvalError::NonFiniteInput)));

        let summary = EvalSummary::from_results(&out);
        assert_eq!(
            summary,
            EvalSummary {
                ready: 1,
                not_ready: 1,
                errors: 3
            }
        );
        assert_eq!(summary.total(), out.len());
        assert_eq!(values(&out), vec![None, Some(1.5), None, None, None]);
    }

    #[test]
    fn test_empty_input() {
        let mut rsi = create("RelativeStrengthIndex", &period(14)).unwrap();
        assert!(evaluate(&mut rsi, &[]).is_empty());
        assert_eq!(EvalSummary::from_results(&[]), EvalSummary::default());
    }
}
