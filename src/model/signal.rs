use std::fmt;

use serde::{Deserialize, Serialize};

use crate::stochastic::kind::ModelKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalCounts {
    pub buy: usize,
    pub sell: usize,
    pub hold: usize,
}

impl SignalCounts {
    pub fn tally(signals: &[Signal]) -> Self {
        signals.iter().fold(Self::default(), |mut acc, s| {
            match s {
                Signal::Buy => acc.buy += 1,
                Signal::Sell => acc.sell += 1,
                Signal::Hold => acc.hold += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.buy + self.sell + self.hold
    }
}

/// Walk-forward output. `signals[k]` and `expected_returns[k]` belong to price index
/// `first_index + k`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReport {
    pub model: ModelKind,
    pub threshold: f64,
    pub window_size: usize,
    pub first_index: usize,
    pub signals: Vec<Signal>,
    pub counts: SignalCounts,
    pub expected_returns: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_uppercase() {
        let json = serde_json::to_string(&[Signal::Buy, Signal::Sell, Signal::Hold]).unwrap();
        assert_eq!(json, r#"["BUY","SELL","HOLD"]"#);
    }

    #[test]
    fn tally_counts_each_kind() {
        let counts = SignalCounts::tally(&[Signal::Hold, Signal::Buy, Signal::Hold]);
        assert_eq!(
            counts,
            SignalCounts {
                buy: 1,
                sell: 0,
                hold: 2
            }
        );
        assert_eq!(counts.total(), 3);
    }
}
