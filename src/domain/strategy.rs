//! Strategy selection and moving-average window pairs.

use std::fmt;
use std::str::FromStr;

use crate::domain::error::SimError;

/// Strategy selector for a simulation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    MonthlyDca,
    LumpSum,
    Both,
    CrossoverPosition,
}

impl Strategy {
    pub fn tag(&self) -> &'static str {
        match self {
            Strategy::MonthlyDca => "monthly",
            Strategy::LumpSum => "lump_sum",
            Strategy::Both => "both",
            Strategy::CrossoverPosition => "ma_crossover",
        }
    }
}

impl FromStr for Strategy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "monthly_dca" => Ok(Strategy::MonthlyDca),
            "lump_sum" => Ok(Strategy::LumpSum),
            "both" => Ok(Strategy::Both),
            "ma_crossover" | "crossover_position" => Ok(Strategy::CrossoverPosition),
            _ => Err(SimError::InvalidStrategy {
                tag: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Short/long moving-average windows, `1 <= short < long`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPair {
    short: usize,
    long: usize,
}

impl WindowPair {
    /// Monthly crossover default: 3 vs 12 months.
    pub const MONTHLY_DEFAULT: WindowPair = WindowPair { short: 3, long: 12 };

    pub fn new(short: usize, long: usize) -> Result<Self, SimError> {
        if short == 0 || short >= long {
            return Err(SimError::InvalidWindow { short, long });
        }
        Ok(Self { short, long })
    }

    pub fn short(&self) -> usize {
        self.short
    }

    pub fn long(&self) -> usize {
        self.long
    }
}

impl fmt::Display for WindowPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.short, self.long)
    }
}

/// Fixed daily window choices offered by the backtest command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaOption {
    Ma10x50,
    #[default]
    Ma20x60,
    Ma50x200,
}

impl MaOption {
    pub fn name(&self) -> &'static str {
        match self {
            MaOption::Ma10x50 => "10_50",
            MaOption::Ma20x60 => "20_60",
            MaOption::Ma50x200 => "50_200",
        }
    }

    pub fn windows(&self) -> WindowPair {
        let (short, long) = match self {
            MaOption::Ma10x50 => (10, 50),
            MaOption::Ma20x60 => (20, 60),
            MaOption::Ma50x200 => (50, 200),
        };
        WindowPair { short, long }
    }
}

impl FromStr for MaOption {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "10_50" => Ok(MaOption::Ma10x50),
            "20_60" => Ok(MaOption::Ma20x60),
            "50_200" => Ok(MaOption::Ma50x200),
            other => Err(SimError::ConfigInvalid {
                section: "backtest".into(),
                key: "option".into(),
                reason: format!(
                    "unknown moving-average option '{}' (expected 10_50, 20_60 or 50_200)",
                    other
                ),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_original_tags() {
        assert_eq!("monthly".parse::<Strategy>().unwrap(), Strategy::MonthlyDca);
        assert_eq!("lump_sum".parse::<Strategy>().unwrap(), Strategy::LumpSum);
        assert_eq!("both".parse::<Strategy>().unwrap(), Strategy::Both);
        assert_eq!(
            "ma_crossover".parse::<Strategy>().unwrap(),
            Strategy::CrossoverPosition
        );
    }

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("MONTHLY_DCA".parse::<Strategy>().unwrap(), Strategy::MonthlyDca);
        assert_eq!(
            " Crossover_Position ".parse::<Strategy>().unwrap(),
            Strategy::CrossoverPosition
        );
    }

    #[test]
    fn unknown_tag_is_invalid_strategy() {
        let err = "invalid_strategy".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, SimError::InvalidStrategy { tag } if tag == "invalid_strategy"));
    }

    #[test]
    fn tag_round_trips_through_display() {
        for s in [
            Strategy::MonthlyDca,
            Strategy::LumpSum,
            Strategy::Both,
            Strategy::CrossoverPosition,
        ] {
            assert_eq!(s.to_string().parse::<Strategy>().unwrap(), s);
        }
    }

    #[test]
    fn window_pair_requires_short_below_long() {
        assert!(WindowPair::new(3, 12).is_ok());
        assert!(matches!(
            WindowPair::new(12, 12),
            Err(SimError::InvalidWindow { short: 12, long: 12 })
        ));
        assert!(WindowPair::new(20, 10).is_err());
        assert!(WindowPair::new(0, 10).is_err());
    }

    #[test]
    fn ma_options_map_to_fixed_windows() {
        assert_eq!(MaOption::Ma10x50.windows(), WindowPair::new(10, 50).unwrap());
        assert_eq!(MaOption::Ma20x60.windows(), WindowPair::new(20, 60).unwrap());
        assert_eq!(MaOption::Ma50x200.windows(), WindowPair::new(50, 200).unwrap());
        assert_eq!(MaOption::default(), MaOption::Ma20x60);
        assert_eq!("50_200".parse::<MaOption>().unwrap(), MaOption::Ma50x200);
        assert!("5_10".parse::<MaOption>().is_err());
    }
}
