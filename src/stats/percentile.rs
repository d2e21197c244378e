use std::{fmt::Display, str::FromStr};

/// A percentile on the 0..=100 scale, checked on construction.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentile(f64);

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PercentileError {
    #[error("percentile must be between 0 and 100, got {0}")]
    OutOfRange(f64),
    #[error("percentile is not a number: {0:?}")]
    NotANumber(String),
}

impl Percentile {
    pub const MIN: Percentile = Percentile(0.);
    pub const MEDIAN: Percentile = Percentile(50.);
    pub const MAX: Percentile = Percentile(100.);

    pub fn new(p: f64) -> Result<Self, PercentileError> {
        if p.is_finite() && (0. ..=100.).contains(&p) {
            Ok(Self(p))
        } else {
            Err(PercentileError::OutOfRange(p))
        }
    }

    /// On the 0..=1 scale
    pub fn fraction(self) -> f64 {
        self.0 / 100.
    }
}

impl FromStr for Percentile {
    type Err = PercentileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let p: f64 = s
            .trim()
            .parse()
            .map_err(|_| PercentileError::NotANumber(s.to_owned()))?;
        Self::new(p)
    }
}

impl Display for Percentile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_range() {
        assert_eq!(Percentile::new(0.), Ok(Percentile::MIN));
        assert_eq!(Percentile::new(100.), Ok(Percentile::MAX));
        assert_eq!(Percentile::new(100.5), Err(PercentileError::OutOfRange(100.5)));
        assert_eq!(Percentile::new(-1.), Err(PercentileError::OutOfRange(-1.)));
        assert!(Percentile::new(f64::NAN).is_err());
    }

    #[test]
    fn t_from_str() {
        assert_eq!("95".parse::<Percentile>(), Ok(Percentile(95.)));
        assert_eq!(" 99.9 ".parse::<Percentile>(), Ok(Percentile(99.9)));
        assert_eq!(
            "ninety".parse::<Percentile>(),
            Err(PercentileError::NotANumber("ninety".into()))
        );
        assert_eq!(Percentile::MEDIAN.to_string(), "50");
        assert_eq!(Percentile::MEDIAN.fraction(), 0.5);
    }
}
