use crate::error::{BallError, Result};

/// Below this many rows or right-hand-side columns the triangular solver
/// switches from block recursion to substitution.
pub const DEFAULT_CROSSOVER: usize = 8;

/// Precision, in bits, of error radii.
pub const MAG_BITS: u64 = 30;

/// Parameters for the triangular solver
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolveConfig {
    crossover: usize,
}

impl SolveConfig {
    /// Creates a configuration with the given crossover.
    ///
    /// # Errors
    /// * `InvalidParameters` if `crossover < 2`; a 1×1 block would be split
    ///   into an empty block and itself.
    pub fn new(crossover: usize) -> Result<Self> {
        if crossover < 2 {
            return Err(BallError::InvalidParameters(format!(
                "crossover must be at least 2, got {}",
                crossover
            )));
        }
        Ok(Self { crossover })
    }

    /// Smallest row count and right-hand-side count for which the solver
    /// splits recursively.
    pub fn crossover(&self) -> usize {
        self.crossover
    }

    /// Whether a system with `n` rows and `m` right-hand sides is solved by
    /// substitution rather than split.
    pub fn use_classical(&self, n: usize, m: usize) -> bool {
        n < self.crossover || m < self.crossover
    }
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self {
            crossover: DEFAULT_CROSSOVER,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_crossover() {
        let config = SolveConfig::default();
        assert_eq!(config.crossover(), 8);
        assert!(config.use_classical(7, 100));
        assert!(config.use_classical(100, 7));
        assert!(!config.use_classical(8, 8));
    }

    #[test]
    fn test_crossover_validation() {
        assert!(matches!(
            SolveConfig::new(1),
            Err(BallError::InvalidParameters(_))
        ));
        assert!(SolveConfig::new(0).is_err());
        assert_eq!(SolveConfig::new(2).unwrap().crossover(), 2);
    }
}
