//! Forward-only position within a set of scenario columns.

use crate::error::ValidationError;

/// Current scenario column, advancing with wraparound.
///
/// Columns can only be visited in increasing order, so reaching an earlier
/// column means stepping past the last one and around to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioIndexer {
    current: usize,
    total: usize,
}

impl ScenarioIndexer {
    /// Creates an indexer at column 0.
    ///
    /// # Errors
    /// `ValidationError::EmptyScenarioSet` if `total` is 0.
    pub fn new(total: usize) -> Result<Self, ValidationError> {
        if total == 0 {
            return Err(ValidationError::EmptyScenarioSet);
        }
        Ok(Self { current: 0, total })
    }

    /// Current column.
    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }

    /// Number of columns.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Moves to the next column, wrapping to 0 after the last.
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.total;
    }

    /// Number of forward steps from the current column to `target`.
    ///
    /// # Errors
    /// - `NegativeScenarioIndex` if `target` is negative.
    /// - `ScenarioIndexOutOfRange` if `target >= total`.
    pub fn steps_to(&self, target: i64) -> Result<usize, ValidationError> {
        let index = usize::try_from(target)
            .map_err(|_| ValidationError::NegativeScenarioIndex { index: target })?;
        if index >= self.total {
            return Err(ValidationError::ScenarioIndexOutOfRange {
                index: target,
                total: self.total,
            });
        }
        if index >= self.current {
            Ok(index - self.current)
        } else {
            Ok(self.total - self.current + index)
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn at(current: usize, total: usize) -> ScenarioIndexer {
        let mut indexer = ScenarioIndexer::new(total).unwrap();
        for _ in 0..current {
            indexer.advance();
        }
        indexer
    }

    #[test]
    fn steps_forward_and_around() {
        assert_eq!(at(2, 4).steps_to(3).unwrap(), 1);
        assert_eq!(at(2, 4).steps_to(1).unwrap(), 3);
        assert_eq!(at(0, 4).steps_to(0).unwrap(), 0);
        assert_eq!(at(3, 4).steps_to(0).unwrap(), 1);
    }

    #[test]
    fn rejects_bad_targets() {
        assert!(matches!(
            at(0, 4).steps_to(-1),
            Err(ValidationError::NegativeScenarioIndex { index: -1 })
        ));
        assert!(matches!(
            at(0, 4).steps_to(4),
            Err(ValidationError::ScenarioIndexOutOfRange { index: 4, total: 4 })
        ));
        assert!(matches!(
            ScenarioIndexer::new(0),
            Err(ValidationError::EmptyScenarioSet)
        ));
    }

    #[test]
    fn advance_wraps() {
        let mut indexer = at(3, 4);
        indexer.advance();
        assert_eq!(indexer.current(), 0);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn stepping_lands_on_target(total in 1usize..64, start in 0usize..64, target in 0usize..64) {
            let start = start % total;
            let target = target % total;
            let mut indexer = at(start, total);
            let steps = indexer.steps_to(i64::try_from(target).unwrap()).unwrap();
            prop_assert!(steps < total);
            for _ in 0..steps {
                indexer.advance();
            }
            prop_assert_eq!(indexer.current(), target);
        }
    }
}
