// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Batch planning.
//!
//! Splits `[0, total)` into consecutive ranges of `batch_size` leaves,
//! numbered from 1 in submission order.

use core::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};

pub const DEFAULT_BATCH_SIZE: usize = 250;
/// Bounds proof and transaction size.
pub const MAX_BATCH_SIZE: usize = 1000;

/// Inclusive leaf-index range of one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchRange {
    pub number: u64,
    pub start: usize,
    pub end: usize,
}

impl BatchRange {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn indices(&self) -> Range<usize> {
        self.start..self.end + 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPlan {
    pub batch_size: usize,
    pub total_leaves: usize,
    /// Leaves actually covered, after the `max_batches` cap.
    pub covered_leaves: usize,
    pub batches: Vec<BatchRange>,
}

impl BatchPlan {
    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlanner {
    max_batch_size: usize,
}

impl Default for BatchPlanner {
    fn default() -> Self {
        Self {
            max_batch_size: MAX_BATCH_SIZE,
        }
    }
}

impl BatchPlanner {
    pub fn new(max_batch_size: usize) -> Self {
        Self { max_batch_size }
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    pub fn check_batch_size(&self, batch_size: usize) -> Result<()> {
        if batch_size == 0 || batch_size > self.max_batch_size {
            return Err(KernelError::InvalidBatchSize {
                size: batch_size,
                max: self.max_batch_size,
            });
        }
        Ok(())
    }

    pub fn plan(&self, total_leaves: usize, batch_size: usize, max_batches: Option<usize>) -> Result<BatchPlan> {
        self.check_batch_size(batch_size)?;

        let covered_leaves = match max_batches {
            Some(0) => return Err(KernelError::InvalidMaxBatches),
            Some(cap) => total_leaves.min(cap.saturating_mul(batch_size)),
            None => total_leaves,
        };

        let batches = (0..covered_leaves)
            .step_by(batch_size)
            .enumerate()
            .map(|(i, start)| BatchRange {
                number: i as u64 + 1,
                start,
                end: (start + batch_size).min(covered_leaves) - 1,
            })
            .collect();

        Ok(BatchPlan {
            batch_size,
            total_leaves,
            covered_leaves,
            batches,
        })
    }
}

/// Plans with the default size ceiling.
pub fn plan_batches(total_leaves: usize, batch_size: usize, max_batches: Option<usize>) -> Result<BatchPlan> {
    BatchPlanner::default().plan(total_leaves, batch_size, max_batches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_multiple() {
        let plan = plan_batches(100, 50, None).unwrap();
        assert_eq!(plan.batch_count(), 2);
        assert_eq!(plan.batches[1], BatchRange { number: 2, start: 50, end: 99 });
    }

    #[test]
    fn test_rejects_zero_and_oversized() {
        assert!(matches!(plan_batches(10, 0, None), Err(KernelError::InvalidBatchSize { .. })));
        assert!(matches!(
            plan_batches(10, MAX_BATCH_SIZE + 1, None),
            Err(KernelError::InvalidBatchSize { .. })
        ));
        assert!(plan_batches(10, MAX_BATCH_SIZE, None).is_ok());
    }

    #[test]
    fn test_custom_ceiling() {
        let planner = BatchPlanner::new(10);
        assert!(planner.plan(100, 11, None).is_err());
        assert_eq!(planner.plan(100, 10, None).unwrap().batch_count(), 10);
    }

    #[test]
    fn test_max_batches_cap() {
        let plan = plan_batches(1000, 30, Some(2)).unwrap();
        assert_eq!(plan.covered_leaves, 60);
        assert_eq!(plan.total_leaves, 1000);
        assert_eq!(plan.batches.last().unwrap().end, 59);

        // cap larger than needed changes nothing
        assert_eq!(plan_batches(10, 5, Some(50)).unwrap().batch_count(), 2);
        assert!(matches!(plan_batches(10, 5, Some(0)), Err(KernelError::InvalidMaxBatches)));
    }
}
