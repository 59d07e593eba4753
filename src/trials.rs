//! Depth and locality experiments over randomly built treaps.
//!
//! A depth trial inserts keys in ascending order, the worst case for an unbalanced binary search
//! tree, and compares the resulting maximum depth with `log2(N)`. It then removes the middle half
//! of the keys through `find` and `decouple` and checks the treap again. A locality trial shows
//! how repeated `usurping_find` calls pull popular keys towards the root.

use crate::error::{Error, Result};
use crate::treap::Treap;
use log::{debug, info, warn};
use rand::Rng;
use serde_derive::Serialize;
use std::iter;

/// Parameters of a batch of depth trials.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialConfig {
    /// Number of times the whole range of sizes is run.
    pub repetitions: usize,
    /// Exclusive upper bound on trial sizes. Sizes are the powers of two from 2 up to this bound.
    pub max_size: u32,
}

impl Default for TrialConfig {
    fn default() -> Self {
        TrialConfig {
            repetitions: 20,
            max_size: 2_000_000,
        }
    }
}

impl TrialConfig {
    /// Returns the trial sizes of one repetition.
    ///
    /// # Examples
    ///
    /// ```
    /// use usurping_treap::trials::TrialConfig;
    ///
    /// let config = TrialConfig { repetitions: 1, max_size: 20 };
    /// assert_eq!(config.sizes().collect::<Vec<u32>>(), vec![2, 4, 8, 16]);
    /// ```
    pub fn sizes(&self) -> impl Iterator<Item = u32> {
        let max_size = self.max_size;
        iter::successors(Some(2u32), |size| size.checked_mul(2))
            .take_while(move |size| *size < max_size)
    }
}

/// Measurements of a single depth trial.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DepthReport {
    pub size: u32,
    pub valid_after_insert: bool,
    pub max_depth_after_insert: usize,
    pub log2_size: f64,
    /// `max_depth_after_insert / log2_size`, or zero for trials with fewer than two keys.
    pub log_factor: f64,
    pub valid_after_removal: bool,
    pub max_depth_after_removal: usize,
    pub remaining: usize,
}

/// Aggregate result of `run_depth_trials`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrialSummary {
    pub reports: Vec<DepthReport>,
    pub average_log_factor: f64,
}

/// Shape of a treap before and after repeated promotion of some hot keys.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LocalityReport {
    pub hot_keys: Vec<u32>,
    pub rounds: usize,
    pub before: String,
    pub after: String,
    pub depths_before: Vec<usize>,
    pub depths_after: Vec<usize>,
}

fn is_valid<R>(treap: &Treap<R>) -> bool {
    match treap.validate() {
        Ok(()) => true,
        Err(err) => {
            warn!("{}", err);
            false
        },
    }
}

fn ascending<R: Rng>(size: u32, rng: R) -> Treap<R> {
    let mut treap = Treap::with_rng(rng);
    for key in 0..size {
        treap.insert(key);
    }
    treap
}

fn hot_key_depths<R>(treap: &Treap<R>, hot_keys: &[u32]) -> Result<Vec<usize>> {
    hot_keys
        .iter()
        .map(|&key| {
            treap
                .find(key)
                .map(|node_ref| treap.depth(node_ref))
                .ok_or(Error::KeyNotFound(key))
        })
        .collect()
}

/// Builds a treap from the keys `0..size`, measures it, then decouples the keys
/// `size / 4 .. 3 * size / 4` and measures it again.
///
/// # Examples
///
/// ```
/// use usurping_treap::trials;
///
/// let report = trials::depth_trial(64, rand::weak_rng()).unwrap();
/// assert!(report.valid_after_insert);
/// assert!(report.valid_after_removal);
/// assert_eq!(report.remaining, 32);
/// ```
pub fn depth_trial<R: Rng>(size: u32, rng: R) -> Result<DepthReport> {
    let mut treap = ascending(size, rng);
    let valid_after_insert = is_valid(&treap);
    let max_depth_after_insert = treap.max_depth();
    let log2_size = f64::from(size).log2();
    let log_factor = if log2_size > 0.0 {
        max_depth_after_insert as f64 / log2_size
    } else {
        0.0
    };

    let start = size / 4;
    let end = (u64::from(size) * 3 / 4) as u32;
    for key in start..end {
        let node_ref = treap.find(key).ok_or(Error::KeyNotFound(key))?;
        treap.decouple(node_ref)?;
    }

    let report = DepthReport {
        size,
        valid_after_insert,
        max_depth_after_insert,
        log2_size,
        log_factor,
        valid_after_removal: is_valid(&treap),
        max_depth_after_removal: treap.max_depth(),
        remaining: treap.len(),
    };
    debug!("{:?}", report);
    Ok(report)
}

/// Runs a depth trial for every size of `config`, `config.repetitions` times, drawing each trial's
/// priorities from `rng`.
pub fn run_depth_trials<R: Rng>(config: &TrialConfig, rng: &mut R) -> Result<TrialSummary> {
    let mut reports = Vec::new();
    for repetition in 0..config.repetitions {
        for size in config.sizes() {
            let report = depth_trial(size, &mut *rng)?;
            info!(
                "repetition {} size {}: max depth {}, log factor {:.3}",
                repetition, size, report.max_depth_after_insert, report.log_factor,
            );
            reports.push(report);
        }
    }

    let average_log_factor = if reports.is_empty() {
        0.0
    } else {
        reports.iter().map(|report| report.log_factor).sum::<f64>() / reports.len() as f64
    };
    Ok(TrialSummary {
        reports,
        average_log_factor,
    })
}

/// Builds a treap from the keys `0..size` and calls `usurping_find` on each hot key, interleaved,
/// `rounds` times.
///
/// Returns `Err(Error::KeyNotFound)` if a hot key is not below `size`.
pub fn locality_trial<R: Rng>(
    size: u32,
    hot_keys: &[u32],
    rounds: usize,
    rng: R,
) -> Result<LocalityReport> {
    let mut treap = ascending(size, rng);
    let before = treap.to_string();
    let depths_before = hot_key_depths(&treap, hot_keys)?;

    for _ in 0..rounds {
        for &key in hot_keys {
            treap.usurping_find(key);
        }
    }

    treap.validate()?;
    Ok(LocalityReport {
        hot_keys: hot_keys.to_vec(),
        rounds,
        before,
        after: treap.to_string(),
        depths_before,
        depths_after: hot_key_depths(&treap, hot_keys)?,
    })
}
