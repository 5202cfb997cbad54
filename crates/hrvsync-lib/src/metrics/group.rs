use crate::{
    error::Result,
    metrics::{
        coherence::CoherencePhase,
        sync::{synchronization, SyncConfig, SynchronizationResult},
    },
};
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Synchronization of participants `a` and `b` (indices into the group).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynchronizationPair {
    pub a: usize,
    pub b: usize,
    #[serde(flatten)]
    pub result: SynchronizationResult,
}

/// Symmetric N×N matrix of pairwise sync strengths, row-major.
///
/// The diagonal is fixed at 1.0 and never computed from data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynchronizationMatrix {
    pub size: usize,
    pub values: Vec<f64>,
}

impl SynchronizationMatrix {
    fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    pub fn rows(&self) -> Vec<Vec<f64>> {
        (0..self.size).map(|i| self.row(i).to_vec()).collect()
    }

    /// Upper-triangle entries as `(i, j, strength)` with `i < j`.
    pub fn pairs(&self) -> Vec<(usize, usize, f64)> {
        let mut out = Vec::with_capacity(self.size * self.size.saturating_sub(1) / 2);
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                out.push((i, j, self.get(i, j)));
            }
        }
        out
    }

    /// Mean off-diagonal strength, `None` with fewer than two participants.
    pub fn mean_sync(&self) -> Option<f64> {
        let pairs = self.pairs();
        if pairs.is_empty() {
            return None;
        }
        Some(pairs.iter().map(|(_, _, s)| s).sum::<f64>() / pairs.len() as f64)
    }
}

/// Every unordered pair `(i, j)`, `i < j`, among `n` participants.
fn unordered_pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect()
}

/// Run the pairwise analyzer on every unordered pair, in parallel.
pub fn pairwise_synchronization<S>(
    signals: &[S],
    cfg: &SyncConfig,
) -> Result<Vec<SynchronizationPair>>
where
    S: AsRef<[f64]> + Sync,
{
    let pairs = unordered_pairs(signals.len());
    debug!("group: {} participants, {} pairs", signals.len(), pairs.len());
    pairs
        .par_iter()
        .map(|&(a, b)| {
            synchronization(signals[a].as_ref(), signals[b].as_ref(), cfg)
                .map(|result| SynchronizationPair { a, b, result })
        })
        .collect()
}

/// Build the group matrix from one signal per participant.
pub fn group_sync_matrix<S>(signals: &[S], cfg: &SyncConfig) -> Result<SynchronizationMatrix>
where
    S: AsRef<[f64]> + Sync,
{
    let pairs = pairwise_synchronization(signals, cfg)?;
    let mut matrix = SynchronizationMatrix::zeros(signals.len());
    let n = matrix.size;
    for pair in &pairs {
        let strength = pair.result.sync_strength;
        matrix.values[pair.a * n + pair.b] = strength;
        matrix.values[pair.b * n + pair.a] = strength;
    }
    // Self-synchronization is 1 by definition.
    for i in 0..n {
        matrix.values[i * n + i] = 1.0;
    }
    Ok(matrix)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

/// Aggregate of the participants' current coherence scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroupCoherenceSummary {
    pub participant_count: usize,
    pub average_score: f64,
    /// Highest single participant score, not a running peak of the average.
    pub max_participant_score: f64,
    pub phase: CoherencePhase,
    pub distribution: PhaseDistribution,
}

pub fn group_coherence_summary(scores: &[f64]) -> GroupCoherenceSummary {
    let participant_count = scores.len();
    let mut distribution = PhaseDistribution::default();
    for &score in scores {
        match CoherencePhase::from_score(score) {
            CoherencePhase::Low => distribution.low += 1,
            CoherencePhase::Medium => distribution.medium += 1,
            CoherencePhase::High => distribution.high += 1,
        }
    }
    let average_score = if participant_count == 0 {
        0.0
    } else {
        scores.iter().sum::<f64>() / participant_count as f64
    };
    GroupCoherenceSummary {
        participant_count,
        average_score,
        max_participant_score: scores.iter().copied().fold(0.0, f64::max),
        phase: CoherencePhase::from_score(average_score),
        distribution,
    }
}
