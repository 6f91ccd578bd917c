use crate::core::scoring::SpScoreData;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A pool entry: scores plus whatever the caller needs to find the peptide again.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<K> {
    pub score: f64,
    /// Tie-breaker for equal primary scores; higher wins.
    pub secondary: f64,
    pub is_decoy: bool,
    pub key: K,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpRank {
    pub data: SpScoreData,
    pub rank: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch<K> {
    pub key: K,
    pub score: f64,
    pub secondary: f64,
    pub is_decoy: bool,
    pub rank: u32,
    pub delta_cn: f64,
    pub sp: Option<SpRank>,
}

struct HeapEntry<K> {
    candidate: ScoredCandidate<K>,
    order: usize,
}

impl<K> Ord for HeapEntry<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.candidate
            .score
            .total_cmp(&other.candidate.score)
            .then_with(|| self.candidate.secondary.total_cmp(&other.candidate.secondary))
            // Earlier pool entries win full ties.
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl<K> PartialOrd for HeapEntry<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> PartialEq for HeapEntry<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K> Eq for HeapEntry<K> {}

/// Selects the top-N targets and top-N decoys of one spectrum/charge pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchRanker {
    top_n: usize,
    decoys: bool,
}

impl MatchRanker {
    pub fn new(top_n: usize, decoys: bool) -> Self {
        Self { top_n, decoys }
    }

    pub fn top_n(&self) -> usize {
        self.top_n
    }

    pub fn rank<K>(&self, pool: Vec<ScoredCandidate<K>>) -> RankedMatches<K> {
        let pool_size = pool.len();
        let mut heap: BinaryHeap<HeapEntry<K>> = pool
            .into_iter()
            .enumerate()
            .map(|(order, candidate)| HeapEntry { candidate, order })
            .collect();

        let mut targets = Vec::with_capacity(self.top_n.min(pool_size));
        let mut decoys = Vec::new();
        if self.decoys {
            while targets.len() < self.top_n || decoys.len() < self.top_n {
                let Some(entry) = heap.pop() else { break };
                let list = if entry.candidate.is_decoy {
                    &mut decoys
                } else {
                    &mut targets
                };
                if list.len() < self.top_n {
                    list.push(entry.candidate);
                }
            }
        } else {
            while targets.len() < self.top_n {
                let Some(entry) = heap.pop() else { break };
                targets.push(entry.candidate);
            }
        }

        RankedMatches {
            targets: finalize(targets),
            decoys: finalize(decoys),
            pool_size,
        }
    }
}

/// Assigns ranks and delta-cn to a list already in descending score order.
fn finalize<K>(list: Vec<ScoredCandidate<K>>) -> Vec<RankedMatch<K>> {
    let scores: Vec<f64> = list.iter().map(|c| c.score).collect();
    list.into_iter()
        .enumerate()
        .map(|(i, candidate)| {
            let delta_cn = match scores.get(i + 1) {
                Some(&next) => (candidate.score - next) / candidate.score.max(1.0),
                None => 0.0,
            };
            RankedMatch {
                key: candidate.key,
                score: candidate.score,
                secondary: candidate.secondary,
                is_decoy: candidate.is_decoy,
                rank: i as u32 + 1,
                delta_cn,
                sp: None,
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatches<K> {
    targets: Vec<RankedMatch<K>>,
    decoys: Vec<RankedMatch<K>>,
    pool_size: usize,
}

impl<K> RankedMatches<K> {
    pub fn targets(&self) -> &[RankedMatch<K>] {
        &self.targets
    }

    pub fn decoys(&self) -> &[RankedMatch<K>] {
        &self.decoys
    }

    /// Number of candidates scored for the spectrum, reported or not.
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty() && self.decoys.is_empty()
    }

    /// Rescores every reported match and ranks each list by Sp, independently.
    pub fn assign_sp<E>(
        &mut self,
        mut score: impl FnMut(&K) -> Result<SpScoreData, E>,
    ) -> Result<(), E> {
        for list in [&mut self.targets, &mut self.decoys] {
            let data = list
                .iter()
                .map(|m| score(&m.key))
                .collect::<Result<Vec<_>, E>>()?;
            let mut order: Vec<usize> = (0..list.len()).collect();
            order.sort_by(|&a, &b| data[b].sp_score.total_cmp(&data[a].sp_score));
            for (position, &index) in order.iter().enumerate() {
                list[index].sp = Some(SpRank {
                    data: data[index],
                    rank: position as u32 + 1,
                });
            }
        }
        Ok(())
    }
}
