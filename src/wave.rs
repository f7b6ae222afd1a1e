use crate::err::Error;
use rand::Rng;
use rand_chacha::ChaCha20Rng;

/// Span of the per-cell entropy perturbation used to break ties.
const NOISE_SPAN: f64 = 1e-6;

/// Per-cell partial sums kept in lockstep with the allowance data so that
/// entropy queries never rescan the pattern axis.
#[derive(Debug, Clone)]
struct EntropyMemo {
  plogp_sum: Vec<f64>,
  sum: Vec<f64>,
  log_sum: Vec<f64>,
  nb_possible: Vec<usize>,
  entropy: Vec<f64>,
}

/// The boolean allowance of every pattern at every cell, plus the entropy
/// bookkeeping driving observation order.
///
/// Removals are monotone within a try: `unset` never re-allows a pattern.
#[derive(Debug, Clone)]
pub struct Wave {
  height: usize,
  width: usize,
  nb_patterns: usize,
  data: Vec<bool>,
  weights: Vec<f64>,
  plogp_weights: Vec<f64>,
  memo: EntropyMemo,
  noise: Vec<f64>,
  impossible: bool,
}

impl Wave {
  pub fn new(height: usize, width: usize, weights: &[f64], rng: &mut ChaCha20Rng) -> Self {
    let size = height * width;
    let nb_patterns = weights.len();
    let plogp_weights: Vec<f64> = weights.iter().map(|w| w * w.ln()).collect();

    let base_sum: f64 = weights.iter().sum();
    let base_plogp: f64 = plogp_weights.iter().sum();
    let base_log_sum = base_sum.ln();
    let base_entropy = base_log_sum - base_plogp / base_sum;

    let noise = (0..size).map(|_| rng.gen_range(0.0..NOISE_SPAN)).collect();

    Self {
      height,
      width,
      nb_patterns,
      data: vec![true; size * nb_patterns],
      weights: weights.to_vec(),
      plogp_weights,
      memo: EntropyMemo {
        plogp_sum: vec![base_plogp; size],
        sum: vec![base_sum; size],
        log_sum: vec![base_log_sum; size],
        nb_possible: vec![nb_patterns; size],
        entropy: vec![base_entropy; size],
      },
      noise,
      impossible: nb_patterns == 0,
    }
  }

  pub fn height(&self) -> usize {
    self.height
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn len(&self) -> usize {
    self.height * self.width
  }

  pub fn nb_patterns(&self) -> usize {
    self.nb_patterns
  }

  pub fn index_of(&self, y: usize, x: usize) -> usize {
    y * self.width + x
  }

  pub fn get(&self, index: usize, pattern: usize) -> bool {
    self.data[index * self.nb_patterns + pattern]
  }

  pub fn nb_possible(&self, index: usize) -> usize {
    self.memo.nb_possible[index]
  }

  /// Marks `pattern` impossible at `index`, updating the entropy sums.
  /// Returns whether this was a new removal; errs when the cell runs dry.
  pub fn unset(&mut self, index: usize, pattern: usize) -> Result<bool, Error> {
    let slot = index * self.nb_patterns + pattern;
    if !self.data[slot] {
      return Ok(false);
    }
    self.data[slot] = false;

    let memo = &mut self.memo;
    memo.plogp_sum[index] -= self.plogp_weights[pattern];
    memo.sum[index] -= self.weights[pattern];
    memo.log_sum[index] = memo.sum[index].ln();
    memo.nb_possible[index] -= 1;
    memo.entropy[index] = memo.log_sum[index] - memo.plogp_sum[index] / memo.sum[index];

    if memo.nb_possible[index] == 0 {
      self.impossible = true;
      return Err(Error::Contradiction);
    }
    Ok(true)
  }

  /// The cell to observe next: the one minimizing entropy plus its noise,
  /// among cells still holding more than one pattern. `Ok(None)` means every
  /// cell is down to a single pattern and the wave is collapsed.
  #[profiling::function]
  pub fn min_entropy_cell(&self) -> Result<Option<usize>, Error> {
    if self.impossible {
      return Err(Error::Contradiction);
    }

    let mut min = f64::INFINITY;
    let mut argmin = None;
    for index in 0..self.len() {
      if self.memo.nb_possible[index] == 1 {
        continue;
      }
      let entropy = self.memo.entropy[index] + self.noise[index];
      if entropy < min {
        min = entropy;
        argmin = Some(index);
      }
    }
    Ok(argmin)
  }
}

#[cfg(test)]
mod tests {
  use super::Wave;
  use crate::err::Error;
  use rand::SeedableRng;
  use rand_chacha::ChaCha20Rng;

  fn wave(height: usize, width: usize, weights: &[f64]) -> Wave {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    Wave::new(height, width, weights, &mut rng)
  }

  #[test]
  fn starts_with_everything_possible() {
    let wave = wave(2, 3, &[1.0, 2.0, 1.0]);
    for index in 0..wave.len() {
      assert_eq!(wave.nb_possible(index), 3);
      for pattern in 0..3 {
        assert!(wave.get(index, pattern));
      }
    }
  }

  #[test]
  fn unset_tracks_counts_and_is_idempotent() {
    let mut wave = wave(1, 2, &[1.0, 1.0, 2.0]);
    assert!(wave.unset(0, 1).unwrap());
    assert!(!wave.unset(0, 1).unwrap());
    assert_eq!(wave.nb_possible(0), 2);
    assert!(!wave.get(0, 1));
  }

  #[test]
  fn emptying_a_cell_is_a_contradiction() {
    let mut wave = wave(1, 1, &[1.0, 1.0]);
    wave.unset(0, 0).unwrap();
    assert!(matches!(wave.unset(0, 1), Err(Error::Contradiction)));
    assert!(matches!(wave.min_entropy_cell(), Err(Error::Contradiction)));
  }

  #[test]
  fn collapsed_wave_reports_done() {
    let mut wave = wave(1, 2, &[1.0, 1.0]);
    wave.unset(0, 0).unwrap();
    wave.unset(1, 1).unwrap();
    assert!(wave.min_entropy_cell().unwrap().is_none());
  }

  #[test]
  fn lower_entropy_cell_wins() {
    let mut wave = wave(1, 3, &[1.0, 1.0, 1.0, 1.0]);
    wave.unset(2, 0).unwrap();
    wave.unset(2, 1).unwrap();
    assert_eq!(wave.min_entropy_cell().unwrap(), Some(2));
  }

  #[test]
  fn entropy_matches_shannon_formula() {
    let weights = [1.0, 2.0, 4.0];
    let mut wave = wave(1, 1, &weights);
    wave.unset(0, 0).unwrap();

    let sum: f64 = weights[1] + weights[2];
    let plogp: f64 = weights[1] * weights[1].ln() + weights[2] * weights[2].ln();
    let expected = sum.ln() - plogp / sum;

    let observed = wave.memo.entropy[0];
    assert!((observed - expected).abs() < 1e-12);
  }
}
