use crate::{
  err::Error,
  grid::Grid2d,
  propagator::{Propagator, PropagatorRules},
  wave::Wave,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

#[derive(PartialEq, Eq, Debug)]
pub enum Observation {
  Incomplete(usize),
  Complete,
}

impl Observation {
  pub fn complete(&self) -> bool {
    *self == Self::Complete
  }
}

/// One try of the constraint solver: an owned seeded generator, the pattern
/// weights, the wave, and the propagation engine. Front-ends construct a
/// fresh instance per try, so nothing here is ever reset.
#[derive(Debug)]
pub struct Solver {
  rng: ChaCha20Rng,
  weights: Vec<f64>,
  wave: Wave,
  propagator: Propagator,
}

impl Solver {
  pub fn new(
    height: usize,
    width: usize,
    periodic_output: bool,
    seed: u32,
    weights: Vec<f64>,
    rules: PropagatorRules,
  ) -> Self {
    let mut rng = ChaCha20Rng::seed_from_u64(seed as u64);
    let total: f64 = weights.iter().sum();
    let weights: Vec<f64> = weights.iter().map(|w| w / total).collect();
    let wave = Wave::new(height, width, &weights, &mut rng);
    let propagator = Propagator::new(height, width, periodic_output, rules);

    Self {
      rng,
      weights,
      wave,
      propagator,
    }
  }

  /// Runs observation and propagation to quiescence, yielding the grid of
  /// surviving pattern indices, or `Contradiction` when this try is dead.
  #[profiling::function]
  pub fn run(mut self) -> Result<Grid2d<usize>, Error> {
    loop {
      match self.observe()? {
        Observation::Complete => return Ok(self.output()),
        Observation::Incomplete(_) => self.propagator.propagate(&mut self.wave)?,
      }
    }
  }

  /// Collapses the minimum entropy cell to a single weighted-random pattern,
  /// queuing the discarded patterns for propagation.
  #[profiling::function]
  pub fn observe(&mut self) -> Result<Observation, Error> {
    let Some(index) = self.wave.min_entropy_cell()? else {
      return Ok(Observation::Complete);
    };

    let chosen = self.weighted_choice(index);
    for pattern in 0..self.wave.nb_patterns() {
      if pattern != chosen && self.wave.get(index, pattern) {
        self.ban_index(index, pattern)?;
      }
    }

    Ok(Observation::Incomplete(index))
  }

  /// Samples a uniform variate in `[0, sum of allowed weights)` and walks the
  /// allowed patterns in index order; the accumulation order is part of the
  /// determinism contract.
  fn weighted_choice(&mut self, index: usize) -> usize {
    let total: f64 = (0..self.wave.nb_patterns())
      .filter(|&pattern| self.wave.get(index, pattern))
      .map(|pattern| self.weights[pattern])
      .sum();

    let mut variate = self.rng.gen_range(0.0..total);
    let mut chosen = self.wave.nb_patterns() - 1;
    for pattern in 0..self.wave.nb_patterns() {
      if self.wave.get(index, pattern) {
        variate -= self.weights[pattern];
        if variate <= 0.0 {
          chosen = pattern;
          break;
        }
      }
    }
    chosen
  }

  /// Removes `pattern` from cell `(y, x)` ahead of the main loop; front-ends
  /// use this to install their initial constraints.
  pub fn ban(&mut self, y: usize, x: usize, pattern: usize) -> Result<(), Error> {
    self.ban_index(self.wave.index_of(y, x), pattern)
  }

  fn ban_index(&mut self, index: usize, pattern: usize) -> Result<(), Error> {
    if self.wave.get(index, pattern) {
      let (y, x) = (index / self.wave.width(), index % self.wave.width());
      self.propagator.add_removal(y, x, pattern);
      self.wave.unset(index, pattern)?;
    }
    Ok(())
  }

  /// Flushes removals queued by `ban` through the engine.
  pub fn propagate(&mut self) -> Result<(), Error> {
    self.propagator.propagate(&mut self.wave)
  }

  pub fn wave(&self) -> &Wave {
    &self.wave
  }

  fn output(&self) -> Grid2d<usize> {
    let mut data = vec![0; self.wave.len()];
    for (index, slot) in data.iter_mut().enumerate() {
      for pattern in 0..self.wave.nb_patterns() {
        if self.wave.get(index, pattern) {
          *slot = pattern;
        }
      }
    }
    Grid2d::from_raw(self.wave.height(), self.wave.width(), data)
  }
}
