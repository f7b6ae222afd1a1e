use crate::{direction::Direction, err::Error, util, wave::Wave};
use derive_more::derive::{Deref, DerefMut, From};
use strum::IntoEnumIterator;

/// For each pattern and direction, the ascending list of patterns permitted
/// at that offset. Construction (either front-end) must leave the table
/// symmetric: `q in rules[p][d]` exactly when `p in rules[q][opposite(d)]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut, From)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropagatorRules(Vec<[Vec<usize>; 4]>);

impl PropagatorRules {
  pub fn empty(nb_patterns: usize) -> Self {
    Self(vec![Default::default(); nb_patterns])
  }

  pub fn nb_patterns(&self) -> usize {
    self.0.len()
  }

  pub fn is_symmetric(&self) -> bool {
    self.0.iter().enumerate().all(|(p, by_direction)| {
      Direction::iter().all(|dir| {
        by_direction[dir.index()]
          .iter()
          .all(|&q| self.0[q][dir.opposite().index()].contains(&p))
      })
    })
  }
}

/// Worklist driven arc consistency over the wave.
///
/// `compatible[cell][pattern][d]` counts the patterns still allowed in the
/// neighbor opposite to `d` that support `pattern` here; a pattern is removed
/// the moment any of its four counters reaches zero. Queuing a removal zeroes
/// all four counters so an entry can never be queued twice.
#[derive(Debug, Clone)]
pub struct Propagator {
  rules: PropagatorRules,
  wave_height: usize,
  wave_width: usize,
  periodic_output: bool,
  compatible: Vec<[i32; 4]>,
  worklist: Vec<(usize, usize, usize)>,
}

impl Propagator {
  pub fn new(
    wave_height: usize,
    wave_width: usize,
    periodic_output: bool,
    rules: PropagatorRules,
  ) -> Self {
    debug_assert!(rules.is_symmetric(), "propagator rules must be symmetric");

    let nb_patterns = rules.nb_patterns();
    let mut this = Self {
      rules,
      wave_height,
      wave_width,
      periodic_output,
      compatible: vec![[0_i32; 4]; wave_height * wave_width * nb_patterns],
      worklist: Vec::new(),
    };
    this.init_counters();
    this
  }

  fn init_counters(&mut self) {
    let nb_patterns = self.rules.nb_patterns();
    for cell in 0..self.wave_height * self.wave_width {
      for pattern in 0..nb_patterns {
        let slot = &mut self.compatible[cell * nb_patterns + pattern];
        for dir in Direction::iter() {
          slot[dir.index()] = self.rules[pattern][dir.opposite().index()].len() as i32;
        }
      }
    }
  }

  /// Queues the removal of `pattern` at `(y, x)`; the caller is responsible
  /// for the matching `wave.unset`.
  pub fn add_removal(&mut self, y: usize, x: usize, pattern: usize) {
    let nb_patterns = self.rules.nb_patterns();
    let cell = y * self.wave_width + x;
    self.compatible[cell * nb_patterns + pattern] = [0; 4];
    self.worklist.push((y, x, pattern));
  }

  /// The neighbor of `(y, x)` toward `dir`, wrapping when the output is
  /// periodic and skipping past-the-edge cells otherwise.
  fn neighbor(&self, y: usize, x: usize, dir: Direction) -> Option<(usize, usize)> {
    let y = y as isize + dir.dy();
    let x = x as isize + dir.dx();
    if self.periodic_output {
      let y = util::wrap(y, self.wave_height as isize) as usize;
      let x = util::wrap(x, self.wave_width as isize) as usize;
      Some((y, x))
    } else if y < 0 || y >= self.wave_height as isize || x < 0 || x >= self.wave_width as isize {
      None
    } else {
      Some((y as usize, x as usize))
    }
  }

  /// Drains the worklist, transitively removing patterns that lost their last
  /// supporter. Counters and allowances only decrease, so this terminates.
  #[profiling::function]
  pub fn propagate(&mut self, wave: &mut Wave) -> Result<(), Error> {
    let nb_patterns = self.rules.nb_patterns();

    while let Some((y, x, pattern)) = self.worklist.pop() {
      for dir in Direction::iter() {
        let Some((ny, nx)) = self.neighbor(y, x, dir) else {
          continue;
        };
        let neighbor = ny * self.wave_width + nx;

        for i in 0..self.rules[pattern][dir.index()].len() {
          let q = self.rules[pattern][dir.index()][i];
          let slot = neighbor * nb_patterns + q;
          self.compatible[slot][dir.index()] -= 1;
          if self.compatible[slot][dir.index()] == 0 {
            self.add_removal(ny, nx, q);
            wave.unset(neighbor, q)?;
          }
        }
      }
    }

    Ok(())
  }

  #[cfg(test)]
  fn counter(&self, cell: usize, pattern: usize, dir: Direction) -> i32 {
    self.compatible[cell * self.rules.nb_patterns() + pattern][dir.index()]
  }
}

#[cfg(test)]
mod tests {
  use super::{Propagator, PropagatorRules};
  use crate::{direction::Direction, err::Error, wave::Wave};
  use rand::SeedableRng;
  use rand_chacha::ChaCha20Rng;
  use strum::IntoEnumIterator;

  /// Two patterns that only tolerate themselves in every direction.
  fn diagonal_rules() -> PropagatorRules {
    PropagatorRules::from(vec![
      [vec![0], vec![0], vec![0], vec![0]],
      [vec![1], vec![1], vec![1], vec![1]],
    ])
  }

  fn test_wave(height: usize, width: usize, nb_patterns: usize) -> Wave {
    let mut rng = ChaCha20Rng::seed_from_u64(99);
    Wave::new(height, width, &vec![1.0; nb_patterns], &mut rng)
  }

  #[test]
  fn symmetry_check_accepts_symmetric_tables() {
    assert!(diagonal_rules().is_symmetric());
  }

  #[test]
  fn symmetry_check_rejects_one_sided_rules() {
    let mut rules = PropagatorRules::empty(2);
    rules[0][Direction::Right.index()].push(1);
    assert!(!rules.is_symmetric());

    rules[1][Direction::Left.index()].push(0);
    assert!(rules.is_symmetric());
  }

  #[test]
  fn counters_start_from_opposite_rule_sizes() {
    let mut rules = PropagatorRules::empty(2);
    rules[0][Direction::Right.index()].push(1);
    rules[1][Direction::Left.index()].push(0);
    let propagator = Propagator::new(1, 2, false, rules);

    // pattern 0 is only supported from its right (where a 1 may sit)
    assert_eq!(propagator.counter(0, 0, Direction::Left), 1);
    assert_eq!(propagator.counter(0, 0, Direction::Right), 0);
    assert_eq!(propagator.counter(0, 1, Direction::Right), 1);
  }

  #[test]
  fn removal_propagates_across_the_row() {
    let mut wave = test_wave(1, 3, 2);
    let mut propagator = Propagator::new(1, 3, false, diagonal_rules());

    propagator.add_removal(0, 0, 1);
    wave.unset(0, 1).unwrap();
    propagator.propagate(&mut wave).unwrap();

    for cell in 0..3 {
      assert!(wave.get(cell, 0));
      assert!(!wave.get(cell, 1));
    }
  }

  #[test]
  fn wrapping_propagation_reaches_the_far_edge() {
    let mut wave = test_wave(1, 4, 2);
    let mut propagator = Propagator::new(1, 4, true, diagonal_rules());

    propagator.add_removal(0, 2, 0);
    wave.unset(2, 0).unwrap();
    propagator.propagate(&mut wave).unwrap();

    for cell in 0..4 {
      assert!(!wave.get(cell, 0));
      assert!(wave.get(cell, 1));
    }
  }

  #[test]
  fn conflicting_removals_contradict() {
    let mut wave = test_wave(1, 2, 2);
    let mut propagator = Propagator::new(1, 2, false, diagonal_rules());

    propagator.add_removal(0, 0, 0);
    wave.unset(0, 0).unwrap();
    propagator.add_removal(0, 1, 1);
    wave.unset(1, 1).unwrap();

    assert!(matches!(
      propagator.propagate(&mut wave),
      Err(Error::Contradiction)
    ));
  }

  #[test]
  fn queued_removals_zero_every_counter() {
    let mut propagator = Propagator::new(1, 2, false, diagonal_rules());
    propagator.add_removal(0, 1, 0);
    for dir in Direction::iter() {
      assert_eq!(propagator.counter(1, 0, dir), 0);
    }
  }
}
