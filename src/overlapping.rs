use crate::{
  direction::Direction,
  err::Error,
  grid::Grid2d,
  propagator::PropagatorRules,
  solver::Solver,
};
use itertools::Itertools;
use ordermap::OrderMap;
use std::hash::Hash;
use strum::IntoEnumIterator;

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OverlappingOptions {
  pub periodic_input: bool,
  pub periodic_output: bool,
  pub out_height: usize,
  pub out_width: usize,
  /// Symmetry expansion level for extracted windows: 1, 2, 4 or 8.
  pub symmetry: usize,
  pub ground: bool,
  /// Side of the square sliding window, typically 2 or 3.
  pub pattern_size: usize,
}

impl OverlappingOptions {
  /// A non-periodic output is assembled from overlapping windows, so its wave
  /// is smaller than the pixel grid by `pattern_size - 1` on each axis.
  pub fn wave_height(&self) -> usize {
    if self.periodic_output {
      self.out_height
    } else {
      self.out_height - self.pattern_size + 1
    }
  }

  pub fn wave_width(&self) -> usize {
    if self.periodic_output {
      self.out_width
    } else {
      self.out_width - self.pattern_size + 1
    }
  }
}

/// The overlapping model: generalizes an exemplar image into N x N window
/// patterns, derives adjacency from pixelwise overlap agreement, and decodes
/// the collapsed wave back into pixels.
#[derive(Debug)]
pub struct OverlappingWfc<T> {
  options: OverlappingOptions,
  patterns: Vec<Grid2d<T>>,
  ground_pattern: Option<usize>,
  solver: Solver,
}

impl<T: Clone + Eq + Hash> OverlappingWfc<T> {
  #[profiling::function]
  pub fn new(input: Grid2d<T>, options: OverlappingOptions, seed: u32) -> Result<Self, Error> {
    if input.is_empty() {
      return Err(Error::EmptyExemplar);
    }
    assert!(
      options.periodic_output
        || (options.out_height >= options.pattern_size
          && options.out_width >= options.pattern_size),
      "output must fit at least one pattern"
    );

    let (patterns, weights) = extract_patterns(&input, &options)?;
    let rules = derive_rules(&patterns);

    let ground_pattern = options
      .ground
      .then(|| ground_pattern_id(&input, &patterns, &options))
      .transpose()?;

    let solver = Solver::new(
      options.wave_height(),
      options.wave_width(),
      options.periodic_output,
      seed,
      weights,
      rules,
    );

    let mut this = Self {
      options,
      patterns,
      ground_pattern,
      solver,
    };
    if let Some(ground) = this.ground_pattern {
      this.init_ground(ground)?;
    }
    Ok(this)
  }

  /// Forces the ground pattern across the last wave row and bans it
  /// everywhere else, then settles the consequences.
  fn init_ground(&mut self, ground: usize) -> Result<(), Error> {
    let wave_height = self.options.wave_height();
    let wave_width = self.options.wave_width();

    for x in 0..wave_width {
      for pattern in 0..self.patterns.len() {
        if pattern != ground {
          self.solver.ban(wave_height - 1, x, pattern)?;
        }
      }
    }
    for y in 0..wave_height - 1 {
      for x in 0..wave_width {
        self.solver.ban(y, x, ground)?;
      }
    }

    self.solver.propagate()
  }

  /// Runs this try to completion and decodes the result, or reports the
  /// contradiction that killed it.
  pub fn run(self) -> Result<Grid2d<T>, Error> {
    let patterns = self.patterns;
    let options = self.options;
    let output = self.solver.run()?;
    Ok(decode(&patterns, &options, &output))
  }
}

/// Slides the window over the exemplar, expands each window to the requested
/// symmetry level, and tallies occurrence counts as weights. Pattern indices
/// follow first-encounter order, which the output determinism relies on.
#[profiling::function]
fn extract_patterns<T: Clone + Eq + Hash>(
  input: &Grid2d<T>,
  options: &OverlappingOptions,
) -> Result<(Vec<Grid2d<T>>, Vec<f64>), Error> {
  let n = options.pattern_size;
  if n > input.height() || n > input.width() {
    return Err(Error::NoPatternsExtracted);
  }

  let max_y = if options.periodic_input {
    input.height()
  } else {
    input.height() - n + 1
  };
  let max_x = if options.periodic_input {
    input.width()
  } else {
    input.width() - n + 1
  };

  let mut tally: OrderMap<Grid2d<T>, f64> = OrderMap::new();
  for y in 0..max_y {
    for x in 0..max_x {
      let p0 = input.sub_grid(y, x, n, n);
      let p1 = p0.reflected();
      let p2 = p0.rotated();
      let p3 = p2.reflected();
      let p4 = p2.rotated();
      let p5 = p4.reflected();
      let p6 = p4.rotated();
      let p7 = p6.reflected();

      for variant in [p0, p1, p2, p3, p4, p5, p6, p7]
        .into_iter()
        .take(options.symmetry)
      {
        *tally.entry(variant).or_insert(0.0) += 1.0;
      }
    }
  }

  if tally.is_empty() {
    return Err(Error::NoPatternsExtracted);
  }
  Ok(tally.into_iter().unzip())
}

/// Two patterns agree in a direction when the pixels of their overlap match.
fn agrees<T: Eq>(a: &Grid2d<T>, b: &Grid2d<T>, dy: isize, dx: isize) -> bool {
  let n = a.width() as isize;
  let x_range = dx.max(0)..if dx < 0 { dx + n } else { n };
  let y_range = dy.max(0)..if dy < 0 { dy + n } else { n };

  for y in y_range {
    for x in x_range.clone() {
      if a.get(y as usize, x as usize) != b.get((y - dy) as usize, (x - dx) as usize) {
        return false;
      }
    }
  }
  true
}

fn derive_rules<T: Eq>(patterns: &[Grid2d<T>]) -> PropagatorRules {
  let mut rules = PropagatorRules::empty(patterns.len());
  for (p, q) in (0..patterns.len()).cartesian_product(0..patterns.len()) {
    for dir in Direction::iter() {
      if agrees(&patterns[p], &patterns[q], dir.dy(), dir.dx()) {
        rules[p][dir.index()].push(q);
      }
    }
  }
  rules
}

/// The ground pattern is the window under the bottom-middle of the exemplar.
fn ground_pattern_id<T: Clone + Eq + Hash>(
  input: &Grid2d<T>,
  patterns: &[Grid2d<T>],
  options: &OverlappingOptions,
) -> Result<usize, Error> {
  let n = options.pattern_size;
  let ground = input.sub_grid(input.height() - 1, input.width() / 2, n, n);
  patterns
    .iter()
    .position(|pattern| *pattern == ground)
    .ok_or(Error::NoPatternsExtracted)
}

/// Maps surviving pattern indices back to pixels. A periodic wave covers the
/// output one top-left pixel per cell; a non-periodic wave additionally
/// completes the right and bottom margins from the edge cells' interiors.
fn decode<T: Clone>(
  patterns: &[Grid2d<T>],
  options: &OverlappingOptions,
  output: &Grid2d<usize>,
) -> Grid2d<T> {
  let n = options.pattern_size;
  let wave_height = options.wave_height();
  let wave_width = options.wave_width();

  let blank = patterns[*output.get(0, 0)].get(0, 0).clone();
  let mut image = Grid2d::filled(options.out_height, options.out_width, blank);

  for y in 0..wave_height {
    for x in 0..wave_width {
      *image.get_mut(y, x) = patterns[*output.get(y, x)].get(0, 0).clone();
    }
  }
  if options.periodic_output {
    return image;
  }

  for y in 0..wave_height {
    let pattern = &patterns[*output.get(y, wave_width - 1)];
    for dx in 1..n {
      *image.get_mut(y, wave_width - 1 + dx) = pattern.get(0, dx).clone();
    }
  }
  for x in 0..wave_width {
    let pattern = &patterns[*output.get(wave_height - 1, x)];
    for dy in 1..n {
      *image.get_mut(wave_height - 1 + dy, x) = pattern.get(dy, 0).clone();
    }
  }

  let corner = &patterns[*output.get(wave_height - 1, wave_width - 1)];
  for dy in 1..n {
    for dx in 1..n {
      *image.get_mut(wave_height - 1 + dy, wave_width - 1 + dx) = corner.get(dy, dx).clone();
    }
  }

  image
}
