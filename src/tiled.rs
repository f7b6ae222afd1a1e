use crate::{
  direction::Direction,
  err::Error,
  grid::Grid2d,
  propagator::PropagatorRules,
  solver::Solver,
  symmetry::Symmetry,
};
use itertools::Itertools;
use strum::IntoEnumIterator;

/// A base tile: its distinct oriented images, symmetry class, and prior
/// weight. The image at orientation 0 is the one the caller supplied;
/// rotations come first, then (for `P`) the reflections of each rotation,
/// matching the layout the symmetry action tables assume.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tile<T> {
  pub images: Vec<Grid2d<T>>,
  pub symmetry: Symmetry,
  pub weight: f64,
}

impl<T: Clone> Tile<T> {
  pub fn new(image: Grid2d<T>, symmetry: Symmetry, weight: f64) -> Self {
    let mut images = Vec::with_capacity(symmetry.orbit_len());
    images.push(image);
    for _ in 1..4.min(symmetry.orbit_len()) {
      images.push(images.last().unwrap().rotated());
    }
    if symmetry.orbit_len() == 8 {
      images.push(images.last().unwrap().reflected());
      for _ in 5..8 {
        images.push(images.last().unwrap().rotated());
      }
    }

    Self {
      images,
      symmetry,
      weight,
    }
  }
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TilingOptions {
  pub periodic_output: bool,
}

/// The tiled model: expands base tiles into oriented patterns, closes the
/// caller's neighbor rules under the dihedral group, and blits the chosen
/// tile images back out after the solve.
#[derive(Debug)]
pub struct TilingWfc<T> {
  tiles: Vec<Tile<T>>,
  id_to_oriented: Vec<(usize, usize)>,
  solver: Solver,
  height: usize,
  width: usize,
}

impl<T: Clone> TilingWfc<T> {
  #[profiling::function]
  pub fn new(
    tiles: Vec<Tile<T>>,
    neighbors: &[(usize, usize, usize, usize)],
    height: usize,
    width: usize,
    options: TilingOptions,
    seed: u32,
  ) -> Self {
    let (id_to_oriented, oriented_ids) = oriented_tile_ids(&tiles);
    let rules = derive_rules(&tiles, neighbors, &oriented_ids);
    let weights = tiles
      .iter()
      .flat_map(|tile| {
        let share = tile.weight / tile.images.len() as f64;
        std::iter::repeat(share).take(tile.images.len())
      })
      .collect();

    let solver = Solver::new(height, width, options.periodic_output, seed, weights, rules);

    Self {
      tiles,
      id_to_oriented,
      solver,
      height,
      width,
    }
  }

  pub fn run(self) -> Result<Grid2d<T>, Error> {
    let output = self.solver.run()?;
    Ok(decode(&self.tiles, &self.id_to_oriented, self.height, self.width, &output))
  }
}

/// Flat pattern ids for every (tile, orientation) pair, in tile order.
fn oriented_tile_ids<T>(tiles: &[Tile<T>]) -> (Vec<(usize, usize)>, Vec<Vec<usize>>) {
  let mut id_to_oriented = Vec::new();
  let mut oriented_ids = Vec::new();
  for (tile, entry) in tiles.iter().enumerate() {
    let ids = (0..entry.images.len())
      .map(|orientation| {
        id_to_oriented.push((tile, orientation));
        id_to_oriented.len() - 1
      })
      .collect();
    oriented_ids.push(ids);
  }
  (id_to_oriented, oriented_ids)
}

/// Each rule `(left, right)` is asserted for the identity and re-asserted for
/// the seven other group elements, with the contact direction rotated and
/// reflected along: rotations send `Right` to `Up`, `Left`, `Down`; the
/// reflections send it to `Left`, `Down`, `Right`, `Up`.
const RULE_DIRECTIONS: [Direction; 8] = [
  Direction::Right,
  Direction::Up,
  Direction::Left,
  Direction::Down,
  Direction::Left,
  Direction::Down,
  Direction::Right,
  Direction::Up,
];

fn derive_rules<T>(
  tiles: &[Tile<T>],
  neighbors: &[(usize, usize, usize, usize)],
  oriented_ids: &[Vec<usize>],
) -> PropagatorRules {
  let nb_patterns: usize = oriented_ids.iter().map(Vec::len).sum();
  let mut dense: Vec<[Vec<bool>; 4]> = (0..nb_patterns)
    .map(|_| std::array::from_fn(|_| vec![false; nb_patterns]))
    .collect();

  for &(left, left_orientation, right, right_orientation) in neighbors {
    let left_actions = tiles[left].symmetry.action_map();
    let right_actions = tiles[right].symmetry.action_map();

    for (action, dir) in RULE_DIRECTIONS.iter().enumerate() {
      let p = oriented_ids[left][left_actions[action][left_orientation]];
      let q = oriented_ids[right][right_actions[action][right_orientation]];
      dense[p][dir.index()][q] = true;
      dense[q][dir.opposite().index()][p] = true;
    }
  }

  let mut rules = PropagatorRules::empty(nb_patterns);
  for (p, q) in (0..nb_patterns).cartesian_product(0..nb_patterns) {
    for dir in Direction::iter() {
      if dense[p][dir.index()][q] {
        rules[p][dir.index()].push(q);
      }
    }
  }
  rules
}

fn decode<T: Clone>(
  tiles: &[Tile<T>],
  id_to_oriented: &[(usize, usize)],
  height: usize,
  width: usize,
  output: &Grid2d<usize>,
) -> Grid2d<T> {
  let size = tiles[0].images[0].height();
  let (first_tile, first_orientation) = id_to_oriented[*output.get(0, 0)];
  let blank = tiles[first_tile].images[first_orientation].get(0, 0).clone();
  let mut image = Grid2d::filled(height * size, width * size, blank);

  for y in 0..height {
    for x in 0..width {
      let (tile, orientation) = id_to_oriented[*output.get(y, x)];
      let source = &tiles[tile].images[orientation];
      for dy in 0..size {
        for dx in 0..size {
          *image.get_mut(y * size + dy, x * size + dx) = source.get(dy, dx).clone();
        }
      }
    }
  }
  image
}
