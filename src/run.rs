//! The batch entry points: argument records mirroring the public interface,
//! the retry policy around the per-try engine, and the sample type dispatch.

use crate::{
  err::Error,
  grid::Grid2d,
  overlapping::{OverlappingOptions, OverlappingWfc},
  symmetry::Symmetry,
  tiled::{Tile, TilingOptions, TilingWfc},
  util,
};
use bimap::BiHashMap;
use derive_new::new;
use std::str::FromStr;
use tracing::{info, warn};

/// An opaque pixel value. Equality and hashing are all the engine ever needs.
#[derive(new, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

/// A base tile described with raw pixels, as handed over by a caller.
#[derive(new, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileSpec {
  pub name: String,
  pub pixels: Vec<Color>,
  /// Tiles are square; `pixels` holds `size * size` values.
  pub size: usize,
  /// Symmetry class name: one of X, T, I, L, \ or P.
  pub symmetry: String,
  pub weight: f64,
}

impl TileSpec {
  fn to_tile(&self) -> Result<Tile<Color>, Error> {
    let symmetry = Symmetry::from_str(&self.symmetry)
      .map_err(|_| Error::InvalidSymmetryName(self.symmetry.clone()))?;
    let image = Grid2d::from_raw(self.size, self.size, self.pixels.clone());
    Ok(Tile::new(image, symmetry, self.weight))
  }
}

/// An adjacency declaration: `left` at `left_orientation` may sit to the left
/// of `right` at `right_orientation`.
#[derive(new, Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Neighbor {
  pub left: String,
  pub left_orientation: usize,
  pub right: String,
  pub right_orientation: usize,
}

#[derive(Debug, Clone)]
pub struct OverlappingArgs {
  pub seed: u32,
  pub out_width: usize,
  pub out_height: usize,
  pub periodic_output: bool,
  pub periodic_input: bool,
  pub pattern_size: usize,
  pub ground: bool,
  pub symmetry: usize,
  pub nb_samples: usize,
  pub nb_tries: usize,
  pub input: Vec<Color>,
  pub input_width: usize,
  pub input_height: usize,
  pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct TiledArgs {
  pub seed: u32,
  /// Output size in tiles; pixels are this times the tile side.
  pub out_width: usize,
  pub out_height: usize,
  pub periodic_output: bool,
  pub nb_samples: usize,
  pub nb_tries: usize,
  pub tiles: Vec<TileSpec>,
  pub neighbors: Vec<Neighbor>,
  pub verbose: bool,
}

/// The flat argument record of the unified entry; `sample_type` selects
/// which half of it is read.
#[derive(Debug, Clone)]
pub struct RunArgs {
  pub seed: u32,
  pub width: usize,
  pub height: usize,
  /// 0 = tiled, 1 = overlapping.
  pub sample_type: i32,
  pub periodic_output: bool,
  pub pattern_size: usize,
  pub periodic_input: bool,
  pub ground: bool,
  pub nb_samples: usize,
  pub symmetry: usize,
  pub input: Vec<Color>,
  pub input_width: usize,
  pub input_height: usize,
  pub verbose: bool,
  pub nb_tries: usize,
  pub tiles: Vec<TileSpec>,
  pub neighbors: Vec<Neighbor>,
}

/// Dispatches on `sample_type` and concatenates the successful samples.
pub fn run_wfc(args: RunArgs) -> Result<Vec<Color>, Error> {
  match args.sample_type {
    0 => run_tiled(TiledArgs {
      seed: args.seed,
      out_width: args.width,
      out_height: args.height,
      periodic_output: args.periodic_output,
      nb_samples: args.nb_samples,
      nb_tries: args.nb_tries,
      tiles: args.tiles,
      neighbors: args.neighbors,
      verbose: args.verbose,
    }),
    1 => run_overlapping(OverlappingArgs {
      seed: args.seed,
      out_width: args.width,
      out_height: args.height,
      periodic_output: args.periodic_output,
      periodic_input: args.periodic_input,
      pattern_size: args.pattern_size,
      ground: args.ground,
      symmetry: args.symmetry,
      nb_samples: args.nb_samples,
      nb_tries: args.nb_tries,
      input: args.input,
      input_width: args.input_width,
      input_height: args.input_height,
      verbose: args.verbose,
    }),
    other => Err(Error::UnknownSampleType(other)),
  }
}

/// Runs the overlapping model for `nb_samples` outputs, retrying each sample
/// up to `nb_tries` times on contradiction with an incremented seed.
#[profiling::function]
pub fn run_overlapping(args: OverlappingArgs) -> Result<Vec<Color>, Error> {
  if args.verbose {
    info!(samples = args.nb_samples, "overlapping generation started");
  }

  if args.input.is_empty() {
    return Err(Error::EmptyExemplar);
  }
  let input = Grid2d::from_raw(args.input_height, args.input_width, args.input.clone());

  let options = OverlappingOptions {
    periodic_input: args.periodic_input,
    periodic_output: args.periodic_output,
    out_height: args.out_height,
    out_width: args.out_width,
    symmetry: args.symmetry,
    ground: args.ground,
    pattern_size: args.pattern_size,
  };

  let mut results = Vec::new();
  let mut seed = args.seed;
  for sample in 0..args.nb_samples {
    let mut finished = false;
    for test in 0..args.nb_tries {
      if test > 0 {
        seed = util::increment_seed(seed);
      }

      let attempt =
        OverlappingWfc::new(input.clone(), options, seed).and_then(|wfc| wfc.run());
      match attempt {
        Ok(output) => {
          if args.verbose {
            info!(sample, seed, "sample finished");
          }
          results.extend(output.into_data());
          finished = true;
          break;
        }
        Err(Error::Contradiction) => {
          if args.verbose {
            info!(sample, seed, "try hit a contradiction");
          }
        }
        Err(fatal) => return Err(fatal),
      }
    }

    if !finished {
      warn!(sample, "failed to generate a sample, skipping it");
    }
  }

  Ok(results)
}

/// Runs the tiled model for `nb_samples` outputs. Neighbor entries naming
/// unknown tiles are dropped; a bad symmetry name is fatal.
#[profiling::function]
pub fn run_tiled(args: TiledArgs) -> Result<Vec<Color>, Error> {
  if args.verbose {
    info!(samples = args.nb_samples, "tiled generation started");
  }

  let mut legend: BiHashMap<String, usize> = BiHashMap::new();
  let mut tiles = Vec::with_capacity(args.tiles.len());
  for (id, spec) in args.tiles.iter().enumerate() {
    legend.insert(spec.name.clone(), id);
    tiles.push(spec.to_tile()?);
  }

  let mut neighbor_ids = Vec::with_capacity(args.neighbors.len());
  for neighbor in &args.neighbors {
    let left = legend.get_by_left(&neighbor.left);
    let right = legend.get_by_left(&neighbor.right);
    let (Some(&left), Some(&right)) = (left, right) else {
      warn!(
        left = %neighbor.left,
        right = %neighbor.right,
        "dropping neighbor rule referencing an unknown tile"
      );
      continue;
    };
    neighbor_ids.push((
      left,
      neighbor.left_orientation,
      right,
      neighbor.right_orientation,
    ));
  }

  let options = TilingOptions {
    periodic_output: args.periodic_output,
  };

  let mut results = Vec::new();
  let mut seed = args.seed;
  for sample in 0..args.nb_samples {
    let mut finished = false;
    for test in 0..args.nb_tries {
      if test > 0 {
        seed = util::increment_seed(seed);
      }

      let wfc = TilingWfc::new(
        tiles.clone(),
        &neighbor_ids,
        args.out_height,
        args.out_width,
        options,
        seed,
      );
      match wfc.run() {
        Ok(output) => {
          if args.verbose {
            info!(sample, seed, "sample finished");
          }
          results.extend(output.into_data());
          finished = true;
          break;
        }
        Err(Error::Contradiction) => {
          if args.verbose {
            info!(sample, seed, "try hit a contradiction");
          }
        }
        Err(fatal) => return Err(fatal),
      }
    }

    if !finished {
      warn!(sample, "failed to generate a sample, skipping it");
    }
  }

  Ok(results)
}
