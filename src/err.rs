use std::fmt::Debug;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// Propagation removed the last candidate of some cell. Recoverable by
  /// retrying with a fresh seed; every other variant is fatal for the call.
  #[error("Contradiction: a cell has no remaining candidate patterns")]
  Contradiction,
  #[error("The exemplar image is empty")]
  EmptyExemplar,
  #[error("No patterns could be extracted from the exemplar")]
  NoPatternsExtracted,
  #[error("{0:?} is not a valid symmetry name")]
  InvalidSymmetryName(String),
  #[error("Unknown sample type {0}, expected 0 (tiled) or 1 (overlapping)")]
  UnknownSampleType(i32),
}

impl Error {
  pub fn is_contradiction(&self) -> bool {
    matches!(self, Self::Contradiction)
  }
}
