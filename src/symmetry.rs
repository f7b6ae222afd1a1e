//! The dihedral symmetry classes a tile can declare, and the orientation
//! algebra used to close neighbor rules under the full group of 8 operations.
//!
//! Orientations of a tile are numbered 0..orbit: anticlockwise rotations
//! first, then (for the `P` class) the reflections of each rotation.

use strum_macros::{Display, EnumIter, EnumString};

#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Display, EnumIter, EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Symmetry {
  X,
  T,
  I,
  L,
  #[strum(serialize = "\\")]
  Backslash,
  P,
}

impl Symmetry {
  /// How many distinct images the 8 dihedral operations produce.
  pub fn orbit_len(&self) -> usize {
    match self {
      Self::X => 1,
      Self::I | Self::Backslash => 2,
      Self::T | Self::L => 4,
      Self::P => 8,
    }
  }

  /// For each orientation, the orientation reached by a 90 degree rotation.
  fn rotation_map(&self) -> Vec<usize> {
    match self {
      Self::X => vec![0],
      Self::I | Self::Backslash => vec![1, 0],
      Self::T | Self::L => vec![1, 2, 3, 0],
      Self::P => vec![1, 2, 3, 0, 5, 6, 7, 4],
    }
  }

  /// For each orientation, the orientation reached by the vertical-axis mirror.
  fn reflection_map(&self) -> Vec<usize> {
    match self {
      Self::X => vec![0],
      Self::I => vec![0, 1],
      Self::Backslash => vec![1, 0],
      Self::T => vec![0, 3, 2, 1],
      Self::L => vec![3, 2, 1, 0],
      Self::P => vec![4, 7, 6, 5, 0, 3, 2, 1],
    }
  }

  /// The composition table: `action_map()[g][o]` is the orientation an
  /// orientation-`o` image lands on when the whole scene undergoes group
  /// element `g` (the identity and three rotations, then the reflection
  /// followed by its three rotations).
  pub fn action_map(&self) -> [Vec<usize>; 8] {
    let rotation = self.rotation_map();
    let reflection = self.reflection_map();
    let orbit = rotation.len();
    let mut actions: [Vec<usize>; 8] = std::array::from_fn(|_| vec![0; orbit]);
    for i in 0..orbit {
      actions[0][i] = i;
      actions[1][i] = rotation[actions[0][i]];
      actions[2][i] = rotation[actions[1][i]];
      actions[3][i] = rotation[actions[2][i]];
      actions[4][i] = reflection[actions[0][i]];
      actions[5][i] = rotation[actions[4][i]];
      actions[6][i] = rotation[actions[5][i]];
      actions[7][i] = rotation[actions[6][i]];
    }
    actions
  }
}

#[cfg(test)]
mod tests {
  use super::Symmetry;
  use std::str::FromStr;
  use strum::IntoEnumIterator;

  #[test]
  fn orbit_lengths() {
    assert_eq!(Symmetry::X.orbit_len(), 1);
    assert_eq!(Symmetry::I.orbit_len(), 2);
    assert_eq!(Symmetry::Backslash.orbit_len(), 2);
    assert_eq!(Symmetry::T.orbit_len(), 4);
    assert_eq!(Symmetry::L.orbit_len(), 4);
    assert_eq!(Symmetry::P.orbit_len(), 8);
  }

  #[test]
  fn parses_every_name() {
    assert_eq!(Symmetry::from_str("X").unwrap(), Symmetry::X);
    assert_eq!(Symmetry::from_str("\\").unwrap(), Symmetry::Backslash);
    assert_eq!(Symmetry::from_str("L").unwrap(), Symmetry::L);
    assert!(Symmetry::from_str("Q").is_err());
  }

  #[test]
  fn action_rows_are_permutations_of_the_orbit() {
    for symmetry in Symmetry::iter() {
      let orbit = symmetry.orbit_len();
      for row in symmetry.action_map() {
        let mut seen = vec![false; orbit];
        for orientation in row {
          assert!(orientation < orbit);
          seen[orientation] = true;
        }
        assert!(seen.into_iter().all(|s| s));
      }
    }
  }

  #[test]
  fn identity_action_is_first() {
    for symmetry in Symmetry::iter() {
      let actions = symmetry.action_map();
      for i in 0..symmetry.orbit_len() {
        assert_eq!(actions[0][i], i);
      }
    }
  }

  #[test]
  fn reflected_actions_continue_the_rotation_series() {
    let actions = Symmetry::T.action_map();
    assert_eq!(actions[4], vec![0, 3, 2, 1]);
    assert_eq!(actions[5], vec![1, 0, 3, 2]);
    assert_eq!(actions[6], vec![2, 1, 0, 3]);
    assert_eq!(actions[7], vec![3, 2, 1, 0]);

    let actions = Symmetry::P.action_map();
    assert_eq!(actions[5], vec![5, 4, 7, 6, 1, 0, 3, 2]);
    assert_eq!(actions[6], vec![6, 5, 4, 7, 2, 1, 0, 3]);
    assert_eq!(actions[7], vec![7, 6, 5, 4, 3, 2, 1, 0]);
  }

  #[test]
  fn four_rotations_compose_to_identity() {
    for symmetry in Symmetry::iter() {
      let actions = symmetry.action_map();
      for i in 0..symmetry.orbit_len() {
        let mut orientation = i;
        for _ in 0..4 {
          orientation = actions[1][orientation];
        }
        assert_eq!(orientation, i);
      }
    }
  }
}
