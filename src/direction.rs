//! The four cardinal neighbor offsets, indexed so that `opposite` is `index ^ 2`.

use strum_macros::{EnumCount, EnumIter, VariantArray};

#[derive(
  PartialEq, Eq, Hash, PartialOrd, Ord, EnumCount, EnumIter, VariantArray, Clone, Copy, Debug,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
  Right,
  Up,
  Left,
  Down,
}

impl Direction {
  pub fn index(&self) -> usize {
    *self as usize
  }

  pub fn from_index(index: usize) -> Self {
    use strum::VariantArray;
    Self::VARIANTS[index]
  }

  pub fn opposite(&self) -> Self {
    Self::from_index(self.index() ^ 2)
  }

  pub fn dx(&self) -> isize {
    match self {
      Self::Right => 1,
      Self::Left => -1,
      Self::Up | Self::Down => 0,
    }
  }

  pub fn dy(&self) -> isize {
    match self {
      Self::Down => 1,
      Self::Up => -1,
      Self::Right | Self::Left => 0,
    }
  }
}
