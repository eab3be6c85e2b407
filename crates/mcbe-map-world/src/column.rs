//! Per-column block stacks for one chunk.
//!
//! Each (x, z) keeps an opaque floor and the transparent blocks above it.
//! Writes must arrive in ascending Y per column; an opaque block replaces
//! the whole stack and raises the floor.

use std::sync::Arc;

use crate::block::{Block, TransparentBlocks};

/// Blocks visible from above at one (x, z).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Column {
    floor: Option<Arc<Block>>,
    layers: Vec<Arc<Block>>,
    base_y: Option<i32>,
}

impl Column {
    /// The opaque bottom block, if one has been seen.
    pub fn floor(&self) -> Option<&Arc<Block>> {
        self.floor.as_ref()
    }

    /// Transparent blocks above the floor, bottom to top.
    pub fn layers(&self) -> &[Arc<Block>] {
        &self.layers
    }

    /// Absolute Y of the floor. `None` while the column has no floor.
    pub fn base_y(&self) -> Option<i32> {
        self.base_y
    }

    /// Floor (if any) followed by the layers, bottom to top.
    pub fn stack(&self) -> impl Iterator<Item = &Arc<Block>> {
        self.floor.iter().chain(self.layers.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.floor.is_none() && self.layers.is_empty()
    }
}

/// The 16×16 columns of one chunk.
#[derive(Debug, Clone)]
pub struct ChunkColumns<'t> {
    transparent: &'t TransparentBlocks,
    columns: Vec<Option<Column>>,
}

impl<'t> ChunkColumns<'t> {
    pub fn new(transparent: &'t TransparentBlocks) -> Self {
        Self {
            transparent,
            columns: vec![None; 256],
        }
    }

    /// Place `block` at absolute height `y` in column (x, z).
    ///
    /// A write below the current floor is ignored.
    pub fn insert(&mut self, x: usize, z: usize, y: i32, block: Arc<Block>) {
        let transparent = self.transparent.is_transparent(&block);
        let slot = &mut self.columns[column_index(x, z)];
        let Some(column) = slot.as_mut() else {
            *slot = Some(if transparent {
                Column {
                    floor: None,
                    layers: vec![block],
                    base_y: None,
                }
            } else {
                Column {
                    floor: Some(block),
                    layers: Vec::new(),
                    base_y: Some(y),
                }
            });
            return;
        };

        if column.base_y.is_some_and(|base| y < base) {
            return;
        }
        if transparent {
            column.layers.push(block);
        } else {
            column.floor = Some(block);
            column.layers.clear();
            column.base_y = Some(y);
        }
    }

    pub fn get(&self, x: usize, z: usize) -> Option<&Column> {
        self.columns[column_index(x, z)].as_ref()
    }

    /// Occupied columns, x outer and z inner.
    pub fn iter(&self) -> Columns<'_> {
        Columns {
            inner: self.columns.iter().enumerate(),
        }
    }

    /// Number of occupied columns.
    pub fn len(&self) -> usize {
        self.columns.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(Option::is_none)
    }
}

impl PartialEq for ChunkColumns<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns
    }
}

/// Iterator over the occupied columns of a [`ChunkColumns`].
pub struct Columns<'a> {
    inner: std::iter::Enumerate<std::slice::Iter<'a, Option<Column>>>,
}

impl<'a> Iterator for Columns<'a> {
    type Item = (usize, usize, &'a Column);

    fn next(&mut self) -> Option<Self::Item> {
        for (i, slot) in self.inner.by_ref() {
            if let Some(column) = slot {
                return Some((i >> 4, i & 0xF, column));
            }
        }
        None
    }
}

fn column_index(x: usize, z: usize) -> usize {
    ((x & 0xF) << 4) | (z & 0xF)
}
