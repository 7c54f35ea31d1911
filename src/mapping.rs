//! Position mapping through sequences of steps
//!
//! Every step produces a [`StepMap`] describing which ranges it replaced.
//! A [`Mapping`] strings step maps together so a position valid before a run
//! of steps can be translated to one valid after them.
//!
//! # Mirrors
//!
//! Rebasing undoes local steps, applies confirmed ones, and redoes the local
//! steps again. A position that falls inside text inserted by a local step is
//! "deleted" by that step's undo, and would be lost if mapped naively. The
//! mapping therefore keeps a side table linking the index of each undo map to
//! the index of the matching redo map. When a position is deleted by a map
//! that has a mirror further along, it is recovered through the mirror
//! instead, landing at the same offset inside the redone content.
//!
//! # Example
//!
//! ```rust
//! use synckit_collab::mapping::{Assoc, Mappable, Mapping, StepMap};
//!
//! let mut mapping = Mapping::new();
//! // Insert 3 tokens at position 2
//! mapping.append_map(StepMap::new(2, 0, 3), None);
//!
//! assert_eq!(mapping.map(1, Assoc::After), 1);
//! assert_eq!(mapping.map(2, Assoc::Before), 2);
//! assert_eq!(mapping.map(2, Assoc::After), 5);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{Bound, RangeBounds};

const DEL_BEFORE: u8 = 1;
const DEL_AFTER: u8 = 2;
const DEL_ACROSS: u8 = 4;
const DEL_SIDE: u8 = 8;

/// Which side a position sticks to when content is inserted right at it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Assoc {
    /// Stay before content inserted at this position
    Before,
    /// Move after content inserted at this position
    After,
}

/// Token allowing a deleted position to be recovered through a mirror map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recover {
    /// Index of the replaced range the position fell into
    pub index: usize,
    /// Offset of the position from the start of that range
    pub offset: usize,
}

/// Outcome of mapping a single position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapResult {
    /// Mapped position
    pub pos: usize,
    del_info: u8,
    recover: Option<Recover>,
}

impl MapResult {
    fn new(pos: usize, del_info: u8, recover: Option<Recover>) -> Self {
        Self {
            pos,
            del_info,
            recover,
        }
    }

    /// The content on the side the position was associated with was deleted
    pub fn deleted(&self) -> bool {
        self.del_info & DEL_SIDE > 0
    }

    /// The token before the position was deleted
    pub fn deleted_before(&self) -> bool {
        self.del_info & (DEL_BEFORE | DEL_ACROSS) > 0
    }

    /// The token after the position was deleted
    pub fn deleted_after(&self) -> bool {
        self.del_info & (DEL_AFTER | DEL_ACROSS) > 0
    }

    /// The position sat strictly inside a deleted range
    pub fn deleted_across(&self) -> bool {
        self.del_info & DEL_ACROSS > 0
    }

    pub fn recover(&self) -> Option<Recover> {
        self.recover
    }
}

/// Anything positions can be mapped through
pub trait Mappable {
    fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult;

    fn map(&self, pos: usize, assoc: Assoc) -> usize {
        self.map_result(pos, assoc).pos
    }
}

/// A replaced range: `old_size` tokens at `start` became `new_size` tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacedRange {
    pub start: usize,
    pub old_size: usize,
    pub new_size: usize,
}

/// Position map of a single step
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepMap {
    ranges: Vec<ReplacedRange>,
    inverted: bool,
}

impl StepMap {
    /// Map for a step replacing `old_size` tokens at `start` with `new_size` tokens
    pub fn new(start: usize, old_size: usize, new_size: usize) -> Self {
        Self::from_ranges(vec![ReplacedRange {
            start,
            old_size,
            new_size,
        }])
    }

    /// Map from ranges sorted by start position (in pre-step coordinates)
    pub fn from_ranges(ranges: Vec<ReplacedRange>) -> Self {
        Self {
            ranges,
            inverted: false,
        }
    }

    /// Map that leaves every position untouched
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn ranges(&self) -> &[ReplacedRange] {
        &self.ranges
    }

    /// Map in the opposite direction (post-step to pre-step positions)
    pub fn invert(&self) -> Self {
        Self {
            ranges: self.ranges.clone(),
            inverted: !self.inverted,
        }
    }

    fn sizes(&self, range: &ReplacedRange) -> (usize, usize) {
        if self.inverted {
            (range.new_size, range.old_size)
        } else {
            (range.old_size, range.new_size)
        }
    }

    /// Resolve a recover token produced by this map's mirror
    ///
    /// Returns `None` if the token refers to a range this map does not have.
    pub fn recover(&self, token: Recover) -> Option<usize> {
        let range = self.ranges.get(token.index)?;
        let mut diff: isize = 0;
        if !self.inverted {
            for r in &self.ranges[..token.index] {
                diff += r.new_size as isize - r.old_size as isize;
            }
        }
        Some(offset(range.start, diff) + token.offset)
    }
}

fn offset(pos: usize, diff: isize) -> usize {
    (pos as isize + diff).max(0) as usize
}

impl Mappable for StepMap {
    fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        let mut diff: isize = 0;
        for (index, range) in self.ranges.iter().enumerate() {
            let start = if self.inverted {
                offset(range.start, -diff)
            } else {
                range.start
            };
            if start > pos {
                break;
            }
            let (old_size, new_size) = self.sizes(range);
            let end = start + old_size;
            if pos <= end {
                let side = if old_size == 0 {
                    assoc
                } else if pos == start {
                    Assoc::Before
                } else if pos == end {
                    Assoc::After
                } else {
                    assoc
                };
                let mapped = offset(start, diff)
                    + match side {
                        Assoc::Before => 0,
                        Assoc::After => new_size,
                    };
                let anchored = match assoc {
                    Assoc::Before => start,
                    Assoc::After => end,
                };
                let recover = (pos != anchored).then_some(Recover {
                    index,
                    offset: pos - start,
                });
                let mut del = if pos == start {
                    DEL_AFTER
                } else if pos == end {
                    DEL_BEFORE
                } else {
                    DEL_ACROSS
                };
                if pos != anchored {
                    del |= DEL_SIDE;
                }
                return MapResult::new(mapped, del, recover);
            }
            diff += new_size as isize - old_size as isize;
        }
        MapResult::new(offset(pos, diff), 0, None)
    }
}

/// Composed position mapping over a sequence of step maps
///
/// Mirror links live in an index-keyed side table, stored in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    maps: Vec<StepMap>,
    mirror: HashMap<usize, usize>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Add a step map, optionally mirroring an earlier map index
    pub fn append_map(&mut self, map: StepMap, mirrors: Option<usize>) {
        self.maps.push(map);
        if let Some(mirror) = mirrors {
            self.set_mirror(self.maps.len() - 1, mirror);
        }
    }

    /// Add all maps of another mapping, keeping its mirror links
    pub fn append_mapping(&mut self, other: &Mapping) {
        let start = self.maps.len();
        self.maps.extend(other.maps.iter().cloned());
        for (&from, &to) in &other.mirror {
            self.mirror.insert(start + from, start + to);
        }
    }

    /// Record that the maps at `a` and `b` undo each other
    pub fn set_mirror(&mut self, a: usize, b: usize) {
        self.mirror.insert(a, b);
        self.mirror.insert(b, a);
    }

    pub fn get_mirror(&self, index: usize) -> Option<usize> {
        self.mirror.get(&index).copied()
    }

    /// Forget the first `count` maps
    ///
    /// Later maps move down by `count`. Mirror links touching a dropped map
    /// are removed with it.
    pub fn drop_front(&mut self, count: usize) {
        let count = count.min(self.maps.len());
        if count == 0 {
            return;
        }
        self.maps.drain(..count);
        self.mirror = self
            .mirror
            .drain()
            .filter(|&(a, b)| a >= count && b >= count)
            .map(|(a, b)| (a - count, b - count))
            .collect();
    }

    /// View mapping only through `maps[range]`
    pub fn slice(&self, range: impl RangeBounds<usize>) -> MappingSlice<'_> {
        let from = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n + 1,
            Bound::Unbounded => 0,
        };
        let to = match range.end_bound() {
            Bound::Included(&n) => n + 1,
            Bound::Excluded(&n) => n,
            Bound::Unbounded => self.maps.len(),
        };
        MappingSlice {
            mapping: self,
            from: from.min(self.maps.len()),
            to: to.min(self.maps.len()),
        }
    }

    fn map_between(&self, from: usize, to: usize, pos: usize, assoc: Assoc) -> MapResult {
        let mut pos = pos;
        let mut del_info = 0;
        let mut i = from;
        while i < to {
            let result = self.maps[i].map_result(pos, assoc);
            if let Some(token) = result.recover {
                let recovered = self
                    .get_mirror(i)
                    .filter(|&corr| corr > i && corr < to)
                    .and_then(|corr| self.maps[corr].recover(token).map(|p| (corr, p)));
                if let Some((corr, recovered)) = recovered {
                    pos = recovered;
                    i = corr + 1;
                    continue;
                }
            }
            del_info |= result.del_info;
            pos = result.pos;
            i += 1;
        }
        MapResult::new(pos, del_info, None)
    }
}

impl Mappable for Mapping {
    fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        self.map_between(0, self.maps.len(), pos, assoc)
    }
}

/// Borrowed view over part of a [`Mapping`]
#[derive(Debug, Clone, Copy)]
pub struct MappingSlice<'a> {
    mapping: &'a Mapping,
    from: usize,
    to: usize,
}

impl MappingSlice<'_> {
    /// Owned copy of the viewed maps, keeping mirror links between them
    pub fn to_mapping(&self) -> Mapping {
        let range = self.from..self.to;
        let mirror = self
            .mapping
            .mirror
            .iter()
            .filter(|&(&a, &b)| range.contains(&a) && range.contains(&b))
            .map(|(&a, &b)| (a - self.from, b - self.from))
            .collect();
        Mapping {
            maps: self.mapping.maps[range.clone()].to_vec(),
            mirror,
        }
    }
}

impl Mappable for MappingSlice<'_> {
    fn map_result(&self, pos: usize, assoc: Assoc) -> MapResult {
        self.mapping.map_between(self.from, self.to, pos, assoc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_map() {
        let map = StepMap::new(2, 0, 3);
        assert_eq!(map.map(0, Assoc::After), 0);
        assert_eq!(map.map(2, Assoc::Before), 2);
        assert_eq!(map.map(2, Assoc::After), 5);
        assert_eq!(map.map(4, Assoc::After), 7);
        assert!(!map.map_result(2, Assoc::After).deleted());
    }

    #[test]
    fn test_deletion_map() {
        let map = StepMap::new(2, 4, 0);

        let inside = map.map_result(4, Assoc::After);
        assert_eq!(inside.pos, 2);
        assert!(inside.deleted());
        assert!(inside.deleted_across());
        assert!(inside.recover().is_some());

        let at_start = map.map_result(2, Assoc::After);
        assert_eq!(at_start.pos, 2);
        assert!(at_start.deleted());
        assert!(!at_start.deleted_across());
        assert!(at_start.deleted_after());

        let at_start_before = map.map_result(2, Assoc::Before);
        assert!(!at_start_before.deleted());

        let at_end = map.map_result(6, Assoc::Before);
        assert_eq!(at_end.pos, 2);
        assert!(at_end.deleted_before());
        assert!(at_end.deleted());

        assert_eq!(map.map(9, Assoc::After), 5);
    }

    #[test]
    fn test_inverted_map() {
        let map = StepMap::new(2, 0, 3).invert();
        // Inserted tokens collapse back to the insertion point
        assert_eq!(map.map(3, Assoc::After), 2);
        assert!(map.map_result(3, Assoc::After).deleted_across());
        assert_eq!(map.map(5, Assoc::After), 2);
        assert_eq!(map.map(7, Assoc::After), 4);
    }

    #[test]
    fn test_multiple_ranges() {
        let map = StepMap::from_ranges(vec![
            ReplacedRange {
                start: 1,
                old_size: 0,
                new_size: 2,
            },
            ReplacedRange {
                start: 5,
                old_size: 2,
                new_size: 0,
            },
        ]);
        assert_eq!(map.map(3, Assoc::After), 5);
        assert_eq!(map.map(8, Assoc::After), 8);
        assert_eq!(map.map(6, Assoc::After), 7);
    }

    #[test]
    fn test_mapping_composition() {
        let mut mapping = Mapping::new();
        mapping.append_map(StepMap::new(0, 0, 2), None);
        mapping.append_map(StepMap::new(4, 2, 0), None);

        assert_eq!(mapping.map(1, Assoc::After), 3);
        assert_eq!(mapping.map(5, Assoc::After), 5);
        assert_eq!(mapping.slice(1..).map(1, Assoc::After), 1);
        assert_eq!(mapping.slice(..1).map(5, Assoc::After), 7);
    }

    #[test]
    fn test_mirror_recovers_deleted_positions() {
        let mut mapping = Mapping::new();
        // Undo an insertion of 3 tokens at 2, insert 4 tokens at 0, redo the insertion
        let insertion = StepMap::new(2, 0, 3);
        mapping.append_map(insertion.invert(), None);
        mapping.append_map(StepMap::new(0, 0, 4), None);
        mapping.append_map(StepMap::new(6, 0, 3), Some(0));

        // Without the mirror, position 3 would collapse to the insertion point
        assert_eq!(mapping.map(3, Assoc::After), 7);
        assert_eq!(mapping.map(4, Assoc::After), 8);
        assert!(!mapping.map_result(3, Assoc::After).deleted());

        // Slicing past the mirror loses the link
        assert_eq!(mapping.slice(..2).map(3, Assoc::After), 6);
    }

    #[test]
    fn test_append_mapping_offsets_mirrors() {
        let mut inner = Mapping::new();
        inner.append_map(StepMap::new(1, 0, 1).invert(), None);
        inner.append_map(StepMap::new(1, 0, 1), Some(0));

        let mut outer = Mapping::new();
        outer.append_map(StepMap::new(0, 0, 5), None);
        outer.append_mapping(&inner);

        assert_eq!(outer.len(), 3);
        assert_eq!(outer.get_mirror(1), Some(2));
        assert_eq!(outer.get_mirror(2), Some(1));
        assert_eq!(outer.get_mirror(0), None);
    }

    #[test]
    fn test_drop_front_shifts_mirrors() {
        let mut mapping = Mapping::new();
        mapping.append_map(StepMap::new(0, 0, 1), None);
        mapping.append_map(StepMap::new(0, 0, 1).invert(), Some(0));
        mapping.append_map(StepMap::new(2, 0, 3).invert(), None);
        mapping.append_map(StepMap::new(0, 0, 4), None);
        mapping.append_map(StepMap::new(6, 0, 3), Some(2));

        mapping.drop_front(2);
        assert_eq!(mapping.len(), 3);
        // The link between the dropped maps is gone, the later one moved down
        assert_eq!(mapping.get_mirror(0), Some(2));
        assert_eq!(mapping.get_mirror(2), Some(0));
        assert_eq!(mapping.get_mirror(1), None);
        assert_eq!(mapping.map(3, Assoc::After), 7);

        mapping.drop_front(10);
        assert!(mapping.is_empty());
        assert_eq!(mapping.get_mirror(0), None);
    }

    #[test]
    fn test_owned_slice_keeps_inner_mirrors() {
        let mut mapping = Mapping::new();
        mapping.append_map(StepMap::new(0, 0, 5), None);
        mapping.append_map(StepMap::new(2, 0, 3).invert(), None);
        mapping.append_map(StepMap::new(0, 0, 4), None);
        mapping.append_map(StepMap::new(6, 0, 3), Some(1));

        let owned = mapping.slice(1..).to_mapping();
        assert_eq!(owned.len(), 3);
        assert_eq!(owned.get_mirror(0), Some(2));
        for pos in 0..6 {
            assert_eq!(
                owned.map(pos, Assoc::After),
                mapping.slice(1..).map(pos, Assoc::After)
            );
        }

        // A link reaching outside the slice is not carried over
        let head = mapping.slice(..3).to_mapping();
        assert_eq!(head.get_mirror(1), None);
    }

    #[test]
    fn test_recover_out_of_range_token() {
        let map = StepMap::empty();
        assert_eq!(map.recover(Recover { index: 0, offset: 1 }), None);
    }
}
