//! Polyomino block shapes and the quarter-turn rotations applied to them.
//!
//! Shapes are stored as offsets relative to the block anchor and are kept in
//! normalized form: the smallest `dx` and the smallest `dy` are both zero.
//! Every rotation renormalizes, which makes four quarter turns an exact
//! identity and lets callers undo a rejected rotation by turning three more
//! times instead of computing an inverse.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CellCoord;

/// Position of a single unit square relative to the anchor of its shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Offset {
    dx: i32,
    dy: i32,
}

impl Offset {
    /// Creates a new offset.
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Horizontal displacement from the anchor.
    #[must_use]
    pub const fn dx(&self) -> i32 {
        self.dx
    }

    /// Vertical displacement from the anchor.
    #[must_use]
    pub const fn dy(&self) -> i32 {
        self.dy
    }
}

/// Orientation layered on top of a block's base shape.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Rotation {
    /// Base orientation.
    #[default]
    Deg0,
    /// One clockwise quarter turn.
    Deg90,
    /// Half turn.
    Deg180,
    /// Three clockwise quarter turns.
    Deg270,
}

impl Rotation {
    /// Every orientation in quarter-turn order.
    pub const ALL: [Rotation; 4] = [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270];

    /// Builds the orientation reached after the given number of quarter turns.
    #[must_use]
    pub const fn from_quarter_turns(turns: u32) -> Self {
        match turns % 4 {
            0 => Self::Deg0,
            1 => Self::Deg90,
            2 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    /// Number of clockwise quarter turns represented by the orientation.
    #[must_use]
    pub const fn quarter_turns(self) -> u32 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }

    /// Angle of the orientation in degrees.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Orientation reached after one more clockwise quarter turn.
    #[must_use]
    pub const fn quarter_turn(self) -> Self {
        Self::from_quarter_turns(self.quarter_turns() + 1)
    }
}

/// Reasons an offset list cannot form a block shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum ShapeError {
    /// The shape contains no cells.
    #[error("a block shape needs at least one cell")]
    Empty,
    /// The same offset was listed more than once.
    #[error("offset ({dx}, {dy}) appears more than once")]
    DuplicateOffset {
        /// Horizontal component of the repeated offset.
        dx: i32,
        /// Vertical component of the repeated offset.
        dy: i32,
    },
}

/// Immutable, normalized set of unit squares forming a block.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PolyominoShape {
    offsets: Vec<Offset>,
}

impl PolyominoShape {
    /// Creates a shape from raw `(dx, dy)` pairs, translating it into normalized form.
    ///
    /// The order of the offsets is preserved.
    pub fn new<I>(offsets: I) -> Result<Self, ShapeError>
    where
        I: IntoIterator<Item = (i32, i32)>,
    {
        let offsets: Vec<Offset> = offsets
            .into_iter()
            .map(|(dx, dy)| Offset::new(dx, dy))
            .collect();
        if offsets.is_empty() {
            return Err(ShapeError::Empty);
        }

        let mut seen = BTreeSet::new();
        for offset in &offsets {
            if !seen.insert(*offset) {
                return Err(ShapeError::DuplicateOffset {
                    dx: offset.dx(),
                    dy: offset.dy(),
                });
            }
        }

        Ok(Self::normalized(offsets))
    }

    fn from_table(table: &[(i32, i32)]) -> Self {
        Self::normalized(
            table
                .iter()
                .map(|&(dx, dy)| Offset::new(dx, dy))
                .collect(),
        )
    }

    fn normalized(mut offsets: Vec<Offset>) -> Self {
        let min_dx = offsets.iter().map(Offset::dx).min().unwrap_or(0);
        let min_dy = offsets.iter().map(Offset::dy).min().unwrap_or(0);
        for offset in &mut offsets {
            *offset = Offset::new(offset.dx - min_dx, offset.dy - min_dy);
        }
        Self { offsets }
    }

    fn mapped<F>(&self, transform: F) -> Self
    where
        F: Fn(Offset) -> Offset,
    {
        Self::normalized(self.offsets.iter().copied().map(transform).collect())
    }

    /// Offsets composing the shape, in their original order.
    #[must_use]
    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    /// Number of unit squares in the shape.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.offsets.len()
    }

    /// Width and height of the shape's bounding box.
    #[must_use]
    pub fn extent(&self) -> (u32, u32) {
        let width = self.offsets.iter().map(Offset::dx).max().unwrap_or(0);
        let height = self.offsets.iter().map(Offset::dy).max().unwrap_or(0);
        (width.unsigned_abs() + 1, height.unsigned_abs() + 1)
    }

    /// Rotates a quarter turn clockwise: `(x, y) -> (y, -x)`.
    #[must_use]
    pub fn rotate90(&self) -> Self {
        self.mapped(|offset| Offset::new(offset.dy, -offset.dx))
    }

    /// Rotates a half turn: `(x, y) -> (-x, -y)`.
    #[must_use]
    pub fn rotate180(&self) -> Self {
        self.mapped(|offset| Offset::new(-offset.dx, -offset.dy))
    }

    /// Rotates three quarter turns clockwise: `(x, y) -> (-y, x)`.
    #[must_use]
    pub fn rotate270(&self) -> Self {
        self.mapped(|offset| Offset::new(-offset.dy, offset.dx))
    }

    /// Returns the shape in the requested orientation.
    #[must_use]
    pub fn rotated(&self, rotation: Rotation) -> Self {
        match rotation {
            Rotation::Deg0 => self.clone(),
            Rotation::Deg90 => self.rotate90(),
            Rotation::Deg180 => self.rotate180(),
            Rotation::Deg270 => self.rotate270(),
        }
    }

    /// Absolute cells covered when the shape is anchored at `anchor` in `rotation`.
    ///
    /// Returns `None` when any cell would leave the coordinate range, so a
    /// footprint always holds exactly one cell per offset.
    #[must_use]
    pub fn footprint(&self, anchor: CellCoord, rotation: Rotation) -> Option<Vec<CellCoord>> {
        self.rotated(rotation)
            .offsets
            .iter()
            .map(|offset| anchor.offset(offset.dx, offset.dy))
            .collect()
    }

    /// Mean offset of the shape, truncated toward zero.
    ///
    /// Only used to anchor visuals. Asymmetric shapes do not get an exact
    /// centre and collision logic never consults this value.
    #[must_use]
    pub fn centroid(&self) -> Offset {
        let count = i64::try_from(self.offsets.len()).unwrap_or(i64::MAX).max(1);
        let sum_x: i64 = self.offsets.iter().map(|o| i64::from(o.dx)).sum();
        let sum_y: i64 = self.offsets.iter().map(|o| i64::from(o.dy)).sum();
        let dx = i32::try_from(sum_x / count).unwrap_or(0);
        let dy = i32::try_from(sum_y / count).unwrap_or(0);
        Offset::new(dx, dy)
    }
}

/// Named shapes available to the block factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShapeKind {
    /// Straight tetromino.
    I,
    /// Square tetromino.
    O,
    /// T tetromino.
    T,
    /// L tetromino.
    L,
    /// J tetromino.
    J,
    /// S tetromino.
    S,
    /// Z tetromino.
    Z,
    /// F pentomino.
    PentominoF,
    /// P pentomino.
    PentominoP,
    /// Single cell item block.
    Single,
    /// Two cells in a row.
    Line2,
    /// Two diagonally touching cells.
    Diagonal2,
    /// Three cells in a row.
    Line3,
    /// Three cells bent into a corner.
    Corner3,
}

impl ShapeKind {
    /// Every catalogued shape.
    pub const ALL: [ShapeKind; 14] = [
        Self::I,
        Self::O,
        Self::T,
        Self::L,
        Self::J,
        Self::S,
        Self::Z,
        Self::PentominoF,
        Self::PentominoP,
        Self::Single,
        Self::Line2,
        Self::Diagonal2,
        Self::Line3,
        Self::Corner3,
    ];

    /// Builds the shape in its base orientation.
    #[must_use]
    pub fn shape(self) -> PolyominoShape {
        PolyominoShape::from_table(self.table())
    }

    /// Short display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::I => "I",
            Self::O => "O",
            Self::T => "T",
            Self::L => "L",
            Self::J => "J",
            Self::S => "S",
            Self::Z => "Z",
            Self::PentominoF => "F",
            Self::PentominoP => "P",
            Self::Single => "single",
            Self::Line2 => "line2",
            Self::Diagonal2 => "diagonal2",
            Self::Line3 => "line3",
            Self::Corner3 => "corner3",
        }
    }

    const fn table(self) -> &'static [(i32, i32)] {
        match self {
            Self::I => &[(0, 0), (1, 0), (2, 0), (3, 0)],
            Self::O => &[(0, 0), (1, 0), (0, 1), (1, 1)],
            Self::T => &[(1, 0), (0, 1), (1, 1), (2, 1)],
            Self::L => &[(0, 0), (0, 1), (0, 2), (1, 2)],
            Self::J => &[(1, 0), (1, 1), (1, 2), (0, 2)],
            Self::S => &[(1, 0), (2, 0), (0, 1), (1, 1)],
            Self::Z => &[(0, 0), (1, 0), (1, 1), (2, 1)],
            Self::PentominoF => &[(1, 0), (0, 1), (1, 1), (2, 1), (1, 2)],
            Self::PentominoP => &[(0, 0), (1, 0), (0, 1), (1, 1), (0, 2)],
            Self::Single => &[(0, 0)],
            Self::Line2 => &[(0, 0), (1, 0)],
            Self::Diagonal2 => &[(0, 0), (1, 1)],
            Self::Line3 => &[(0, 0), (1, 0), (2, 0)],
            Self::Corner3 => &[(0, 0), (0, 1), (1, 0)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offsets(shape: &PolyominoShape) -> Vec<(i32, i32)> {
        shape.offsets().iter().map(|o| (o.dx(), o.dy())).collect()
    }

    #[test]
    fn construction_normalizes_offsets() {
        let shape = PolyominoShape::new([(3, -2), (4, -2), (3, -1)]).expect("valid shape");
        assert_eq!(offsets(&shape), vec![(0, 0), (1, 0), (0, 1)]);
    }

    #[test]
    fn construction_rejects_empty_and_duplicate_offsets() {
        assert_eq!(
            PolyominoShape::new(Vec::<(i32, i32)>::new()),
            Err(ShapeError::Empty)
        );
        assert_eq!(
            PolyominoShape::new([(0, 0), (1, 0), (0, 0)]),
            Err(ShapeError::DuplicateOffset { dx: 0, dy: 0 })
        );
    }

    #[test]
    fn four_quarter_turns_restore_every_catalogued_shape() {
        for kind in ShapeKind::ALL {
            for start in Rotation::ALL {
                let shape = kind.shape().rotated(start);
                let restored = shape.rotate90().rotate90().rotate90().rotate90();
                assert_eq!(restored, shape, "{} from {:?}", kind.name(), start);
            }
        }
    }

    #[test]
    fn straight_tetromino_rotates_into_a_column() {
        let shape = ShapeKind::I.shape();
        let rotated = shape.rotate90();

        // (x, y) -> (y, -x) gives (0,0) (0,-1) (0,-2) (0,-3); shifting by +3 on y.
        assert_eq!(offsets(&rotated), vec![(0, 3), (0, 2), (0, 1), (0, 0)]);
    }

    #[test]
    fn direct_rotations_match_repeated_quarter_turns() {
        for kind in ShapeKind::ALL {
            let shape = kind.shape();
            assert_eq!(shape.rotate180(), shape.rotate90().rotate90());
            assert_eq!(shape.rotate270(), shape.rotate90().rotate90().rotate90());
        }
    }

    #[test]
    fn rotation_cycles_through_all_orientations() {
        let mut rotation = Rotation::Deg0;
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(rotation.degrees());
            rotation = rotation.quarter_turn();
        }
        assert_eq!(seen, vec![0, 90, 180, 270]);
        assert_eq!(rotation, Rotation::Deg0);
    }

    #[test]
    fn footprint_translates_rotated_offsets_by_anchor() {
        let cells = ShapeKind::L
            .shape()
            .footprint(CellCoord::new(-2, 5), Rotation::Deg90)
            .expect("footprint in range");
        let expected: Vec<CellCoord> = offsets(&ShapeKind::L.shape().rotate90())
            .into_iter()
            .map(|(dx, dy)| CellCoord::new(-2 + dx, 5 + dy))
            .collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn footprint_leaving_the_coordinate_range_is_refused() {
        let straight = ShapeKind::I.shape();
        assert_eq!(straight.footprint(CellCoord::new(i32::MAX, 0), Rotation::Deg0), None);
        assert_eq!(
            straight
                .footprint(CellCoord::new(i32::MAX - 3, 0), Rotation::Deg0)
                .map(|cells| cells.len()),
            Some(4)
        );
    }

    #[test]
    fn centroid_truncates_toward_zero() {
        assert_eq!(ShapeKind::O.shape().centroid(), Offset::new(0, 0));
        assert_eq!(ShapeKind::I.shape().centroid(), Offset::new(1, 0));
        assert_eq!(ShapeKind::PentominoF.shape().centroid(), Offset::new(1, 1));
    }

    #[test]
    fn extent_reports_bounding_box() {
        assert_eq!(ShapeKind::I.shape().extent(), (4, 1));
        assert_eq!(ShapeKind::I.shape().rotate90().extent(), (1, 4));
        assert_eq!(ShapeKind::T.shape().extent(), (3, 2));
    }
}
