use std::collections::BTreeSet;

use block_defence_core::{
    CellCoord, Command, Event, ExpansionError, GridBounds, PurchaseError, Winding,
};
use block_defence_system_perimeter::frontier;
use block_defence_world::{apply, interaction, query, World, WorldConfig};

fn world_with(columns: u32, rows: u32) -> World {
    World::with_config(WorldConfig {
        columns,
        rows,
        ..WorldConfig::default()
    })
}

#[test]
fn single_cell_grid_offers_its_four_edges() {
    let world = world_with(1, 1);

    let expected: BTreeSet<CellCoord> = [
        CellCoord::new(1, 0),
        CellCoord::new(-1, 0),
        CellCoord::new(0, 1),
        CellCoord::new(0, -1),
    ]
    .into_iter()
    .collect();

    assert_eq!(query::expandable_positions(&world), expected);
}

#[test]
fn expandable_positions_never_contain_cells() {
    let mut world = world_with(2, 2);
    let mut events = Vec::new();
    for cell in [(2, 0), (3, 0), (3, 1), (-1, 1), (0, 5)] {
        assert!(interaction::try_expand(
            &mut world,
            CellCoord::new(cell.0, cell.1),
            &mut events
        ));
    }

    let grid = query::grid_view(&world);
    for candidate in query::expandable_positions(&world) {
        assert!(!grid.has_cell(candidate), "{candidate} is already a cell");
        assert!(
            candidate
                .orthogonal_neighbors()
                .into_iter()
                .any(|neighbor| grid.has_cell(neighbor)),
            "{candidate} does not touch the grid",
        );
    }
}

#[test]
fn expansion_grows_bounds_and_rebuilds_ring() {
    let mut world = world_with(2, 2);
    let mut events = Vec::new();

    assert!(interaction::try_expand(
        &mut world,
        CellCoord::new(-1, 0),
        &mut events
    ));

    let bounds = query::bounds(&world).expect("bounds");
    assert_eq!(bounds.min(), CellCoord::new(-1, 0));
    assert_eq!(bounds.width(), 3);
    assert_eq!(events[0], Event::CellAdded {
        cell: CellCoord::new(-1, 0)
    });
    let Some(Event::PathRecomputed { cells }) = events.get(1) else {
        panic!("expected ring rebuild after expansion: {events:?}");
    };
    assert_eq!(cells.as_slice(), query::path(&world));
    let ring: BTreeSet<CellCoord> = cells.iter().copied().collect();
    assert_eq!(ring, frontier(&query::grid_view(&world)));
}

#[test]
fn duplicate_expansion_reports_false() {
    let mut world = world_with(2, 2);
    let mut events = Vec::new();

    assert!(!interaction::try_expand(
        &mut world,
        CellCoord::new(1, 1),
        &mut events
    ));
    assert!(events.is_empty());
    assert_eq!(query::grid_view(&world).len(), 4);
}

#[test]
fn purchases_follow_the_purchase_gate() {
    let mut world = World::with_config(WorldConfig {
        columns: 2,
        rows: 2,
        purchase_bounds: Some(GridBounds::new(
            CellCoord::new(0, 0),
            CellCoord::new(3, 3),
        )),
        ..WorldConfig::default()
    });
    let mut events = Vec::new();
    let edge = CellCoord::new(2, 0);

    assert!(!interaction::try_purchase(&mut world, edge, &mut events));
    assert_eq!(
        events.last(),
        Some(&Event::PurchaseRejected {
            cell: edge,
            reason: PurchaseError::PurchaseModeDisabled,
        })
    );

    apply(
        &mut world,
        Command::SetPurchaseMode { enabled: true },
        &mut events,
    );

    assert!(!interaction::try_purchase(
        &mut world,
        CellCoord::new(-1, 0),
        &mut events
    ));
    assert_eq!(
        events.last(),
        Some(&Event::PurchaseRejected {
            cell: CellCoord::new(-1, 0),
            reason: PurchaseError::OutOfBounds,
        })
    );

    assert!(!interaction::try_purchase(
        &mut world,
        CellCoord::new(1, 1),
        &mut events
    ));
    assert_eq!(
        events.last(),
        Some(&Event::PurchaseRejected {
            cell: CellCoord::new(1, 1),
            reason: PurchaseError::Expansion(ExpansionError::DuplicateExpansion {
                cell: CellCoord::new(1, 1),
            }),
        })
    );

    assert!(!interaction::try_purchase(
        &mut world,
        CellCoord::new(3, 3),
        &mut events
    ));
    assert_eq!(
        events.last(),
        Some(&Event::PurchaseRejected {
            cell: CellCoord::new(3, 3),
            reason: PurchaseError::NotAdjacent,
        })
    );

    assert!(interaction::try_purchase(&mut world, edge, &mut events));
    assert!(query::grid_view(&world).has_cell(edge));
}

#[test]
fn ring_tracks_winding_and_covers_frontier() {
    let mut world = world_with(3, 3);
    let mut events = Vec::new();
    for cell in [(3, 1), (4, 1), (1, 3), (1, -1)] {
        apply(
            &mut world,
            Command::ExpandGrid {
                cell: CellCoord::new(cell.0, cell.1),
            },
            &mut events,
        );
    }
    let expected = frontier(&query::grid_view(&world));

    for winding in [Winding::CounterClockwise, Winding::Clockwise] {
        apply(&mut world, Command::SetPathWinding { winding }, &mut events);
        let ring = query::path(&world);
        let unique: BTreeSet<CellCoord> = ring.iter().copied().collect();

        assert_eq!(unique.len(), ring.len(), "{winding:?} ring repeats a waypoint");
        assert_eq!(unique, expected, "{winding:?} ring misses frontier cells");
        assert_eq!(ring.first(), expected.first());
    }
}
