// tests/tip_allocation.rs
use pipette_state::{Error, ErrorKind, RackGeometry, TipLocation, TipRack, TipRackAllocator};

fn setup() -> TipRackAllocator {
    TipRackAllocator::new(RackGeometry::default()).unwrap()
}

fn well(name: &str) -> TipLocation {
    name.parse().unwrap()
}

/// Snapshot of every well's availability, top row first.
fn snapshot(rack: &TipRack) -> Vec<bool> {
    let geometry = rack.geometry();
    let mut cells = Vec::new();
    for column in 0..geometry.columns {
        for row in 0..geometry.rows {
            cells.push(rack.is_available(TipLocation::new(column, row)).unwrap());
        }
    }
    cells
}

#[test]
fn test_single_tips_come_from_the_bottom_of_the_first_column() {
    let mut allocator = setup();

    // Rows are scanned bottom-up: H1, G1, F1, ...
    assert_eq!(allocator.allocate(1).unwrap().to_string(), "H1");
    assert_eq!(allocator.allocate(1).unwrap().to_string(), "G1");
    assert_eq!(allocator.allocate(1).unwrap().to_string(), "F1");
    assert_eq!(allocator.rack().consumed(), 3);
}

#[test]
fn test_full_column_returns_top_well_and_moves_to_next_column() {
    let mut allocator = setup();

    let first = allocator.allocate(8).unwrap();
    assert_eq!(first, well("A1"), "Full column pickup targets the top well");

    let rack = allocator.rack();
    assert_eq!(rack.longest_free_run(0), Some(0));
    for column in 1..12 {
        assert_eq!(
            rack.longest_free_run(column),
            Some(8),
            "Column {} should be untouched",
            column + 1
        );
    }

    let second = allocator.allocate(8).unwrap();
    assert_eq!(second, well("A2"));
}

#[test]
fn test_block_returns_topmost_well_of_run() {
    let mut allocator = setup();

    // Consumes H1..F1, pipette goes to F1.
    assert_eq!(allocator.allocate(3).unwrap(), well("F1"));
    // Next run of 2 starts right above: E1, D1.
    assert_eq!(allocator.allocate(2).unwrap(), well("D1"));
    // Three left in column 1 (C1, B1, A1); four do not fit.
    assert_eq!(allocator.allocate(4).unwrap(), well("E2"));
    assert_eq!(allocator.allocate(3).unwrap(), well("A1"));
}

#[test]
fn test_every_block_size_fits_a_fresh_rack() {
    for n in 1..=8 {
        let mut allocator = setup();
        let location = allocator.allocate(n).unwrap();
        assert_eq!(location.column, 0);
        assert_eq!(location.row, 8 - n, "Top of a run of {n} from the bottom");
        assert_eq!(allocator.rack().consumed(), n);

        // The remainder of column 1 is too short for R - n + 1 tips.
        let next = allocator.allocate(8 - n + 1).unwrap();
        assert_eq!(next.column, 1, "Block of {} must skip column 1", 8 - n + 1);
    }
}

#[test]
fn test_allocation_changes_exactly_n_cells() {
    let mut allocator = setup();
    allocator.allocate(5).unwrap();

    let before = snapshot(allocator.rack());
    allocator.allocate(3).unwrap();
    let after = snapshot(allocator.rack());

    let flipped: Vec<usize> = before
        .iter()
        .zip(&after)
        .enumerate()
        .filter(|(_, (b, a))| b != a)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(flipped.len(), 3);
    for i in flipped {
        assert!(before[i] && !after[i], "Only free cells may become consumed");
    }
}

#[test]
fn test_scattered_tips_are_not_combined() {
    let mut rack = TipRack::new(RackGeometry::new(1, 8).unwrap()).unwrap();
    // Leave free cells at H, F, D, B only.
    for name in ["G1", "E1", "C1", "A1"] {
        assert!(rack.consume(well(name)).unwrap());
    }
    let mut allocator = TipRackAllocator::from_rack(rack);

    let err = allocator.allocate(2).unwrap_err();
    assert_eq!(err, Error::OutOfTips { requested: 2 });
    assert_eq!(err.kind(), ErrorKind::OutOfTips);
    assert_eq!(allocator.rack().available(), 4, "Failed call must not consume");

    assert_eq!(allocator.allocate(1).unwrap(), well("H1"));
}

#[test]
fn test_gap_pushes_block_above_it() {
    let mut rack = TipRack::new(RackGeometry::default()).unwrap();
    rack.consume(well("F1")).unwrap();
    let mut allocator = TipRackAllocator::from_rack(rack);

    // H1, G1 free below the gap; a block of 3 starts at E1.
    assert_eq!(allocator.allocate(3).unwrap(), well("C1"));
    assert_eq!(allocator.allocate(2).unwrap(), well("G1"));
}

#[test]
fn test_exhausted_rack_reports_out_of_tips() {
    let mut allocator = TipRackAllocator::new(RackGeometry::new(2, 4).unwrap()).unwrap();

    assert_eq!(allocator.allocate(4).unwrap(), well("A1"));
    assert_eq!(allocator.allocate(3).unwrap(), well("B2"));
    assert_eq!(
        allocator.allocate(2).unwrap_err(),
        Error::OutOfTips { requested: 2 }
    );
    assert_eq!(allocator.allocate(1).unwrap(), well("A2"));
    assert!(allocator.allocate(1).is_err());
    assert_eq!(allocator.rack().available(), 0);
}

#[test]
fn test_invalid_tip_counts_are_rejected() {
    let mut allocator = setup();

    for n in [0, 9, 96] {
        let err = allocator.allocate(n).unwrap_err();
        assert_eq!(err, Error::InvalidTipCount { requested: n, max: 8 });
        assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    }
    assert_eq!(allocator.rack().consumed(), 0);
}

#[test]
fn test_consumed_tips_are_never_returned() {
    let mut rack = TipRack::new(RackGeometry::default()).unwrap();
    assert!(rack.consume(well("B3")).unwrap());
    assert!(!rack.consume(well("B3")).unwrap(), "Second consume is a no-op");
    assert!(!rack.is_available(well("B3")).unwrap());
    assert_eq!(rack.consumed(), 1);

    assert!(matches!(
        rack.consume(well("I1")),
        Err(Error::LocationOutOfRange { .. })
    ));
    assert!(rack.is_available(well("A13")).is_err());
}

#[test]
fn test_well_names() {
    assert_eq!(well("A1"), TipLocation::new(0, 0));
    assert_eq!(well("h12"), TipLocation::new(11, 7));
    assert_eq!(TipLocation::new(4, 2).to_string(), "C5");

    for bad in ["", "1A", "A", "A0", "Ax", "?3"] {
        assert!(
            bad.parse::<TipLocation>().is_err(),
            "{bad:?} should not parse"
        );
    }
}

#[test]
fn test_well_names_past_z_round_trip() {
    assert_eq!(TipLocation::new(0, 25).to_string(), "Z1");
    assert_eq!(TipLocation::new(0, 26).to_string(), "AA1");
    assert_eq!(TipLocation::new(2, 30).to_string(), "AE3");
    assert_eq!(TipLocation::new(0, 701).to_string(), "ZZ1");
    assert_eq!(TipLocation::new(0, 702).to_string(), "AAA1");

    for row in [0, 7, 25, 26, 30, 51, 52, 701, 702] {
        let location = TipLocation::new(4, row);
        assert_eq!(
            location.to_string().parse::<TipLocation>().unwrap(),
            location,
            "Row {row} should survive a name round trip"
        );
    }
    assert_eq!(well("ae3"), TipLocation::new(2, 30));
}

#[test]
fn test_well_names_respect_width() {
    assert_eq!(format!("{:<4}|", TipLocation::new(0, 0)), "A1  |");
    assert_eq!(format!("{:>4}|", TipLocation::new(11, 7)), " H12|");
}

#[test]
fn test_invalid_geometry() {
    assert!(RackGeometry::new(0, 8).is_err());
    assert!(RackGeometry::new(12, 0).is_err());
    assert!(RackGeometry::new(12, 27).is_err());
    assert!(RackGeometry::new(1, 26).is_ok());
}

#[test]
fn test_rack_display_marks_taken_tips() {
    let mut allocator = TipRackAllocator::new(RackGeometry::new(3, 2).unwrap()).unwrap();
    allocator.allocate(2).unwrap();
    allocator.allocate(1).unwrap();

    let printed = allocator.rack().to_string();
    assert_eq!(printed, "--  A2  A3\n--  --  B3\n");
}
