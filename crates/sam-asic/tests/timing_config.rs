//! Frame timing read from JSON configuration.
#![cfg(feature = "serde")]

use sam_asic::{ContentionTable, FrameTiming};

#[test]
fn partial_config_keeps_defaults() {
    let timing: FrameTiming =
        serde_json::from_str(r#"{ "tstates_per_line": 228, "height_lines": 64 }"#).expect("parse");
    assert_eq!(timing.tstates_per_line, 228);
    assert_eq!(timing.height_lines, 64);
    assert_eq!(timing.int_active_time, 128);
}

#[test]
fn short_line_table_has_four_buckets() {
    let timing = FrameTiming {
        tstates_per_line: 228,
        height_lines: 64,
        top_border_lines: 8,
        screen_lines: 48,
        border_cycles: 32,
        screen_cycles: 128,
        int_start_time: 200,
        ..FrameTiming::default()
    };
    timing.validate().expect("valid timing");

    let mut table = ContentionTable::new(&timing);
    table.select_line(20, &timing);
    // Bucket 3 starts at 192, past the screen area
    assert_eq!(table.mask(200), 3);
    assert_eq!(table.mask(64), 7);
    assert_eq!(table.mask(227), 3);
}
