//! Demo road network for the headless driver.
//!
//! A 3 × 3 grid of junctions 200 m apart, every neighbour pair joined by a
//! single-lane edge in each direction.  Edge `n10n11` runs from junction
//! `n10` to `n11`; its lane is `n10n11_0`.
//!
//! ```text
//!   n00 ── n01 ── n02
//!    │      │      │
//!   n10 ── n11 ── n12        signalised: n11 ("center"), n22 ("corner")
//!    │      │      │
//!   n20 ── n21 ── n22
//! ```

use tc_core::{LaneId, Rgba};
use tc_engine::InMemoryEngine;

const SPACING: f64 = 200.0;

fn name(row: usize, col: usize) -> String {
    format!("n{row}{col}")
}

/// Build the grid with two signalised junctions, two named routes, one park
/// polygon, and two charging stations.
pub fn build_demo_network(step_length_secs: f64) -> InMemoryEngine {
    let mut b = InMemoryEngine::builder().step_length(step_length_secs);

    for row in 0..3 {
        for col in 0..3 {
            b = b.junction(&name(row, col), col as f64 * SPACING, row as f64 * SPACING);
        }
    }
    for row in 0..3 {
        for col in 0..3 {
            let here = name(row, col);
            if col + 1 < 3 {
                let east = name(row, col + 1);
                b = b.edge(&format!("{here}{east}"), &here, &east, 1);
                b = b.edge(&format!("{east}{here}"), &east, &here, 1);
            }
            if row + 1 < 3 {
                let south = name(row + 1, col);
                b = b.edge(&format!("{here}{south}"), &here, &south, 1);
                b = b.edge(&format!("{south}{here}"), &south, &here, 1);
            }
        }
    }

    b.route("west_east", &["n10n11", "n11n12"])
        .route("north_south", &["n01n11", "n11n21"])
        .light(
            "center",
            &["n01n11_0", "n21n11_0", "n10n11_0", "n12n11_0"],
            &[
                (30.0, "GGrr"),
                (4.0, "yyrr"),
                (2.0, "rrrr"),
                (30.0, "rrGG"),
                (4.0, "rryy"),
                (2.0, "rrrr"),
            ],
        )
        .light(
            "corner",
            &["n12n22_0", "n21n22_0"],
            &[(20.0, "Gr"), (3.0, "yr"), (20.0, "rG"), (3.0, "ry")],
        )
        .polygon("park", &[(220.0, 220.0), (380.0, 220.0), (380.0, 380.0), (220.0, 380.0)], Rgba::GREEN, true)
        .station("cs_north", 0)
        .station("cs_south", 1)
        .build()
}

/// Queue pattern replayed by the driver: the west approach to `center`
/// backs up for 30 s out of every 120.
pub fn rush_hour(step: u64) -> Option<(LaneId, u32)> {
    let lane = LaneId::from("n10n11_0");
    match step % 120 {
        60 => Some((lane, 6)),
        90 => Some((lane, 0)),
        _ => None,
    }
}
