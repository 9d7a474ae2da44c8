//! Pure scoring functions. No I/O, no store access; the research orchestrator
//! calls these and fans the results out to attendees itself.

use crate::domain::Category;

/// Combined ranking score: the stronger fit dominates, with a partial bonus
/// for dual competence. Inputs are expected in 0-100; the result may exceed
/// 100 (e.g. 90/90 -> 108) and is deliberately not clamped.
pub fn combined_score(gate: i64, truck: i64) -> i64 {
    let base = gate.max(truck);
    let bonus = gate.min(truck) / 5; // floor(0.2 * min) for non-negative scores
    base + bonus
}

/// 50 points is the single classification boundary. Inputs are assumed
/// already clamped to 0-100 by the producer.
pub fn category(gate: i64, truck: i64) -> Category {
    if gate >= 50 && truck >= 50 {
        Category::Both
    } else if gate >= 50 {
        Category::Gate
    } else if truck >= 50 {
        Category::Truck
    } else {
        Category::Other
    }
}
