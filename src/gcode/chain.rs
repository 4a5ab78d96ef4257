//! Path chaining.
//!
//! Joins polylines whose endpoints nearly touch so the printer draws them in
//! one stroke instead of hopping between them. For the current chain, the
//! nearest endpoint among the remaining polylines is found over all four
//! front/back pairings; if it is within `max_dist` the polyline is spliced
//! on (reversed when needed), otherwise the chain is committed and a new one
//! starts. Direction within each original polyline is preserved unless the
//! splice requires reversing that polyline as a whole.
//!
//! Candidates are matched by position index, never by identity.

use crate::geometry::Polyline;
use crate::CoordF;

/// Default chaining distance in millimeters.
pub const CHAIN_MAX_DIST_MM: CoordF = 2.0;

/// Which ends of the chain and candidate pair up.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Pairing {
    BackFront,
    BackBack,
    FrontFront,
    FrontBack,
}

/// Chain polylines whose endpoints lie within `max_dist` millimeters.
/// Consumes the input; the relative order of unchained groups follows the
/// input order.
pub fn chain_polylines(mut pool: Vec<Polyline>, max_dist: CoordF) -> Vec<Polyline> {
    let max_dist_scaled = max_dist * crate::SCALING_FACTOR;
    let mut result = Vec::with_capacity(pool.len());
    pool.retain(|p| !p.is_empty());
    pool.reverse(); // take from the back cheaply, preserving input order

    let Some(mut current) = pool.pop() else {
        return result;
    };

    loop {
        let best = find_nearest(&current, &pool);
        match best {
            Some((idx, pairing, dist)) if dist <= max_dist_scaled => {
                let candidate = pool.swap_remove(idx);
                splice(&mut current, candidate, pairing);
            }
            _ => {
                result.push(current);
                match pool.pop() {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
    }
    result
}

/// Nearest candidate endpoint over the four pairings.
fn find_nearest(current: &Polyline, pool: &[Polyline]) -> Option<(usize, Pairing, CoordF)> {
    let front = current.first_point();
    let back = current.last_point();
    let mut best: Option<(usize, Pairing, CoordF)> = None;

    for (idx, candidate) in pool.iter().enumerate() {
        let c_front = candidate.first_point();
        let c_back = candidate.last_point();
        let pairings = [
            (Pairing::BackFront, back.distance(&c_front)),
            (Pairing::BackBack, back.distance(&c_back)),
            (Pairing::FrontFront, front.distance(&c_front)),
            (Pairing::FrontBack, front.distance(&c_back)),
        ];
        for (pairing, dist) in pairings {
            if best.map_or(true, |(_, _, d)| dist < d) {
                best = Some((idx, pairing, dist));
            }
        }
    }
    best
}

/// Splice `candidate` onto `current` so the paired endpoints meet.
fn splice(current: &mut Polyline, mut candidate: Polyline, pairing: Pairing) {
    match pairing {
        Pairing::BackFront => {
            current.points_mut().extend(candidate.points().iter().copied());
        }
        Pairing::BackBack => {
            candidate.reverse();
            current.points_mut().extend(candidate.points().iter().copied());
        }
        Pairing::FrontFront => {
            candidate.reverse();
            candidate.points_mut().extend(current.points().iter().copied());
            *current = candidate;
        }
        Pairing::FrontBack => {
            candidate.points_mut().extend(current.points().iter().copied());
            *current = candidate;
        }
    }
}
