//! Stroke Archetypes
//!
//! A connector's geometry follows from how many neighbours it joins and at
//! which angles. The average pairwise angle between the connected
//! directions is the lookup key; the enum values are those averages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::direction::ConnectionDirection;

/// Families of connector pieces. Strokes only connect within a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrokeCategory {
    Path,
    Fence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StrokeType {
    End = 0,
    Turn = 90,
    Straight = 180,
    ThreeWay = 240,
    Cross = 360,
}

impl StrokeType {
    /// Exact lookup; keys between archetypes do not resolve.
    pub fn from_key(key: i32) -> Option<StrokeType> {
        match key {
            0 => Some(StrokeType::End),
            90 => Some(StrokeType::Turn),
            180 => Some(StrokeType::Straight),
            240 => Some(StrokeType::ThreeWay),
            360 => Some(StrokeType::Cross),
            _ => None,
        }
    }

    pub fn key(&self) -> i32 {
        *self as i32
    }
}

/// Sum of angles over ordered pairs of distinct directions, divided by the
/// direction count and truncated.
pub fn archetype_key(directions: &[ConnectionDirection]) -> i32 {
    if directions.is_empty() {
        return 0;
    }
    let mut sum = 0.0f32;
    for (i, a) in directions.iter().enumerate() {
        for (j, b) in directions.iter().enumerate() {
            if i != j {
                sum += a.vector().angle_between(b.vector()).to_degrees();
            }
        }
    }
    // Small bias so 179.99 truncates to 180
    ((sum / directions.len() as f32) + 1e-3) as i32
}

/// Archetype for a set of connected directions. An isolated point (no
/// connections) is an end piece.
pub fn classify(directions: &[ConnectionDirection]) -> Option<StrokeType> {
    StrokeType::from_key(archetype_key(directions))
}

/// Yaw (degrees) that turns an archetype's canonical directions onto the
/// required ones: the most common signed angle over all (required,
/// canonical) pairs. Ties go to the first maximum in iteration order.
pub fn match_angle(required: &[ConnectionDirection], canonical: &[ConnectionDirection]) -> i32 {
    let mut tally: BTreeMap<i32, usize> = BTreeMap::new();
    let mut order: Vec<i32> = Vec::new();
    for from in required {
        for to in canonical {
            let f = from.vector();
            let t = to.vector();
            let sign = if t.cross(f).y < 0.0 { -1.0 } else { 1.0 };
            let angle = (f.angle_between(t).to_degrees() * sign + sign * 1e-3) as i32;
            let count = tally.entry(angle).or_insert(0);
            if *count == 0 {
                order.push(angle);
            }
            *count += 1;
        }
    }

    let mut best = 0;
    let mut best_count = 0;
    for angle in order {
        let count = tally[&angle];
        if count > best_count {
            best = angle;
            best_count = count;
        }
    }
    best
}
