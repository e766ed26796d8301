// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
mod models;
mod payloads;

pub use models::*;
pub use payloads::*;

/// Share of the estimated pomodoros that has been completed, in percent.
///
/// An estimate of zero (or less) yields `0.0` instead of dividing by zero.
/// The value is not clamped: a task can run past its estimate.
pub fn completion_percentage(completed: i64, estimated: i64) -> f64 {
    if estimated > 0 {
        completed as f64 / estimated as f64 * 100.0
    } else {
        0.0
    }
}
