//! Declarative step definitions.

use std::borrow::Cow;

/// One row of a task's step table.
///
/// `start` is the overall progress reported when the step begins; `end`
/// bounds any intra-step sub-progress. Tables are the single source of the
/// milestones clients key their UI off.
#[derive(Debug, Clone, PartialEq)]
pub struct StepDef {
    pub id: Cow<'static, str>,
    pub label: Cow<'static, str>,
    pub start: f64,
    pub end: f64,
}

impl StepDef {
    /// A step known at compile time.
    pub const fn fixed(id: &'static str, label: &'static str, start: f64, end: f64) -> Self {
        Self {
            id: Cow::Borrowed(id),
            label: Cow::Borrowed(label),
            start,
            end,
        }
    }

    /// A step built at runtime (labels that depend on input).
    pub fn dynamic(id: impl Into<String>, label: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: Cow::Owned(id.into()),
            label: Cow::Owned(label.into()),
            start,
            end,
        }
    }

    /// Overall progress after completing `fraction` of this step.
    pub fn progress_at(&self, fraction: f64) -> f64 {
        let fraction = fraction.clamp(0.0, 1.0);
        (self.end - self.start).mul_add(fraction, self.start)
    }
}

/// Milestones for step `index` of `count` evenly spaced steps: `(start, end)`.
pub fn evenly_spaced(index: usize, count: usize) -> (f64, f64) {
    if count == 0 {
        return (0.0, 100.0);
    }
    let width = 100.0 / count as f64;
    (index as f64 * width, (index + 1) as f64 * width)
}
