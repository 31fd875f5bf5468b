//! Application state management.
//!
//! The point list and entry form, plus the small amount of UI feedback state
//! (status line and modal notice) shared between panels.

mod points;

pub use points::{Point, PointInput, PointList};

#[cfg(test)]
use points::EXAMPLE_POINTS;

/// An action was requested without enough points to perform it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    NotEnoughPoints {
        action: &'static str,
        required: usize,
        actual: usize,
    },
}

impl std::fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PreconditionError::NotEnoughPoints {
                action,
                required,
                actual,
            } => {
                let noun = if *required == 1 { "point" } else { "points" };
                write!(
                    f,
                    "Add at least {} {} to {} (currently {}).",
                    required, noun, action, actual
                )
            }
        }
    }
}

impl std::error::Error for PreconditionError {}

/// Checks that `action` has at least `required` points to work with.
pub fn require_points(
    points: &PointList,
    action: &'static str,
    required: usize,
) -> Result<(), PreconditionError> {
    if points.len() < required {
        return Err(PreconditionError::NotEnoughPoints {
            action,
            required,
            actual: points.len(),
        });
    }
    Ok(())
}

/// A message shown in a modal window until dismissed.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

/// Root application state.
#[derive(Debug, Default)]
pub struct AppState {
    /// Ordered trajectory points
    pub points: PointList,

    /// Contents of the point entry form
    pub input: PointInput,

    /// Status message displayed in the top bar
    pub status_message: String,

    /// Modal notice, if one is open
    pub notice: Option<Notice>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            status_message: "Ready".to_string(),
            ..Default::default()
        }
    }

    /// Opens a modal notice and mirrors it to the log.
    pub fn notify(&mut self, title: impl Into<String>, message: impl Into<String>) {
        let notice = Notice {
            title: title.into(),
            message: message.into(),
        };
        log::warn!("{}: {}", notice.title, notice.message);
        self.notice = Some(notice);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    /// Adds the point typed into the form. On success the form is cleared; on
    /// failure a notice explains why and nothing changes.
    pub fn submit_point(&mut self) -> bool {
        match self.points.add(&self.input) {
            Ok(point) => {
                let status = format!("Added '{}'", point.name);
                self.input.clear();
                self.set_status(status);
                true
            }
            Err(e) => {
                self.notify("Invalid point", e.to_string());
                false
            }
        }
    }

    pub fn remove_point(&mut self, id: u64) {
        if let Some(point) = self.points.remove(id) {
            self.set_status(format!("Removed '{}'", point.name));
        }
    }

    pub fn add_examples(&mut self) {
        match self.points.add_examples() {
            Ok(count) => self.set_status(format!("Added {} example points", count)),
            Err(e) => self.notify("Invalid point", e.to_string()),
        }
    }
}
