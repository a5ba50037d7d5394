//! Course catalog: immutable course definitions, startup validation, and the
//! between-rounds rotation.

use crate::types::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Course definition
// ---------------------------------------------------------------------------

/// How the round modifier is chosen for this course.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModifierMode {
    Random,
    Fixed,
}

/// A single course layout, loaded once at startup and treated as read-only
/// for the lifetime of the process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDefinition {
    pub id: String,
    pub name: String,
    pub lobby_spawn: Vec3,
    pub start_pad_position: Vec3,
    pub start_pad_size: Vec3,
    pub finish_gate_position: Vec3,
    pub finish_gate_size: Vec3,
    /// Ordered checkpoints between start pad and finish gate. Never empty.
    pub checkpoint_positions: Vec<Vec3>,
    pub checkpoint_size: Vec3,
    /// Falling below this Y triggers a respawn.
    pub out_of_bounds_y: f32,
    pub start_trigger_radius: f32,
    pub checkpoint_trigger_radius: f32,
    pub finish_trigger_radius: f32,
    pub modifier_mode: ModifierMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_modifier_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CourseError {
    #[error("course catalog is empty")]
    EmptyCatalog,
    #[error("course '{0}' has no checkpoints")]
    NoCheckpoints(String),
    #[error("course '{course}' has non-positive {which} trigger radius")]
    NonPositiveRadius { course: String, which: &'static str },
    #[error(
        "course '{course}' out-of-bounds Y {oob_y} is not strictly below gate at Y {gate_y}"
    )]
    OutOfBoundsTooHigh {
        course: String,
        oob_y: f32,
        gate_y: f32,
    },
    #[error("duplicate course id '{0}'")]
    DuplicateId(String),
}

impl CourseDefinition {
    /// Check the course invariants: a non-empty checkpoint list, positive
    /// trigger radii, and an out-of-bounds threshold strictly below every
    /// gate so falling is always detectable before reaching one.
    pub fn validate(&self) -> Result<(), CourseError> {
        if self.checkpoint_positions.is_empty() {
            return Err(CourseError::NoCheckpoints(self.id.clone()));
        }

        for (radius, which) in [
            (self.start_trigger_radius, "start"),
            (self.checkpoint_trigger_radius, "checkpoint"),
            (self.finish_trigger_radius, "finish"),
        ] {
            if radius <= 0.0 {
                return Err(CourseError::NonPositiveRadius {
                    course: self.id.clone(),
                    which,
                });
            }
        }

        let gate_ys = std::iter::once(self.start_pad_position.y)
            .chain(std::iter::once(self.finish_gate_position.y))
            .chain(self.checkpoint_positions.iter().map(|p| p.y));
        for gate_y in gate_ys {
            if self.out_of_bounds_y >= gate_y {
                return Err(CourseError::OutOfBoundsTooHigh {
                    course: self.id.clone(),
                    oob_y: self.out_of_bounds_y,
                    gate_y,
                });
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Static registry of every course the server rotates through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseCatalog {
    courses: Vec<CourseDefinition>,
}

impl CourseCatalog {
    /// Build a catalog, validating every course up front.
    pub fn new(courses: Vec<CourseDefinition>) -> Result<Self, CourseError> {
        if courses.is_empty() {
            return Err(CourseError::EmptyCatalog);
        }
        for (i, course) in courses.iter().enumerate() {
            course.validate()?;
            if courses[..i].iter().any(|c| c.id == course.id) {
                return Err(CourseError::DuplicateId(course.id.clone()));
            }
        }
        Ok(Self { courses })
    }

    pub fn courses(&self) -> &[CourseDefinition] {
        &self.courses
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CourseDefinition> {
        self.courses.iter().find(|c| c.id == id)
    }

    /// The built-in course set used when no catalog file is supplied.
    pub fn builtin() -> Self {
        // Built-in definitions are validated by the catalog tests.
        Self {
            courses: vec![skyline_dash(), cavern_drift()],
        }
    }
}

fn skyline_dash() -> CourseDefinition {
    CourseDefinition {
        id: "course1".into(),
        name: "Skyline Dash".into(),
        lobby_spawn: Vec3::new(0.0, 10.0, 0.0),
        start_pad_position: Vec3::new(0.0, 5.0, -20.0),
        start_pad_size: Vec3::new(6.0, 1.0, 6.0),
        finish_gate_position: Vec3::new(0.0, 5.0, -200.0),
        finish_gate_size: Vec3::new(6.0, 6.0, 2.0),
        checkpoint_positions: vec![
            Vec3::new(10.0, 8.0, -40.0),
            Vec3::new(-5.0, 12.0, -60.0),
            Vec3::new(15.0, 10.0, -80.0),
            Vec3::new(-10.0, 15.0, -100.0),
            Vec3::new(5.0, 12.0, -120.0),
            Vec3::new(-15.0, 18.0, -140.0),
            Vec3::new(10.0, 14.0, -160.0),
            Vec3::new(0.0, 20.0, -180.0),
        ],
        checkpoint_size: Vec3::new(4.0, 4.0, 4.0),
        out_of_bounds_y: -10.0,
        start_trigger_radius: 4.0,
        checkpoint_trigger_radius: 3.0,
        finish_trigger_radius: 4.0,
        modifier_mode: ModifierMode::Random,
        fixed_modifier_id: None,
    }
}

fn cavern_drift() -> CourseDefinition {
    CourseDefinition {
        id: "course2".into(),
        name: "Cavern Drift".into(),
        lobby_spawn: Vec3::new(0.0, 10.0, 0.0),
        start_pad_position: Vec3::new(40.0, 6.0, 10.0),
        start_pad_size: Vec3::new(6.0, 1.0, 6.0),
        finish_gate_position: Vec3::new(220.0, 8.0, 10.0),
        finish_gate_size: Vec3::new(6.0, 6.0, 2.0),
        checkpoint_positions: vec![
            Vec3::new(70.0, 4.0, 18.0),
            Vec3::new(100.0, 9.0, 2.0),
            Vec3::new(130.0, 6.0, 22.0),
            Vec3::new(160.0, 12.0, 10.0),
            Vec3::new(190.0, 7.0, -2.0),
        ],
        checkpoint_size: Vec3::new(4.0, 4.0, 4.0),
        out_of_bounds_y: -8.0,
        start_trigger_radius: 4.0,
        checkpoint_trigger_radius: 3.0,
        finish_trigger_radius: 4.0,
        modifier_mode: ModifierMode::Fixed,
        fixed_modifier_id: Some("low_gravity".into()),
    }
}

// ---------------------------------------------------------------------------
// Rotation
// ---------------------------------------------------------------------------

/// Cycles the active course sequentially between rounds, wrapping around.
#[derive(Debug, Clone)]
pub struct CourseRotation {
    catalog: CourseCatalog,
    index: usize,
}

impl CourseRotation {
    pub fn new(catalog: CourseCatalog) -> Self {
        Self { catalog, index: 0 }
    }

    pub fn active(&self) -> &CourseDefinition {
        &self.catalog.courses()[self.index]
    }

    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    /// Advance to the next course and return it.
    pub fn advance(&mut self) -> &CourseDefinition {
        self.index = (self.index + 1) % self.catalog.len();
        self.active()
    }

    /// Peek at the next course without advancing.
    pub fn peek_next(&self) -> &CourseDefinition {
        &self.catalog.courses()[(self.index + 1) % self.catalog.len()]
    }
}
