//! Collider shape declarations
//!
//! A [`Shape`] is the declarative description a [`crate::Collider`] is
//! built from. Shapes can also be described by a string tag plus loose
//! parameters ([`ShapeDesc`]), which is how scene files declare them.

use std::fmt;
use std::str::FromStr;

use jazz2d_math::Vec2;
use serde::{Serialize, Deserialize};

use crate::error::PhysicsError;

/// The kind tag of a collider shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Polygon,
    Ray,
}

impl FromStr for ShapeKind {
    type Err = PhysicsError;

    /// Accepts both the short tags (`Rect`, `Poly`) and the full names
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag {
            "Rect" | "Rectangle" => Ok(ShapeKind::Rectangle),
            "Circle" => Ok(ShapeKind::Circle),
            "Poly" | "Polygon" => Ok(ShapeKind::Polygon),
            "Ray" => Ok(ShapeKind::Ray),
            other => Err(PhysicsError::InvalidShape(format!("unknown shape kind '{}'", other))),
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Rectangle => "Rectangle",
            ShapeKind::Circle => "Circle",
            ShapeKind::Polygon => "Polygon",
            ShapeKind::Ray => "Ray",
        };
        f.write_str(name)
    }
}

/// A collider shape with its parameters, in owner-local space
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// Rectangle centered on the owner
    Rectangle { width: f32, height: f32 },
    /// Circle centered on the owner
    Circle { radius: f32 },
    /// Convex polygon, vertices relative to the owner
    Polygon { vertices: Vec<Vec2> },
    /// Segment from the owner along its facing direction
    Ray { length: f32 },
}

impl Shape {
    pub fn rectangle(width: f32, height: f32) -> Self {
        Shape::Rectangle { width, height }
    }

    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    pub fn polygon(vertices: impl IntoIterator<Item = Vec2>) -> Self {
        Shape::Polygon { vertices: vertices.into_iter().collect() }
    }

    pub fn ray(length: f32) -> Self {
        Shape::Ray { length }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Rectangle { .. } => ShapeKind::Rectangle,
            Shape::Circle { .. } => ShapeKind::Circle,
            Shape::Polygon { .. } => ShapeKind::Polygon,
            Shape::Ray { .. } => ShapeKind::Ray,
        }
    }

    /// Build a shape from a kind tag and loose parameters
    ///
    /// Missing parameters fall back to the engine defaults (unit sizes);
    /// an unknown tag or a polygon without vertices is rejected.
    pub fn from_tag(tag: &str, desc: &ShapeDesc) -> Result<Self, PhysicsError> {
        let shape = match tag.parse::<ShapeKind>()? {
            ShapeKind::Rectangle => Shape::Rectangle {
                width: desc.width.unwrap_or(1.0),
                height: desc.height.unwrap_or(1.0),
            },
            ShapeKind::Circle => Shape::Circle {
                radius: desc.radius.unwrap_or(1.0),
            },
            ShapeKind::Polygon => Shape::Polygon {
                vertices: desc
                    .vertices
                    .as_ref()
                    .map(|verts| verts.iter().map(|&v| Vec2::from(v)).collect())
                    .ok_or_else(|| {
                        PhysicsError::InvalidShape("a polygon collider needs its vertices".to_string())
                    })?,
            },
            ShapeKind::Ray => Shape::Ray {
                length: desc.length.unwrap_or(1.0),
            },
        };
        shape.validate()?;
        Ok(shape)
    }

    /// Check the shape parameters without building a collider
    pub fn validate(&self) -> Result<(), PhysicsError> {
        fn positive(name: &str, value: f32) -> Result<(), PhysicsError> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(PhysicsError::InvalidShape(format!("{} must be positive, got {}", name, value)))
            }
        }

        match self {
            Shape::Rectangle { width, height } => {
                positive("rectangle width", *width)?;
                positive("rectangle height", *height)
            }
            Shape::Circle { radius } => positive("circle radius", *radius),
            Shape::Polygon { vertices } => {
                if vertices.len() < 3 {
                    return Err(PhysicsError::InvalidShape(format!(
                        "a polygon needs at least 3 vertices, got {}",
                        vertices.len()
                    )));
                }
                if vertices.iter().any(|v| !v.x.is_finite() || !v.y.is_finite()) {
                    return Err(PhysicsError::InvalidShape("polygon vertices must be finite".to_string()));
                }
                Ok(())
            }
            Shape::Ray { length } => positive("ray length", *length),
        }
    }
}

/// A shape described by tag, as written in scene files
///
/// ```ron
/// (kind: "Poly", vertices: Some([(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]))
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeDesc {
    pub kind: String,
    #[serde(default)]
    pub width: Option<f32>,
    #[serde(default)]
    pub height: Option<f32>,
    #[serde(default)]
    pub radius: Option<f32>,
    #[serde(default)]
    pub vertices: Option<Vec<(f32, f32)>>,
    #[serde(default)]
    pub length: Option<f32>,
}

impl ShapeDesc {
    /// Resolve the description into a validated [`Shape`]
    pub fn to_shape(&self) -> Result<Shape, PhysicsError> {
        Shape::from_tag(&self.kind, self)
    }
}

impl From<&Shape> for ShapeDesc {
    fn from(shape: &Shape) -> Self {
        let mut desc = ShapeDesc {
            kind: shape.kind().to_string(),
            ..Default::default()
        };
        match shape {
            Shape::Rectangle { width, height } => {
                desc.width = Some(*width);
                desc.height = Some(*height);
            }
            Shape::Circle { radius } => desc.radius = Some(*radius),
            Shape::Polygon { vertices } => {
                desc.vertices = Some(vertices.iter().map(|v| (v.x, v.y)).collect());
            }
            Shape::Ray { length } => desc.length = Some(*length),
        }
        desc
    }
}
