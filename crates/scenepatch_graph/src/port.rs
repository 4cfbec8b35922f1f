// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port definitions for node inputs/outputs.

use crate::connection::ConnectionId;
use serde::{Deserialize, Serialize};

/// Port direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortDirection {
    /// Input port
    Input,
    /// Output port
    Output,
}

/// Data type that can flow through ports
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortType {
    /// Boolean value
    Bool,
    /// Integer value
    Int,
    /// Floating point value
    Float,
    /// 2D vector
    Vector2,
    /// 3D vector
    Vector3,
    /// 4D vector
    Vector4,
    /// Color (RGBA)
    Color,
    /// String value
    String,
    /// Any type (for generic nodes)
    Any,
}

impl PortType {
    /// Get the color for this port type (for UI)
    pub fn color(&self) -> [u8; 3] {
        match self {
            Self::Bool => [200, 80, 80],
            Self::Int => [80, 200, 200],
            Self::Float => [80, 200, 80],
            Self::Vector2 => [200, 200, 80],
            Self::Vector3 => [200, 150, 80],
            Self::Vector4 => [200, 100, 200],
            Self::Color => [255, 200, 100],
            Self::String => [200, 180, 150],
            Self::Any => [150, 150, 150],
        }
    }

    /// Check if a value of this type can flow into a port of `other` type
    pub fn can_connect_to(&self, other: &PortType) -> bool {
        if matches!(self, Self::Any) || matches!(other, Self::Any) {
            return true;
        }

        if self == other {
            return true;
        }

        // Implicit conversions
        match (self, other) {
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => true,
            (Self::Float, Self::Vector2 | Self::Vector3 | Self::Vector4) => true,
            (Self::Vector2, Self::Vector3 | Self::Vector4) => true,
            (Self::Vector3, Self::Vector4) => true,
            (Self::Color, Self::Vector4) | (Self::Vector4, Self::Color) => true,
            _ => false,
        }
    }

    /// The zero value for this type
    pub fn zero(&self) -> PortValue {
        match self {
            Self::Bool => PortValue::Bool(false),
            Self::Int => PortValue::Int(0),
            Self::Float | Self::Any => PortValue::Float(0.0),
            Self::Vector2 => PortValue::Vector2([0.0; 2]),
            Self::Vector3 => PortValue::Vector3([0.0; 3]),
            Self::Vector4 => PortValue::Vector4([0.0; 4]),
            Self::Color => PortValue::Color([0.0, 0.0, 0.0, 1.0]),
            Self::String => PortValue::String(String::new()),
        }
    }
}

/// Value that can be stored in a port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PortValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i32),
    /// Float
    Float(f32),
    /// 2D vector
    Vector2([f32; 2]),
    /// 3D vector
    Vector3([f32; 3]),
    /// 4D vector
    Vector4([f32; 4]),
    /// Color
    Color([f32; 4]),
    /// String
    String(String),
}

impl PortValue {
    /// Get the port type for this value
    pub fn port_type(&self) -> PortType {
        match self {
            Self::Bool(_) => PortType::Bool,
            Self::Int(_) => PortType::Int,
            Self::Float(_) => PortType::Float,
            Self::Vector2(_) => PortType::Vector2,
            Self::Vector3(_) => PortType::Vector3,
            Self::Vector4(_) => PortType::Vector4,
            Self::Color(_) => PortType::Color,
            Self::String(_) => PortType::String,
        }
    }

    /// Convert this value for a port of the given type.
    ///
    /// Follows the implicit conversion table of [`PortType::can_connect_to`];
    /// returns `None` when no conversion exists.
    pub fn coerce_to(&self, target: &PortType) -> Option<PortValue> {
        if matches!(target, PortType::Any) || self.port_type() == *target {
            return Some(self.clone());
        }

        let converted = match (self, target) {
            (Self::Int(v), PortType::Float) => Self::Float(*v as f32),
            (Self::Float(v), PortType::Int) => Self::Int(v.round() as i32),
            (Self::Float(v), PortType::Vector2) => Self::Vector2([*v; 2]),
            (Self::Float(v), PortType::Vector3) => Self::Vector3([*v; 3]),
            (Self::Float(v), PortType::Vector4) => Self::Vector4([*v; 4]),
            (Self::Vector2([x, y]), PortType::Vector3) => Self::Vector3([*x, *y, 0.0]),
            (Self::Vector2([x, y]), PortType::Vector4) => Self::Vector4([*x, *y, 0.0, 0.0]),
            (Self::Vector3([x, y, z]), PortType::Vector4) => Self::Vector4([*x, *y, *z, 0.0]),
            (Self::Color(c), PortType::Vector4) => Self::Vector4(*c),
            (Self::Vector4(v), PortType::Color) => Self::Color(*v),
            _ => return None,
        };
        Some(converted)
    }

    /// Read as a float, converting integers and booleans
    pub fn as_float(&self) -> Option<f32> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f32),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Read as a 3D vector, broadcasting scalars
    pub fn as_vector3(&self) -> Option<[f32; 3]> {
        match self {
            Self::Vector3(v) => Some(*v),
            Self::Vector2([x, y]) => Some([*x, *y, 0.0]),
            Self::Vector4([x, y, z, _]) | Self::Color([x, y, z, _]) => Some([*x, *y, *z]),
            other => other.as_float().map(|v| [v; 3]),
        }
    }

    /// Read as a boolean; numbers are true when non-zero
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(v) => Some(*v != 0),
            Self::Float(v) => Some(*v != 0.0),
            _ => None,
        }
    }
}

impl From<f32> for PortValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PortValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<[f32; 3]> for PortValue {
    fn from(value: [f32; 3]) -> Self {
        Self::Vector3(value)
    }
}

/// A port on a node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    /// Port name
    pub name: String,
    /// Port direction
    pub direction: PortDirection,
    /// Data type
    pub port_type: PortType,
    /// Current value
    pub value: PortValue,
    /// Value restored when an input loses its connection
    pub default_value: PortValue,
    /// Feeding connection (inputs only)
    #[serde(skip)]
    pub connection: Option<ConnectionId>,
    /// Outgoing connections (outputs only)
    #[serde(skip)]
    pub connections: Vec<ConnectionId>,
}

impl Port {
    fn new(name: impl Into<String>, port_type: PortType, direction: PortDirection) -> Self {
        let default_value = port_type.zero();
        Self {
            name: name.into(),
            direction,
            port_type,
            value: default_value.clone(),
            default_value,
            connection: None,
            connections: Vec::new(),
        }
    }

    /// Create a new input port
    pub fn input(name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(name, port_type, PortDirection::Input)
    }

    /// Create a new output port
    pub fn output(name: impl Into<String>, port_type: PortType) -> Self {
        Self::new(name, port_type, PortDirection::Output)
    }

    /// Set the default value; the current value follows it
    pub fn with_default(mut self, value: impl Into<PortValue>) -> Self {
        let value = value.into();
        self.value = value.clone();
        self.default_value = value;
        self
    }

    /// Check if a connection to another port is valid
    pub fn can_connect(&self, other: &Port) -> bool {
        if self.direction == other.direction {
            return false;
        }

        self.port_type.can_connect_to(&other.port_type)
    }

    /// Whether an input port currently has a feeding connection
    pub fn is_connected(&self) -> bool {
        match self.direction {
            PortDirection::Input => self.connection.is_some(),
            PortDirection::Output => !self.connections.is_empty(),
        }
    }

    /// Store a value, returning whether it differs from the previous one
    pub fn set_value(&mut self, value: PortValue) -> bool {
        if self.value == value {
            return false;
        }
        self.value = value;
        true
    }

    /// Restore the default value, returning whether the value changed
    pub fn reset(&mut self) -> bool {
        let default = self.default_value.clone();
        self.set_value(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coercion_follows_compatibility() {
        assert_eq!(
            PortValue::Int(3).coerce_to(&PortType::Float),
            Some(PortValue::Float(3.0))
        );
        assert_eq!(
            PortValue::Float(2.0).coerce_to(&PortType::Vector3),
            Some(PortValue::Vector3([2.0; 3]))
        );
        assert!(PortValue::String("x".into()).coerce_to(&PortType::Float).is_none());
        assert!(PortType::Float.can_connect_to(&PortType::Vector3));
        assert!(!PortType::Vector3.can_connect_to(&PortType::Float));
    }

    #[test]
    fn test_direction_compatibility() {
        let out = Port::output("time", PortType::Float);
        let input = Port::input("seconds", PortType::Float);
        assert!(out.can_connect(&input));
        assert!(!input.can_connect(&Port::input("other", PortType::Float)));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut port = Port::input("gain", PortType::Float).with_default(1.5_f32);
        assert!(port.set_value(PortValue::Float(4.0)));
        assert!(!port.set_value(PortValue::Float(4.0)));
        assert!(port.reset());
        assert_eq!(port.value, PortValue::Float(1.5));
    }
}
