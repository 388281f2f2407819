use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// All tunable parameters, one UI slider or toggle each.
///
/// Field names serialize to the snapshot keys (`offsetX`, `colorToggle`, ...),
/// see [`Field::key`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Params {
    // View
    pub scale: f32,
    pub speed: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub offset_x: f32,
    pub offset_y: f32,

    // Fractal sum
    pub octaves: i32,
    pub persistence: f32,
    pub lacunarity: f32,

    // Hashing operands
    pub mod1: f32,
    pub mod2: f32,
    pub base_mod: f32,
    pub mod_mult: f32,

    #[serde(rename = "colorToggle")]
    pub color_enabled: bool,
    pub mod1_fine: f32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            scale: 100.0,
            speed: 0.5,
            brightness: 0.0,
            contrast: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
            octaves: 5,
            persistence: 0.5,
            lacunarity: 2.0,
            mod1: 289.0,
            mod2: 289.0,
            base_mod: 289.0,
            mod_mult: 1.0,
            color_enabled: false,
            mod1_fine: 0.0,
        }
    }
}

impl Params {
    /// Divisor of the first hash stage (coarse + fine slider).
    #[inline]
    pub fn mod1_total(&self) -> f32 {
        self.mod1 + self.mod1_fine
    }

    pub fn get(&self, field: Field) -> Value {
        match field {
            Field::Scale => Value::Float(self.scale),
            Field::Speed => Value::Float(self.speed),
            Field::Brightness => Value::Float(self.brightness),
            Field::Contrast => Value::Float(self.contrast),
            Field::OffsetX => Value::Float(self.offset_x),
            Field::OffsetY => Value::Float(self.offset_y),
            Field::Octaves => Value::Int(self.octaves),
            Field::Persistence => Value::Float(self.persistence),
            Field::Lacunarity => Value::Float(self.lacunarity),
            Field::Mod1 => Value::Float(self.mod1),
            Field::Mod2 => Value::Float(self.mod2),
            Field::BaseMod => Value::Float(self.base_mod),
            Field::ModMult => Value::Float(self.mod_mult),
            Field::ColorToggle => Value::Bool(self.color_enabled),
            Field::Mod1Fine => Value::Float(self.mod1_fine),
        }
    }

    /// Write one typed value. Fails without touching `self` if the value kind
    /// does not match the field.
    pub fn set(&mut self, field: Field, value: Value) -> Result<(), ParseError> {
        let mismatch = || ParseError::InvalidValue {
            field,
            raw: value.to_string(),
        };
        match (field.kind(), value) {
            (Kind::Float, Value::Float(v)) if v.is_finite() => {
                let slot = match field {
                    Field::Scale => &mut self.scale,
                    Field::Speed => &mut self.speed,
                    Field::Brightness => &mut self.brightness,
                    Field::Contrast => &mut self.contrast,
                    Field::OffsetX => &mut self.offset_x,
                    Field::OffsetY => &mut self.offset_y,
                    Field::Persistence => &mut self.persistence,
                    Field::Lacunarity => &mut self.lacunarity,
                    Field::Mod1 => &mut self.mod1,
                    Field::Mod2 => &mut self.mod2,
                    Field::BaseMod => &mut self.base_mod,
                    Field::ModMult => &mut self.mod_mult,
                    Field::Mod1Fine => &mut self.mod1_fine,
                    Field::Octaves | Field::ColorToggle => return Err(mismatch()),
                };
                *slot = v;
            }
            (Kind::Int, Value::Int(v)) => self.octaves = v,
            (Kind::Bool, Value::Bool(v)) => self.color_enabled = v,
            _ => return Err(mismatch()),
        }
        Ok(())
    }

    /// Reject the first non-finite float field.
    pub fn validate(&self) -> Result<(), ParseError> {
        for field in Field::ALL {
            if let Value::Float(v) = self.get(field) {
                if !v.is_finite() {
                    return Err(ParseError::InvalidValue {
                        field,
                        raw: v.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Semantic type of a parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    Float,
    Int,
    Bool,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Float => "number",
            Kind::Int => "integer",
            Kind::Bool => "boolean",
        }
    }
}

/// A typed parameter value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Float(f32),
    Int(i32),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Float(v) => write!(f, "{v}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Identifier of one parameter, as sent by the UI and stored in snapshots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Scale,
    Speed,
    Brightness,
    Contrast,
    OffsetX,
    OffsetY,
    Octaves,
    Persistence,
    Lacunarity,
    Mod1,
    Mod2,
    BaseMod,
    ModMult,
    ColorToggle,
    Mod1Fine,
}

impl Field {
    pub const COUNT: usize = 15;

    /// Snapshot key order.
    pub const ALL: [Field; Field::COUNT] = [
        Field::Scale,
        Field::Speed,
        Field::Brightness,
        Field::Contrast,
        Field::OffsetX,
        Field::OffsetY,
        Field::Octaves,
        Field::Persistence,
        Field::Lacunarity,
        Field::Mod1,
        Field::Mod2,
        Field::BaseMod,
        Field::ModMult,
        Field::ColorToggle,
        Field::Mod1Fine,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::Scale => "scale",
            Field::Speed => "speed",
            Field::Brightness => "brightness",
            Field::Contrast => "contrast",
            Field::OffsetX => "offsetX",
            Field::OffsetY => "offsetY",
            Field::Octaves => "octaves",
            Field::Persistence => "persistence",
            Field::Lacunarity => "lacunarity",
            Field::Mod1 => "mod1",
            Field::Mod2 => "mod2",
            Field::BaseMod => "baseMod",
            Field::ModMult => "modMult",
            Field::ColorToggle => "colorToggle",
            Field::Mod1Fine => "mod1Fine",
        }
    }

    pub fn kind(self) -> Kind {
        match self {
            Field::Octaves => Kind::Int,
            Field::ColorToggle => Kind::Bool,
            _ => Kind::Float,
        }
    }

    /// Parse a raw UI string into this field's type.
    pub fn parse_value(self, raw: &str) -> Result<Value, ParseError> {
        let s = raw.trim();
        let invalid = || ParseError::InvalidValue {
            field: self,
            raw: raw.to_string(),
        };
        match self.kind() {
            Kind::Float => match s.parse::<f32>() {
                Ok(v) if v.is_finite() => Ok(Value::Float(v)),
                _ => Err(invalid()),
            },
            Kind::Int => s.parse::<i32>().map(Value::Int).map_err(|_| invalid()),
            Kind::Bool => s.parse::<bool>().map(Value::Bool).map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.key() == s)
            .ok_or_else(|| ParseError::UnknownField(s.to_string()))
    }
}

/// A single field's raw value could not be applied.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("unknown parameter `{0}`")]
    UnknownField(String),
    #[error("invalid {} for `{field}`: {raw:?}", .field.kind().name())]
    InvalidValue { field: Field, raw: String },
    #[error("missing parameter `{0}`")]
    MissingField(Field),
}
