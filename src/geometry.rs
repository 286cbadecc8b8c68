//! The eight geometric parameters of an extended end-plate connection.
//!
//! Column and beam share the same section, so one width, depth, web and
//! flange thickness describe both members.

use std::fmt::{self, Display, Formatter};
use std::ops::RangeInclusive;

use ndarray::Array1;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::InputError;

/// Number of geometric parameters.
pub const PARAMETER_COUNT: usize = 8;

/// Length of a model input row: the parameters followed by the rotation.
pub const FEATURE_COUNT: usize = PARAMETER_COUNT + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterKind {
    Width,
    Depth,
    BoltVerticalSpacing,
    BoltHorizontalSpacing,
    WebThickness,
    FlangeThickness,
    EndplateThickness,
    BoltDiameter,
}

impl ParameterKind {
    /// All parameters in model input order.
    pub const ALL: [ParameterKind; PARAMETER_COUNT] = [
        ParameterKind::Width,
        ParameterKind::Depth,
        ParameterKind::BoltVerticalSpacing,
        ParameterKind::BoltHorizontalSpacing,
        ParameterKind::WebThickness,
        ParameterKind::FlangeThickness,
        ParameterKind::EndplateThickness,
        ParameterKind::BoltDiameter,
    ];

    /// Position of the parameter in an input row.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            ParameterKind::Width => "Overall width (b)",
            ParameterKind::Depth => "Overall depth (d)",
            ParameterKind::BoltVerticalSpacing => "Bolt vertical spacing (Sv)",
            ParameterKind::BoltHorizontalSpacing => "Bolt horizontal spacing (Sh)",
            ParameterKind::WebThickness => "Web thickness (tw)",
            ParameterKind::FlangeThickness => "Flange thickness (tf)",
            ParameterKind::EndplateThickness => "Endplate thickness (tp)",
            ParameterKind::BoltDiameter => "Bolt diameter (db)",
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ParameterKind::Width => "b",
            ParameterKind::Depth => "d",
            ParameterKind::BoltVerticalSpacing => "Sv",
            ParameterKind::BoltHorizontalSpacing => "Sh",
            ParameterKind::WebThickness => "tw",
            ParameterKind::FlangeThickness => "tf",
            ParameterKind::EndplateThickness => "tp",
            ParameterKind::BoltDiameter => "db",
        }
    }

    /// Snake-case name used in JSON output.
    pub fn key(self) -> &'static str {
        match self {
            ParameterKind::Width => "overall_width",
            ParameterKind::Depth => "overall_depth",
            ParameterKind::BoltVerticalSpacing => "bolt_vertical_spacing",
            ParameterKind::BoltHorizontalSpacing => "bolt_horizontal_spacing",
            ParameterKind::WebThickness => "web_thickness",
            ParameterKind::FlangeThickness => "flange_thickness",
            ParameterKind::EndplateThickness => "endplate_thickness",
            ParameterKind::BoltDiameter => "bolt_diameter",
        }
    }

    /// Range of application in millimetres, bounds included.
    pub fn range(self) -> RangeInclusive<f64> {
        match self {
            ParameterKind::Width => 100.0..=300.0,
            ParameterKind::Depth => 100.0..=300.0,
            ParameterKind::BoltVerticalSpacing => 70.0..=150.0,
            ParameterKind::BoltHorizontalSpacing => 50.0..=150.0,
            ParameterKind::WebThickness => 10.0..=14.0,
            ParameterKind::FlangeThickness => 10.0..=14.0,
            ParameterKind::EndplateThickness => 8.0..=14.0,
            ParameterKind::BoltDiameter => 16.0..=24.0,
        }
    }

    /// Checks that `value` lies within the range of application.
    ///
    /// # Errors
    ///
    /// Returns `InputError::OutOfRange` for values outside the range and for
    /// non-finite values.
    pub fn check(self, value: f64) -> Result<f64, InputError> {
        let range = self.range();
        if range.contains(&value) {
            Ok(value)
        } else {
            Err(InputError::OutOfRange {
                label: self.label(),
                value,
                min: *range.start(),
                max: *range.end(),
            })
        }
    }

    /// Parses the text of a form entry and checks its range.
    pub fn parse_entry(self, text: &str) -> Result<f64, InputError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(InputError::Empty { label: self.label() });
        }
        let value: f64 = text.parse().map_err(|_| InputError::NotANumber {
            label: self.label(),
            text: text.to_string(),
        })?;
        self.check(value)
    }
}

impl Display for ParameterKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A Parameter Vector: one value per [`ParameterKind`], in input order.
///
/// Values are in millimetres. Constructing with [`new`](Self::new) does not
/// check ranges; front ends validate with [`validated`](Self::validated) or
/// [`from_entries`](Self::from_entries) before handing the geometry to the
/// predictor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionGeometry {
    values: [f64; PARAMETER_COUNT],
}

impl ConnectionGeometry {
    pub fn new(values: [f64; PARAMETER_COUNT]) -> Self {
        ConnectionGeometry { values }
    }

    /// Builds a geometry after checking every value against its range.
    ///
    /// # Errors
    ///
    /// Returns the error of the first parameter out of range.
    pub fn validated(values: [f64; PARAMETER_COUNT]) -> Result<Self, InputError> {
        for kind in ParameterKind::ALL {
            kind.check(values[kind.index()])?;
        }
        Ok(ConnectionGeometry { values })
    }

    /// Parses and validates the eight form entries.
    pub fn from_entries<S: AsRef<str>>(entries: &[S; PARAMETER_COUNT]) -> Result<Self, InputError> {
        let mut values = [0.0; PARAMETER_COUNT];
        for kind in ParameterKind::ALL {
            values[kind.index()] = kind.parse_entry(entries[kind.index()].as_ref())?;
        }
        Ok(ConnectionGeometry { values })
    }

    pub fn get(&self, kind: ParameterKind) -> f64 {
        self.values[kind.index()]
    }

    pub fn values(&self) -> &[f64; PARAMETER_COUNT] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterKind, f64)> + '_ {
        ParameterKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }

    /// The model input row for one rotation: the parameters followed by
    /// `rotation`.
    pub fn sample_row(&self, rotation: f64) -> Array1<f64> {
        self.values.iter().copied().chain(std::iter::once(rotation)).collect()
    }
}

impl Serialize for ConnectionGeometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PARAMETER_COUNT))?;
        for (kind, value) in self.iter() {
            map.serialize_entry(kind.key(), &value)?;
        }
        map.end()
    }
}
