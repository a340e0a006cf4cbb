//! Build gate over the export artifact's branch coordinates.
//!
//! Every branch must carry a numeric latitude in [-90, 90] and longitude in
//! [-180, 180]. Any violation fails the gate. Values that are valid but look
//! like placeholders only produce warnings.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;

pub const LATITUDE_RANGE: (f64, f64) = (-90.0, 90.0);
pub const LONGITUDE_RANGE: (f64, f64) = (-180.0, 180.0);

#[derive(Debug, thiserror::Error)]
pub enum CoordinateError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse export artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Export artifact does not contain a \"branches\" array")]
    MissingBranches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    fn key(self) -> &'static str {
        match self {
            Axis::Latitude => "latitude",
            Axis::Longitude => "longitude",
        }
    }

    fn range(self) -> (f64, f64) {
        match self {
            Axis::Latitude => LATITUDE_RANGE,
            Axis::Longitude => LONGITUDE_RANGE,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Latitude => f.write_str("Latitude"),
            Axis::Longitude => f.write_str("Longitude"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "issue")]
pub enum CoordinateIssue {
    MissingLatitude,
    InvalidLatitudeType { found: String },
    InvalidLatitudeRange { value: f64 },
    MissingLongitude,
    InvalidLongitudeType { found: String },
    InvalidLongitudeRange { value: f64 },
}

impl CoordinateIssue {
    fn missing(axis: Axis) -> Self {
        match axis {
            Axis::Latitude => CoordinateIssue::MissingLatitude,
            Axis::Longitude => CoordinateIssue::MissingLongitude,
        }
    }

    fn invalid_type(axis: Axis, found: &str) -> Self {
        let found = found.to_string();
        match axis {
            Axis::Latitude => CoordinateIssue::InvalidLatitudeType { found },
            Axis::Longitude => CoordinateIssue::InvalidLongitudeType { found },
        }
    }

    fn out_of_range(axis: Axis, value: f64) -> Self {
        match axis {
            Axis::Latitude => CoordinateIssue::InvalidLatitudeRange { value },
            Axis::Longitude => CoordinateIssue::InvalidLongitudeRange { value },
        }
    }
}

impl fmt::Display for CoordinateIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateIssue::MissingLatitude => f.write_str("Missing Latitude"),
            CoordinateIssue::MissingLongitude => f.write_str("Missing Longitude"),
            CoordinateIssue::InvalidLatitudeType { found } => {
                write!(f, "Latitude must be a number, got: {}", found)
            }
            CoordinateIssue::InvalidLongitudeType { found } => {
                write!(f, "Longitude must be a number, got: {}", found)
            }
            CoordinateIssue::InvalidLatitudeRange { value } => {
                write!(f, "Latitude {} is outside valid range (-90 to 90)", value)
            }
            CoordinateIssue::InvalidLongitudeRange { value } => {
                write!(f, "Longitude {} is outside valid range (-180 to 180)", value)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "warning")]
pub enum CoordinateWarning {
    /// Exactly (0, 0), almost always a placeholder
    NullIsland,
    WholeNumberCoordinates,
}

impl fmt::Display for CoordinateWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordinateWarning::NullIsland => {
                f.write_str("Coordinates are (0, 0), likely a placeholder")
            }
            CoordinateWarning::WholeNumberCoordinates => {
                f.write_str("Both latitude and longitude are whole numbers")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchFinding<T> {
    pub branch_id: String,
    pub branch_name: String,
    #[serde(flatten)]
    pub finding: T,
}

impl<T> BranchFinding<T> {
    fn new(branch_id: &str, branch_name: &str, finding: T) -> Self {
        Self {
            branch_id: branch_id.to_string(),
            branch_name: branch_name.to_string(),
            finding,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateReport {
    pub branches_checked: usize,
    pub errors: Vec<BranchFinding<CoordinateIssue>>,
    pub warnings: Vec<BranchFinding<CoordinateWarning>>,
}

impl CoordinateReport {
    pub fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_axis(branch: &Value, axis: Axis) -> Result<f64, CoordinateIssue> {
    let value = match branch.get(axis.key()) {
        None | Some(Value::Null) => return Err(CoordinateIssue::missing(axis)),
        Some(value) => value,
    };
    let number = value
        .as_f64()
        .ok_or_else(|| CoordinateIssue::invalid_type(axis, json_type(value)))?;

    let (min, max) = axis.range();
    if number < min || number > max {
        return Err(CoordinateIssue::out_of_range(axis, number));
    }
    Ok(number)
}

/// Check every branch in a parsed export artifact
pub fn validate_artifact(artifact: &Value) -> Result<CoordinateReport, CoordinateError> {
    let branches = artifact
        .get("branches")
        .and_then(Value::as_array)
        .ok_or(CoordinateError::MissingBranches)?;

    let mut report = CoordinateReport {
        branches_checked: branches.len(),
        ..Default::default()
    };

    for (index, branch) in branches.iter().enumerate() {
        let branch_name = branch
            .get("branchName")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Branch {}", index + 1));
        let branch_id = branch
            .get("branchId")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .unwrap_or("Unknown ID")
            .to_string();

        let latitude = check_axis(branch, Axis::Latitude);
        let longitude = check_axis(branch, Axis::Longitude);

        match (latitude, longitude) {
            (Ok(lat), Ok(long)) => {
                if lat == 0.0 && long == 0.0 {
                    report
                        .warnings
                        .push(BranchFinding::new(&branch_id, &branch_name, CoordinateWarning::NullIsland));
                }
                if lat.fract() == 0.0 && long.fract() == 0.0 {
                    report.warnings.push(BranchFinding::new(
                        &branch_id,
                        &branch_name,
                        CoordinateWarning::WholeNumberCoordinates,
                    ));
                }
            }
            (lat, long) => {
                for issue in [lat.err(), long.err()].into_iter().flatten() {
                    report
                        .errors
                        .push(BranchFinding::new(&branch_id, &branch_name, issue));
                }
            }
        }
    }

    Ok(report)
}

/// Read and check an export artifact on disk
pub async fn validate_file(path: impl AsRef<Path>) -> Result<CoordinateReport, CoordinateError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CoordinateError::Read {
            path: path.display().to_string(),
            source,
        })?;
    let artifact: Value = serde_json::from_str(&raw)?;
    validate_artifact(&artifact)
}
