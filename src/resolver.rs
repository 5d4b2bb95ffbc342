//! Hover/click resolution
//!
//! Plotly reports the marker under the cursor as `{"points": [{"pointNumber": i, ...}]}`.
//! The resolver maps that index back to the spike image for the side panel.
//! Anything that does not carry a usable index means "leave the image alone".

use crate::chart::PointTable;
use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Event payload sent by the chart. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HoverEvent {
    #[serde(default, deserialize_with = "lenient_points")]
    pub points: Option<Vec<HoverPoint>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverPoint {
    pub point_number: Option<usize>,
}

impl HoverPoint {
    fn from_value(value: &Value) -> Self {
        Self {
            point_number: value
                .get("pointNumber")
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok()),
        }
    }
}

/// Points are read one by one so a badly typed entry only affects itself.
fn lenient_points<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<HoverPoint>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<Value>> = Option::deserialize(deserializer)?;
    Ok(raw.map(|points| points.iter().map(HoverPoint::from_value).collect()))
}

impl HoverEvent {
    /// Event for a single point, as the chart would send it.
    pub fn at(point_number: usize) -> Self {
        Self {
            points: Some(vec![HoverPoint {
                point_number: Some(point_number),
            }]),
        }
    }

    /// `pointNumber` of the first point, if any.
    pub fn point_number(&self) -> Option<usize> {
        self.points.as_ref()?.first()?.point_number
    }
}

/// Parse a JSON event body. Malformed payloads, including invalid UTF-8, become `None`.
pub fn parse_event(body: &[u8]) -> Option<HoverEvent> {
    match serde_json::from_slice::<Option<HoverEvent>>(body) {
        Ok(event) => event,
        Err(e) => {
            log::debug!("Ignoring malformed interaction payload: {}", e);
            None
        }
    }
}

/// Resolve an event to the trimmed image reference of the hovered point.
///
/// `Ok(None)` means no update. An index past the end of the table is an
/// error; callers serving a UI should treat it as no update as well.
pub fn resolve<'a>(points: &'a PointTable, event: Option<&HoverEvent>) -> Result<Option<&'a str>> {
    let index = match event.and_then(HoverEvent::point_number) {
        Some(i) => i,
        None => return Ok(None),
    };

    points
        .get(index)
        .map(|pic| Some(pic.trim()))
        .ok_or(Error::IndexOutOfRange {
            index,
            len: points.len(),
        })
}
