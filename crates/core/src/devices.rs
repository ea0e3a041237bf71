//! Device Aggregator
//!
//! Groups per-page detections by device type and summarises each group
//! (count, pages, locations, confidence bounds). The input comes straight from
//! the server, so parsing is lenient: anything that is not the expected shape
//! is skipped rather than rejected.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Group key used when a detection has no usable device type
pub const UNKNOWN_DEVICE: &str = "Unknown Device";

/// Detector bounding box, centre-based, in pixels at the detector's DPI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One device sighting reported by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub device_type: String,
    pub location: Option<String>,
    pub confidence: Option<f64>,
    /// Inherited from the containing page record
    pub page_number: Option<u32>,
    pub bbox: Option<BoundingBox>,
}

/// A page number plus the detections found on it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub page_number: Option<u32>,
    pub page_type: Option<String>,
    pub is_fire_alarm_page: Option<bool>,
    pub devices: Vec<Detection>,
}

/// Summary of every detection sharing one device type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceGroup {
    pub device_type: String,
    pub count: usize,
    /// Distinct, ascending
    pub pages: Vec<u32>,
    /// Distinct, non-empty, first-seen order
    pub locations: Vec<String>,
    pub avg_confidence: Option<f64>,
    pub min_confidence: Option<f64>,
    pub max_confidence: Option<f64>,
}

/// Parse the `page_analyses` field of an analyze response.
///
/// Absent, `null` and non-array input yield no pages. Non-object entries are
/// skipped; a page without a `devices` array has no detections.
pub fn parse_page_analyses(value: &Value) -> Vec<PageAnalysis> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(Value::as_object)
        .map(|page| {
            let page_number = page.get("page_number").and_then(as_page_number);
            let devices = page
                .get("devices")
                .and_then(Value::as_array)
                .map(|devices| {
                    devices
                        .iter()
                        .filter(|d| d.is_object())
                        .map(|d| parse_detection(d, page_number))
                        .collect()
                })
                .unwrap_or_default();

            PageAnalysis {
                page_number,
                page_type: page
                    .get("page_type")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                is_fire_alarm_page: page.get("is_fire_alarm_page").and_then(Value::as_bool),
                devices,
            }
        })
        .collect()
}

fn parse_detection(device: &Value, page_number: Option<u32>) -> Detection {
    let device_type = device
        .get("device_type")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(UNKNOWN_DEVICE)
        .to_string();

    let location = device
        .get("location")
        .and_then(Value::as_str)
        .filter(|l| !l.trim().is_empty())
        .map(str::to_string);

    let confidence = device
        .get("confidence")
        .and_then(Value::as_f64)
        .filter(|c| c.is_finite());

    let coord = |key: &str| device.get(key).and_then(Value::as_f64);
    let bbox = match (coord("x"), coord("y"), coord("width"), coord("height")) {
        (Some(x), Some(y), Some(width), Some(height)) => Some(BoundingBox {
            x,
            y,
            width,
            height,
        }),
        _ => None,
    };

    Detection {
        device_type,
        location,
        confidence,
        page_number,
        bbox,
    }
}

fn as_page_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Default)]
struct GroupAccumulator {
    count: usize,
    pages: BTreeSet<u32>,
    locations: Vec<String>,
    confidence_sum: f64,
    confidence_count: usize,
    min: Option<f64>,
    max: Option<f64>,
}

impl GroupAccumulator {
    fn push(&mut self, detection: &Detection) {
        self.count += 1;

        if let Some(page) = detection.page_number {
            self.pages.insert(page);
        }

        if let Some(location) = &detection.location {
            if !self.locations.contains(location) {
                self.locations.push(location.clone());
            }
        }

        if let Some(confidence) = detection.confidence {
            self.confidence_sum += confidence;
            self.confidence_count += 1;
            self.min = Some(self.min.map_or(confidence, |m| m.min(confidence)));
            self.max = Some(self.max.map_or(confidence, |m| m.max(confidence)));
        }
    }

    fn finish(self, device_type: String) -> DeviceGroup {
        // The mean can drift past the bounds by an ulp when all values are equal
        let avg = match (self.min, self.max) {
            (Some(min), Some(max)) if self.confidence_count > 0 => {
                Some((self.confidence_sum / self.confidence_count as f64).clamp(min, max))
            }
            _ => None,
        };

        DeviceGroup {
            device_type,
            count: self.count,
            pages: self.pages.into_iter().collect(),
            locations: self.locations,
            avg_confidence: avg,
            min_confidence: avg.and(self.min),
            max_confidence: avg.and(self.max),
        }
    }
}

/// Group detections by device type.
///
/// Groups are sorted by descending count, ties broken by ascending device type.
pub fn aggregate_devices(pages: &[PageAnalysis]) -> Vec<DeviceGroup> {
    let mut groups: BTreeMap<&str, GroupAccumulator> = BTreeMap::new();

    for detection in pages.iter().flat_map(|p| p.devices.iter()) {
        groups
            .entry(detection.device_type.as_str())
            .or_default()
            .push(detection);
    }

    let mut output: Vec<DeviceGroup> = groups
        .into_iter()
        .map(|(device_type, acc)| acc.finish(device_type.to_string()))
        .collect();

    output.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.device_type.cmp(&b.device_type))
    });

    output
}

/// Parse and aggregate a raw `page_analyses` value in one step.
pub fn aggregate_page_analyses(value: &Value) -> Vec<DeviceGroup> {
    aggregate_devices(&parse_page_analyses(value))
}
