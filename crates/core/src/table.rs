//! Table display structure for aggregated device groups.

use serde::Serialize;

use crate::devices::DeviceGroup;

/// Page tags shown per row before collapsing into "+N more"
pub const PAGE_TAG_CAP: usize = 10;
/// Location tags shown per row before collapsing into "+N more"
pub const LOCATION_TAG_CAP: usize = 5;
/// Shown instead of the table when nothing was detected
pub const EMPTY_TABLE_MESSAGE: &str = "No devices detected in the analyzed pages.";
/// Confidence column when no detection in the group carried a number
pub const NO_CONFIDENCE: &str = "N/A";

/// Tolerance under which min and max are shown as a single percentage
const SAME_CONFIDENCE_TOLERANCE: f64 = 0.005;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tag {
    pub label: String,
    /// True for the collapsed "+N more" tag
    pub overflow: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceRow {
    pub device_type: String,
    pub count: usize,
    pub pages: Vec<Tag>,
    pub locations: Vec<Tag>,
    pub confidence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeviceTable {
    Empty { message: String },
    Rows { rows: Vec<DeviceRow> },
}

/// Build one row per group, or the empty-state message for no groups.
pub fn build_device_table(groups: &[DeviceGroup]) -> DeviceTable {
    if groups.is_empty() {
        return DeviceTable::Empty {
            message: EMPTY_TABLE_MESSAGE.to_string(),
        };
    }

    let rows = groups
        .iter()
        .map(|group| DeviceRow {
            device_type: group.device_type.clone(),
            count: group.count,
            pages: cap_tags(
                group.pages.iter().map(ToString::to_string).collect(),
                PAGE_TAG_CAP,
            ),
            locations: cap_tags(group.locations.clone(), LOCATION_TAG_CAP),
            confidence: confidence_summary(group),
        })
        .collect();

    DeviceTable::Rows { rows }
}

/// Keep the first `cap` values as tags and collapse the rest into "+N more".
pub fn cap_tags(values: Vec<String>, cap: usize) -> Vec<Tag> {
    let hidden = values.len().saturating_sub(cap);

    let mut tags: Vec<Tag> = values
        .into_iter()
        .take(cap)
        .map(|label| Tag {
            label,
            overflow: false,
        })
        .collect();

    if hidden > 0 {
        tags.push(Tag {
            label: format!("+{hidden} more"),
            overflow: true,
        });
    }

    tags
}

/// Format a `[0, 1]` ratio as a percentage with one decimal, dropping ".0".
///
/// `0.7` becomes `"70%"`, `0.755` becomes `"75.5%"`.
pub fn format_percent(ratio: f64) -> String {
    let formatted = format!("{:.1}", ratio * 100.0);
    let trimmed = formatted.strip_suffix(".0").unwrap_or(&formatted);
    format!("{trimmed}%")
}

/// Confidence column text for a group.
pub fn confidence_summary(group: &DeviceGroup) -> String {
    match (
        group.min_confidence,
        group.avg_confidence,
        group.max_confidence,
    ) {
        (Some(min), Some(avg), Some(max)) => {
            if (max - min).abs() < SAME_CONFIDENCE_TOLERANCE {
                format_percent(avg)
            } else {
                format!(
                    "{} - {} (avg {})",
                    format_percent(min),
                    format_percent(max),
                    format_percent(avg)
                )
            }
        }
        _ => NO_CONFIDENCE.to_string(),
    }
}
