//! View model for local detection results.

use serde::Serialize;

use crate::api::AnalyzeResponse;
use crate::devices::{aggregate_devices, parse_page_analyses, Detection, DeviceGroup, PageAnalysis};
use crate::endpoints::{download_annotated_path, visualize_path};
use crate::table::{build_device_table, DeviceTable};

/// One card per page that has at least one detection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageCard {
    pub page_number: u32,
    pub device_count: usize,
    pub page_type: Option<String>,
    pub is_fire_alarm_page: Option<bool>,
    /// Device type and count on this page, most frequent first
    pub device_counts: Vec<(String, usize)>,
    /// Raw sightings with their bounding boxes
    pub detections: Vec<Detection>,
    /// Present once a job id is known
    pub view_path: Option<String>,
    pub download_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionView {
    pub job_id: Option<String>,
    pub total_devices: u64,
    pub pages_with_devices: u64,
    pub total_pages: u64,
    pub selected_pages: Vec<u32>,
    pub groups: Vec<DeviceGroup>,
    pub table: DeviceTable,
    pub page_cards: Vec<PageCard>,
}

/// Build the detection view from a successful analyze response.
///
/// Totals reported by the server win; missing totals are recomputed from the
/// page list.
pub fn build_detection_view(response: &AnalyzeResponse) -> DetectionView {
    let pages = parse_page_analyses(&response.page_analyses);
    let groups = aggregate_devices(&pages);

    let counted_devices: usize = pages.iter().map(|p| p.devices.len()).sum();
    let counted_pages_with_devices = pages.iter().filter(|p| !p.devices.is_empty()).count();

    DetectionView {
        job_id: response.job_id.clone(),
        total_devices: response.total_devices.unwrap_or(counted_devices as u64),
        pages_with_devices: response
            .pages_with_devices
            .unwrap_or(counted_pages_with_devices as u64),
        total_pages: response.total_pages.unwrap_or(pages.len() as u64),
        selected_pages: response.selected_pages.clone().unwrap_or_default(),
        table: build_device_table(&groups),
        groups,
        page_cards: build_page_cards(&pages, response.job_id.as_deref()),
    }
}

fn build_page_cards(pages: &[PageAnalysis], job_id: Option<&str>) -> Vec<PageCard> {
    let mut cards: Vec<PageCard> = pages
        .iter()
        .filter(|p| !p.devices.is_empty())
        .filter_map(|page| {
            let page_number = page.page_number?;
            let device_counts = aggregate_devices(std::slice::from_ref(page))
                .into_iter()
                .map(|g| (g.device_type, g.count))
                .collect();

            Some(PageCard {
                page_number,
                device_count: page.devices.len(),
                page_type: page.page_type.clone(),
                is_fire_alarm_page: page.is_fire_alarm_page,
                device_counts,
                detections: page.devices.clone(),
                view_path: job_id.map(|job| visualize_path(job, page_number)),
                download_path: job_id.map(|job| download_annotated_path(job, page_number)),
            })
        })
        .collect();

    cards.sort_by_key(|c| c.page_number);
    cards
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: serde_json::Value) -> AnalyzeResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_build_detection_view_basic() {
        let view = build_detection_view(&response(json!({
            "success": true,
            "job_id": "job-1",
            "total_devices": 3,
            "pages_with_devices": 2,
            "total_pages": 3,
            "selected_pages": [1, 2, 5],
            "page_analyses": [
                {"page_number": 5, "page_type": "mechanical", "devices": [
                    {"device_type": "Duct Detector", "location": "RTU-1", "confidence": 0.66}
                ]},
                {"page_number": 1, "page_type": "power_plan", "is_fire_alarm_page": true, "devices": [
                    {"device_type": "Smoke Detector", "confidence": 0.9,
                     "x": 120, "y": 80, "width": 30, "height": 32},
                    {"device_type": "Smoke Detector", "confidence": 0.7}
                ]},
                {"page_number": 2, "devices": []}
            ]
        })));

        assert_eq!(view.job_id.as_deref(), Some("job-1"));
        assert_eq!(view.total_devices, 3);
        assert_eq!(view.pages_with_devices, 2);
        assert_eq!(view.total_pages, 3);
        assert_eq!(view.selected_pages, vec![1, 2, 5]);
        assert_eq!(view.groups.len(), 2);
        assert_eq!(view.groups[0].device_type, "Smoke Detector");

        assert_eq!(view.page_cards.len(), 2);
        let first = &view.page_cards[0];
        assert_eq!(first.page_number, 1);
        assert_eq!(first.device_count, 2);
        assert_eq!(first.page_type.as_deref(), Some("power_plan"));
        assert_eq!(
            first.device_counts,
            vec![("Smoke Detector".to_string(), 2)]
        );
        assert_eq!(first.is_fire_alarm_page, Some(true));
        assert_eq!(first.detections.len(), 2);
        assert_eq!(
            first.detections[0].bbox.map(|b| (b.x, b.y, b.width, b.height)),
            Some((120.0, 80.0, 30.0, 32.0))
        );
        assert_eq!(first.detections[1].bbox, None);
        assert_eq!(view.page_cards[1].is_fire_alarm_page, None);
        assert_eq!(first.view_path.as_deref(), Some("/api/visualize/job-1/1"));
        assert_eq!(
            first.download_path.as_deref(),
            Some("/api/download_annotated_pdf/job-1/1")
        );
        assert_eq!(view.page_cards[1].page_number, 5);
    }

    #[test]
    fn test_build_detection_view_recomputes_missing_totals() {
        let view = build_detection_view(&response(json!({
            "success": true,
            "page_analyses": [
                {"page_number": 1, "devices": [{"device_type": "Horn"}]},
                {"page_number": 2, "devices": []}
            ]
        })));

        assert_eq!(view.total_devices, 1);
        assert_eq!(view.pages_with_devices, 1);
        assert_eq!(view.total_pages, 2);
        assert!(view.page_cards[0].view_path.is_none());
    }

    #[test]
    fn test_build_detection_view_malformed_pages() {
        let view = build_detection_view(&response(json!({
            "success": true,
            "job_id": "job-2",
            "page_analyses": "not a list"
        })));

        assert!(view.groups.is_empty());
        assert!(view.page_cards.is_empty());
        assert!(matches!(view.table, DeviceTable::Empty { .. }));
        assert_eq!(view.total_devices, 0);
    }
}
