use colored::Colorize;
use fireplan_core::detection::{DetectionView, PageCard};
use fireplan_core::gemini::{Card, CardItem, GeminiView};
use fireplan_core::selection::{join_pages, PageSelection};
use fireplan_core::status::{StatusView, SubsystemStatus};
use fireplan_core::table::{DeviceTable, Tag};
use fireplan_core::upload::{format_size, SelectedFile};

use super::{PreviewEntry, Renderer, SavedArtifact};
use crate::prelude::{eprintln, println, *};

/// Colored text for humans.
pub struct TerminalRenderer;

fn banner(title: &str) -> String {
    format!(
        "\n{}\n{}\n{}\n",
        "=".repeat(80).bright_cyan(),
        title.bright_cyan().bold(),
        "=".repeat(80).bright_cyan()
    )
}

fn format_indicator(subsystem: &SubsystemStatus) -> String {
    let (dot, state) = if subsystem.indicator.is_online() {
        ("●".green(), "online".green().bold())
    } else {
        ("●".red(), "offline".red().bold())
    };

    let detail = subsystem
        .detail
        .as_deref()
        .map(|d| format!(" ({})", d.bright_black()))
        .unwrap_or_default();

    format!("{dot} {:<16} {state}{detail}\n", subsystem.name)
}

fn format_status_text(view: &StatusView) -> String {
    let mut result = String::new();
    result.push_str(&format_indicator(&view.detector));
    result.push_str(&format_indicator(&view.llm));
    result
}

fn format_file_text(file: &SelectedFile) -> String {
    format!(
        "{} {} ({})\n",
        "Selected:".green().bold(),
        file.name.bright_white(),
        format_size(file.size)
    )
}

fn format_preview_text(entries: &[PreviewEntry], selection: &PageSelection) -> String {
    let mut result = banner(&format!("PAGE PREVIEWS ({} pages)", entries.len()));

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Page".bold().cyan(),
        "Thumbnail".bold().cyan(),
        "Selected".bold().cyan(),
        "Saved To".bold().cyan()
    ]);
    for entry in entries {
        table.add_row(prettytable::row![
            entry.page_number.to_string().bright_yellow(),
            entry.media_type.as_deref().unwrap_or("unknown").bright_blue(),
            if selection.is_selected(entry.page_number) {
                "yes".green()
            } else {
                "no".bright_black()
            },
            entry
                .saved_to
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
                .bright_white()
        ]);
    }
    result.push_str(&table.to_string());

    result.push_str(&format!(
        "\n{} of {} pages selected\n",
        selection.selected_count().to_string().bright_cyan().bold(),
        selection.available_count()
    ));
    result
}

fn format_tags(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return "-".to_string();
    }

    tags.iter()
        .map(|tag| {
            if tag.overflow {
                tag.label.bright_black().italic().to_string()
            } else {
                format!("[{}]", tag.label)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_device_table(table: &DeviceTable) -> String {
    match table {
        DeviceTable::Empty { message } => format!("{}\n", message.yellow()),
        DeviceTable::Rows { rows } => {
            let mut out = new_table();
            out.add_row(prettytable::row![
                "Device Type".bold().cyan(),
                "Count".bold().cyan(),
                "Pages".bold().cyan(),
                "Locations".bold().cyan(),
                "Confidence".bold().cyan()
            ]);
            for row in rows {
                out.add_row(prettytable::row![
                    row.device_type.bright_white(),
                    row.count.to_string().bright_yellow(),
                    format_tags(&row.pages),
                    format_tags(&row.locations),
                    row.confidence.bright_magenta()
                ]);
            }
            out.to_string()
        }
    }
}

fn format_page_card(card: &PageCard, job_id: Option<&str>) -> String {
    let mut result = format!(
        "\n{} {}",
        format!("[Page {}]", card.page_number).yellow().bold(),
        format!("{} device(s)", card.device_count).bright_white()
    );
    if let Some(page_type) = &card.page_type {
        result.push_str(&format!(" {}", format!("({page_type})").bright_black()));
    }
    if card.is_fire_alarm_page == Some(true) {
        result.push_str(&format!(" {}", "fire alarm page".red()));
    }
    result.push('\n');

    for (device_type, count) in &card.device_counts {
        result.push_str(&format!("    {device_type} x {count}\n"));
    }

    if let Some(job) = job_id {
        result.push_str(&format!(
            "    {}: {} | {}: {}\n",
            "View".green(),
            format!("fireplan view {job} {}", card.page_number).cyan(),
            "Download".green(),
            format!("fireplan download {job} {}", card.page_number).cyan()
        ));
    }

    result
}

fn format_detection_text(view: &DetectionView) -> String {
    let mut result = banner("DETECTION RESULTS");

    if let Some(job) = &view.job_id {
        result.push_str(&format!("{}: {}\n", "Job".green(), job.bright_white()));
    }
    result.push_str(&format!(
        "{}: {} | {}: {} | {}: {}\n",
        "Total devices".green(),
        view.total_devices.to_string().bright_yellow(),
        "Pages with devices".green(),
        view.pages_with_devices.to_string().bright_yellow(),
        "Total pages".green(),
        view.total_pages.to_string().bright_yellow()
    ));
    if !view.selected_pages.is_empty() {
        result.push_str(&format!(
            "{}: {}\n",
            "Analyzed pages".green(),
            join_pages(&view.selected_pages)
        ));
    }
    result.push('\n');

    result.push_str(&format_device_table(&view.table));

    if !view.page_cards.is_empty() {
        result.push_str(&banner("PAGES WITH DETECTIONS"));
        for card in &view.page_cards {
            result.push_str(&format_page_card(card, view.job_id.as_deref()));
        }
    }

    if let Some(job) = &view.job_id {
        result.push_str(&format!(
            "\n{}: {}\n",
            "Export results".bright_white().bold(),
            format!("fireplan export {job}").cyan()
        ));
    }

    result
}

fn format_card_item(item: &CardItem) -> String {
    match item {
        CardItem::Field { label, value } => format!("  {}: {}\n", label.green(), value),
        CardItem::List { label, entries } => {
            let mut result = format!("  {}:\n", label.green());
            for entry in entries {
                result.push_str(&format!("    - {entry}\n"));
            }
            result
        }
        CardItem::Bullet { text } => format!("  - {text}\n"),
        CardItem::Note {
            page,
            note_type,
            content,
        } => {
            let page = page
                .as_deref()
                .map(|p| format!("{} ", format!("[Page {p}]").yellow()))
                .unwrap_or_default();
            format!(
                "  {page}{} {content}\n",
                format!("({note_type})").bright_black()
            )
        }
        CardItem::Empty { message } => format!("  {}\n", message.bright_black().italic()),
        CardItem::Error { message } => format!("  {} {}\n", "Error:".red().bold(), message.red()),
    }
}

fn format_card(card: &Card) -> String {
    let mut result = format!("\n{}\n", card.title.bright_yellow().bold());
    for item in &card.items {
        result.push_str(&format_card_item(item));
    }
    result
}

fn format_gemini_text(view: &GeminiView) -> String {
    let mut result = banner("GEMINI AI ANALYSIS");
    for card in &view.cards {
        result.push_str(&format_card(card));
    }
    result.push('\n');
    result
}

fn format_artifacts_text(saved: &[SavedArtifact]) -> String {
    let mut result = String::new();
    for artifact in saved {
        result.push_str(&format!(
            "{} {} {} ({})\n",
            "Saved".green().bold(),
            artifact.label,
            artifact.path.display().to_string().bright_white(),
            format_size(artifact.bytes as u64)
        ));
        if let Some(hint) = &artifact.hint {
            result.push_str(&format!("    {}\n", hint.cyan()));
        }
    }
    result
}

impl Renderer for TerminalRenderer {
    fn status(&self, view: &StatusView) -> Result<()> {
        print!("{}", format_status_text(view));
        Ok(())
    }

    fn file_selected(&self, file: &SelectedFile) -> Result<()> {
        print!("{}", format_file_text(file));
        Ok(())
    }

    fn previews(&self, entries: &[PreviewEntry], selection: &PageSelection) -> Result<()> {
        print!("{}", format_preview_text(entries, selection));
        Ok(())
    }

    fn detection(&self, view: &DetectionView) -> Result<()> {
        print!("{}", format_detection_text(view));
        Ok(())
    }

    fn gemini(&self, view: &GeminiView) -> Result<()> {
        print!("{}", format_gemini_text(view));
        Ok(())
    }

    fn artifacts(&self, saved: &[SavedArtifact]) -> Result<()> {
        print!("{}", format_artifacts_text(saved));
        Ok(())
    }

    fn warning(&self, message: &str) {
        eprintln!("{} {}", "Warning:".yellow().bold(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fireplan_core::api::AnalyzeResponse;
    use fireplan_core::detection::build_detection_view;
    use fireplan_core::gemini::build_gemini_view;
    use fireplan_core::status::{status_view, unreachable_view};
    use serde_json::json;
    use std::path::PathBuf;

    fn create_test_detection(page_analyses: serde_json::Value) -> DetectionView {
        let response: AnalyzeResponse = serde_json::from_value(json!({
            "success": true,
            "job_id": "job-42",
            "page_analyses": page_analyses
        }))
        .unwrap();
        build_detection_view(&response)
    }

    #[test]
    fn test_format_status_text_online() {
        let view = status_view(
            &serde_json::from_value(json!({
                "local_model_configured": true,
                "gemini_configured": true,
                "local_model_name": "fa_yolo_v8"
            }))
            .unwrap(),
        );

        let text = format_status_text(&view);

        assert!(text.contains("Local detector"));
        assert!(text.contains("Gemini AI"));
        assert!(text.contains("online"));
        assert!(!text.contains("offline"));
        assert!(text.contains("fa_yolo_v8"));
    }

    #[test]
    fn test_format_status_text_unreachable() {
        let text = format_status_text(&unreachable_view("connection refused"));

        assert_eq!(text.matches("offline").count(), 2);
        assert!(text.contains("connection refused"));
    }

    #[test]
    fn test_format_detection_text() {
        let view = create_test_detection(json!([
            {"page_number": 1, "page_type": "power_plan", "is_fire_alarm_page": true, "devices": [
                {"device_type": "Smoke Detector", "confidence": 0.9},
                {"device_type": "Smoke Detector", "confidence": 0.7}
            ]},
            {"page_number": 2, "devices": [
                {"device_type": "Pull Station", "location": "Hallway"}
            ]}
        ]));

        let text = format_detection_text(&view);

        assert!(text.contains("DETECTION RESULTS"));
        assert!(text.contains("job-42"));
        assert!(text.contains("Smoke Detector"));
        assert!(text.contains("Pull Station"));
        assert!(text.contains("[Hallway]"));
        assert!(text.contains("70% - 90% (avg 80%)"));
        assert!(text.contains("N/A"));
        assert!(text.contains("Smoke Detector x 2"));
        assert!(text.contains("(power_plan)"));
        assert_eq!(text.matches("fire alarm page").count(), 1);
        assert!(text.contains("fireplan view job-42 1"));
        assert!(text.contains("fireplan download job-42 2"));
        assert!(text.contains("fireplan export job-42"));
    }

    #[test]
    fn test_format_detection_text_empty() {
        let view = create_test_detection(json!(null));

        let text = format_detection_text(&view);

        assert!(text.contains("No devices detected in the analyzed pages."));
        assert!(!text.contains("PAGES WITH DETECTIONS"));
    }

    #[test]
    fn test_format_tags_overflow() {
        let tags = vec![
            Tag {
                label: "1".to_string(),
                overflow: false,
            },
            Tag {
                label: "+3 more".to_string(),
                overflow: true,
            },
        ];

        let text = format_tags(&tags);

        assert!(text.starts_with("[1] "));
        assert!(text.contains("+3 more"));
        assert_eq!(format_tags(&[]), "-");
    }

    #[test]
    fn test_format_gemini_text() {
        let view = build_gemini_view(
            &serde_json::from_value(json!({
                "success": true,
                "project_info": {"project_name": "Riverside Clinic"},
                "fire_alarm_notes": [
                    {"page": 3, "note_type": "code", "content": "Provide CO detection"}
                ],
                "specifications": {"error": "quota exceeded"}
            }))
            .unwrap(),
        );

        let text = format_gemini_text(&view);

        assert!(text.contains("Project Information"));
        assert!(text.contains("Riverside Clinic"));
        assert!(text.contains("Not provided"));
        assert!(text.contains("[Page 3]"));
        assert!(text.contains("Provide CO detection"));
        assert!(text.contains("quota exceeded"));
        assert!(text.contains("Analysis Summary"));
    }

    #[test]
    fn test_format_preview_text() {
        let mut selection = PageSelection::with_pages([1, 2]);
        selection.toggle(1);
        let entries = vec![
            PreviewEntry {
                page_number: 1,
                media_type: Some("image/jpeg".to_string()),
                saved_to: Some(PathBuf::from("thumbs/page_1.jpg")),
            },
            PreviewEntry {
                page_number: 2,
                media_type: Some("image/jpeg".to_string()),
                saved_to: None,
            },
        ];

        let text = format_preview_text(&entries, &selection);

        assert!(text.contains("PAGE PREVIEWS (2 pages)"));
        assert!(text.contains("thumbs/page_1.jpg"));
        assert!(text.contains("of 2 pages selected"));
    }

    #[test]
    fn test_format_artifacts_text() {
        let saved = vec![SavedArtifact {
            label: "page image".to_string(),
            path: PathBuf::from("page_3_detections.jpg"),
            bytes: 2048,
            hint: Some("fireplan download job-1 3".to_string()),
        }];

        let text = format_artifacts_text(&saved);

        assert!(text.contains("page_3_detections.jpg"));
        assert!(text.contains("fireplan download job-1 3"));
    }
}
