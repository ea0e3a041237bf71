//! View model for Gemini analysis results.
//!
//! The response is produced by an LLM, so every section may be missing, have
//! an unexpected shape, or carry an `{"error": ...}` object instead of data.
//! Each section becomes one card and every field has a fallback.

use chrono::{DateTime, NaiveDateTime};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::api::GeminiResponse;

pub const NOT_PROVIDED: &str = "Not provided";
pub const NOT_SPECIFIED: &str = "Not specified";
pub const NONE_IDENTIFIED: &str = "None identified";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardItem {
    Field { label: String, value: String },
    List { label: String, entries: Vec<String> },
    Bullet { text: String },
    Note { page: Option<String>, note_type: String, content: String },
    Empty { message: String },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub title: String,
    pub items: Vec<CardItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeminiView {
    pub job_id: Option<String>,
    pub cards: Vec<Card>,
}

const PROJECT_FIELDS: &[(&str, &[&str])] = &[
    ("Project Name", &["project_name"]),
    ("Location", &["location", "project_location"]),
    ("Project Type", &["project_type"]),
    ("Project Number", &["project_number"]),
    ("Owner", &["owner"]),
    ("Architect", &["architect"]),
    ("Engineer", &["engineer"]),
    ("Scope Summary", &["scope_summary"]),
];

const CODE_CATEGORIES: &[(&str, &str)] = &[
    ("building_codes", "Building Codes"),
    ("fire_codes", "Fire Codes"),
    ("electrical_codes", "Electrical Codes"),
    ("fire_alarm_standards", "Fire Alarm Standards"),
    ("local_codes", "Local Codes"),
];

/// Build one card per category of a successful Gemini response.
pub fn build_gemini_view(response: &GeminiResponse) -> GeminiView {
    GeminiView {
        job_id: response.job_id.clone(),
        cards: vec![
            project_card(&response.project_info),
            codes_card(&response.code_requirements),
            pages_card(&response.fire_alarm_pages),
            notes_card(&response.fire_alarm_notes),
            mechanical_card(&response.mechanical_devices),
            specifications_card(&response.specifications),
            summary_card(response),
        ],
    }
}

fn section_error(value: &Value) -> Option<CardItem> {
    value
        .get("error")
        .and_then(value_text)
        .map(|message| CardItem::Error { message })
}

fn project_card(info: &Value) -> Card {
    let mut items: Vec<CardItem> = section_error(info).into_iter().collect();

    for (label, keys) in PROJECT_FIELDS {
        let value = keys
            .iter()
            .find_map(|key| info.get(*key).and_then(value_text))
            .unwrap_or_else(|| NOT_PROVIDED.to_string());
        items.push(CardItem::Field {
            label: label.to_string(),
            value,
        });
    }

    Card {
        title: "Project Information".to_string(),
        items,
    }
}

fn codes_card(codes: &Value) -> Card {
    let mut items: Vec<CardItem> = section_error(codes).into_iter().collect();

    for (key, label) in CODE_CATEGORIES {
        items.push(list_or_fallback(label, codes.get(*key), NOT_SPECIFIED));
    }

    // Categories the model invented on its own
    if let Some(map) = codes.as_object() {
        for (key, value) in map {
            if key == "error" || CODE_CATEGORIES.iter().any(|(k, _)| *k == key.as_str()) {
                continue;
            }
            items.push(list_or_fallback(&humanize_key(key), Some(value), NOT_SPECIFIED));
        }
    }

    Card {
        title: "Code Requirements".to_string(),
        items,
    }
}

fn pages_card(pages: &Value) -> Card {
    let numbers: Vec<String> = pages
        .as_array()
        .map(|pages| pages.iter().filter_map(value_text).collect())
        .unwrap_or_default();

    let mut items: Vec<CardItem> = section_error(pages).into_iter().collect();

    if numbers.is_empty() {
        items.push(CardItem::Empty {
            message: "No fire alarm pages identified".to_string(),
        });
    } else {
        items.extend([
            CardItem::Field {
                label: "Count".to_string(),
                value: numbers.len().to_string(),
            },
            CardItem::Field {
                label: "Pages".to_string(),
                value: numbers.join(", "),
            },
        ]);
    }

    Card {
        title: "Fire Alarm Pages".to_string(),
        items,
    }
}

fn notes_card(notes: &Value) -> Card {
    let mut items: Vec<CardItem> = section_error(notes).into_iter().collect();

    for note in notes.as_array().into_iter().flatten() {
        match note {
            Value::Object(map) => {
                let Some(content) = map.get("content").and_then(value_text) else {
                    continue;
                };
                items.push(CardItem::Note {
                    page: map.get("page").and_then(value_text),
                    note_type: map
                        .get("note_type")
                        .and_then(value_text)
                        .unwrap_or_else(|| "General".to_string()),
                    content,
                });
            }
            other => {
                if let Some(text) = value_text(other) {
                    items.push(CardItem::Bullet { text });
                }
            }
        }
    }

    if items.is_empty() {
        items.push(CardItem::Empty {
            message: "No project-specific fire alarm notes found".to_string(),
        });
    }

    Card {
        title: "Fire Alarm Notes".to_string(),
        items,
    }
}

fn mechanical_card(devices: &Value) -> Card {
    let mut items: Vec<CardItem> = section_error(devices).into_iter().collect();

    match devices {
        Value::Array(list) => {
            items.extend(
                list.iter()
                    .filter_map(Value::as_object)
                    .map(|d| CardItem::Bullet {
                        text: describe_mechanical_device(d),
                    }),
            );
            if items.is_empty() {
                items.push(CardItem::Empty {
                    message: "No mechanical fire alarm devices found".to_string(),
                });
            }
        }
        _ => {
            for (key, label) in [("duct_detectors", "Duct Detectors"), ("dampers", "Dampers")] {
                let entries: Vec<String> = devices
                    .get(key)
                    .and_then(Value::as_array)
                    .map(|list| {
                        list.iter()
                            .filter_map(Value::as_object)
                            .map(describe_mechanical_device)
                            .collect()
                    })
                    .unwrap_or_default();

                items.push(if entries.is_empty() {
                    CardItem::Field {
                        label: label.to_string(),
                        value: NONE_IDENTIFIED.to_string(),
                    }
                } else {
                    CardItem::List {
                        label: label.to_string(),
                        entries,
                    }
                });
            }
        }
    }

    Card {
        title: "Mechanical Coordination".to_string(),
        items,
    }
}

/// `"Duct Smoke Detector @ RTU-1 (page 12, qty 2): provide relay to FACP"`
fn describe_mechanical_device(device: &Map<String, Value>) -> String {
    let mut line =
        first_text(device, &["device_type", "device"]).unwrap_or_else(|| "Device".to_string());

    if let Some(location) = first_text(device, &["location"]) {
        line.push_str(&format!(" @ {location}"));
    }

    let mut meta = Vec::new();
    if let Some(page) = first_text(device, &["page"]) {
        meta.push(format!("page {page}"));
    }
    if let Some(quantity) = first_text(device, &["quantity"]) {
        meta.push(format!("qty {quantity}"));
    }
    if !meta.is_empty() {
        line.push_str(&format!(" ({})", meta.join(", ")));
    }

    if let Some(spec) = first_text(device, &["specifications", "action"]) {
        line.push_str(&format!(": {spec}"));
    }

    line
}

fn first_text(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| map.get(*k).and_then(value_text))
}

fn specifications_card(specs: &Value) -> Card {
    let mut items: Vec<CardItem> = section_error(specs).into_iter().collect();

    if let Some(map) = specs.as_object() {
        for (key, value) in map.iter().filter(|(k, _)| k.as_str() != "error") {
            items.push(CardItem::Field {
                label: humanize_key(key),
                value: value_text(value).unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            });
        }
    }

    if items.is_empty() {
        items.push(CardItem::Empty {
            message: "No fire alarm specifications extracted".to_string(),
        });
    }

    Card {
        title: "Specifications".to_string(),
        items,
    }
}

fn summary_card(response: &GeminiResponse) -> Card {
    Card {
        title: "Analysis Summary".to_string(),
        items: vec![
            CardItem::Field {
                label: "Total Pages".to_string(),
                value: response
                    .total_pages
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| NOT_PROVIDED.to_string()),
            },
            CardItem::Field {
                label: "Analyzed At".to_string(),
                value: response
                    .analysis_timestamp
                    .as_deref()
                    .filter(|t| !t.trim().is_empty())
                    .map(format_timestamp)
                    .unwrap_or_else(|| NOT_PROVIDED.to_string()),
            },
        ],
    }
}

fn list_or_fallback(label: &str, value: Option<&Value>, fallback: &str) -> CardItem {
    let entries: Vec<String> = match value {
        Some(Value::Array(list)) => list.iter().filter_map(value_text).collect(),
        Some(other) => value_text(other).into_iter().collect(),
        None => Vec::new(),
    };

    if entries.is_empty() {
        CardItem::Field {
            label: label.to_string(),
            value: fallback.to_string(),
        }
    } else {
        CardItem::List {
            label: label.to_string(),
            entries,
        }
    }
}

/// Render any JSON value as display text; `None` for null and blank values.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Bool(b) => Some(if *b { "Yes" } else { "No" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(list) => {
            let parts: Vec<String> = list.iter().filter_map(value_text).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(map) => {
            let parts: Vec<String> = map
                .iter()
                .filter_map(|(k, v)| value_text(v).map(|v| format!("{}: {v}", humanize_key(k))))
                .collect();
            (!parts.is_empty()).then(|| parts.join("; "))
        }
    }
}

/// `"CONTROL_PANEL"` and `"control_panel"` both become `"Control Panel"`.
pub fn humanize_key(key: &str) -> String {
    key.split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let lower = word.to_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format an ISO-8601 timestamp for display, passing unknown formats through.
pub fn format_timestamp(raw: &str) -> String {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y-%m-%d %H:%M:%S %:z").to_string();
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format("%Y-%m-%d %H:%M:%S").to_string();
    }

    raw.to_string()
}
