//! JSON syntax highlighting for the import/export dialog text areas.

use eframe::egui;
use egui::text::{LayoutJob, TextFormat};
use egui::{Color32, FontId};

struct Palette {
    key: Color32,
    string: Color32,
    number: Color32,
    keyword: Color32,
    default: Color32,
}

fn palette(dark_mode: bool) -> Palette {
    if dark_mode {
        Palette {
            key: Color32::from_rgb(120, 180, 255),
            string: Color32::from_rgb(150, 210, 140),
            number: Color32::from_rgb(240, 180, 120),
            keyword: Color32::from_rgb(200, 140, 220),
            default: Color32::from_gray(180),
        }
    } else {
        Palette {
            key: Color32::from_rgb(20, 90, 180),
            string: Color32::from_rgb(30, 130, 50),
            number: Color32::from_rgb(180, 90, 20),
            keyword: Color32::from_rgb(130, 40, 160),
            default: Color32::from_gray(70),
        }
    }
}

/// Produces a layout job coloring JSON keys, strings, numbers, and the
/// `true`/`false`/`null` keywords. Tolerant of partial or invalid input —
/// anything unrecognized renders in the default color.
pub fn highlight_json(text: &str, font_id: FontId, dark_mode: bool) -> LayoutJob {
    let colors = palette(dark_mode);
    let mut job = LayoutJob::default();
    let mut append = |job: &mut LayoutJob, slice: &str, color: Color32| {
        job.append(
            slice,
            0.0,
            TextFormat {
                font_id: font_id.clone(),
                color,
                ..Default::default()
            },
        );
    };

    let mut chars = text.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if c == '"' {
            // Scan to the closing quote, honoring escapes
            let mut end = text.len();
            let mut escaped = false;
            for (j, d) in chars.by_ref() {
                if escaped {
                    escaped = false;
                    continue;
                }
                match d {
                    '\\' => escaped = true,
                    '"' => {
                        end = j + 1;
                        break;
                    }
                    _ => {}
                }
            }
            // A string followed by ':' is an object key
            let is_key = text[end..].trim_start().starts_with(':');
            append(
                &mut job,
                &text[start..end],
                if is_key { colors.key } else { colors.string },
            );
        } else if c.is_ascii_digit() || c == '-' {
            let mut end = start + c.len_utf8();
            while let Some(&(j, d)) = chars.peek() {
                if d.is_ascii_digit() || matches!(d, '.' | 'e' | 'E' | '+' | '-') {
                    chars.next();
                    end = j + d.len_utf8();
                } else {
                    break;
                }
            }
            append(&mut job, &text[start..end], colors.number);
        } else if c.is_ascii_alphabetic() {
            let mut end = start + c.len_utf8();
            while let Some(&(j, d)) = chars.peek() {
                if d.is_ascii_alphanumeric() {
                    chars.next();
                    end = j + d.len_utf8();
                } else {
                    break;
                }
            }
            let word = &text[start..end];
            let color = if matches!(word, "true" | "false" | "null") {
                colors.keyword
            } else {
                colors.default
            };
            append(&mut job, word, color);
        } else {
            append(&mut job, &text[start..start + c.len_utf8()], colors.default);
        }
    }

    job
}

/// Creates a JSON-highlighting layouter for an `egui::TextEdit`.
pub fn json_layouter(
    dark_mode: bool,
) -> impl FnMut(&egui::Ui, &dyn egui::TextBuffer, f32) -> std::sync::Arc<egui::Galley> {
    move |ui: &egui::Ui, text: &dyn egui::TextBuffer, wrap_width: f32| {
        let font_id = egui::TextStyle::Monospace.resolve(ui.style());
        let mut layout_job = highlight_json(text.as_str(), font_id, dark_mode);
        layout_job.wrap.max_width = wrap_width;
        ui.fonts_mut(|f| f.layout_job(layout_job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_covers_full_text() {
        let text = r#"{"nodes": [], "count": 3, "ok": true}"#;
        let job = highlight_json(text, FontId::monospace(12.0), true);
        assert_eq!(job.text, text);
    }

    #[test]
    fn test_keys_and_values_get_distinct_colors() {
        let text = r#"{"label": "Sales Page"}"#;
        let job = highlight_json(text, FontId::monospace(12.0), true);

        let colors = palette(true);
        let key_section = job
            .sections
            .iter()
            .find(|s| &job.text[s.byte_range.clone()] == "\"label\"")
            .expect("key section present");
        let value_section = job
            .sections
            .iter()
            .find(|s| &job.text[s.byte_range.clone()] == "\"Sales Page\"")
            .expect("value section present");

        assert_eq!(key_section.format.color, colors.key);
        assert_eq!(value_section.format.color, colors.string);
    }

    #[test]
    fn test_tolerates_unterminated_string() {
        let text = r#"{"broken: "#;
        let job = highlight_json(text, FontId::monospace(12.0), false);
        assert_eq!(job.text, text);
    }
}
