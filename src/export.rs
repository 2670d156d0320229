use std::io::Write;

use color_eyre::{Result, eyre::Context};
use csv::{QuoteStyle, WriterBuilder};

use crate::persist::Entry;

/// Upper bound on the exported image field; inlined data URIs would
/// otherwise drown the spreadsheet.
const IMAGE_PREVIEW_CHARS: usize = 48;

/// One row per entry, every field quoted. Spreadsheet-friendly.
pub fn write_csv<W: Write>(entries: &[Entry], writer: W) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(writer);

    csv_writer
        .write_record(["Date", "Mood", "Summary", "Image URL"])
        .context("Failed to write CSV header")?;

    for record in entries {
        let preview = image_preview(&record.image_url);
        csv_writer
            .write_record([
                record.date.as_str(),
                record.mood.as_str(),
                record.summary.as_str(),
                preview.as_str(),
            ])
            .context("Failed to write CSV record")?;
    }

    csv_writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

fn image_preview(image_url: &str) -> String {
    if image_url.chars().count() <= IMAGE_PREVIEW_CHARS {
        return image_url.to_string();
    }
    let head: String = image_url.chars().take(IMAGE_PREVIEW_CHARS).collect();
    format!("{head}…")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn entry(date: &str, mood: &str, summary: &str, image_url: &str) -> Entry {
        Entry {
            id: "1700000000000".to_string(),
            date: date.to_string(),
            mood: mood.to_string(),
            image_url: image_url.to_string(),
            summary: summary.to_string(),
        }
    }

    fn export(entries: &[Entry]) -> String {
        let mut output = Vec::new();
        write_csv(entries, &mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn every_field_is_quoted() {
        let csv = export(&[entry("Jan 5", "calm", "slow morning", "selfie.jpg")]);
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines[0], r#""Date","Mood","Summary","Image URL""#);
        assert_eq!(lines[1], r#""Jan 5","calm","slow morning","selfie.jpg""#);
    }

    #[test]
    fn internal_quotes_are_doubled() {
        let csv = export(&[entry("Jan 5", "silly", r#"say "cheese" now"#, "selfie.jpg")]);
        assert!(csv.contains(r#""say ""cheese"" now""#));
    }

    #[test]
    fn long_image_fields_become_a_preview() {
        let data_uri = format!("data:image/png;base64,{}", "A".repeat(4000));
        let csv = export(&[entry("Jan 5", "calm", "note", &data_uri)]);

        let image_field = csv.lines().nth(1).unwrap().split("\",\"").last().unwrap();
        assert!(image_field.starts_with("data:image/png;base64,A"));
        assert!(image_field.contains('…'));
        assert!(image_field.len() < 200);
    }

    #[test]
    fn short_image_fields_pass_through_untouched() {
        assert_eq!(image_preview("selfie.jpg"), "selfie.jpg");
    }
}
