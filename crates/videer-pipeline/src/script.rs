//! Narration script parsing.
//!
//! A script is plain text split into segments at blank-line boundaries.
//! Inside a paragraph, a line starting with `>> ` supplies the segment's
//! footage-search text instead of deriving keywords from the narration.

use videer_models::NarrationSegment;

use crate::error::{PipelineError, PipelineResult};

/// Prefix marking a footage-search override line.
const OVERRIDE_PREFIX: &str = ">>";

/// Split narration text into ordered segments.
pub fn parse_script(text: &str, voice: &str) -> PipelineResult<Vec<NarrationSegment>> {
    let mut segments = Vec::new();

    for block in text.split("\n\n") {
        let mut narration_lines: Vec<&str> = Vec::new();
        let mut override_lines: Vec<&str> = Vec::new();

        for line in block.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(rest) = trimmed.strip_prefix(OVERRIDE_PREFIX) {
                override_lines.push(rest.trim());
            } else {
                narration_lines.push(trimmed);
            }
        }

        if narration_lines.is_empty() {
            continue;
        }

        let mut segment =
            NarrationSegment::new(segments.len(), narration_lines.join(" "), voice);
        if !override_lines.is_empty() {
            segment.search_override = Some(override_lines.join(" "));
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        return Err(PipelineError::EmptyScript);
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paragraphs_become_segments() {
        let script = "The sun rises over the bay.\n\nFishing boats head out to sea.";
        let segments = parse_script(script, "amy").unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].index, 0);
        assert_eq!(segments[0].text, "The sun rises over the bay.");
        assert_eq!(segments[1].index, 1);
        assert_eq!(segments[1].text, "Fishing boats head out to sea.");
    }

    #[test]
    fn test_multiline_paragraph_joins_lines() {
        let script = "One long thought\nspread over two lines.";
        let segments = parse_script(script, "amy").unwrap();
        assert_eq!(segments[0].text, "One long thought spread over two lines.");
    }

    #[test]
    fn test_search_override_line() {
        let script = "Our hero walks into the unknown.\n>> foggy forest path\n\nThe end.";
        let segments = parse_script(script, "amy").unwrap();
        assert_eq!(
            segments[0].search_override.as_deref(),
            Some("foggy forest path")
        );
        assert_eq!(segments[0].text, "Our hero walks into the unknown.");
        assert_eq!(segments[0].search_text(), "foggy forest path");
        assert!(segments[1].search_override.is_none());
    }

    #[test]
    fn test_blank_heavy_script() {
        let script = "\n\n\nFirst.\n\n\n\nSecond.\n\n";
        let segments = parse_script(script, "amy").unwrap();
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_empty_script_is_an_error() {
        assert!(matches!(
            parse_script("\n\n   \n", "amy"),
            Err(PipelineError::EmptyScript)
        ));
    }

    #[test]
    fn test_override_only_paragraph_is_skipped() {
        let script = ">> just keywords, no narration\n\nActual narration.";
        let segments = parse_script(script, "amy").unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "Actual narration.");
    }

    #[test]
    fn test_voice_is_applied() {
        let segments = parse_script("Hello.", "joe").unwrap();
        assert_eq!(segments[0].voice, "joe");
    }
}
