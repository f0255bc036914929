//! Gaze sample payloads.
//!
//! Each streamed payload is a small XML document whose root carries
//! `GazeX` and `GazeY` child elements with textual floating point values:
//!
//! ```text
//! <GazeData><GazeX>812.5</GazeX><GazeY>400.25</GazeY></GazeData>
//! ```
//!
//! Other children (timestamps, head pose, ...) are ignored.

use crate::error::SampleError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// One gaze position in the tracker's native screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    pub x: f64,
    pub y: f64,
}

impl GazeSample {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Render this sample the way the tracker sends it.
    pub fn to_xml(&self) -> String {
        format!(
            "<GazeData><GazeX>{}</GazeX><GazeY>{}</GazeY></GazeData>",
            self.x, self.y
        )
    }
}

fn malformed(reason: impl Into<String>) -> SampleError {
    SampleError::MalformedSample {
        reason: reason.into(),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    X,
    Y,
}

/// Parse a sample document.
pub fn parse_sample(payload: &str) -> Result<GazeSample, SampleError> {
    let mut reader = Reader::from_str(payload);
    reader.trim_text(true);

    let mut depth = 0usize;
    let mut saw_root = false;
    let mut current: Option<Field> = None;
    let mut gaze_x: Option<String> = None;
    let mut gaze_y: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if depth == 0 && saw_root {
                    return Err(malformed("multiple root elements"));
                }
                depth += 1;
                saw_root = true;
                if depth == 2 {
                    current = match e.name().as_ref() {
                        b"GazeX" if gaze_x.is_none() => Some(Field::X),
                        b"GazeY" if gaze_y.is_none() => Some(Field::Y),
                        _ => None,
                    };
                }
            }
            Ok(Event::Empty(_)) => {
                if depth == 0 {
                    if saw_root {
                        return Err(malformed("multiple root elements"));
                    }
                    saw_root = true;
                }
            }
            Ok(Event::Text(text)) => {
                if depth == 2 {
                    if let Some(field) = current {
                        let value = text
                            .unescape()
                            .map_err(|e| malformed(format!("bad text: {e}")))?
                            .into_owned();
                        match field {
                            Field::X => gaze_x = Some(value),
                            Field::Y => gaze_y = Some(value),
                        }
                    }
                } else if depth == 0 {
                    return Err(malformed("text outside root element"));
                }
            }
            Ok(Event::End(_)) => {
                if depth == 2 {
                    current = None;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(malformed(format!("XML parse error: {e}"))),
        }
    }

    if !saw_root {
        return Err(malformed("no root element"));
    }
    if depth != 0 {
        return Err(malformed("unterminated element"));
    }

    let x = parse_coordinate("GazeX", gaze_x)?;
    let y = parse_coordinate("GazeY", gaze_y)?;
    Ok(GazeSample { x, y })
}

fn parse_coordinate(name: &str, raw: Option<String>) -> Result<f64, SampleError> {
    let raw = raw.ok_or_else(|| malformed(format!("{name} not found")))?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| malformed(format!("{name} is not a number: {raw:?}")))?;
    if !value.is_finite() {
        return Err(malformed(format!("{name} is not finite")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document() {
        let sample = parse_sample("<Gaze><GazeX>812.5</GazeX><GazeY>400</GazeY></Gaze>").unwrap();
        assert_eq!(sample, GazeSample::new(812.5, 400.0));
    }

    #[test]
    fn test_parse_ignores_extra_fields_and_whitespace() {
        let payload = r#"<?xml version="1.0"?>
            <GazeData>
                <Timestamp>123456</Timestamp>
                <GazeX> -3.25 </GazeX>
                <GazeY>1e3</GazeY>
                <HeadX>1</HeadX>
            </GazeData>"#;
        let sample = parse_sample(payload).unwrap();
        assert_eq!(sample, GazeSample::new(-3.25, 1000.0));
    }

    #[test]
    fn test_parse_roundtrips_own_xml() {
        let sample = GazeSample::new(1919.75, 0.5);
        assert_eq!(parse_sample(&sample.to_xml()).unwrap(), sample);
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let err = parse_sample("<Gaze><GazeX>1</GazeX></Gaze>").unwrap_err();
        assert!(err.to_string().contains("GazeY"));
    }

    #[test]
    fn test_nested_fields_do_not_count() {
        let payload = "<Gaze><Inner><GazeX>1</GazeX><GazeY>2</GazeY></Inner></Gaze>";
        assert!(parse_sample(payload).is_err());
    }

    #[test]
    fn test_non_numeric_is_malformed() {
        assert!(parse_sample("<Gaze><GazeX>left</GazeX><GazeY>2</GazeY></Gaze>").is_err());
        assert!(parse_sample("<Gaze><GazeX>NaN</GazeX><GazeY>2</GazeY></Gaze>").is_err());
    }

    #[test]
    fn test_garbage_is_malformed() {
        assert!(parse_sample("not xml at all").is_err());
        assert!(parse_sample("<Gaze><GazeX>1</GazeX>").is_err());
        assert!(parse_sample("<Gaze><GazeX>1</GazeY></Gaze>").is_err());
    }
}
