// crates/duoscope-ui/src/helpers/format.rs
//
// Display strings for the toolbar and inspector. Frame/time formatting lives
// in duoscope_core::helpers::frames; this is only about labels.

use std::path::Path;

/// File name of `path`, shortened to `max_chars` with a trailing "…".
/// `None` reads as "no file".
pub fn file_label(path: Option<&Path>, max_chars: usize) -> String {
    let Some(name) = path.and_then(|p| p.file_name()).map(|n| n.to_string_lossy()) else {
        return "no file".into();
    };
    if name.chars().count() <= max_chars {
        return name.into_owned();
    }
    let keep = max_chars.saturating_sub(1);
    name.chars().take(keep).collect::<String>() + "…"
}

/// Ruler length for the readout panel.
pub fn length_label(length: Option<f64>) -> String {
    match length {
        Some(l) => format!("{l:.3} px"),
        None    => "—".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_are_kept() {
        assert_eq!(file_label(Some(Path::new("/v/left.mp4")), 20), "left.mp4");
    }

    #[test]
    fn long_names_are_truncated() {
        let s = file_label(Some(Path::new("/v/camera_north_2024.mp4")), 8);
        assert_eq!(s, "camera_…");
        assert_eq!(s.chars().count(), 8);
    }

    #[test]
    fn missing_file_and_length() {
        assert_eq!(file_label(None, 10), "no file");
        assert_eq!(length_label(None), "—");
        assert_eq!(length_label(Some(5.0)), "5.000 px");
    }
}
