//! Conversion reports in JSON and plain text.

use serde::Serialize;

use crate::encode::{ConflictRecord, EncodedBundle, Mode};
use crate::palette::PaletteIndex;

/// Conflict entries listed in the text report before the rest are omitted.
pub const CONFLICT_DISPLAY_CAP: usize = 25;

/// Summary of one bitmap conversion or analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub mode: Mode,
    pub image_size: [u32; 2],
    pub palette_used: Vec<PaletteIndex>,
    pub background_color: PaletteIndex,
    pub conflicts: Vec<ConflictRecord>,
    pub fixed_cells: usize,
}

impl Report {
    /// Build a report from an encoded bundle.
    ///
    /// `background_color` is the background the conversion settled on, even
    /// for hires modes where the encoder itself ignores it.
    pub fn from_bundle(
        bundle: &EncodedBundle,
        image_size: (u32, u32),
        palette_used: Vec<PaletteIndex>,
        background_color: PaletteIndex,
    ) -> Self {
        Self {
            mode: bundle.mode,
            image_size: [image_size.0, image_size.1],
            palette_used,
            background_color,
            conflicts: bundle.conflicts.clone(),
            fixed_cells: bundle.fixed_units,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable summary, one fact per line.
    pub fn to_text(&self) -> String {
        let mut lines = vec![
            format!("mode: {}", self.mode),
            format!("image_size: [{}, {}]", self.image_size[0], self.image_size[1]),
            format!("palette_used: {} colors", self.palette_used.len()),
            format!("conflicts: {}", self.conflicts.len()),
        ];
        if !self.conflicts.is_empty() {
            lines.push("conflict_cells:".to_string());
            for conflict in self.conflicts.iter().take(CONFLICT_DISPLAY_CAP) {
                lines.push(conflict_line(conflict));
            }
            if self.conflicts.len() > CONFLICT_DISPLAY_CAP {
                lines.push("... more conflicts omitted".to_string());
            }
        }
        lines.join("\n") + "\n"
    }
}

fn conflict_line(conflict: &ConflictRecord) -> String {
    let colors = conflict.colors.iter().map(|c| c.to_string()).collect::<Vec<_>>().join(", ");
    format!("- {}: [{}]", conflict.unit_label(), colors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conflict(x: u32, y: u32) -> ConflictRecord {
        ConflictRecord {
            cell_x: Some(x),
            cell_y: Some(y),
            colors: vec![0, 1, 2],
            background_color: None,
        }
    }

    fn report(conflicts: Vec<ConflictRecord>) -> Report {
        Report {
            mode: Mode::BitmapHires,
            image_size: [320, 200],
            palette_used: vec![0, 1, 2],
            background_color: 0,
            fixed_cells: conflicts.len(),
            conflicts,
        }
    }

    #[test]
    fn test_text_without_conflicts() {
        let text = report(Vec::new()).to_text();
        assert_eq!(
            text,
            "mode: bitmap_hires\nimage_size: [320, 200]\npalette_used: 3 colors\nconflicts: 0\n"
        );
    }

    #[test]
    fn test_text_lists_conflicts() {
        let text = report(vec![conflict(3, 4)]).to_text();
        assert!(text.contains("conflict_cells:\n- cell (3,4): [0, 1, 2]\n"));
        assert!(!text.contains("omitted"));
    }

    #[test]
    fn test_text_caps_conflict_list() {
        let conflicts = (0..30).map(|i| conflict(i, 0)).collect();
        let text = report(conflicts).to_text();
        assert_eq!(text.matches("- cell").count(), CONFLICT_DISPLAY_CAP);
        assert!(text.contains("- cell (24,0)"));
        assert!(!text.contains("- cell (25,0)"));
        assert!(text.ends_with("... more conflicts omitted\n"));
    }

    #[test]
    fn test_json_field_names() {
        let json: serde_json::Value =
            serde_json::from_str(&report(vec![conflict(1, 2)]).to_json().unwrap()).unwrap();
        assert_eq!(json["mode"], "bitmap_hires");
        assert_eq!(json["image_size"], serde_json::json!([320, 200]));
        assert_eq!(json["fixed_cells"], 1);
        assert_eq!(json["conflicts"][0]["cell_x"], 1);
    }
}
