use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizontalAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

/// Presentation attributes. `None` fields are unset; applying a format only
/// overwrites the fields it sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellFormat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_align: Option<HorizontalAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VerticalAlign>,
}

impl CellFormat {
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self == &Self::default()
    }

    #[must_use]
    pub fn number(pattern: &str) -> Self {
        Self {
            number_format: Some(pattern.to_owned()),
            ..Self::default()
        }
    }

    /// Overlay the fields set in `other` onto `self`.
    pub fn apply(&mut self, other: &CellFormat) {
        if other.number_format.is_some() {
            self.number_format.clone_from(&other.number_format);
        }
        if other.background.is_some() {
            self.background.clone_from(&other.background);
        }
        if other.font_color.is_some() {
            self.font_color.clone_from(&other.font_color);
        }
        self.font_size = other.font_size.or(self.font_size);
        self.bold = other.bold.or(self.bold);
        self.horizontal_align = other.horizontal_align.or(self.horizontal_align);
        self.vertical_align = other.vertical_align.or(self.vertical_align);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_keeps_fields_the_overlay_leaves_unset() {
        let mut base = CellFormat {
            background: Some("#38761d".into()),
            bold: Some(true),
            ..CellFormat::default()
        };
        base.apply(&CellFormat::number("R$ #,##0.00"));
        assert_eq!(base.background.as_deref(), Some("#38761d"));
        assert_eq!(base.bold, Some(true));
        assert_eq!(base.number_format.as_deref(), Some("R$ #,##0.00"));
        assert!(!base.is_unset());
        assert!(CellFormat::default().is_unset());
    }
}
