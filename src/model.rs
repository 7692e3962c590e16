use serde::Serialize;
use std::fmt;

/// Placeholder used when a source recipe carries no name.
pub const UNNAMED_RECIPE: &str = "Unnamed Recipe";

/// Marker placed in image payloads that were deliberately omitted upstream.
pub const TRUNCATION_SENTINEL: &str = "truncated for LLM context";

/// Canonical recipe produced by every parser and consumed by the formatter.
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<Step>,
    pub images: Vec<ImageRef>,
    pub metadata: Metadata,
}

impl Default for Recipe {
    fn default() -> Self {
        Self {
            name: UNNAMED_RECIPE.to_string(),
            ingredients: Vec::new(),
            instructions: Vec::new(),
            images: Vec::new(),
            metadata: Metadata::default(),
        }
    }
}

/// Free-form recipe details. Absent source fields stay at their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub source_url: String,
    pub source: String,
    pub cook_time: String,
    pub prep_time: String,
    pub total_time: String,
    pub servings: String,
    pub notes: String,
    pub nutrition_info: String,
    pub rating: i64,
    pub difficulty: String,
    pub tags: Vec<String>,
    /// Creation stamp recorded by the source app, not the conversion date
    pub created: String,
    pub uid: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ingredient {
    pub name: String,
    pub amount: Amount,
    pub unit: String,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, amount: Amount, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount,
            unit: unit.into(),
        }
    }
}

/// Ingredient quantity as found in the source: structured formats carry
/// numbers, flat text formats carry the literal token.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Amount {
    #[default]
    Empty,
    Number(serde_json::Number),
    Text(String),
}

impl Amount {
    pub fn from_json(value: Option<&serde_json::Value>) -> Self {
        match value {
            Some(serde_json::Value::Number(n)) => Amount::Number(n.clone()),
            Some(serde_json::Value::String(s)) if !s.is_empty() => Amount::Text(s.clone()),
            _ => Amount::Empty,
        }
    }

    /// Zero and empty amounts count as absent.
    pub fn is_present(&self) -> bool {
        match self {
            Amount::Empty => false,
            Amount::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
            Amount::Text(s) => !s.is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Amount::Empty => None,
            Amount::Number(n) => n.as_f64(),
            Amount::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn is_plural(&self) -> bool {
        self.as_f64().map(|v| v > 1.0).unwrap_or(false)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Empty => Ok(()),
            Amount::Number(n) => write!(f, "{n}"),
            Amount::Text(s) => f.write_str(s),
        }
    }
}

/// One instruction line, optionally opening a named section.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Step {
    pub text: String,
    pub is_section: bool,
    pub section_name: Option<String>,
}

impl Step {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_section: false,
            section_name: None,
        }
    }

    pub fn section(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_section: true,
            section_name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum ImageRef {
    Base64 { data: String, filename: String },
    Url { url: String, filename: String },
}

impl ImageRef {
    pub fn filename(&self) -> &str {
        match self {
            ImageRef::Base64 { filename, .. } | ImageRef::Url { filename, .. } => filename,
        }
    }

    pub fn is_truncated(&self) -> bool {
        matches!(self, ImageRef::Base64 { data, .. } if data.contains(TRUNCATION_SENTINEL))
    }
}

/// Replace every character outside `[A-Za-z0-9]` with an underscore.
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Sample Test Recipe"), "Sample_Test_Recipe");
        assert_eq!(sanitize_name("Mac & Cheese (v2)"), "Mac___Cheese__v2_");
        assert_eq!(sanitize_name("Crème brûlée"), "Cr_me_br_l_e");
    }

    #[test]
    fn test_amount_presence() {
        assert!(!Amount::Empty.is_present());
        assert!(!Amount::from_json(Some(&json!(0))).is_present());
        assert!(!Amount::from_json(Some(&json!(""))).is_present());
        assert!(Amount::from_json(Some(&json!(2))).is_present());
        assert!(Amount::Text("1/2".to_string()).is_present());
    }

    #[test]
    fn test_amount_plural() {
        assert!(Amount::from_json(Some(&json!(2))).is_plural());
        assert!(Amount::from_json(Some(&json!(1.5))).is_plural());
        assert!(!Amount::from_json(Some(&json!(1))).is_plural());
        assert!(Amount::Text("3".to_string()).is_plural());
        assert!(!Amount::Text("1/2".to_string()).is_plural());
    }

    #[test]
    fn test_amount_display_keeps_source_text() {
        assert_eq!(Amount::from_json(Some(&json!(2))).to_string(), "2");
        assert_eq!(Amount::from_json(Some(&json!(0.5))).to_string(), "0.5");
        assert_eq!(Amount::Text("1.25".to_string()).to_string(), "1.25");
        assert_eq!(Amount::Empty.to_string(), "");
    }

    #[test]
    fn test_truncated_image_detection() {
        let image = ImageRef::Base64 {
            data: "abc truncated for LLM context".to_string(),
            filename: "x.jpg".to_string(),
        };
        assert!(image.is_truncated());

        let url = ImageRef::Url {
            url: "https://example.com/truncated for LLM context".to_string(),
            filename: "x.jpg".to_string(),
        };
        assert!(!url.is_truncated());
    }
}
