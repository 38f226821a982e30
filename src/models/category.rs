use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;
use uuid::Uuid;

/// Label assigned when no category keyword matches.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Color shown for receipts whose category no longer exists.
pub const UNKNOWN_CATEGORY_COLOR: &str = "#6B7280";

pub const PALETTE: [&str; 8] = [
    "#10B981", "#3B82F6", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#14B8A6", "#F97316",
];

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("hex color pattern is valid"));

/// A named spending bucket. Receipts reference it by `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    id: Uuid,
    name: String,
    color: String,
    keywords: Vec<String>,
}

impl Category {
    pub fn new(
        name: &str,
        color: &str,
        keywords: Vec<String>,
    ) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), name, color, keywords)
    }

    /// Builds a category that keeps an existing identifier, used when editing.
    pub fn with_id(
        id: Uuid,
        name: &str,
        color: &str,
        keywords: Vec<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            });
        }

        if !HEX_COLOR.is_match(color) {
            return Err(ValidationError::InvalidFormat {
                field: "color".to_string(),
                reason: format!("'{}' is not a #RRGGBB value", color),
            });
        }

        Ok(Self::from_parts(id, name, color, keywords))
    }

    fn from_parts(id: Uuid, name: &str, color: &str, keywords: Vec<String>) -> Self {
        Self {
            id,
            name: name.to_string(),
            color: color.to_string(),
            keywords: keywords
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

/// Categories a fresh ledger starts with. Order matters for detection.
pub fn default_categories() -> Vec<Category> {
    let defaults: [(&str, &str, &[&str]); 6] = [
        (
            "Groceries",
            "#10B981",
            &["magnit", "pyaterochka", "auchan", "perekrestok", "milk", "bread"],
        ),
        ("Transport", "#3B82F6", &["taxi", "yandex", "uber", "metro", "gasoline"]),
        ("Entertainment", "#F59E0B", &["cinema", "theater", "restaurant", "cafe", "bar"]),
        ("Health", "#EF4444", &["pharmacy", "medicine", "clinic"]),
        ("Clothing", "#8B5CF6", &["zara", "h&m", "shoes", "clothing"]),
        (FALLBACK_CATEGORY, UNKNOWN_CATEGORY_COLOR, &[]),
    ];

    defaults
        .iter()
        .map(|(name, color, keywords)| {
            Category::from_parts(
                Uuid::new_v4(),
                name,
                color,
                keywords.iter().map(|k| k.to_string()).collect(),
            )
        })
        .collect()
}

/// User input for creating or editing a category, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub color: Option<String>,
    pub keywords: Vec<String>,
}

impl CategoryDraft {
    /// Parses `name; #RRGGBB; keyword, keyword`. Color and keywords are optional.
    pub fn parse(input: &str) -> Self {
        let mut parts = input.splitn(3, ';').map(str::trim);
        let name = parts.next().unwrap_or("").to_string();
        let color = parts
            .next()
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let keywords = parts
            .next()
            .map(|k| {
                k.split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            name,
            color,
            keywords,
        }
    }

    pub fn build(self, id: Option<Uuid>) -> Result<Category, ValidationError> {
        let color = self.color.as_deref().unwrap_or(PALETTE[0]);
        match id {
            Some(id) => Category::with_id(id, &self.name, color, self.keywords),
            None => Category::new(&self.name, color, self.keywords),
        }
    }
}

/// Splits a validated `#RRGGBB` string into its channels.
pub fn hex_to_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
