//! Extracted movie records
//!
//! A [`Record`] is the structured result for one successfully fetched page.
//! It has a fixed core schema plus an extension mapping for the key/value
//! info rows each page defines for itself. `Record::fields` flattens both
//! into the ordered column list the checkpoint writer emits.

use std::fmt;

/// Prefix shared by every reaction counter column
pub const REACTION_PREFIX: &str = "reaction_";

/// Canonical reaction glyphs and the labels they are recorded under
pub const REACTIONS: [(&str, &str); 15] = [
    ("😌", "relaxed"),
    ("🤗", "hugging"),
    ("🤩", "starstruck"),
    ("😂", "laughing"),
    ("🤔", "thinking"),
    ("😳", "flushed"),
    ("😬", "grimacing"),
    ("😒", "unamused"),
    ("🥰", "loving"),
    ("🙏", "grateful"),
    ("😢", "crying"),
    ("🤯", "mindblown"),
    ("😰", "anxious"),
    ("🤐", "silent"),
    ("🤮", "disgusted"),
];

/// Core column names, in emission order around the dynamic groups
pub const COL_URL: &str = "url";
pub const COL_TITLE: &str = "title";
pub const COL_TITLE_EN: &str = "title_en";
pub const COL_RATING: &str = "myshows_rating";
pub const COL_TOP: &str = "myshows_top";
pub const COL_POSTER: &str = "poster_url";
pub const COL_ACTORS: &str = "actors";
pub const COL_DESCRIPTION: &str = "description";

const RESERVED_COLUMNS: [&str; 8] = [
    COL_URL,
    COL_TITLE,
    COL_TITLE_EN,
    COL_RATING,
    COL_TOP,
    COL_POSTER,
    COL_ACTORS,
    COL_DESCRIPTION,
];

/// Maps a glyph to its canonical label, falling back to the glyph itself
pub fn reaction_label(glyph: &str) -> &str {
    let lookup = glyph.trim_end_matches('\u{fe0f}');
    REACTIONS
        .iter()
        .find(|(g, _)| *g == lookup)
        .map(|(_, label)| *label)
        .unwrap_or(glyph)
}

/// Column name for a reaction label
pub fn reaction_column(label: &str) -> String {
    format!("{}{}", REACTION_PREFIX, label)
}

/// Returns true if a column name belongs to the fixed schema
pub fn is_reserved_column(name: &str) -> bool {
    RESERVED_COLUMNS.contains(&name) || name.starts_with(REACTION_PREFIX)
}

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Float(f64),
    Integer(u64),
    Absent,
}

impl FieldValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    fn from_option(value: Option<&String>) -> Self {
        value.map_or(Self::Absent, |v| Self::Text(v.clone()))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}", text),
            // Whole ratings keep their decimal point so the column reads as float
            Self::Float(value) if value.is_finite() && value.fract() == 0.0 => {
                write!(f, "{:.1}", value)
            }
            Self::Float(value) => write!(f, "{}", value),
            Self::Integer(value) => write!(f, "{}", value),
            Self::Absent => Ok(()),
        }
    }
}

/// Structured extraction result for one page
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub url: String,
    pub title: Option<String>,
    pub title_en: Option<String>,
    pub rating: Option<f64>,
    pub top: Option<u64>,
    pub poster_url: Option<String>,
    pub actors: String,
    pub description: Option<String>,

    /// Page-defined info rows, in first-seen order
    info: Vec<(String, String)>,

    /// Reaction counters keyed by label; canonical labels come first
    reactions: Vec<(String, u64)>,
}

impl Record {
    /// Creates an empty record for a URL, with every canonical reaction at 0
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            title_en: None,
            rating: None,
            top: None,
            poster_url: None,
            actors: String::new(),
            description: None,
            info: Vec::new(),
            reactions: REACTIONS
                .iter()
                .map(|(_, label)| (label.to_string(), 0))
                .collect(),
        }
    }

    /// Sets a page-defined info field
    ///
    /// Returns false (and stores nothing) when the key collides with the
    /// fixed schema. A repeated key keeps its position and takes the new value.
    pub fn set_info(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        if is_reserved_column(&key) {
            return false;
        }
        let value = value.into();
        match self.info.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.info.push((key, value)),
        }
        true
    }

    pub fn info(&self) -> &[(String, String)] {
        &self.info
    }

    pub fn info_value(&self, key: &str) -> Option<&str> {
        self.info
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets a reaction counter by label
    pub fn set_reaction(&mut self, label: impl Into<String>, count: u64) {
        let label = label.into();
        match self.reactions.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = count,
            None => self.reactions.push((label, count)),
        }
    }

    pub fn reaction(&self, label: &str) -> Option<u64> {
        self.reactions
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, count)| *count)
    }

    pub fn reactions(&self) -> &[(String, u64)] {
        &self.reactions
    }

    /// Flattens the record into ordered `(column, value)` pairs
    pub fn fields(&self) -> Vec<(String, FieldValue)> {
        let mut fields = Vec::with_capacity(8 + self.info.len() + self.reactions.len());

        fields.push((COL_URL.to_string(), FieldValue::Text(self.url.clone())));
        fields.push((
            COL_TITLE.to_string(),
            FieldValue::from_option(self.title.as_ref()),
        ));
        fields.push((
            COL_TITLE_EN.to_string(),
            FieldValue::from_option(self.title_en.as_ref()),
        ));

        for (key, value) in &self.info {
            fields.push((key.clone(), FieldValue::Text(value.clone())));
        }

        fields.push((
            COL_RATING.to_string(),
            self.rating.map_or(FieldValue::Absent, FieldValue::Float),
        ));
        fields.push((
            COL_TOP.to_string(),
            self.top.map_or(FieldValue::Absent, FieldValue::Integer),
        ));
        fields.push((
            COL_POSTER.to_string(),
            FieldValue::from_option(self.poster_url.as_ref()),
        ));

        for (label, count) in &self.reactions {
            fields.push((reaction_column(label), FieldValue::Integer(*count)));
        }

        fields.push((COL_ACTORS.to_string(), FieldValue::Text(self.actors.clone())));
        fields.push((
            COL_DESCRIPTION.to_string(),
            FieldValue::from_option(self.description.as_ref()),
        ));

        fields
    }

    /// Rebuilds a record from a checkpoint row
    ///
    /// Empty cells are treated as absent: an empty reaction cell leaves the
    /// record without that reaction (canonical ones stay at 0) and an empty
    /// info cell leaves the key unset. Returns None if the row has no URL.
    pub fn from_columns<'a, I>(columns: I) -> Option<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut url = None;
        let mut record = Record::new(String::new());

        for (column, cell) in columns {
            let text = (!cell.is_empty()).then(|| cell.to_string());
            match column {
                COL_URL => url = text,
                COL_TITLE => record.title = text,
                COL_TITLE_EN => record.title_en = text,
                COL_RATING => record.rating = cell.parse().ok(),
                COL_TOP => record.top = cell.parse().ok(),
                COL_POSTER => record.poster_url = text,
                COL_ACTORS => record.actors = cell.to_string(),
                COL_DESCRIPTION => record.description = text,
                _ => {
                    if let Some(label) = column.strip_prefix(REACTION_PREFIX) {
                        if !cell.is_empty() {
                            record.set_reaction(label, cell.parse().unwrap_or(0));
                        }
                    } else if let Some(value) = text {
                        record.set_info(column, value);
                    }
                }
            }
        }

        record.url = url?;
        Some(record)
    }
}
