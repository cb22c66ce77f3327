//! Showcase: a random sample of a finished dataset, rendered as text cards
//!
//! The dataset is a CSV table with at least `movie_title`, `description` and
//! `image_url` columns. Rows are identified by their zero-based position.

use rand::Rng;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TITLE_COLUMN: &str = "movie_title";
pub const DESCRIPTION_COLUMN: &str = "description";
pub const IMAGE_COLUMN: &str = "image_url";

const REQUIRED_COLUMNS: [&str; 3] = [TITLE_COLUMN, DESCRIPTION_COLUMN, IMAGE_COLUMN];
const CARDS_PER_BLOCK: usize = 2;

/// Dataset problems reported to the user instead of rendering
#[derive(Debug, Error)]
pub enum ShowcaseError {
    #[error("Dataset file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Dataset could not be read: {0}")]
    Malformed(String),

    #[error("Dataset is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

/// One row of the dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRow {
    pub index: usize,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

/// A row prepared for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub index: usize,
    pub title: String,
    pub description: String,
    pub image_url: String,

    /// True when `image_url` is the placeholder
    pub placeholder: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub cards: Vec<Card>,

    /// Set when fewer rows than requested were available
    pub warning: Option<String>,
}

/// Loads a dataset table
///
/// # Errors
///
/// * `ShowcaseError::NotFound` - No file at `path`
/// * `ShowcaseError::Malformed` - The file is not valid UTF-8 CSV
/// * `ShowcaseError::MissingColumns` - One of the required columns is absent
pub fn load_dataset(path: &Path) -> Result<Dataset, ShowcaseError> {
    if !path.is_file() {
        return Err(ShowcaseError::NotFound(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|e| ShowcaseError::Malformed(e.to_string()))?;
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let mut reader = csv::ReaderBuilder::new().from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| ShowcaseError::Malformed(e.to_string()))?
        .clone();

    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let found = REQUIRED_COLUMNS.map(position);
    let (title_at, description_at, image_at) = match found {
        [Some(t), Some(d), Some(i)] => (t, d, i),
        _ => {
            let missing = REQUIRED_COLUMNS
                .iter()
                .zip(found)
                .filter(|(_, at)| at.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(ShowcaseError::MissingColumns(missing));
        }
    };

    let mut rows = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| ShowcaseError::Malformed(e.to_string()))?;
        let cell = |at: usize| row.get(at).unwrap_or_default().to_string();
        let image_url = Some(cell(image_at)).filter(|url| !url.trim().is_empty());

        rows.push(DatasetRow {
            index,
            title: cell(title_at),
            description: cell(description_at),
            image_url,
        });
    }

    tracing::debug!("Loaded {} dataset rows from {}", rows.len(), path.display());
    Ok(Dataset { rows })
}

impl Dataset {
    pub fn from_rows(rows: Vec<DatasetRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Picks up to `n` distinct rows at random
    ///
    /// When fewer than `n` rows exist every row is returned, in table order,
    /// together with a warning. Rows without an image get `placeholder`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, n: usize, placeholder: &str) -> Selection {
        let (picked, warning): (Vec<&DatasetRow>, _) = if self.rows.is_empty() {
            (Vec::new(), Some("The dataset has no rows".to_string()))
        } else if self.rows.len() < n {
            (
                self.rows.iter().collect(),
                Some(format!(
                    "The dataset has fewer than {} movies; showing all {}",
                    n,
                    self.rows.len()
                )),
            )
        } else {
            let picked = rand::seq::index::sample(rng, self.rows.len(), n)
                .into_iter()
                .map(|i| &self.rows[i])
                .collect();
            (picked, None)
        };

        let cards = picked
            .into_iter()
            .map(|row| Card::from_row(row, placeholder))
            .collect();

        Selection { cards, warning }
    }
}

impl Card {
    fn from_row(row: &DatasetRow, placeholder: &str) -> Self {
        let (image_url, is_placeholder) = match &row.image_url {
            Some(url) => (url.trim().to_string(), false),
            None => (placeholder.to_string(), true),
        };
        Self {
            index: row.index,
            title: row.title.clone(),
            description: row.description.clone(),
            image_url,
            placeholder: is_placeholder,
        }
    }
}

/// Renders the selection as text, two cards per block
pub fn render_selection(selection: &Selection) -> String {
    let mut out = String::new();
    if let Some(warning) = &selection.warning {
        out.push_str(&format!("Warning: {}\n\n", warning));
    }

    for (block, cards) in selection.cards.chunks(CARDS_PER_BLOCK).enumerate() {
        out.push_str(&format!("--- {} ---\n", block + 1));
        for card in cards {
            out.push_str(&format!("🎥 {} (ID {})\n", card.title, card.index));
            out.push_str(&format!("   image: {}\n", card.image_url));
            if !card.description.is_empty() {
                out.push_str(&format!("   {}\n", card.description));
            }
        }
        out.push('\n');
    }
    out
}
