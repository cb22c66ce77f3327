//! Field extractor for movie pages
//!
//! This module turns page markup into a [`Record`]. Extraction never fails:
//! any element that cannot be found leaves its field absent (or at its
//! default), and nothing here performs I/O.

use crate::record::{reaction_label, Record};
use crate::SweepError;
use scraper::{ElementRef, Html, Selector};

/// Compiled selectors for every field group
///
/// Build once with [`Extractor::new`] and share it between workers.
#[derive(Debug)]
pub struct Extractor {
    title: Selector,
    title_en: Selector,
    info_title: Selector,
    rating_block: Selector,
    rating_value: Selector,
    rating_counter: Selector,
    poster: Selector,
    reaction_button: Selector,
    reaction_emoji: Selector,
    reaction_counter: Selector,
    character: Selector,
    character_name: Selector,
    description: Selector,
}

impl Extractor {
    /// Compiles the selector set
    pub fn new() -> Result<Self, SweepError> {
        Ok(Self {
            title: selector("h1.title__main-text")?,
            title_en: selector("div.MovieDetails__original")?,
            info_title: selector("td.info-row__title")?,
            rating_block: selector(".ShowRating-value")?,
            rating_value: selector("div")?,
            rating_counter: selector(".Counter")?,
            poster: selector("div.movie-poster__picture img")?,
            reaction_button: selector("div.Reactions button.ReactionButton")?,
            reaction_emoji: selector("span.ReactionButton__emoji")?,
            reaction_counter: selector("span.ReactionButton__counter")?,
            character: selector("div.Characters__list a.Character")?,
            character_name: selector("div.Character__name")?,
            description: selector("div.SlidingTabs__descriptioncontent .HtmlContent")?,
        })
    }

    /// Extracts a record from page markup
    ///
    /// # Arguments
    ///
    /// * `markup` - The HTML content of the page
    /// * `url` - The URL the markup was fetched from
    ///
    /// # Example
    ///
    /// ```
    /// use reel_sweep::crawler::Extractor;
    ///
    /// let extractor = Extractor::new().unwrap();
    /// let html = r#"<h1 class="title__main-text"> Брат </h1>"#;
    /// let record = extractor.extract(html, "https://myshows.me/movie/7");
    /// assert_eq!(record.title.as_deref(), Some("Брат"));
    /// assert_eq!(record.reaction("laughing"), Some(0));
    /// ```
    pub fn extract(&self, markup: &str, url: &str) -> Record {
        let document = Html::parse_document(markup);
        let mut record = Record::new(url);

        record.title = first(&document, &self.title).map(trimmed_text);
        record.title_en = first(&document, &self.title_en).map(trimmed_text);

        self.extract_info_rows(&document, &mut record);

        if let Some((rating, top)) = self.extract_rating(&document) {
            record.rating = Some(rating);
            record.top = Some(top);
        }

        record.poster_url = first(&document, &self.poster)
            .and_then(|img| img.value().attr("src"))
            .map(str::to_string);

        self.extract_reactions(&document, &mut record);

        record.actors = document
            .select(&self.character)
            .filter_map(|character| character.select(&self.character_name).next())
            .map(trimmed_text)
            .collect::<Vec<_>>()
            .join(", ");

        record.description = first(&document, &self.description).map(normalized_text);

        record
    }

    /// Collects title/value cell pairs into the record's extension fields
    fn extract_info_rows(&self, document: &Html, record: &mut Record) {
        for title_cell in document.select(&self.info_title) {
            let key = stripped_text(title_cell);

            let value_cell = title_cell
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|sibling| {
                    sibling.value().name() == "td"
                        && sibling.value().classes().any(|c| c == "info-row__value")
                });

            // Info values are never empty, so they survive a checkpoint reload
            let Some(value) = value_cell.map(stripped_text).filter(|v| !v.is_empty()) else {
                continue;
            };
            if !record.set_info(key.as_str(), value) {
                tracing::debug!("Ignoring info row '{}' on {}: reserved column", key, record.url);
            }
        }
    }

    /// Parses the rating and its popularity counter; both or neither
    fn extract_rating(&self, document: &Html) -> Option<(f64, u64)> {
        let block = first(document, &self.rating_block)?;

        let rating = block
            .select(&self.rating_value)
            .next()
            .map(trimmed_text)?
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())?;

        let counter: String = block
            .select(&self.rating_counter)
            .next()?
            .text()
            .flat_map(str::chars)
            .filter(|c| !matches!(c, '(' | ')') && !c.is_whitespace())
            .collect();
        let top = counter.parse::<u64>().ok()?;

        Some((rating, top))
    }

    /// Reads every reaction control, then relies on the record's canonical defaults
    fn extract_reactions(&self, document: &Html, record: &mut Record) {
        for button in document.select(&self.reaction_button) {
            let Some(emoji) = button.select(&self.reaction_emoji).next() else {
                continue;
            };
            let glyph = trimmed_text(emoji);
            if glyph.is_empty() {
                continue;
            }

            let count = button
                .select(&self.reaction_counter)
                .next()
                .map(trimmed_text)
                .filter(|text| !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()))
                .and_then(|text| text.parse::<u64>().ok())
                .unwrap_or(0);

            record.set_reaction(reaction_label(&glyph), count);
        }
    }
}

fn selector(css: &str) -> Result<Selector, SweepError> {
    Selector::parse(css).map_err(|e| SweepError::Selector {
        selector: css.to_string(),
        message: format!("{:?}", e),
    })
}

fn first<'a>(document: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    document.select(selector).next()
}

/// All text, concatenated, then trimmed
fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Each text node trimmed, empty ones dropped, the rest concatenated
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

/// Text with all whitespace runs collapsed to single spaces
fn normalized_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
