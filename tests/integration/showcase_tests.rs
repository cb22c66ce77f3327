//! Integration tests for the showcase sampler
//!
//! These tests write dataset tables to a temporary directory and check the
//! sample and the rendered cards.

use rand::rngs::StdRng;
use rand::SeedableRng;
use reel_sweep::config::ShowcaseConfig;
use reel_sweep::output::{load_dataset, render_selection, ShowcaseError};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Writes a dataset of `rows` movies; every third row has a blank image URL
fn write_dataset(dir: &TempDir, rows: usize) -> PathBuf {
    let mut content = String::from("movie_title,description,image_url\n");
    for i in 0..rows {
        let image = if i % 3 == 0 {
            String::new()
        } else {
            format!("https://img.example/{}.jpg", i)
        };
        content.push_str(&format!("Фильм {},\"Описание, часть {}\",{}\n", i, i, image));
    }

    let path = dir.path().join("basic_data.csv");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_twelve_rows_yield_ten_distinct_cards() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(&write_dataset(&dir, 12)).unwrap();
    let showcase = ShowcaseConfig::default();

    let mut rng = StdRng::seed_from_u64(2024);
    let selection = dataset.sample(&mut rng, showcase.sample_size, &showcase.placeholder_url);

    assert!(selection.warning.is_none());
    assert_eq!(selection.cards.len(), 10);
    let indices: HashSet<usize> = selection.cards.iter().map(|c| c.index).collect();
    assert_eq!(indices.len(), 10);

    for card in &selection.cards {
        if card.index % 3 == 0 {
            assert_eq!(card.image_url, showcase.placeholder_url);
            assert!(card.placeholder);
        } else {
            assert_eq!(card.image_url, format!("https://img.example/{}.jpg", card.index));
        }
        assert_eq!(card.description, format!("Описание, часть {}", card.index));
    }
}

#[test]
fn test_four_rows_yield_all_with_warning() {
    let dir = TempDir::new().unwrap();
    let dataset = load_dataset(&write_dataset(&dir, 4)).unwrap();
    let showcase = ShowcaseConfig::default();

    let mut rng = StdRng::seed_from_u64(1);
    let selection = dataset.sample(&mut rng, 10, &showcase.placeholder_url);

    assert_eq!(selection.cards.len(), 4);
    assert!(selection.warning.as_deref().unwrap().contains("fewer than 10"));

    let rendered = render_selection(&selection);
    assert!(rendered.starts_with("Warning:"));
    for i in 0..4 {
        assert!(rendered.contains(&format!("Фильм {} (ID {})", i, i)));
    }
}

#[test]
fn test_missing_columns_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("basic_data.csv");
    fs::write(&path, "title,description\nСолярис,Станция\n").unwrap();

    let err = load_dataset(&path).unwrap_err();
    assert!(matches!(err, ShowcaseError::MissingColumns(ref names) if names.len() == 2));
    assert!(err.to_string().contains("movie_title"));
}

#[test]
fn test_missing_file_reported() {
    let dir = TempDir::new().unwrap();
    let err = load_dataset(&dir.path().join("basic_data.csv")).unwrap_err();
    assert!(matches!(err, ShowcaseError::NotFound(_)));
}
