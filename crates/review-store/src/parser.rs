//! Parser and writer for seed data files.
//!
//! All files are `::`-delimited, one record per line; free text always sits
//! in the last field so it may itself contain `::`.
//! - reviews.dat: id::movieId::authorId::authorName::stars::createdAtMs::sentiment::confidence::likedBy::dislikedBy::text
//! - legacy_reviews.dat: movieId::userId::userName::rating::timestampMs::sentiment::score::text
//! - movies.dat: movieId::title::genres (MovieLens format, ISO-8859-1)
//!
//! Empty fields mean "absent". Vote sets are comma-separated user ids.
//! Newlines and backslashes inside text are escaped as `\n` and `\\`.
//! Free-form fields before the text (ids, names, labels) additionally
//! escape `:` as `\c` and `,` as `\m`, so they never contain a delimiter.

use crate::adapters::millis_to_datetime;
use crate::error::{Result, StoreError};
use crate::types::*;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;
use std::str::FromStr;

const PRIMARY_FIELDS: usize = 11;
const LEGACY_FIELDS: usize = 8;
const MOVIE_FIELDS: usize = 3;

fn read_lines_utf8(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => StoreError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => StoreError::IoError(e),
    })?;
    Ok(content.lines().map(str::to_string).collect())
}

/// MovieLens files are ISO-8859-1; every byte maps straight to a code point
fn read_lines_latin1(path: &Path) -> Result<Vec<String>> {
    let mut file = File::open(path).map_err(|_| StoreError::FileNotFound {
        path: path.display().to_string(),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let content: String = bytes.iter().map(|&b| b as char).collect();
    Ok(content.lines().map(str::to_string).collect())
}

/// Split a line into exactly `expected` fields, the last one taking the rest
fn split_fields<'a>(line: &'a str, expected: usize, file: &str, line_no: usize) -> Result<Vec<&'a str>> {
    let parts: Vec<&str> = line.splitn(expected, "::").collect();
    if parts.len() != expected {
        return Err(StoreError::ParseError {
            file: file.to_string(),
            line: line_no,
            reason: format!("expected {} fields, found {}", expected, parts.len()),
        });
    }
    Ok(parts)
}

fn parse_field<T>(value: &str, name: &str, file: &str, line_no: usize) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| StoreError::ParseError {
        file: file.to_string(),
        line: line_no,
        reason: format!("Invalid {}: {}", name, e),
    })
}

fn parse_optional<T>(value: &str, name: &str, file: &str, line_no: usize) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_field(value, name, file, line_no).map(Some)
    }
}

fn optional_string(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| unescape_text(trimmed))
}

fn required_string(value: &str) -> String {
    unescape_text(value.trim())
}

fn parse_user_set(value: &str) -> BTreeSet<UserId> {
    value
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(unescape_text)
        .collect()
}

fn join_user_set(users: &BTreeSet<UserId>) -> String {
    users.iter().map(|id| escape_field(id)).collect::<Vec<_>>().join(",")
}

pub fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Escape a non-final field: no `:` or `,` may survive
pub fn escape_field(value: &str) -> String {
    escape_text(value).replace(':', "\\c").replace(',', "\\m")
}

pub fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            Some('m') => out.push(','),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Parse the primary store seed file (reviews.dat)
pub fn parse_primary_reviews(path: &Path) -> Result<Vec<PrimaryReviewRow>> {
    const FILE: &str = "reviews.dat";
    let lines = read_lines_utf8(path)?;
    let mut rows = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let f = split_fields(line, PRIMARY_FIELDS, FILE, line_no)?;

        let stars: u8 = parse_field(f[4], "stars", FILE, line_no)?;
        if !(MIN_STARS..=MAX_STARS).contains(&stars) {
            return Err(StoreError::InvalidValue {
                field: "stars".to_string(),
                value: stars.to_string(),
            });
        }
        let sentiment = match optional_string(f[6]) {
            Some(raw) => Some(SentimentLabel::normalize(&raw).ok_or_else(|| {
                StoreError::InvalidValue {
                    field: "sentiment".to_string(),
                    value: raw.clone(),
                }
            })?),
            None => None,
        };
        let confidence: Option<u8> = parse_optional(f[7], "confidence", FILE, line_no)?;
        let liked_by = parse_user_set(f[8]);
        let disliked_by = parse_user_set(f[9]);

        rows.push(PrimaryReviewRow {
            id: required_string(f[0]),
            movie_id: parse_field(f[1], "movieId", FILE, line_no)?,
            author_id: required_string(f[2]),
            author_name: required_string(f[3]),
            stars,
            created_at: millis_to_datetime(parse_field(f[5], "createdAt", FILE, line_no)?),
            sentiment,
            confidence: confidence.map(|c| c.min(100)),
            like_count: liked_by.len() as u32,
            dislike_count: disliked_by.len() as u32,
            liked_by,
            disliked_by,
            text: unescape_text(f[10]),
        });
    }
    Ok(rows)
}

/// Parse the legacy store seed file (legacy_reviews.dat)
pub fn parse_legacy_reviews(path: &Path) -> Result<Vec<LegacyReviewRow>> {
    const FILE: &str = "legacy_reviews.dat";
    let lines = read_lines_utf8(path)?;
    let mut rows = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let f = split_fields(line, LEGACY_FIELDS, FILE, line_no)?;

        rows.push(LegacyReviewRow {
            movie_id: parse_field(f[0], "movieId", FILE, line_no)?,
            user_id: optional_string(f[1]),
            user_name: optional_string(f[2]),
            rating: parse_field(f[3], "rating", FILE, line_no)?,
            timestamp_ms: parse_field(f[4], "timestamp", FILE, line_no)?,
            sentiment: optional_string(f[5]),
            score: parse_optional(f[6], "score", FILE, line_no)?,
            review_text: unescape_text(f[7]),
        });
    }
    Ok(rows)
}

/// Parse the movies.dat file
///
/// Format: movieId::title::genres, genres pipe-separated
pub fn parse_movies(path: &Path) -> Result<Vec<MovieMetadata>> {
    const FILE: &str = "movies.dat";
    let lines = read_lines_latin1(path)?;
    let mut movies = Vec::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue;
        }
        let f = split_fields(line_trimmed, MOVIE_FIELDS, FILE, line_no)?;

        movies.push(MovieMetadata {
            id: parse_field(f[0], "movieId", FILE, line_no)?,
            title: f[1].to_string(),
            year: extract_year_from_title(f[1]),
            genres: f[2]
                .split('|')
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect(),
        });
    }
    Ok(movies)
}

/// Write primary rows in the reviews.dat format
pub fn write_primary_reviews(path: &Path, rows: &[PrimaryReviewRow]) -> Result<()> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "{}::{}::{}::{}::{}::{}::{}::{}::{}::{}::{}\n",
            escape_field(&row.id),
            row.movie_id,
            escape_field(&row.author_id),
            escape_field(&row.author_name),
            row.stars,
            row.created_at.timestamp_millis(),
            row.sentiment.map(|s| s.as_str()).unwrap_or(""),
            row.confidence.map(|c| c.to_string()).unwrap_or_default(),
            join_user_set(&row.liked_by),
            join_user_set(&row.disliked_by),
            escape_text(&row.text),
        ));
    }
    let mut file = File::create(path)?;
    file.write_all(out.as_bytes())?;
    Ok(())
}

/// Write legacy rows in the legacy_reviews.dat format
pub fn write_legacy_reviews(path: &Path, rows: &[LegacyReviewRow]) -> Result<()> {
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "{}::{}::{}::{}::{}::{}::{}::{}\n",
            row.movie_id,
            row.user_id.as_deref().map(escape_field).unwrap_or_default(),
            row.user_name.as_deref().map(escape_field).unwrap_or_default(),
            row.rating,
            row.timestamp_ms,
            row.sentiment.as_deref().map(escape_field).unwrap_or_default(),
            row.score.map(|s| s.to_string()).unwrap_or_default(),
            escape_text(&row.review_text),
        ));
    }
    let mut file = File::create(path)?;
    file.write_all(out.as_bytes())?;
    Ok(())
}

/// Extract year from movie title
///
/// Example: "Toy Story (1995)" -> Some(1995)
///          "Movie Title" -> None
fn extract_year_from_title(title: &str) -> Option<u16> {
    let start = title.rfind('(')?;
    let end = title.rfind(')')?;
    if start < end {
        return title[start + 1..end].parse::<u16>().ok();
    }
    None
}
