//! Parser for the ratings and movies CSV files.
//!
//! Formats (MovieLens "latest" layout, header row required):
//! - ratings.csv: userId,movieId,rating,timestamp
//! - movies.csv: movieId,title,genres
//!
//! Columns are located by header name, so column order and extra columns do
//! not matter. Fields may be double-quoted, which movies.csv needs for titles
//! such as `"American President, The (1995)"`.

use crate::error::{DataLoadError, Result};
use crate::types::*;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

const NO_GENRES: &str = "(no genres listed)";

fn open_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| DataLoadError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Turn a reader-level CSV failure into a parse error at the line it reports
fn csv_error(file: &str, err: csv::Error) -> DataLoadError {
    DataLoadError::ParseError {
        file: file.to_string(),
        line: err.position().map(|pos| pos.line() as usize).unwrap_or(0),
        reason: err.to_string(),
    }
}

/// CSV reader over `input` plus the header row, columns located by name
struct Table<'a, R: Read> {
    file: &'a str,
    reader: csv::Reader<R>,
    headers: StringRecord,
}

impl<'a, R: Read> Table<'a, R> {
    fn open(input: R, file: &'a str) -> Result<Self> {
        // Flexible so a short row reports the missing column by name
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(input);
        let headers = reader.headers().map_err(|e| csv_error(file, e))?.clone();
        if headers.iter().all(|name| name.is_empty()) {
            return Err(DataLoadError::ValidationError(format!("{} is empty", file)));
        }
        Ok(Self {
            file,
            reader,
            headers,
        })
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|name| name.trim_start_matches('\u{feff}') == column)
    }

    fn require(&self, column: &str) -> Result<usize> {
        self.position(column).ok_or_else(|| DataLoadError::MissingColumn {
            file: self.file.to_string(),
            column: column.to_string(),
        })
    }

    /// Remaining data rows, each tagged with the line it starts on
    fn rows(self) -> impl Iterator<Item = Result<Row<'a>>> {
        let file = self.file;
        self.reader.into_records().map(move |record| {
            let record = record.map_err(|e| csv_error(file, e))?;
            let line = record.position().map(|pos| pos.line() as usize).unwrap_or(0);
            Ok(Row { file, line, record })
        })
    }
}

/// One data row, with helpers that attach file/line context to failures
struct Row<'a> {
    file: &'a str,
    line: usize,
    record: StringRecord,
}

impl Row<'_> {
    fn field(&self, idx: usize, column: &str) -> Result<&str> {
        self.record
            .get(idx)
            .filter(|f| !f.is_empty())
            .ok_or_else(|| self.error(format!("Missing {}", column)))
    }

    fn parse_id(&self, idx: usize, column: &str) -> Result<u32> {
        let raw = self.field(idx, column)?;
        raw.parse()
            .map_err(|e| self.error(format!("Invalid {}: {} ({})", column, raw, e)))
    }

    fn parse_rating(&self, idx: usize) -> Result<f32> {
        let raw = self.field(idx, "rating")?;
        let rating: f32 = raw
            .parse()
            .map_err(|e| self.error(format!("Invalid rating: {} ({})", raw, e)))?;
        if !rating.is_finite() {
            return Err(self.error(format!("Non-finite rating: {}", raw)));
        }
        Ok(rating)
    }

    fn error(&self, reason: String) -> DataLoadError {
        DataLoadError::ParseError {
            file: self.file.to_string(),
            line: self.line,
            reason,
        }
    }
}

/// Parse the ratings.csv file
pub fn parse_ratings(path: &Path) -> Result<Vec<Rating>> {
    read_ratings(open_file(path)?, &file_label(path))
}

/// Parse ratings from CSV text. `file` is only used in error messages.
pub fn parse_ratings_str(text: &str, file: &str) -> Result<Vec<Rating>> {
    read_ratings(text.as_bytes(), file)
}

fn read_ratings<R: Read>(input: R, file: &str) -> Result<Vec<Rating>> {
    let table = Table::open(input, file)?;
    let user_col = table.require("userId")?;
    let movie_col = table.require("movieId")?;
    let rating_col = table.require("rating")?;

    let mut ratings = Vec::new();
    for row in table.rows() {
        let row = row?;
        ratings.push(Rating {
            movie_id: row.parse_id(movie_col, "movieId")?,
            user_id: row.parse_id(user_col, "userId")?,
            rating: row.parse_rating(rating_col)?,
        });
    }

    debug!("Parsed {} ratings from {}", ratings.len(), file);
    Ok(ratings)
}

/// Parse the movies.csv file
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    read_movies(open_file(path)?, &file_label(path))
}

/// Parse movies from CSV text. `file` is only used in error messages.
pub fn parse_movies_str(text: &str, file: &str) -> Result<Vec<Movie>> {
    read_movies(text.as_bytes(), file)
}

fn read_movies<R: Read>(input: R, file: &str) -> Result<Vec<Movie>> {
    let table = Table::open(input, file)?;
    let id_col = table.require("movieId")?;
    let title_col = table.require("title")?;
    let genres_col = table.position("genres");

    let mut movies = Vec::new();
    for row in table.rows() {
        let row = row?;
        let id = row.parse_id(id_col, "movieId")?;
        let title = row.field(title_col, "title")?;
        let genres = genres_col
            .and_then(|idx| row.record.get(idx))
            .map(parse_genres)
            .unwrap_or_default();

        movies.push(Movie::new(id, title).with_genres(genres));
    }

    debug!("Parsed {} movies from {}", movies.len(), file);
    Ok(movies)
}

/// Parse pipe-separated genres
///
/// Example: "Action|Adventure|Sci-Fi" -> vec!["Action", "Adventure", "Sci-Fi"]
fn parse_genres(s: &str) -> Vec<String> {
    let s = s.trim();
    if s.is_empty() || s == NO_GENRES {
        return Vec::new();
    }
    s.split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}
