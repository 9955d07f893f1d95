//! Parser for `::`-delimited dataset files.
//!
//! A dataset directory holds:
//! - users.dat: `userId::email::login::name::birthday`
//! - films.dat: `filmId::name::releaseDate::duration::mpa::genres::description`
//!   where `mpa` is `id:name` (or empty) and `genres` is `id:name|id:name`
//! - marks.dat: `userId::filmId::mark`
//! - friends.dat: `userId::friendId` (one line per friendship, either direction)
//! - directors.dat (optional): `filmId::directorId::name`
//!
//! Dates use `YYYY-MM-DD`. Blank lines and lines starting with `#` are skipped.
//! Each line is split into at most as many fields as its file declares, so
//! the last field (a film description, say) may itself contain `::`.

use crate::error::{CatalogError, Result};
use crate::types::*;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// One rating line from marks.dat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkRecord {
    pub user_id: UserId,
    pub film_id: FilmId,
    pub mark: Mark,
}

/// One line from directors.dat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorCredit {
    pub film_id: FilmId,
    pub director: Director,
}

/// A split line with enough context to report errors.
struct Record<'a> {
    file: &'static str,
    line: usize,
    fields: Vec<&'a str>,
}

impl<'a> Record<'a> {
    fn error(&self, reason: impl Into<String>) -> CatalogError {
        CatalogError::Parse {
            file: self.file.to_string(),
            line: self.line,
            reason: reason.into(),
        }
    }

    fn field(&self, idx: usize, name: &str) -> Result<&'a str> {
        self.fields
            .get(idx)
            .map(|&s| s.trim())
            .ok_or_else(|| self.error(format!("Missing {}", name)))
    }

    /// Trailing fields may be left out entirely.
    fn optional(&self, idx: usize) -> &'a str {
        self.fields.get(idx).map_or("", |&s| s.trim())
    }

    fn parse<T>(&self, idx: usize, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.field(idx, name)?
            .parse()
            .map_err(|e| self.error(format!("Invalid {}: {}", name, e)))
    }

    fn date(&self, idx: usize, name: &str) -> Result<NaiveDate> {
        let raw = self.field(idx, name)?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|e| self.error(format!("Invalid {} '{}': {}", name, raw, e)))
    }
}

fn records<'a>(content: &'a str, file: &'static str, max_fields: usize) -> impl Iterator<Item = Record<'a>> {
    content.lines().enumerate().filter_map(move |(idx, line)| {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return None;
        }
        Some(Record {
            file,
            line: idx + 1,
            fields: trimmed.splitn(max_fields, "::").collect(),
        })
    })
}

/// Parse an `id:name` reference.
fn parse_reference<'a>(record: &Record<'_>, raw: &'a str, what: &str) -> Result<(u64, &'a str)> {
    let (id, name) = raw
        .split_once(':')
        .ok_or_else(|| record.error(format!("Expected id:name for {}, got '{}'", what, raw)))?;
    let id = id
        .trim()
        .parse()
        .map_err(|e| record.error(format!("Invalid {} id: {}", what, e)))?;
    Ok((id, name.trim()))
}

pub fn parse_users(path: &Path) -> Result<Vec<User>> {
    parse_users_str(&fs::read_to_string(path)?)
}

pub fn parse_users_str(content: &str) -> Result<Vec<User>> {
    records(content, "users.dat", 5)
        .map(|record| {
            Ok(User::new(
                record.parse(0, "userId")?,
                record.field(1, "email")?,
                record.field(2, "login")?,
                record.field(3, "name")?,
                record.date(4, "birthday")?,
            ))
        })
        .collect()
}

pub fn parse_films(path: &Path) -> Result<Vec<Film>> {
    parse_films_str(&fs::read_to_string(path)?)
}

pub fn parse_films_str(content: &str) -> Result<Vec<Film>> {
    records(content, "films.dat", 7)
        .map(|record| {
            let mut film = Film::new(
                record.parse(0, "filmId")?,
                record.field(1, "name")?,
                record.date(2, "releaseDate")?,
                record.parse(3, "duration")?,
            )
            .with_description(record.optional(6));

            let mpa = record.optional(4);
            if !mpa.is_empty() {
                let (id, name) = parse_reference(&record, mpa, "mpa")?;
                film = film.with_mpa(id, name);
            }

            for genre in record.optional(5).split('|').filter(|g| !g.trim().is_empty()) {
                let (id, name) = parse_reference(&record, genre, "genre")?;
                film = film.with_genre(id, name);
            }

            Ok(film)
        })
        .collect()
}

pub fn parse_marks(path: &Path) -> Result<Vec<MarkRecord>> {
    parse_marks_str(&fs::read_to_string(path)?)
}

pub fn parse_marks_str(content: &str) -> Result<Vec<MarkRecord>> {
    records(content, "marks.dat", 3)
        .map(|record| {
            let value: i64 = record.parse(2, "mark")?;
            Ok(MarkRecord {
                user_id: record.parse(0, "userId")?,
                film_id: record.parse(1, "filmId")?,
                mark: Mark::new(value).map_err(|e| record.error(e.to_string()))?,
            })
        })
        .collect()
}

pub fn parse_friendships(path: &Path) -> Result<Vec<(UserId, UserId)>> {
    parse_friendships_str(&fs::read_to_string(path)?)
}

pub fn parse_friendships_str(content: &str) -> Result<Vec<(UserId, UserId)>> {
    records(content, "friends.dat", 2)
        .map(|record| Ok((record.parse(0, "userId")?, record.parse(1, "friendId")?)))
        .collect()
}

pub fn parse_director_credits(path: &Path) -> Result<Vec<DirectorCredit>> {
    parse_director_credits_str(&fs::read_to_string(path)?)
}

pub fn parse_director_credits_str(content: &str) -> Result<Vec<DirectorCredit>> {
    records(content, "directors.dat", 3)
        .map(|record| {
            Ok(DirectorCredit {
                film_id: record.parse(0, "filmId")?,
                director: Director {
                    id: record.parse(1, "directorId")?,
                    name: record.field(2, "name")?.to_string(),
                },
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_users() {
        let users = parse_users_str(
            "# id::email::login::name::birthday\n\
             1::neo@matrix.io::neo::Thomas Anderson::1971-09-13\n\
             \n\
             2::trin@matrix.io::trinity::::1975-02-01\n",
        )
        .unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].name, "Thomas Anderson");
        assert_eq!(users[1].name, "trinity");
        assert!(users[1].friend_ids.is_empty());
    }

    #[test]
    fn test_parse_films_with_references() {
        let films = parse_films_str(
            "1::Heat::1995-12-15::170::4:R::6:Action|2:Drama::Cops and robbers\n\
             2::Short::2020-01-01::12::::\n",
        )
        .unwrap();

        assert_eq!(films[0].mpa.as_ref().map(|m| m.name.as_str()), Some("R"));
        let genres: Vec<GenreId> = films[0].genres.iter().map(|g| g.id).collect();
        assert_eq!(genres, vec![2, 6]);
        assert_eq!(films[0].description, "Cops and robbers");

        assert!(films[1].mpa.is_none());
        assert!(films[1].genres.is_empty());
    }

    #[test]
    fn test_description_keeps_separators() {
        let films = parse_films_str("1::Dune::2021-10-22::155::3:PG-13::6:Action::Part one:: of two\n").unwrap();
        assert_eq!(films[0].description, "Part one:: of two");
    }

    #[test]
    fn test_extra_fields_are_reported() {
        let err = parse_marks_str("1::1::8::9\n").unwrap_err();
        assert!(err.to_string().contains("mark"));
    }

    #[test]
    fn test_parse_marks_rejects_out_of_range() {
        let err = parse_marks_str("1::1::8\n2::1::11\n").unwrap_err();
        match err {
            CatalogError::Parse { file, line, .. } => {
                assert_eq!(file, "marks.dat");
                assert_eq!(line, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_field_reports_line() {
        let err = parse_friendships_str("1::2\n3\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(err.to_string().contains("friendId"));
    }

    #[test]
    fn test_parse_director_credits() {
        let credits = parse_director_credits_str("1::10::Michael Mann\n").unwrap();
        assert_eq!(credits[0].film_id, 1);
        assert_eq!(credits[0].director.name, "Michael Mann");
    }
}
