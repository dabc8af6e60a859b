//! Query option composition
//!
//! Translates the string-keyed query-parameter map arriving from a
//! transport layer into a typed `QueryOptions`. The parsing happens here,
//! once; service code only ever sees explicit booleans and numbers.

use shelfmark_core::{AppError, Result};
use shelfmark_database::Page;
use std::collections::HashMap;

/// Eager-load flags. Each entity kind honors the subset that applies to it
/// and ignores the rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Include {
    pub library: bool,
    pub authors: bool,
    pub series: bool,
    pub stories: bool,
    pub volumes: bool,
}

/// Typed query options shared by every listing and lookup operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub include: Include,
}

impl QueryOptions {
    /// Returns the pagination window for the storage layer
    pub fn page(&self) -> Page {
        Page {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

/// Composes query options from caller-supplied parameters, layered on top
/// of `base`.
///
/// `limit` must parse as a positive integer and `offset` as a
/// non-negative one; a limit of zero would silently empty every listing,
/// so it is rejected like any other bad value. A `withX`
/// inclusion flag is activated only when the parameter is present with an
/// empty-string value, matching the convention of flag-style query
/// parameters (`?withAuthors`). Unrecognized parameters are ignored and
/// the input map is never mutated.
pub fn compose(base: &QueryOptions, params: &HashMap<String, String>) -> Result<QueryOptions> {
    let mut options = base.clone();

    if let Some(value) = params.get("limit") {
        options.limit = Some(parse_count("limit", value, 1)?);
    }
    if let Some(value) = params.get("offset") {
        options.offset = Some(parse_count("offset", value, 0)?);
    }

    if is_flag(params, "withLibrary") {
        options.include.library = true;
    }
    if is_flag(params, "withAuthors") {
        options.include.authors = true;
    }
    if is_flag(params, "withSeries") {
        options.include.series = true;
    }
    if is_flag(params, "withStories") {
        options.include.stories = true;
    }
    if is_flag(params, "withVolumes") {
        options.include.volumes = true;
    }

    Ok(options)
}

fn is_flag(params: &HashMap<String, String>, key: &str) -> bool {
    params.get(key).map(String::as_str) == Some("")
}

fn parse_count(name: &str, value: &str, min: i64) -> Result<i64> {
    value
        .parse::<i64>()
        .ok()
        .filter(|n| *n >= min)
        .ok_or_else(|| AppError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_compose_parses_pagination() {
        let options = compose(
            &QueryOptions::default(),
            &params(&[("limit", "10"), ("offset", "5")]),
        )
        .unwrap();
        assert_eq!(options.limit, Some(10));
        assert_eq!(options.offset, Some(5));
    }

    #[test]
    fn test_compose_rejects_non_numeric_limit() {
        let err = compose(&QueryOptions::default(), &params(&[("limit", "ten")])).unwrap_err();
        assert!(err.to_string().contains("'ten'"));
    }

    #[test]
    fn test_compose_rejects_negative_offset() {
        assert!(compose(&QueryOptions::default(), &params(&[("offset", "-1")])).is_err());
    }

    #[test]
    fn test_limit_must_be_positive_but_offset_may_be_zero() {
        assert!(compose(&QueryOptions::default(), &params(&[("limit", "0")])).is_err());
        assert!(compose(&QueryOptions::default(), &params(&[("limit", "-3")])).is_err());

        let options = compose(&QueryOptions::default(), &params(&[("offset", "0")])).unwrap();
        assert_eq!(options.offset, Some(0));
    }

    #[test]
    fn test_inclusion_requires_empty_string_value() {
        let on = compose(&QueryOptions::default(), &params(&[("withAuthors", "")])).unwrap();
        assert!(on.include.authors);

        // A non-empty value is not the flag convention and stays off
        let off = compose(&QueryOptions::default(), &params(&[("withAuthors", "true")])).unwrap();
        assert!(!off.include.authors);
    }

    #[test]
    fn test_unrecognized_parameters_ignored() {
        let options = compose(&QueryOptions::default(), &params(&[("wat", "x")])).unwrap();
        assert_eq!(options, QueryOptions::default());
    }

    #[test]
    fn test_base_options_preserved_and_layered() {
        let base = QueryOptions {
            limit: Some(3),
            offset: None,
            include: Include {
                library: true,
                ..Include::default()
            },
        };
        let options = compose(&base, &params(&[("offset", "1")])).unwrap();
        assert_eq!(options.limit, Some(3));
        assert_eq!(options.offset, Some(1));
        assert!(options.include.library);
    }

    #[test]
    fn test_input_map_not_mutated() {
        let input = params(&[("limit", "2"), ("withSeries", "")]);
        let before = input.clone();
        compose(&QueryOptions::default(), &input).unwrap();
        assert_eq!(input, before);
    }
}
