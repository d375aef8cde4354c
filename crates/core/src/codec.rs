// Copyright (c) chronicledb.dev 2025
// This file is licensed under the AGPL-3.0-or-later

//! Accessors shared by the record codecs: pull one attribute out of a stored
//! document and fail with a `Decode` error naming the attribute.

use std::str::FromStr;

use chronicle_type::{AttrMap, Timestamp, Value};

use crate::{Error, Result};

fn missing(field: &str) -> Error {
    Error::Decode {
        field: field.to_string(),
        detail: "attribute is missing".to_string(),
    }
}

fn mismatch(field: &str, expected: &str, actual: &Value) -> Error {
    Error::Decode {
        field: field.to_string(),
        detail: format!("expected {expected}, found {actual}"),
    }
}

pub(crate) fn text<'a>(attrs: &'a AttrMap, field: &str) -> Result<&'a str> {
    let value = attrs.get(field).ok_or_else(|| missing(field))?;
    value.as_text().ok_or_else(|| mismatch(field, "text", value))
}

pub(crate) fn parse<T>(attrs: &AttrMap, field: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    text(attrs, field)?.parse().map_err(|err: T::Err| Error::Decode {
        field: field.to_string(),
        detail: err.to_string(),
    })
}

pub(crate) fn parse_optional<T>(attrs: &AttrMap, field: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match attrs.get(field) {
        None | Some(Value::Undefined) => Ok(None),
        Some(_) => parse(attrs, field).map(Some),
    }
}

pub(crate) fn int(attrs: &AttrMap, field: &str) -> Result<i64> {
    let value = attrs.get(field).ok_or_else(|| missing(field))?;
    value.as_int().ok_or_else(|| mismatch(field, "integer", value))
}

pub(crate) fn unsigned(attrs: &AttrMap, field: &str) -> Result<u64> {
    let raw = int(attrs, field)?;
    u64::try_from(raw).map_err(|_| Error::Decode {
        field: field.to_string(),
        detail: format!("expected a non-negative integer, found {raw}"),
    })
}

pub(crate) fn optional_unsigned(attrs: &AttrMap, field: &str) -> Result<Option<u64>> {
    match attrs.get(field) {
        None | Some(Value::Undefined) => Ok(None),
        Some(_) => unsigned(attrs, field).map(Some),
    }
}

pub(crate) fn boolean(attrs: &AttrMap, field: &str) -> Result<bool> {
    let value = attrs.get(field).ok_or_else(|| missing(field))?;
    value.as_bool().ok_or_else(|| mismatch(field, "boolean", value))
}

pub(crate) fn instant(attrs: &AttrMap, field: &str) -> Result<Timestamp> {
    let value = attrs.get(field).ok_or_else(|| missing(field))?;
    value
        .as_instant()
        .ok_or_else(|| mismatch(field, "instant", value))
}

pub(crate) fn map(attrs: &AttrMap, field: &str) -> Result<AttrMap> {
    let value = attrs.get(field).ok_or_else(|| missing(field))?;
    value
        .as_map()
        .cloned()
        .ok_or_else(|| mismatch(field, "map", value))
}

pub(crate) fn text_list(attrs: &AttrMap, field: &str) -> Result<Vec<String>> {
    let value = attrs.get(field).ok_or_else(|| missing(field))?;
    let items = value
        .as_list()
        .ok_or_else(|| mismatch(field, "list", value))?;
    items
        .iter()
        .map(|item| {
            item.as_text()
                .map(str::to_string)
                .ok_or_else(|| mismatch(field, "list of text", item))
        })
        .collect()
}
