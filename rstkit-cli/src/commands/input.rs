//! Fragment input files shared by `assemble` and `build`.
//!
//! Accepted shapes: a JSON array, or an object with a `content_list` array
//! (the `/api/document` request body). Items are either preformatted markup
//! strings or `{kind, fields}` requests that get formatted on the way in.

use anyhow::{Context, Result};
use rstkit_core::{Document, FragmentRequest};
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum InputItem {
    Markup(String),
    Request(FragmentRequest),
}

impl InputItem {
    fn into_markup(self) -> String {
        match self {
            InputItem::Markup(text) => text,
            InputItem::Request(request) => request.format(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum InputFile {
    List(Vec<InputItem>),
    Body {
        #[serde(default)]
        content_list: Vec<InputItem>,
    },
}

/// Parse fragment input into a [`Document`], in file order.
pub fn parse_input(json: &str) -> Result<Document> {
    let file: InputFile = serde_json::from_str(json)
        .context("Expected a JSON array of fragments or an object with content_list")?;
    let items = match file {
        InputFile::List(items) | InputFile::Body { content_list: items } => items,
    };
    Ok(items.into_iter().map(InputItem::into_markup).collect())
}

pub fn read_input(path: &Path) -> Result<Document> {
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    parse_input(&json).with_context(|| format!("Invalid fragment file {:?}", path))
}
