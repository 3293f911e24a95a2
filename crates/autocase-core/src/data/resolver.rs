//! `${set.item}` placeholder substitution.
//!
//! The scanner is a small state machine over the input characters:
//!
//! ```text
//! Literal --"${"--> SetName --"."--> ItemName --"}"--> Literal
//!                     |                  |
//!                     +--"}"-------------+--> Literal (MissingSeparator / resolved)
//! ```
//!
//! A `${` seen while inside a placeholder abandons the open one (left
//! verbatim) and starts a new placeholder there. Anything that cannot be
//! resolved stays in the output exactly as written and is reported.
use std::fmt;

use crate::data::error::UnresolvedReason;
use crate::data::model::DataSet;
use crate::data::store::DataStore;

/// A placeholder left verbatim in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Exact text of the placeholder as it appears in the input
    pub placeholder: String,
    pub reason: UnresolvedReason,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.placeholder, self.reason)
    }
}

/// Result of substituting every placeholder in a string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    pub output: String,
    pub unresolved: Vec<UnresolvedReference>,
}

impl Resolution {
    /// True when every placeholder was replaced.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    Literal,
    /// Inside `${`, before the first `.`; `start` is the byte offset of `$`
    SetName { start: usize },
    /// After the first `.`; `dot` is its byte offset
    ItemName { start: usize, dot: usize },
}

/// Substitutes placeholders against a [`DataStore`] snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceResolver<'a> {
    store: &'a DataStore,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(store: &'a DataStore) -> Self {
        Self { store }
    }

    /// Replace every well-formed, resolvable placeholder in `input`.
    pub fn resolve(&self, input: &str) -> Resolution {
        let mut resolution = Resolution {
            output: String::with_capacity(input.len()),
            unresolved: Vec::new(),
        };
        let mut state = ScanState::Literal;
        let mut chars = input.char_indices().peekable();

        while let Some((i, c)) = chars.next() {
            let opens = c == '$' && matches!(chars.peek(), Some((_, '{')));
            state = match state {
                ScanState::Literal if opens => {
                    chars.next();
                    ScanState::SetName { start: i }
                }
                ScanState::Literal => {
                    resolution.output.push(c);
                    ScanState::Literal
                }
                ScanState::SetName { start } | ScanState::ItemName { start, .. } if opens => {
                    keep_verbatim(&mut resolution, &input[start..i], UnresolvedReason::Unterminated);
                    chars.next();
                    ScanState::SetName { start: i }
                }
                ScanState::SetName { start } => match c {
                    '.' => ScanState::ItemName { start, dot: i },
                    '}' => {
                        keep_verbatim(&mut resolution, &input[start..=i], UnresolvedReason::MissingSeparator);
                        ScanState::Literal
                    }
                    _ => state,
                },
                ScanState::ItemName { start, dot } => {
                    if c == '}' {
                        let placeholder = &input[start..=i];
                        let set_name = &input[start + 2..dot];
                        let item_name = &input[dot + 1..i];
                        match self.lookup(set_name, item_name) {
                            Ok(value) => resolution.output.push_str(value),
                            Err(reason) => keep_verbatim(&mut resolution, placeholder, reason),
                        }
                        ScanState::Literal
                    } else {
                        state
                    }
                }
            };
        }

        if let ScanState::SetName { start } | ScanState::ItemName { start, .. } = state {
            keep_verbatim(&mut resolution, &input[start..], UnresolvedReason::Unterminated);
        }
        resolution
    }

    /// Value of `set_name.item_name`, or why it cannot be produced.
    pub fn lookup(&self, set_name: &str, item_name: &str) -> Result<&'a str, UnresolvedReason> {
        if set_name.is_empty() || item_name.is_empty() {
            return Err(UnresolvedReason::EmptyName);
        }
        let set: &'a DataSet = self
            .store
            .get_data_set_by_name(set_name)
            .ok_or(UnresolvedReason::UnknownDataSet)?;
        set.item_by_name(item_name)
            .map(|item| item.value.as_str())
            .ok_or(UnresolvedReason::UnknownDataItem)
    }
}

fn keep_verbatim(resolution: &mut Resolution, text: &str, reason: UnresolvedReason) {
    resolution.output.push_str(text);
    resolution.unresolved.push(UnresolvedReference {
        placeholder: text.to_string(),
        reason,
    });
}

/// Split a string consisting of exactly one placeholder into set and item names.
pub fn parse_placeholder(reference: &str) -> Result<(&str, &str), UnresolvedReason> {
    let inner = reference
        .strip_prefix("${")
        .ok_or(UnresolvedReason::MissingSeparator)?;
    let inner = inner.strip_suffix('}').ok_or(UnresolvedReason::Unterminated)?;
    if inner.contains('}') || inner.contains("${") {
        return Err(UnresolvedReason::Unterminated);
    }
    let (set_name, item_name) = inner.split_once('.').ok_or(UnresolvedReason::MissingSeparator)?;
    if set_name.is_empty() || item_name.is_empty() {
        return Err(UnresolvedReason::EmptyName);
    }
    Ok((set_name, item_name))
}
