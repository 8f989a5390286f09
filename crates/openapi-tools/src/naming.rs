//! Tool name derivation and collision resolution.

use crate::error::{OpenApiToolsError, Result};
use reqwest::Method;
use std::collections::HashSet;

const MAX_NAME_LEN: usize = 64;
const MAX_SUFFIX_ATTEMPTS: usize = 10_000;

/// Clean a declared `operationId` into an identifier-safe name.
///
/// Characters outside `[A-Za-z0-9_-]` become `_`. Returns `None` when nothing usable is left.
#[must_use]
pub fn sanitize_operation_id(operation_id: &str) -> Option<String> {
    let cleaned: String = operation_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_NAME_LEN)
        .collect();
    if cleaned.chars().all(|c| c == '_') {
        None
    } else {
        Some(cleaned)
    }
}

/// Synthesize a camelCase name from method and path.
///
/// Static segments become words, path variables become a `By...` suffix joined with `And`:
/// `GET /users/{id}/posts` is `getUsersPostsById`, `GET /` is `getRoot`.
#[must_use]
pub fn synthesize_name(method: &Method, path: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut vars: Vec<String> = Vec::new();

    let mut buf = String::new();
    let mut in_var = false;
    for c in path.chars() {
        match c {
            '{' if !in_var => {
                push_words(&mut words, &buf);
                buf.clear();
                in_var = true;
            }
            '}' if in_var => {
                let var = camel_words(&buf);
                if !var.is_empty() {
                    vars.push(var);
                }
                buf.clear();
                in_var = false;
            }
            _ => buf.push(c),
        }
    }
    push_words(&mut words, &buf);

    let mut name = method.as_str().to_ascii_lowercase();
    if words.is_empty() && vars.is_empty() {
        name.push_str("Root");
    }
    for w in &words {
        name.push_str(w);
    }
    if !vars.is_empty() {
        name.push_str("By");
        name.push_str(&vars.join("And"));
    }
    name.chars().take(MAX_NAME_LEN).collect()
}

fn push_words(words: &mut Vec<String>, segment: &str) {
    let w = camel_words(segment);
    if !w.is_empty() {
        words.push(w);
    }
}

/// `"pet-store_items"` -> `"PetStoreItems"`.
fn camel_words(s: &str) -> String {
    s.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Reserve `base`, or the first free `base_1`, `base_2`, ... in `used`.
///
/// Deterministic for a given insertion order, and never returns a name already in `used`. The
/// base is shortened as needed so a suffixed name stays within the length cap.
///
/// # Errors
///
/// Returns [`OpenApiToolsError::NameCollisionUnresolved`] if no free suffix is found.
pub fn reserve_unique_name(used: &mut HashSet<String>, base: &str) -> Result<String> {
    if used.insert(base.to_string()) {
        return Ok(base.to_string());
    }
    for counter in 1..=MAX_SUFFIX_ATTEMPTS {
        let suffix = format!("_{counter}");
        let keep = MAX_NAME_LEN.saturating_sub(suffix.len());
        let candidate: String = base.chars().take(keep).chain(suffix.chars()).collect();
        if used.insert(candidate.clone()) {
            return Ok(candidate);
        }
    }
    Err(OpenApiToolsError::NameCollisionUnresolved(format!(
        "no free name for '{base}' after {MAX_SUFFIX_ATTEMPTS} attempts"
    )))
}
