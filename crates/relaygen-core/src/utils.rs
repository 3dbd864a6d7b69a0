//! Identifier case conversion for generated names

use once_cell::sync::Lazy;
use regex::Regex;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9]+").unwrap());

/// Split an identifier into words on separators and case humps.
///
/// An upper-case run followed by a capitalized word is split before the last
/// capital, so `HTTPResponse` gives `HTTP`, `Response`.
fn words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in SEPARATORS.split(s).filter(|c| !c.is_empty()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut current = String::new();
        for (i, &ch) in chars.iter().enumerate() {
            if i > 0 && ch.is_ascii_uppercase() {
                let prev = chars[i - 1];
                let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
                let hump = prev.is_ascii_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_ascii_uppercase() && next_lower);
                if hump && !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(ch);
        }
        if !current.is_empty() {
            words.push(current);
        }
    }
    words
}

fn capitalize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Convert a string to UpperCamelCase (PascalCase)
pub fn to_upper_camel_case(s: &str) -> String {
    words(s).iter().map(|w| capitalize(w)).collect()
}

/// Convert a string to lowerCamelCase
pub fn to_lower_camel_case(s: &str) -> String {
    let mut out = String::new();
    for (i, word) in words(s).iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_ascii_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Camelize an operation id the way the host and the orchestrator do.
///
/// `_`, `-` and `/` are dropped and the character after each is upper-cased.
/// Only the first letter is lowered; every other letter keeps its case, so
/// `getPetByID` stays as is.
pub fn camelize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = false;
    for ch in s.chars() {
        match ch {
            '_' | '-' | '/' => upper_next = true,
            _ if upper_next => {
                out.push(ch.to_ascii_uppercase());
                upper_next = false;
            }
            _ => out.push(ch),
        }
    }
    if let Some(pos) = out.find(|c: char| c.is_ascii_alphabetic()) {
        out[pos..pos + 1].make_ascii_lowercase();
    }
    out
}
