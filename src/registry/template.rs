// Copyright 2026 KSU Devkit Developers
// SPDX-License-Identifier: GPL-3.0-or-later

//! `{{NAME}}` placeholder expansion and a shallow balance check for the
//! resulting shell text.

use std::{borrow::Cow, collections::BTreeSet};

use crate::error::TemplateError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Names of all placeholders in `text`, in first-seen order.
pub fn placeholders(text: &str) -> Result<Vec<&str>, TemplateError> {
    let mut names = Vec::new();
    let mut rest = text;
    let mut offset = 0;
    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let end = after
            .find(CLOSE)
            .ok_or(TemplateError::Malformed(offset + start))?;
        let name = after[..end].trim();
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(TemplateError::Malformed(offset + start));
        }
        if !names.contains(&name) {
            names.push(name);
        }
        let consumed = start + OPEN.len() + end + CLOSE.len();
        offset += consumed;
        rest = &rest[consumed..];
    }
    Ok(names)
}

/// Replaces every placeholder using `resolve`. All unresolved names are
/// collected before failing so the caller sees the full list at once.
pub fn expand<'v, F>(text: &str, mut resolve: F) -> Result<String, TemplateError>
where
    F: FnMut(&str) -> Option<Cow<'v, str>>,
{
    let names = placeholders(text)?;
    if names.is_empty() {
        return Ok(text.to_string());
    }

    let mut missing = BTreeSet::new();
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + OPEN.len()..];
        // placeholders() already proved every `{{` is closed
        let end = after.find(CLOSE).unwrap_or(after.len());
        let name = after[..end].trim();
        match resolve(name) {
            Some(value) => out.push_str(&value),
            None => {
                missing.insert(name.to_string());
            }
        }
        rest = after.get(end + CLOSE.len()..).unwrap_or("");
    }
    out.push_str(rest);

    if missing.is_empty() {
        Ok(out)
    } else {
        Err(TemplateError::Missing(missing.into_iter().collect()))
    }
}

fn closer_for(open: u8) -> u8 {
    match open {
        b'{' => b'}',
        b'(' => b')',
        b'"' => b'"',
        _ => b']',
    }
}

fn unbalanced(msg: impl Into<String>) -> TemplateError {
    TemplateError::Unbalanced(msg.into())
}

struct Block {
    closer: &'static str,
    /// Bracket depth the block was opened at; it must close at the same depth.
    depth: usize,
    // `case` only
    seen_in: bool,
    pattern: bool,
}

/// Scanner state. `open` holds brackets and `"`; text is in double quotes
/// exactly when the innermost entry is `"`.
struct Balance {
    open: Vec<u8>,
    blocks: Vec<Block>,
    heredocs: Vec<(Vec<u8>, bool)>,
    command_start: bool,
}

impl Balance {
    fn in_double(&self) -> bool {
        self.open.last() == Some(&b'"')
    }

    /// Innermost block is a `case` at the current depth: `(in_seen, in_pattern)`.
    fn case_state(&self) -> Option<(bool, bool)> {
        self.blocks
            .last()
            .filter(|b| b.closer == "esac" && b.depth == self.open.len())
            .map(|b| (b.seen_in, b.pattern))
    }

    fn in_pattern(&self) -> bool {
        self.case_state() == Some((true, true))
    }

    fn set_pattern(&mut self, on: bool) {
        if self.case_state().is_some_and(|(seen_in, _)| seen_in)
            && let Some(block) = self.blocks.last_mut()
        {
            block.pattern = on;
        }
    }

    fn open_block(&mut self, closer: &'static str) {
        self.blocks.push(Block {
            closer,
            depth: self.open.len(),
            seen_in: false,
            pattern: false,
        });
    }

    fn close_block(&mut self, word: &str) -> Result<(), TemplateError> {
        let depth = self.open.len();
        match self.blocks.pop() {
            Some(b) if b.closer == word && b.depth == depth => Ok(()),
            Some(b) if b.closer == word && b.depth < depth => Err(unbalanced(format!(
                "unclosed '{}' before '{word}'",
                self.open.last().map_or('?', |&c| c as char)
            ))),
            Some(b) if b.closer == word => {
                Err(unbalanced(format!("'{word}' outside the bracket its block opened in")))
            }
            Some(b) => Err(unbalanced(format!(
                "found '{word}' while '{}' is open",
                b.closer
            ))),
            None => Err(unbalanced(format!("stray '{word}'"))),
        }
    }

    fn close_bracket(&mut self, c: u8) -> Result<(), TemplateError> {
        match self.open.pop() {
            Some(open) if closer_for(open) == c => {}
            _ => return Err(unbalanced(format!("unexpected '{}'", c as char))),
        }
        match self.blocks.last() {
            Some(b) if b.depth > self.open.len() => Err(unbalanced(format!(
                "missing '{}' before '{}'",
                b.closer, c as char
            ))),
            _ => Ok(()),
        }
    }

    fn end_word(&mut self, word: &mut String) -> Result<(), TemplateError> {
        if word.is_empty() {
            return Ok(());
        }
        let at_command = std::mem::replace(&mut self.command_start, false);
        match self.case_state() {
            Some((false, _)) => {
                if word.as_str() == "in"
                    && let Some(block) = self.blocks.last_mut()
                {
                    block.seen_in = true;
                    block.pattern = true;
                }
            }
            Some((true, true)) => {
                if word.as_str() == "esac" {
                    self.close_block(word)?;
                }
            }
            _ if at_command => self.keyword(word)?,
            _ => {}
        }
        word.clear();
        Ok(())
    }

    fn keyword(&mut self, word: &str) -> Result<(), TemplateError> {
        match word {
            "if" => {
                self.open_block("fi");
                self.command_start = true;
            }
            "do" => {
                self.open_block("done");
                self.command_start = true;
            }
            "case" => self.open_block("esac"),
            "then" | "else" | "elif" | "while" | "until" => self.command_start = true,
            "fi" | "done" | "esac" => self.close_block(word)?,
            _ => {}
        }
        Ok(())
    }

    /// Reads the delimiter after `<<` or `<<-`; the body starts on the next line.
    fn read_heredoc(&mut self, bytes: &[u8], mut i: usize) -> Result<usize, TemplateError> {
        let strip_tabs = bytes.get(i) == Some(&b'-');
        if strip_tabs {
            i += 1;
        }
        while matches!(bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        let mut delim = Vec::new();
        while let Some(&c) = bytes.get(i) {
            match c {
                b'\'' | b'"' | b'\\' => {}
                b';' | b'&' | b'|' | b'<' | b'>' | b'(' | b')' => break,
                c if c.is_ascii_whitespace() => break,
                c => delim.push(c),
            }
            i += 1;
        }
        if delim.is_empty() {
            return Err(unbalanced("heredoc without a delimiter"));
        }
        self.heredocs.push((delim, strip_tabs));
        Ok(i)
    }

    /// Skips pending heredoc bodies; `i` is the first byte after a newline.
    fn skip_heredocs(&mut self, bytes: &[u8], mut i: usize) -> Result<usize, TemplateError> {
        for (delim, strip_tabs) in std::mem::take(&mut self.heredocs) {
            loop {
                if i >= bytes.len() {
                    return Err(unbalanced(format!(
                        "unterminated heredoc '{}'",
                        String::from_utf8_lossy(&delim)
                    )));
                }
                let end = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |n| i + n);
                let mut line = &bytes[i..end];
                if strip_tabs {
                    while let [b'\t', rest @ ..] = line {
                        line = rest;
                    }
                }
                i = (end + 1).min(bytes.len());
                if line == delim.as_slice() {
                    break;
                }
            }
        }
        Ok(i)
    }
}

/// `i` points just past `$((`.
fn skip_arithmetic(bytes: &[u8], mut i: usize) -> Result<usize, TemplateError> {
    let mut depth = 2;
    while let Some(&c) = bytes.get(i) {
        i += 1;
        match c {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
    }
    Err(unbalanced("unclosed '$(('"))
}

/// Checks brackets, quotes and `if`/`case`/`do` blocks are closed.
///
/// Keywords count only in command position, so `echo done` is fine.
/// Comments, single-quoted text, heredoc bodies, arithmetic expansion and
/// backslash-escaped characters are skipped. Inside double quotes only
/// `$(` opens anything. A `)` ending a `case` pattern is not a bracket.
pub fn check_balanced(text: &str) -> Result<(), TemplateError> {
    let bytes = text.as_bytes();
    let mut state = Balance {
        open: Vec::new(),
        blocks: Vec::new(),
        heredocs: Vec::new(),
        command_start: true,
    };
    let mut word = String::new();
    let mut prev: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let last = prev.replace(c);
        i += 1;

        if state.in_double() {
            match c {
                b'\\' => i += 1,
                b'"' => {
                    state.open.pop();
                }
                b'$' if bytes.get(i) == Some(&b'(') => {
                    if bytes.get(i + 1) == Some(&b'(') {
                        i = skip_arithmetic(bytes, i + 2)?;
                    } else {
                        i += 1;
                        state.open.push(b'(');
                        state.command_start = true;
                    }
                }
                _ => {}
            }
            continue;
        }

        if c.is_ascii_alphanumeric() || c == b'_' || c == b'-' {
            word.push(char::from(c));
            continue;
        }
        if c == b'=' {
            // Assignment: `done=1` is not a keyword
            word.clear();
            state.command_start = false;
            continue;
        }
        state.end_word(&mut word)?;

        let at_word_start = last.is_none_or(|p| {
            p.is_ascii_whitespace() || matches!(p, b';' | b'&' | b'|' | b'(' | b')')
        });
        match c {
            b'\\' => i += 1,
            b'#' if at_word_start => {
                i = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |n| i + n);
            }
            b'\'' => match bytes[i..].iter().position(|&b| b == b'\'') {
                Some(n) => i += n + 1,
                None => return Err(unbalanced("unterminated single quote")),
            },
            b'"' => state.open.push(b'"'),
            b'$' if bytes[i..].starts_with(b"((") => i = skip_arithmetic(bytes, i + 2)?,
            // Optional leading paren of a case pattern
            b'(' if state.in_pattern() => {}
            b'(' | b'{' | b'[' => {
                state.open.push(c);
                state.command_start = c != b'[';
            }
            b')' if state.in_pattern() => {
                state.set_pattern(false);
                state.command_start = true;
            }
            b')' | b'}' | b']' => {
                state.close_bracket(c)?;
                state.command_start = false;
            }
            b'\n' => {
                state.command_start = true;
                i = state.skip_heredocs(bytes, i)?;
            }
            b';' | b'&' => {
                state.command_start = true;
                if last == Some(b';') {
                    state.set_pattern(true);
                }
            }
            b'|' => state.command_start = true,
            // Here-string
            b'<' if bytes[i..].starts_with(b"<<") => i += 2,
            b'<' if bytes.get(i) == Some(&b'<') => i = state.read_heredoc(bytes, i + 1)?,
            b' ' | b'\t' | b'\r' | b'!' => {}
            _ => state.command_start = false,
        }
    }
    state.end_word(&mut word)?;

    if let Some((delim, _)) = state.heredocs.first() {
        return Err(unbalanced(format!(
            "unterminated heredoc '{}'",
            String::from_utf8_lossy(delim)
        )));
    }
    if let Some(open) = state.open.pop() {
        return Err(if open == b'"' {
            unbalanced("unterminated double quote")
        } else {
            unbalanced(format!("unclosed '{}'", open as char))
        });
    }
    if let Some(block) = state.blocks.pop() {
        return Err(unbalanced(format!("missing '{}'", block.closer)));
    }
    Ok(())
}
