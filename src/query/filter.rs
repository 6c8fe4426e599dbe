//! Shell-glob screen filter.
//!
//! `*` matches any run of characters, `?` exactly one, everything else is
//! literal. The whole label must match. Only screen nodes are filtered;
//! other nodes always pass.

use regex::Regex;

use crate::error::Result;
use crate::graph::{GraphNode, NodeType};

#[derive(Debug, Clone)]
pub struct ScreenFilter {
    pattern: String,
    regex: Regex,
}

impl ScreenFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&glob_to_regex(pattern))?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether a screen label matches.
    pub fn matches_label(&self, label: &str) -> bool {
        self.regex.is_match(label)
    }

    /// Screens must match; non-screen nodes pass.
    pub fn accepts(&self, node: &GraphNode) -> bool {
        node.node_type != NodeType::Screen || self.matches_label(&node.label)
    }
}

fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("^(?:");
    for ch in pattern.chars() {
        match ch {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            other => out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    out.push_str(")$");
    out
}
