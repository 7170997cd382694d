//! Token classification and matching of tokens to entries.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::entry::Entry;
use crate::error::ParseError;

/// Whether `token` is data rather than an option marker.
///
/// `-` followed by a digit is data so negative numbers pass through.
pub(crate) fn is_value_like(token: &str) -> bool {
    let bytes = token.as_bytes();
    bytes.first() != Some(&b'-') || bytes.get(1).is_some_and(u8::is_ascii_digit)
}

/// Output of the option pass.
#[derive(Debug, Default)]
pub(crate) struct Scan {
    /// Value-like tokens not consumed by an option, in encounter order.
    pub(crate) flat: Vec<String>,
    pub(crate) diagnostics: Vec<ParseError>,
}

pub(crate) struct Matcher<'a> {
    params: &'a [String],
    keyed: &'a IndexMap<String, usize>,
    entries: &'a mut [Entry],
    help: usize,
    diagnostics: Vec<ParseError>,
}

impl<'a> Matcher<'a> {
    pub(crate) fn new(
        params: &'a [String],
        keyed: &'a IndexMap<String, usize>,
        entries: &'a mut [Entry],
        help: usize,
    ) -> Self {
        Self {
            params,
            keyed,
            entries,
            help,
            diagnostics: Vec::new(),
        }
    }

    /// Single forward pass: bind every option token, collect the rest.
    pub(crate) fn scan(mut self) -> Scan {
        let params = self.params;
        let mut flat = Vec::new();
        let mut after_separator = false;
        let mut i = 0usize;

        while i < params.len() {
            let token = params[i].as_str();
            if after_separator || is_value_like(token) {
                flat.push(token.to_string());
            } else if token == "--" {
                after_separator = true;
            } else if let Some(body) = token.strip_prefix("--") {
                i = self.bind_key(body, i);
            } else {
                i = self.short_group(token, i);
            }
            i += 1;
        }

        Scan {
            flat,
            diagnostics: self.diagnostics,
        }
    }

    fn lookup(&self, key: &str) -> Option<usize> {
        self.keyed.get(key).copied()
    }

    fn is_value(&self, i: usize) -> bool {
        self.params.get(i).is_some_and(|t| is_value_like(t))
    }

    fn unrecognized(&mut self, key: &str) {
        warn!(key, "unrecognised commandline argument");
        self.diagnostics.push(ParseError::UnrecognizedKey {
            key: key.to_string(),
        });
    }

    /// Resolve `key[=value]` (prefix already stripped) and bind its value.
    ///
    /// Returns the index of the last token consumed.
    fn bind_key(&mut self, body: &str, i: usize) -> usize {
        if let Some((key, value)) = body.split_once('=') {
            match self.lookup(key) {
                Some(idx) => self.entries[idx].convert(value),
                None => self.unrecognized(key),
            }
            return i;
        }

        let Some(idx) = self.lookup(body) else {
            self.unrecognized(body);
            return i;
        };

        if let Some(implicit) = self.entries[idx].implicit_value().map(str::to_string) {
            self.entries[idx].convert(&implicit);
            return i;
        }

        if !self.is_value(i + 1) {
            self.entries[idx].fail(ParseError::MissingValue {
                key: body.to_string(),
            });
            return i;
        }

        let mut last = i + 1;
        let mut value = self.params[last].clone();
        if self.entries[idx].is_multi_argument() {
            while self.is_value(last + 1) {
                last += 1;
                value.push(',');
                value.push_str(&self.params[last]);
            }
        }
        debug!(key = body, value = %value, "bound option value");
        self.entries[idx].convert(&value);
        last
    }

    /// `-abc[=value]`: `a` and `b` must carry implicit values, `c` is bound
    /// like a long key.
    fn short_group(&mut self, token: &str, i: usize) -> usize {
        let body = &token[1..];
        let head = body.split_once('=').map_or(body, |(head, _)| head);

        // `-help` reads as the long help key rather than a group of letters.
        if head.chars().count() > 1 && self.lookup(head) == Some(self.help) {
            return self.bind_key(body, i);
        }

        let Some((last_at, _)) = head.char_indices().last() else {
            self.unrecognized(token);
            return i;
        };

        for c in head[..last_at].chars() {
            let key = c.to_string();
            let Some(idx) = self.lookup(&key) else {
                self.unrecognized(&key);
                continue;
            };
            match self.entries[idx].implicit_value().map(str::to_string) {
                Some(implicit) => self.entries[idx].convert(&implicit),
                None => self.entries[idx].fail(ParseError::MissingImplicitValue { key }),
            }
        }

        self.bind_key(&body[last_at..], i)
    }
}

/// Bind the flat positional values to positional entries.
///
/// Entries before the first multi-arity entry take values from the front,
/// entries after it take values from the back, and the multi-arity entry
/// absorbs whatever lies between. Returns the values no entry took.
pub(crate) fn match_positionals(
    entries: &mut [Entry],
    positionals: &[usize],
    flat: &[String],
) -> Vec<String> {
    let count = positionals.len();
    let mut front = 0usize;
    while front < count && !entries[positionals[front]].is_multi_argument() {
        if let Some(value) = flat.get(front) {
            entries[positionals[front]].convert(value);
        }
        front += 1;
    }

    let mut back = flat.len();
    for &idx in positionals[front..].iter().rev() {
        if back <= front {
            break;
        }
        let entry = &mut entries[idx];
        if entry.is_multi_argument() {
            entry.convert(&flat[front..back].join(","));
            back = front;
            break;
        }
        back -= 1;
        entry.convert(&flat[back]);
    }

    let start = front.min(flat.len());
    let rest = if back > start {
        flat[start..back].to_vec()
    } else {
        Vec::new()
    };
    for value in &rest {
        debug!(value = %value, "positional value not bound to any entry");
    }
    rest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    fn positional(n: usize, multi: bool) -> Entry {
        let mut e = Entry::new(EntryKind::Positional, &format!("arg_{n}"), "", None);
        if multi {
            e.set_multi_argument();
        }
        e
    }

    fn values(entries: &[Entry]) -> Vec<Option<&str>> {
        entries.iter().map(Entry::value).collect()
    }

    #[test]
    fn classifies_tokens() {
        assert!(is_value_like("file.txt"));
        assert!(is_value_like(""));
        assert!(is_value_like("-5"));
        assert!(is_value_like("-0.25"));
        assert!(!is_value_like("-"));
        assert!(!is_value_like("-v"));
        assert!(!is_value_like("--"));
        assert!(!is_value_like("--5"));
    }

    #[test]
    fn fixed_positionals_bind_in_order() {
        let mut entries = vec![positional(0, false), positional(1, false), positional(2, false)];
        let rest = match_positionals(&mut entries, &[0, 1, 2], &strings(&["a", "b", "c"]));
        assert!(rest.is_empty());
        assert_eq!(values(&entries), [Some("a"), Some("b"), Some("c")]);
    }

    #[test]
    fn surplus_values_are_returned() {
        let mut entries = vec![positional(0, false)];
        let rest = match_positionals(&mut entries, &[0], &strings(&["a", "b", "c"]));
        assert_eq!(rest, ["b", "c"]);
        assert_eq!(values(&entries), [Some("a")]);
    }

    #[test]
    fn too_few_values_leave_trailing_entries_unset() {
        let mut entries = vec![positional(0, false), positional(1, false)];
        let rest = match_positionals(&mut entries, &[0, 1], &strings(&["a"]));
        assert!(rest.is_empty());
        assert_eq!(values(&entries), [Some("a"), None]);
    }

    #[test]
    fn multi_in_the_middle_absorbs_between_both_ends() {
        let mut entries = vec![positional(0, false), positional(1, true), positional(2, false)];
        let rest = match_positionals(&mut entries, &[0, 1, 2], &strings(&["x", "y", "z", "w"]));
        assert!(rest.is_empty());
        assert_eq!(values(&entries), [Some("x"), Some("y,z"), Some("w")]);
    }

    #[test]
    fn multi_first_leaves_tail_for_fixed_entries() {
        let mut entries = vec![positional(0, true), positional(1, false), positional(2, false)];
        match_positionals(&mut entries, &[0, 1, 2], &strings(&["a", "b", "c", "d", "e"]));
        assert_eq!(values(&entries), [Some("a,b,c"), Some("d"), Some("e")]);
    }

    #[test]
    fn multi_gets_nothing_when_fixed_entries_use_everything() {
        let mut entries = vec![
            positional(0, false),
            positional(1, true),
            positional(2, false),
            positional(3, false),
        ];
        match_positionals(&mut entries, &[0, 1, 2, 3], &strings(&["x", "y", "z"]));
        assert_eq!(values(&entries), [Some("x"), None, Some("y"), Some("z")]);
    }

    #[test]
    fn multi_last_takes_single_value() {
        let mut entries = vec![positional(0, false), positional(1, true)];
        match_positionals(&mut entries, &[0, 1], &strings(&["x", "y"]));
        assert_eq!(values(&entries), [Some("x"), Some("y")]);
    }
}
