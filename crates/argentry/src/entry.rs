use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

use tracing::debug;

use crate::convert::{ArgValue, Slot, TypedSlot, split};
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Positional,
    Keyword,
    Flag,
}

/// A declared argument slot and its matching state.
pub struct Entry {
    kind: EntryKind,
    keys: Vec<String>,
    help: String,
    value: Option<String>,
    implicit_value: Option<String>,
    default_str: Option<String>,
    typed_default: Option<Box<dyn Any>>,
    slot: Box<dyn Slot>,
    multi: bool,
    error: Option<ParseError>,
}

impl Entry {
    pub(crate) fn new(
        kind: EntryKind,
        keys: &str,
        help: impl Into<String>,
        implicit_value: Option<String>,
    ) -> Self {
        let keys = split(keys)
            .into_iter()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
        // Unbound flags read as booleans, everything else as the raw string.
        let slot: Box<dyn Slot> = match kind {
            EntryKind::Flag => Box::new(TypedSlot::<bool>::new()),
            EntryKind::Positional | EntryKind::Keyword => Box::new(TypedSlot::<String>::new()),
        };
        Self {
            kind,
            keys,
            help: help.into(),
            value: None,
            implicit_value,
            default_str: None,
            typed_default: None,
            slot,
            multi: false,
            error: None,
        }
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    /// Key aliases, canonical key first.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn name(&self) -> &str {
        self.keys.first().map(String::as_str).unwrap_or_default()
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    /// The raw text that was matched (or the rendered default once applied).
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn implicit_value(&self) -> Option<&str> {
        self.implicit_value.as_deref()
    }

    pub fn default_str(&self) -> Option<&str> {
        self.default_str.as_deref()
    }

    pub fn is_multi_argument(&self) -> bool {
        self.multi
    }

    pub fn error(&self) -> Option<&ParseError> {
        self.error.as_ref()
    }

    /// Keys as they are typed on the command line, e.g. `-n,--number`.
    pub fn display_keys(&self) -> String {
        self.keys
            .iter()
            .map(|k| match self.kind {
                EntryKind::Positional => k.clone(),
                _ if k.chars().count() > 1 => format!("--{k}"),
                _ => format!("-{k}"),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn get<T: ArgValue>(&self) -> Option<&T> {
        self.slot
            .as_any()
            .downcast_ref::<TypedSlot<T>>()
            .and_then(|s| s.value.as_ref())
    }

    pub(crate) fn take<T: ArgValue>(&mut self) -> Option<T> {
        self.slot
            .as_any_mut()
            .downcast_mut::<TypedSlot<T>>()
            .and_then(|s| s.value.take())
    }

    pub(crate) fn set_default<T: ArgValue>(&mut self, value: T) {
        self.default_str = Some(value.to_arg());
        self.typed_default = Some(Box::new(value));
    }

    pub(crate) fn set_default_str(&mut self, text: impl Into<String>) {
        self.default_str = Some(text.into());
        self.typed_default = None;
    }

    pub(crate) fn set_multi_argument(&mut self) {
        self.multi = true;
    }

    pub(crate) fn bind<T: ArgValue>(&mut self) {
        if self.typed_default.as_ref().is_some_and(|d| !d.is::<T>()) {
            debug!(
                keys = %self.display_keys(),
                bound = std::any::type_name::<T>(),
                "typed default does not match the bound type, falling back to its text"
            );
            self.typed_default = None;
        }
        if self.typed_default.is_none() && self.default_str.is_none() {
            if let Some(absent) = T::absent() {
                self.default_str = Some(absent.to_arg());
                self.typed_default = Some(Box::new(absent));
            }
        }
        self.slot = Box::new(TypedSlot::<T>::new());
    }

    /// Store `raw` and convert it into the bound type.
    ///
    /// The outcome replaces whatever an earlier occurrence left behind.
    pub(crate) fn convert(&mut self, raw: &str) {
        self.value = Some(raw.to_string());
        match self.slot.convert(raw) {
            Ok(()) => self.error = None,
            Err(source) => {
                self.error = Some(ParseError::Conversion {
                    raw: raw.to_string(),
                    keys: self.display_keys(),
                    help: self.help.clone(),
                    source,
                });
            }
        }
    }

    pub(crate) fn fail(&mut self, error: ParseError) {
        self.value = None;
        self.slot.clear();
        self.error = Some(error);
    }

    /// Fill an unmatched entry from its default, or record it as missing.
    pub(crate) fn apply_default(&mut self) {
        if self.value.is_some() || self.error.is_some() {
            return;
        }

        if let Some(default) = self.typed_default.take() {
            match self.slot.accept_default(default) {
                Ok(()) => {
                    self.value = self.default_str.clone();
                    return;
                }
                Err(_) => debug!(
                    keys = %self.display_keys(),
                    bound = self.slot.type_name(),
                    "typed default does not match the slot, re-parsing its text"
                ),
            }
        }

        match self.default_str.clone() {
            Some(text) => self.convert(&text),
            None => {
                self.error = Some(ParseError::MissingArgument {
                    keys: self.display_keys(),
                    help: self.help.clone(),
                });
            }
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("kind", &self.kind)
            .field("keys", &self.keys)
            .field("help", &self.help)
            .field("value", &self.value)
            .field("implicit_value", &self.implicit_value)
            .field("default_str", &self.default_str)
            .field("bound", &self.slot.type_name())
            .field("multi", &self.multi)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// Typed key for reading a bound entry out of [`crate::Parsed`].
pub struct Handle<T> {
    index: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            _marker: PhantomData,
        }
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handle")
            .field(&self.index)
            .field(&std::any::type_name::<T>())
            .finish()
    }
}

/// Configures an entry right after registration.
///
/// Finish with [`EntryBuilder::bind`] to choose the value type, or drop the
/// builder to keep the entry untyped (read it back with `Parsed::raw`).
#[must_use = "bind the entry to read its typed value"]
pub struct EntryBuilder<'a> {
    entry: &'a mut Entry,
    index: usize,
}

impl<'a> EntryBuilder<'a> {
    pub(crate) fn new(entry: &'a mut Entry, index: usize) -> Self {
        Self { entry, index }
    }

    /// Default used as-is when nothing is matched; its rendering shows in help.
    pub fn set_default<T: ArgValue>(self, value: T) -> Self {
        self.entry.set_default(value);
        self
    }

    /// Default text, converted like a command-line token when it is needed.
    pub fn set_default_str(self, text: impl Into<String>) -> Self {
        self.entry.set_default_str(text);
        self
    }

    /// Consume a run of consecutive values, joined with `,`.
    pub fn multi_argument(self) -> Self {
        self.entry.set_multi_argument();
        self
    }

    pub fn bind<T: ArgValue>(self) -> Handle<T> {
        self.entry.bind::<T>();
        Handle::new(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword(keys: &str) -> Entry {
        Entry::new(EntryKind::Keyword, keys, "Some help", None)
    }

    #[test]
    fn display_keys_prefixes_by_alias_length() {
        assert_eq!(keyword("n,number").display_keys(), "-n,--number");
        assert_eq!(keyword("v").display_keys(), "-v");
        assert_eq!(keyword(" x , extra ,").keys(), ["x", "extra"]);

        let pos = Entry::new(EntryKind::Positional, "arg_0", "Input", None);
        assert_eq!(pos.display_keys(), "arg_0");
    }

    #[test]
    fn typed_default_is_used_without_reparsing() {
        let mut e = keyword("ratio");
        e.set_default(0.1f64);
        e.bind::<f64>();
        e.apply_default();
        assert_eq!(e.get::<f64>(), Some(&0.1));
        assert_eq!(e.value(), Some("0.1"));
        assert!(e.error().is_none());
    }

    #[test]
    fn textual_default_is_converted_through_the_bound_type() {
        let mut e = keyword("n");
        e.set_default_str("12");
        e.bind::<u32>();
        e.apply_default();
        assert_eq!(e.get::<u32>(), Some(&12));

        let mut bad = keyword("m");
        bad.set_default_str("twelve");
        bad.bind::<u32>();
        bad.apply_default();
        assert!(matches!(bad.error(), Some(ParseError::Conversion { .. })));
    }

    #[test]
    fn mismatched_typed_default_falls_back_to_text() {
        let mut e = keyword("n");
        e.set_default(7i64);
        e.bind::<u8>();
        e.apply_default();
        assert_eq!(e.get::<u8>(), Some(&7));
    }

    #[test]
    fn missing_without_default() {
        let mut e = keyword("n,name");
        e.bind::<String>();
        e.apply_default();
        assert_eq!(
            e.error(),
            Some(&ParseError::MissingArgument {
                keys: "-n,--name".to_string(),
                help: "Some help".to_string(),
            })
        );
    }

    #[test]
    fn optional_binding_defaults_to_none() {
        let mut e = keyword("limit");
        e.bind::<Option<u32>>();
        assert_eq!(e.default_str(), Some("none"));
        e.apply_default();
        assert_eq!(e.get::<Option<u32>>(), Some(&None));
        assert!(e.error().is_none());
    }

    #[test]
    fn explicit_default_beats_absent_default() {
        let mut e = keyword("limit");
        e.set_default(Some(5u32));
        e.bind::<Option<u32>>();
        e.apply_default();
        assert_eq!(e.get::<Option<u32>>(), Some(&Some(5)));
    }

    #[test]
    fn apply_default_is_idempotent_once_matched() {
        let mut e = keyword("n");
        e.set_default(1i32);
        e.bind::<i32>();
        e.convert("4");
        e.apply_default();
        e.apply_default();
        assert_eq!(e.get::<i32>(), Some(&4));
        assert_eq!(e.value(), Some("4"));
    }

    #[test]
    fn later_conversion_replaces_earlier_state() {
        let mut e = keyword("n");
        e.bind::<i32>();
        e.convert("oops");
        assert!(e.error().is_some());
        assert!(e.get::<i32>().is_none());

        e.convert("3");
        assert!(e.error().is_none());
        assert_eq!(e.get::<i32>(), Some(&3));
    }

    #[test]
    fn fail_clears_any_value() {
        let mut e = keyword("n");
        e.bind::<i32>();
        e.convert("3");
        e.fail(ParseError::MissingValue {
            key: "n".to_string(),
        });
        assert!(e.value().is_none());
        assert!(e.get::<i32>().is_none());
        assert!(e.error().is_some());
    }

    #[test]
    fn get_with_wrong_type_is_none() {
        let mut e = keyword("n");
        e.bind::<i32>();
        e.convert("3");
        assert!(e.get::<i64>().is_none());
    }
}
