use std::ops::Index;

use indexmap::IndexMap;
use tracing::debug;

use crate::args::Args;
use crate::convert::ArgValue;
use crate::entry::{Entry, Handle};
use crate::error::{ParseError, ParseErrors};
use crate::help;
use crate::matcher::{Matcher, match_positionals};

#[derive(Debug)]
pub enum ParseOutcome {
    /// Every entry holds a value.
    Matches(Parsed),
    /// The help flag was given; carries the rendered usage.
    Help(String),
    /// At least one entry failed.
    Errors(ParseErrors),
}

impl ParseOutcome {
    /// Print help or errors and exit the process, or hand back the matches.
    ///
    /// Help exits with status 0, errors with status 1.
    pub fn exit_on_failure(self) -> Parsed {
        match self {
            Self::Matches(parsed) => parsed,
            Self::Help(text) => {
                print!("{text}");
                std::process::exit(0);
            }
            Self::Errors(errors) => {
                for err in &errors {
                    eprintln!("{err}");
                }
                std::process::exit(1);
            }
        }
    }
}

impl Args {
    /// Match the raw argument list against the declared entries.
    pub fn parse(mut self) -> ParseOutcome {
        let help = self.register_help();

        let scan = Matcher::new(&self.params, &self.keyed, &mut self.entries, help).scan();
        let rest = match_positionals(&mut self.entries, &self.positionals, &scan.flat);

        for entry in &mut self.entries {
            entry.apply_default();
        }

        if self.entries[help].get::<bool>() == Some(&true) {
            debug!("help requested");
            return ParseOutcome::Help(self.render_help());
        }

        let errors: Vec<ParseError> = self
            .entries
            .iter()
            .filter_map(|e| e.error().cloned())
            .collect();
        if !errors.is_empty() {
            return ParseOutcome::Errors(ParseErrors::new(errors));
        }

        ParseOutcome::Matches(Parsed {
            program_name: self.program_name,
            entries: self.entries,
            positionals: self.positionals,
            keyed: self.keyed,
            rest,
            diagnostics: scan.diagnostics,
        })
    }

    /// Parse, printing help or errors and exiting when there is nothing to
    /// return.
    pub fn validate(self) -> Parsed {
        self.parse().exit_on_failure()
    }
}

/// Successfully parsed entries.
#[derive(Debug)]
pub struct Parsed {
    program_name: String,
    entries: Vec<Entry>,
    positionals: Vec<usize>,
    keyed: IndexMap<String, usize>,
    rest: Vec<String>,
    diagnostics: Vec<ParseError>,
}

impl Parsed {
    pub fn get<T: ArgValue>(&self, handle: Handle<T>) -> Option<&T> {
        self.entries.get(handle.index())?.get::<T>()
    }

    /// Move the value out; later lookups of the same handle return `None`.
    pub fn take<T: ArgValue>(&mut self, handle: Handle<T>) -> Option<T> {
        self.entries.get_mut(handle.index())?.take::<T>()
    }

    /// Look up an entry by option alias or positional name (`arg_0`, ...).
    pub fn entry(&self, key: &str) -> Option<&Entry> {
        if let Some(&idx) = self.keyed.get(key) {
            return self.entries.get(idx);
        }
        self.positionals
            .iter()
            .map(|&idx| &self.entries[idx])
            .find(|e| e.name() == key)
    }

    /// Raw matched (or default) text of an entry.
    pub fn raw(&self, key: &str) -> Option<&str> {
        self.entry(key).and_then(Entry::value)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    /// Positional values that no entry took.
    pub fn rest(&self) -> &[String] {
        &self.rest
    }

    /// Non-fatal findings such as unrecognised keys.
    pub fn diagnostics(&self) -> &[ParseError] {
        &self.diagnostics
    }

    pub fn render_values(&self) -> String {
        help::render_values(&self.entries)
    }
}

impl<T: ArgValue> Index<Handle<T>> for Parsed {
    type Output = T;

    fn index(&self, handle: Handle<T>) -> &T {
        match self.get(handle) {
            Some(v) => v,
            None => panic!("{handle:?} has no value in this parse result"),
        }
    }
}
