//! Typed command-line argument declaration and parsing.
//!
//! Callers register positional arguments, keyword options and flags on an
//! [`Args`] registry, bind each one to a concrete type, then call
//! [`Args::parse`]. The result is either every value converted
//! ([`ParseOutcome::Matches`]), the rendered help text, or the list of
//! per-entry errors. Nothing here prints or exits unless asked to through
//! [`ParseOutcome::exit_on_failure`].
//!
//! Grammar:
//! - positionals are matched by declaration order; one multi-argument
//!   positional may sit anywhere and absorbs the values between the
//!   positionals before and after it
//! - `--key value`, `--key=value`, `--flag`
//! - `-k value`, `-k=value`, `-f`, grouped `-abk value`
//! - multi-argument options consume a run of values, joined with `,`
//! - `--` ends option parsing; `-h`/`--help`/`-help` request help

mod args;
mod convert;
mod entry;
mod error;
mod help;
mod matcher;
mod parse;

pub use args::Args;
pub use convert::{ArgValue, split};
pub use entry::{Entry, EntryBuilder, EntryKind, Handle};
pub use error::{ConversionError, ParseError, ParseErrors};
pub use parse::{ParseOutcome, Parsed};
