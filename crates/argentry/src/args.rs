use indexmap::IndexMap;
use tracing::warn;

use crate::entry::{Entry, EntryBuilder, EntryKind};
use crate::help;

const HELP_KEY: &str = "help";
const HELP_SHORT_KEY: &str = "h";
const HELP_TEXT: &str = "print help";

/// Registry of declared entries plus the raw argument list they are matched
/// against.
///
/// ```
/// use argentry::{Args, ParseOutcome};
///
/// let mut args = Args::new(["prog", "-v", "--count=3", "in.txt"]);
/// let input = args.add_positional("Input file").bind::<String>();
/// let count = args.add_keyword("c,count", "How many", None).bind::<u32>();
/// let verbose = args.add_flag("v,verbose", "Chatty output").bind::<bool>();
///
/// let ParseOutcome::Matches(parsed) = args.parse() else {
///     panic!("expected matches");
/// };
/// assert_eq!(parsed[input], "in.txt");
/// assert_eq!(parsed[count], 3);
/// assert!(parsed[verbose]);
/// ```
#[derive(Debug)]
pub struct Args {
    pub(crate) program_name: String,
    pub(crate) params: Vec<String>,
    pub(crate) entries: Vec<Entry>,
    pub(crate) positionals: Vec<usize>,
    pub(crate) keyed: IndexMap<String, usize>,
    positional_count: usize,
    help: Option<usize>,
}

impl Args {
    /// Capture a full argument vector; the first element is the program name.
    pub fn new<I, S>(argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program_name = argv.next().unwrap_or_default();
        Self {
            program_name,
            params: argv.collect(),
            entries: Vec::new(),
            positionals: Vec::new(),
            keyed: IndexMap::new(),
            positional_count: 0,
            help: None,
        }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::args())
    }

    pub fn program_name(&self) -> &str {
        &self.program_name
    }

    /// Raw tokens after the program name.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// All entries in declaration order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Add a positional argument. Positionals are matched in the order they
    /// are added.
    pub fn add_positional(&mut self, help: impl Into<String>) -> EntryBuilder<'_> {
        let name = format!("arg_{}", self.positional_count);
        self.positional_count += 1;
        let index = self.push(Entry::new(EntryKind::Positional, &name, help, None));
        self.positionals.push(index);
        self.builder(index)
    }

    /// Add an option taking a value.
    ///
    /// `keys` is a comma-separated alias list such as `"k,key"`: single
    /// characters match `-k`, longer aliases match `--key`. `implicit` is the
    /// value used when the option is given without one.
    pub fn add_keyword(
        &mut self,
        keys: &str,
        help: impl Into<String>,
        implicit: Option<&str>,
    ) -> EntryBuilder<'_> {
        let index = self.push_keyed(Entry::new(
            EntryKind::Keyword,
            keys,
            help,
            implicit.map(str::to_string),
        ));
        self.builder(index)
    }

    /// Add a boolean flag: implicit value `true`, default `false`.
    pub fn add_flag(&mut self, keys: &str, help: impl Into<String>) -> EntryBuilder<'_> {
        let index = self.push_keyed(Entry::new(
            EntryKind::Flag,
            keys,
            help,
            Some("true".to_string()),
        ));
        self.builder(index).set_default(false)
    }

    /// Usage text: program name, positionals, then every option including
    /// the built-in help flag.
    pub fn render_help(&self) -> String {
        match self.help {
            Some(_) => help::render_help(&self.program_name, &self.entries, None),
            None => {
                let builtin = self.help_entry();
                help::render_help(&self.program_name, &self.entries, Some(&builtin))
            }
        }
    }

    /// Every entry with its matched or default raw value.
    pub fn render_values(&self) -> String {
        help::render_values(&self.entries)
    }

    pub(crate) fn lookup(&self, key: &str) -> Option<usize> {
        self.keyed.get(key).copied()
    }

    /// The built-in help flag: always `help`, plus `h` while no entry uses it.
    fn help_entry(&self) -> Entry {
        let keys = if self.keyed.contains_key(HELP_SHORT_KEY) {
            HELP_KEY.to_string()
        } else {
            format!("{HELP_SHORT_KEY},{HELP_KEY}")
        };
        let mut entry = Entry::new(EntryKind::Flag, &keys, HELP_TEXT, Some("true".to_string()));
        entry.set_default(false);
        entry
    }

    /// Register the built-in help flag once and return its index.
    ///
    /// A caller-declared `help` alias is taken over.
    pub(crate) fn register_help(&mut self) -> usize {
        if let Some(index) = self.help {
            return index;
        }
        let entry = self.help_entry();
        let index = self.push_keyed(entry);
        self.help = Some(index);
        index
    }

    fn push(&mut self, entry: Entry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    fn push_keyed(&mut self, entry: Entry) -> usize {
        let index = self.push(entry);
        for key in self.entries[index].keys() {
            if let Some(prev) = self.keyed.insert(key.clone(), index) {
                if prev != index {
                    warn!(
                        key = %key,
                        previous = %self.entries[prev].display_keys(),
                        "key registered twice, the later entry shadows the earlier one"
                    );
                }
            }
        }
        index
    }

    fn builder(&mut self, index: usize) -> EntryBuilder<'_> {
        EntryBuilder::new(&mut self.entries[index], index)
    }
}
