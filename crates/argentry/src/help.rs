use crate::entry::{Entry, EntryKind};

fn push_rows(out: &mut String, rows: Vec<(String, String)>) {
    let width = rows
        .iter()
        .map(|(l, _)| l.chars().count())
        .max()
        .unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {}\n", left));
        } else {
            out.push_str(&format!("  {:width$}  {}\n", left, help, width = width));
        }
    }
}

fn option_annotation(entry: &Entry) -> String {
    if entry.kind() != EntryKind::Keyword {
        return String::new();
    }
    let implicit = entry
        .implicit_value()
        .map(|v| format!("implicit: {v}"));
    let default = match entry.default_str() {
        Some(d) => format!("default: {d}"),
        None => "required".to_string(),
    };
    match implicit {
        Some(implicit) => format!(" [{implicit}, {default}]"),
        None => format!(" [{default}]"),
    }
}

/// Render usage for `program_name` and its entries. `builtin` is listed
/// after them when it is not registered yet.
pub(crate) fn render_help(
    program_name: &str,
    entries: &[Entry],
    builtin: Option<&Entry>,
) -> String {
    let positionals: Vec<&Entry> = entries
        .iter()
        .filter(|e| e.kind() == EntryKind::Positional)
        .collect();

    let mut out = format!("Usage: {program_name}");
    for entry in &positionals {
        out.push(' ');
        out.push_str(entry.name());
        if entry.is_multi_argument() {
            out.push_str("...");
        }
    }
    out.push_str(" [options...]\n");

    if !positionals.is_empty() {
        out.push_str("\nArguments:\n");
        let rows = positionals
            .iter()
            .map(|e| {
                let default = e
                    .default_str()
                    .map(|d| format!(" [default: {d}]"))
                    .unwrap_or_default();
                (e.name().to_string(), format!("{}{}", e.help().trim(), default))
            })
            .collect();
        push_rows(&mut out, rows);
    }

    let options: Vec<(String, String)> = entries
        .iter()
        .filter(|e| e.kind() != EntryKind::Positional)
        .chain(builtin)
        .map(|e| {
            (
                e.display_keys(),
                format!("{}{}", e.help().trim(), option_annotation(e)),
            )
        })
        .collect();
    if !options.is_empty() {
        out.push_str("\nOptions:\n");
        push_rows(&mut out, options);
    }

    out
}

/// Render each entry's matched or default raw value, `null` when unset.
pub(crate) fn render_values(entries: &[Entry]) -> String {
    let rows: Vec<(String, String)> = entries
        .iter()
        .map(|e| {
            let mut left = e.display_keys();
            if e.kind() == EntryKind::Positional {
                let help = e.help();
                let snip = if help.chars().count() > 10 {
                    format!("{}...", help.chars().take(7).collect::<String>())
                } else {
                    help.to_string()
                };
                left.push_str(&format!("({snip})"));
            }
            (left, e.value().unwrap_or("null").to_string())
        })
        .collect();

    let width = rows
        .iter()
        .map(|(l, _)| l.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (left, value) in rows {
        out.push_str(&format!("{:>width$} : {}\n", left, value, width = width));
    }
    out
}
