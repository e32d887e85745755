//! Tab completion for the interactive shell.
//!
//! Commands and subcommands come from the command definitions. Option values
//! come from the loaded configuration and the current pricing directory.

use std::borrow::Cow;

use rustyline::{
    completion::{Completer, Pair},
    highlight::Highlighter,
    hint::Hinter,
    validate::{ValidationContext, ValidationResult, Validator},
    Context as ReadlineContext, Helper,
};

use crate::cli::commands::{summary::GROUPINGS, CommandDefinition};
use crate::cli::context::ShellContext;
use crate::config::Config;
use crate::domain::{DayOfWeek, PaymentStatus, PricingTable};

/// Words the shell can offer, refreshed after every command.
pub(crate) struct Vocabulary {
    definitions: &'static [CommandDefinition],
    villages: Vec<String>,
    packages: Vec<String>,
    tea_types: Vec<String>,
}

impl Vocabulary {
    pub(crate) fn new(
        definitions: &'static [CommandDefinition],
        config: &Config,
        pricing: &PricingTable,
    ) -> Self {
        Self {
            definitions,
            villages: config.villages.clone(),
            packages: pricing.labels().into_iter().map(str::to_string).collect(),
            tea_types: config.tea_types.clone(),
        }
    }

    /// Falls back to the configured default rates when the store cannot be read.
    pub(crate) fn from_context(context: &mut ShellContext) -> Self {
        let pricing = match context.pricing() {
            Ok(snapshot) => snapshot.table,
            Err(_) => context.config.default_pricing.clone(),
        };
        Self::new(
            crate::cli::commands::all_definitions(),
            &context.config,
            &pricing,
        )
    }

    fn definition(&self, name: &str) -> Option<&'static CommandDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.name.eq_ignore_ascii_case(name))
    }

    /// Completes the word under the cursor; `prefix` is the line up to the cursor.
    pub(crate) fn complete_prefix(&self, prefix: &str) -> (usize, Vec<Pair>) {
        let start = current_word_start(prefix);
        let previous = shell_words::split(&prefix[..start]).unwrap_or_default();
        let partial = &prefix[start..];
        let needle = partial
            .trim_start_matches(|c| c == '"' || c == '\'')
            .to_lowercase();

        let pairs = self
            .candidates(&previous, partial)
            .into_iter()
            .filter(|word| word.to_lowercase().starts_with(&needle))
            .map(|word| Pair {
                replacement: quote(&word),
                display: word,
            })
            .collect();
        (start, pairs)
    }

    fn candidates(&self, previous: &[String], partial: &str) -> Vec<String> {
        let Some((command, rest)) = previous.split_first() else {
            return self.command_names();
        };
        let Some(definition) = self.definition(command) else {
            return Vec::new();
        };

        if let Some(flag) = rest.last().and_then(|word| word.strip_prefix("--")) {
            if definition.flags.contains(&flag) {
                return self.flag_values(flag);
            }
        }
        if partial.starts_with('-') {
            return definition
                .flags
                .iter()
                .map(|flag| format!("--{}", flag))
                .collect();
        }
        match (definition.name, rest) {
            ("help", []) => self.command_names(),
            (_, []) => words(definition.subcommands),
            ("customer", [_subcommand]) => self.villages.clone(),
            _ => Vec::new(),
        }
    }

    fn command_names(&self) -> Vec<String> {
        self.definitions
            .iter()
            .map(|definition| definition.name.to_string())
            .collect()
    }

    fn flag_values(&self, flag: &str) -> Vec<String> {
        match flag {
            "village" => self.villages.clone(),
            "package" => self.packages.clone(),
            "type" => self.tea_types.clone(),
            "status" => PaymentStatus::ALL
                .iter()
                .map(|status| status.label().to_string())
                .collect(),
            "day" => DayOfWeek::ALL
                .iter()
                .map(|day| day.label().to_string())
                .collect(),
            "by" => words(GROUPINGS),
            "date" => vec!["today".to_string()],
            _ => Vec::new(),
        }
    }
}

fn words(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// Byte offset where the word under the cursor begins. Whitespace inside an
/// open quote does not end a word.
fn current_word_start(prefix: &str) -> usize {
    let mut start = 0;
    let mut open_quote = None;
    for (idx, ch) in prefix.char_indices() {
        match open_quote {
            Some(quote) if ch == quote => open_quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => open_quote = Some(ch),
            None if ch.is_whitespace() => start = idx + ch.len_utf8(),
            None => {}
        }
    }
    start
}

fn quote(word: &str) -> String {
    if word.contains(char::is_whitespace) {
        format!("\"{}\"", word)
    } else {
        word.to_string()
    }
}

pub(crate) struct CommandHelper {
    vocabulary: Vocabulary,
}

impl CommandHelper {
    pub(crate) fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub(crate) fn refresh(&mut self, vocabulary: Vocabulary) {
        self.vocabulary = vocabulary;
    }
}

impl Helper for CommandHelper {}

impl Completer for CommandHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &ReadlineContext<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        Ok(self.vocabulary.complete_prefix(&line[..pos]))
    }
}

impl Hinter for CommandHelper {
    type Hint = String;
}

impl Highlighter for CommandHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for CommandHelper {
    fn validate(&self, _ctx: &mut ValidationContext) -> rustyline::Result<ValidationResult> {
        Ok(ValidationResult::Valid(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::all_definitions;

    fn complete(prefix: &str) -> (usize, Vec<String>) {
        let config = Config::default();
        let vocabulary = Vocabulary::new(all_definitions(), &config, &config.default_pricing);
        let (start, pairs) = vocabulary.complete_prefix(prefix);
        (start, pairs.into_iter().map(|pair| pair.replacement).collect())
    }

    #[test]
    fn first_word_completes_command_names() {
        let (start, words) = complete("su");
        assert_eq!(start, 0);
        assert_eq!(words, vec!["summary"]);
        let (_, words) = complete("s");
        assert!(words.contains(&"sale".to_string()));
        assert!(words.contains(&"status".to_string()));
    }

    #[test]
    fn subcommands_follow_their_command() {
        assert_eq!(complete("sale u").1, vec!["update"]);
        assert_eq!(complete("customer re").1, vec!["rename", "remove"]);
        assert_eq!(complete("import ").1, vec!["customers", "pricing"]);
        assert!(complete("exit ").1.is_empty());
        assert_eq!(complete("help cu").1, vec!["customer"]);
    }

    #[test]
    fn sale_options_and_their_values() {
        assert_eq!(complete("sale add --cu").1, vec!["--customer"]);
        assert_eq!(complete("sale add --package 1").1, vec!["100gm", "1kg"]);
        assert_eq!(complete("sale add --type b").1, vec!["Barik"]);
        assert_eq!(complete("sale add --status h").1, vec!["\"Half paid\""]);
        assert_eq!(complete("sale add --day fr").1, vec!["Friday"]);
    }

    #[test]
    fn village_names_are_quoted_when_needed() {
        let (start, words) = complete("sale add --village Harali K");
        assert_eq!(start, "sale add --village Harali ".len());
        assert!(words.is_empty());

        let (start, words) = complete("sale add --village \"Harali K");
        assert_eq!(start, "sale add --village ".len());
        assert_eq!(words, vec!["\"Harali KH\""]);

        assert_eq!(complete("customer list Bar").1, vec!["Bardwadi"]);
        assert_eq!(complete("customer rename v").1, vec!["vairgwadi"]);
    }

    #[test]
    fn summary_groupings_complete_after_by() {
        assert_eq!(complete("summary --by o").1, vec!["outstanding"]);
        assert_eq!(complete("summary --m").1, vec!["--month"]);
    }
}
