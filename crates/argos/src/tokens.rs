//! Argument-vector preprocessing and token classification.
//!
//! Stages, in order: argument-file expansion (recursive, depth-capped),
//! end-of-options sentinel handling, attached-value splitting for long
//! switches (`--name=value`, `--name:value`), and the classification the
//! parser consumes. Short-cluster resolution (including `-o=value`
//! attachment) needs schema knowledge and stays with the parser.

use tracing::{debug, trace};

use crate::error::Error;
use crate::provider::FileRead;
use crate::settings::Settings;

/// A classified token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Tok {
    /// `--name` with an optionally attached value.
    Long {
        /// The full token as written, for diagnostics.
        text: String,
        /// Switch name without prefix or attached value.
        name: String,
        /// Value split off after the first separator.
        attached: Option<String>,
    },

    /// `-abc` short switch or cluster.
    ///
    /// Short tokens are not separator-split here: whether `-Da=1` means
    /// cluster `D` with value `a=1` or flag `D` with attached `=1` depends
    /// on which switch the characters resolve to, which only the parser
    /// knows.
    Short {
        /// The full token as written, for diagnostics.
        text: String,
        /// The characters after the short prefix.
        chars: String,
    },

    /// The end-of-options sentinel.
    Sentinel,

    /// A positional or detached-value candidate.
    Plain(String),
}

/// Quote-aware whitespace splitting shared by argument files and
/// environment-sourced collections.
///
/// Single and double quotes group; there are no backslash escapes; a quote
/// may not span lines.
pub(crate) fn split_quoted(input: &str) -> Result<Vec<String>, String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut started = false;
    let mut quote: Option<char> = None;

    for ch in input.chars() {
        match quote {
            Some(open) => {
                if ch == open {
                    quote = None;
                } else if ch == '\n' || ch == '\r' {
                    return Err("quoted text may not span lines".to_string());
                } else {
                    current.push(ch);
                }
            }
            None => {
                if ch == '\'' || ch == '"' {
                    quote = Some(ch);
                    started = true;
                } else if ch.is_whitespace() {
                    if started {
                        out.push(std::mem::take(&mut current));
                        started = false;
                    }
                } else {
                    current.push(ch);
                    started = true;
                }
            }
        }
    }

    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }

    if started {
        out.push(current);
    }

    Ok(out)
}

/// Expands argument-file tokens in place, recursively.
fn expand_into(
    token: String,
    files: &dyn FileRead,
    settings: &Settings,
    depth: usize,
    out: &mut Vec<String>,
) -> Result<(), Error> {
    let prefix = match settings.file_prefix {
        Some(prefix) => prefix,
        None => {
            out.push(token);
            return Ok(());
        }
    };

    if !token.starts_with(prefix) {
        out.push(token);
        return Ok(());
    }

    let path = &token[prefix.len_utf8()..];

    if depth >= settings.max_expansion_depth {
        return Err(Error::ArgumentFile {
            path: path.to_string(),
            reason: format!(
                "expansion depth {} exceeded",
                settings.max_expansion_depth
            ),
        });
    }

    let contents = files.read(path).map_err(|err| Error::ArgumentFile {
        path: path.to_string(),
        reason: err.to_string(),
    })?;

    let split = split_quoted(&contents).map_err(|reason| Error::ArgumentFile {
        path: path.to_string(),
        reason,
    })?;

    trace!(path, tokens = split.len(), "expanded argument file");

    for inner in split {
        expand_into(inner, files, settings, depth + 1, out)?;
    }

    Ok(())
}

/// Runs argument-file expansion over the whole vector.
pub(crate) fn expand_argument_files(
    args: Vec<String>,
    files: &dyn FileRead,
    settings: &Settings,
) -> Result<Vec<String>, Error> {
    let mut out = Vec::with_capacity(args.len());
    for token in args {
        expand_into(token, files, settings, 0, &mut out)?;
    }
    Ok(out)
}

/// Splits `rest` at the first configured value separator.
fn split_attached(rest: &str, settings: &Settings) -> (String, Option<String>) {
    let split_at = rest
        .char_indices()
        .find(|(_, ch)| settings.value_separators.contains(ch))
        .map(|(idx, _)| idx);

    match split_at {
        Some(idx) => {
            let (name, tail) = rest.split_at(idx);
            let mut tail_chars = tail.chars();
            let sep = tail_chars.next().map_or(0, char::len_utf8);
            (name.to_string(), Some(tail[sep..].to_string()))
        }
        None => (rest.to_string(), None),
    }
}

/// Expands and classifies an argument vector.
pub(crate) fn tokenize(
    args: Vec<String>,
    files: &dyn FileRead,
    settings: &Settings,
) -> Result<Vec<Tok>, Error> {
    let expanded = expand_argument_files(args, files, settings)?;
    debug!(tokens = expanded.len(), "tokenizing argument vector");

    let mut out = Vec::with_capacity(expanded.len());
    let mut options_ended = false;

    for token in expanded {
        if options_ended {
            out.push(Tok::Plain(token));
            continue;
        }

        if settings.is_sentinel(&token) {
            options_ended = true;
            out.push(Tok::Sentinel);
            continue;
        }

        if settings.looks_long(&token) {
            let rest = &token[settings.long_prefix.len()..];
            let (name, attached) = split_attached(rest, settings);
            out.push(Tok::Long {
                text: token,
                name,
                attached,
            });
            continue;
        }

        if settings.looks_short(&token) {
            let prefix_len = settings.short_prefix.map_or(0, char::len_utf8);
            let chars = token[prefix_len..].to_string();
            out.push(Tok::Short { text: token, chars });
            continue;
        }

        out.push(Tok::Plain(token));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MapFiles;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_split_quoted_basic() {
        assert_eq!(
            split_quoted("a b  c").unwrap(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert!(split_quoted("   ").unwrap().is_empty());
    }

    #[test]
    fn test_split_quoted_groups() {
        assert_eq!(
            split_quoted(r#"--name "Ada Lovelace" -v"#).unwrap(),
            vec![
                "--name".to_string(),
                "Ada Lovelace".to_string(),
                "-v".to_string()
            ]
        );
        assert_eq!(
            split_quoted("'a b'c").unwrap(),
            vec!["a bc".to_string()]
        );
        assert_eq!(split_quoted(r#""""#).unwrap(), vec![String::new()]);
    }

    #[test]
    fn test_split_quoted_no_escapes() {
        // Backslash is an ordinary character inside quotes.
        assert_eq!(
            split_quoted(r#""a\b""#).unwrap(),
            vec![r"a\b".to_string()]
        );
    }

    #[test]
    fn test_split_quoted_errors() {
        assert!(split_quoted("\"open").is_err());
        assert!(split_quoted("\"a\nb\"").is_err());
    }

    #[test]
    fn test_expansion_and_recursion() {
        let files = MapFiles::new()
            .with("outer.txt", "--verbose @inner.txt done")
            .with("inner.txt", "--name 'Ada'");
        let settings = Settings::default();

        let expanded =
            expand_argument_files(args(&["@outer.txt", "tail"]), &files, &settings).unwrap();
        assert_eq!(
            expanded,
            vec!["--verbose", "--name", "Ada", "done", "tail"]
        );
    }

    #[test]
    fn test_expansion_depth_cap() {
        let files = MapFiles::new().with("loop.txt", "@loop.txt");
        let settings = Settings::default();

        let err = expand_argument_files(args(&["@loop.txt"]), &files, &settings).unwrap_err();
        assert!(err.to_string().contains("depth"), "{err}");
    }

    #[test]
    fn test_expansion_missing_file() {
        let files = MapFiles::new();
        let settings = Settings::default();

        let err = expand_argument_files(args(&["@nope.txt"]), &files, &settings).unwrap_err();
        assert!(err.to_string().contains("nope.txt"), "{err}");
    }

    #[test]
    fn test_expansion_disabled() {
        let files = MapFiles::new();
        let settings = Settings {
            file_prefix: None,
            ..Settings::default()
        };

        let expanded =
            expand_argument_files(args(&["@literal"]), &files, &settings).unwrap();
        assert_eq!(expanded, vec!["@literal"]);
    }

    #[test]
    fn test_classification() {
        let files = MapFiles::new();
        let settings = Settings::default();

        let toks = tokenize(
            args(&["--name=Ada", "--port:8080", "-vn42", "pos", "--", "--after"]),
            &files,
            &settings,
        )
        .unwrap();

        assert_eq!(
            toks,
            vec![
                Tok::Long {
                    text: "--name=Ada".into(),
                    name: "name".into(),
                    attached: Some("Ada".into()),
                },
                Tok::Long {
                    text: "--port:8080".into(),
                    name: "port".into(),
                    attached: Some("8080".into()),
                },
                Tok::Short {
                    text: "-vn42".into(),
                    chars: "vn42".into(),
                },
                Tok::Plain("pos".into()),
                Tok::Sentinel,
                Tok::Plain("--after".into()),
            ]
        );
    }

    #[test]
    fn test_empty_attached_value() {
        let files = MapFiles::new();
        let settings = Settings::default();

        let toks = tokenize(args(&["--name="]), &files, &settings).unwrap();
        assert_eq!(
            toks,
            vec![Tok::Long {
                text: "--name=".into(),
                name: "name".into(),
                attached: Some(String::new()),
            }]
        );
    }
}
