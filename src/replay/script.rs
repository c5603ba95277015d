//! Line-oriented operation scripts.
//!
//! ```text
//! # comment
//! put <key> <value...>
//! get <key>
//! peek <key>
//! remove <key>
//! clear
//! resize <capacity>
//! ```
//!
//! A `put` value is the rest of the line and may contain spaces.

use serde::Serialize;

use crate::{CacheError, CacheResult};

/// A single cache operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    Put { key: String, value: String },
    Get { key: String },
    Peek { key: String },
    Remove { key: String },
    Clear,
    Resize { capacity: usize },
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Put { key, value } => write!(f, "put {key} {value}"),
            Self::Get { key } => write!(f, "get {key}"),
            Self::Peek { key } => write!(f, "peek {key}"),
            Self::Remove { key } => write!(f, "remove {key}"),
            Self::Clear => write!(f, "clear"),
            Self::Resize { capacity } => write!(f, "resize {capacity}"),
        }
    }
}

/// An operation tagged with its source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// 1-based line number.
    pub line: usize,
    pub operation: Operation,
}

/// Parses a script, stopping at the first malformed line.
pub fn parse(source: &str) -> CacheResult<Vec<Step>> {
    let mut steps = Vec::new();

    for (idx, raw) in source.lines().enumerate() {
        let line = idx + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let operation = parse_operation(line, text)?;
        steps.push(Step { line, operation });
    }

    Ok(steps)
}

fn parse_operation(line: usize, text: &str) -> CacheResult<Operation> {
    let (verb, rest) = split_word(text);

    let operation = match verb {
        "put" => {
            let (key, value) = split_word(rest);
            if key.is_empty() || value.is_empty() {
                return Err(CacheError::script(line, "put requires a key and a value"));
            }
            Operation::Put {
                key: key.to_string(),
                value: value.to_string(),
            }
        }
        "get" => Operation::Get {
            key: single_key(line, verb, rest)?,
        },
        "peek" => Operation::Peek {
            key: single_key(line, verb, rest)?,
        },
        "remove" => Operation::Remove {
            key: single_key(line, verb, rest)?,
        },
        "clear" => {
            if !rest.is_empty() {
                return Err(CacheError::script(line, "clear takes no arguments"));
            }
            Operation::Clear
        }
        "resize" => {
            let capacity = rest.parse::<usize>().map_err(|_| {
                CacheError::script(
                    line,
                    format!("resize requires a non-negative integer, got '{rest}'"),
                )
            })?;
            Operation::Resize { capacity }
        }
        other => {
            return Err(CacheError::script(
                line,
                format!("unknown operation '{other}'"),
            ))
        }
    };

    Ok(operation)
}

fn single_key(line: usize, verb: &str, rest: &str) -> CacheResult<String> {
    let (key, extra) = split_word(rest);
    if key.is_empty() {
        return Err(CacheError::script(line, format!("{verb} requires a key")));
    }
    if !extra.is_empty() {
        return Err(CacheError::script(
            line,
            format!("{verb} takes exactly one key"),
        ));
    }
    Ok(key.to_string())
}

/// Splits off the first whitespace-delimited word.
fn split_word(text: &str) -> (&str, &str) {
    match text.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (text, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_operations() {
        let steps = parse(
            "# warm up\n\
             put 1 a\n\
             \n\
             get 1\n\
             peek 1\n\
             remove 1\n\
             clear\n\
             resize 4\n",
        )
        .unwrap();

        let ops: Vec<_> = steps.iter().map(|s| s.operation.clone()).collect();
        assert_eq!(
            ops,
            vec![
                Operation::Put {
                    key: "1".into(),
                    value: "a".into()
                },
                Operation::Get { key: "1".into() },
                Operation::Peek { key: "1".into() },
                Operation::Remove { key: "1".into() },
                Operation::Clear,
                Operation::Resize { capacity: 4 },
            ]
        );
        assert_eq!(steps[0].line, 2);
        assert_eq!(steps[1].line, 4);
    }

    #[test]
    fn test_put_value_keeps_spaces() {
        let steps = parse("put greeting  hello there  world ").unwrap();
        assert_eq!(
            steps[0].operation,
            Operation::Put {
                key: "greeting".into(),
                value: "hello there  world".into()
            }
        );
    }

    #[test]
    fn test_unknown_verb_reports_line() {
        let err = parse("put a 1\npop\n").unwrap_err();
        match err {
            CacheError::Script { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("pop"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_arguments() {
        assert!(parse("put onlykey").is_err());
        assert!(parse("get").is_err());
        assert!(parse("get a b").is_err());
        assert!(parse("clear now").is_err());
        assert!(parse("resize -1").is_err());
        assert!(parse("resize big").is_err());
    }

    #[test]
    fn test_display_round_trips_text() {
        let op = Operation::Put {
            key: "k".into(),
            value: "two words".into(),
        };
        assert_eq!(op.to_string(), "put k two words");
        assert_eq!(parse(&op.to_string()).unwrap()[0].operation, op);
    }
}
