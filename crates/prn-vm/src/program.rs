//! # Program Model
//!
//! A program is an ordered sequence of `(mnemonic, args)` records.
//! Mnemonics match case-insensitively and are uppercased at construction.
//! Two loaders produce the same model: a line-oriented text assembler and
//! a JSON reader for the external record format.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One instruction argument: string, integer or float.
///
/// JSON numbers deserialise as `Int` when integral, `Float` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Argument {
    /// Integer literal.
    Int(i64),
    /// Floating-point literal.
    Float(f64),
    /// Bare word, label, register name, or quoted string.
    Str(String),
}

impl Argument {
    /// Numeric view: integers widen to f64. `None` for strings.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    /// Non-negative integer view. `None` for anything else.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(v) if *v >= 0 => Some(*v as u64),
            _ => None,
        }
    }

    /// String view. `None` for numbers.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

/// One instruction record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instruction {
    /// Uppercased mnemonic.
    pub mnemonic: String,
    /// Positional arguments.
    #[serde(default)]
    pub args: Vec<Argument>,
    /// Source line, 1-based. Zero for synthetic instructions.
    #[serde(default)]
    pub line: usize,
}

impl Instruction {
    /// Builds an instruction, uppercasing the mnemonic.
    #[must_use]
    pub fn new(mnemonic: &str, args: Vec<Argument>) -> Self {
        Self {
            mnemonic: mnemonic.to_ascii_uppercase(),
            args,
            line: 0,
        }
    }

    /// Builds an instruction with a source line.
    #[must_use]
    pub fn with_line(mnemonic: &str, args: Vec<Argument>, line: usize) -> Self {
        Self {
            mnemonic: mnemonic.to_ascii_uppercase(),
            args,
            line,
        }
    }
}

/// An ordered instruction sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// The instructions, in execution order.
    pub instructions: Vec<Instruction>,
}

/// Program parse failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A line started with a non-identifier token.
    #[error("line {line}: invalid mnemonic {token:?}")]
    InvalidMnemonic { line: usize, token: String },

    /// A quoted string never closed.
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },

    /// The JSON payload did not match the record format.
    #[error("invalid program JSON: {0}")]
    Json(String),
}

impl Program {
    /// Builds a program from pre-assembled instructions.
    #[must_use]
    pub fn from_instructions(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Parses the line-oriented assembler text.
    ///
    /// One instruction per line: `MNEMONIC arg arg ...`. `#` and `;` start
    /// comments. Arguments are classified as integer, float, or string;
    /// double quotes protect spaces in string arguments.
    ///
    /// # Errors
    ///
    /// Malformed mnemonics and unterminated strings.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let mut instructions = Vec::new();
        for (index, raw_line) in source.lines().enumerate() {
            let line = index + 1;
            let tokens = tokenize(raw_line, line)?;
            let Some((mnemonic, args)) = tokens.split_first() else {
                continue;
            };
            let Argument::Str(mnemonic) = mnemonic else {
                return Err(ParseError::InvalidMnemonic {
                    line,
                    token: mnemonic.to_string(),
                });
            };
            if !mnemonic
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                return Err(ParseError::InvalidMnemonic {
                    line,
                    token: mnemonic.clone(),
                });
            }
            instructions.push(Instruction::with_line(mnemonic, args.to_vec(), line));
        }
        Ok(Self { instructions })
    }

    /// Parses the JSON record format: an array of
    /// `{"mnemonic": "...", "args": [...]}` objects.
    ///
    /// # Errors
    ///
    /// Any JSON shape mismatch.
    pub fn parse_json(source: &str) -> Result<Self, ParseError> {
        let mut program: Self = serde_json::from_str(&format!(
            "{{\"instructions\": {source}}}"
        ))
        .or_else(|_| serde_json::from_str(source))
        .map_err(|e| ParseError::Json(e.to_string()))?;
        for instruction in &mut program.instructions {
            instruction.mnemonic = instruction.mnemonic.to_ascii_uppercase();
        }
        Ok(program)
    }

    /// Instruction count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True when the program has no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Splits one source line into classified tokens, dropping comments.
fn tokenize(line: &str, line_no: usize) -> Result<Vec<Argument>, ParseError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '#' | ';' => break,
            c if c.is_whitespace() => {
                chars.next();
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                for c in chars.by_ref() {
                    if c == '"' {
                        closed = true;
                        break;
                    }
                    text.push(c);
                }
                if !closed {
                    return Err(ParseError::UnterminatedString { line: line_no });
                }
                tokens.push(Argument::Str(text));
            }
            _ => {
                let mut word = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || c == '#' || c == ';' {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(classify(&word));
            }
        }
    }
    Ok(tokens)
}

/// Bare tokens become integers, floats, or strings, in that order.
fn classify(word: &str) -> Argument {
    if let Ok(v) = word.parse::<i64>() {
        return Argument::Int(v);
    }
    if let Ok(v) = word.parse::<f64>() {
        return Argument::Float(v);
    }
    Argument::Str(word.to_string())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_classifies_arguments() {
        let program = Program::parse("LOAD 7 0.5\nGOTO end\n").unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program.instructions[0].mnemonic, "LOAD");
        assert_eq!(
            program.instructions[0].args,
            vec![Argument::Int(7), Argument::Float(0.5)]
        );
        assert_eq!(
            program.instructions[1].args,
            vec![Argument::Str("end".into())]
        );
    }

    #[test]
    fn test_parse_uppercases_mnemonics() {
        let program = Program::parse("halt").unwrap();
        assert_eq!(program.instructions[0].mnemonic, "HALT");
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let source = "# full line comment\n\nLOAD 2 1.0 ; trailing\n   \nHALT\n";
        let program = Program::parse(source).unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program.instructions[0].line, 3);
        assert_eq!(program.instructions[1].line, 5);
    }

    #[test]
    fn test_parse_quoted_strings() {
        let program = Program::parse("OUTPUT \"two words\"").unwrap();
        assert_eq!(
            program.instructions[0].args,
            vec![Argument::Str("two words".into())]
        );
    }

    #[test]
    fn test_parse_rejects_unterminated_string() {
        let err = Program::parse("OUTPUT \"open").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedString { line: 1 }));
    }

    #[test]
    fn test_parse_rejects_numeric_mnemonic() {
        let err = Program::parse("42 1 2").unwrap_err();
        assert!(matches!(err, ParseError::InvalidMnemonic { .. }));
    }

    #[test]
    fn test_json_record_format() {
        let source = r#"[
            {"mnemonic": "load", "args": [7, 0.5]},
            {"mnemonic": "HALT"}
        ]"#;
        let program = Program::parse_json(source).unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program.instructions[0].mnemonic, "LOAD");
        assert_eq!(
            program.instructions[0].args,
            vec![Argument::Int(7), Argument::Float(0.5)]
        );
        assert!(program.instructions[1].args.is_empty());
    }

    #[test]
    fn test_json_rejects_garbage() {
        assert!(Program::parse_json("{\"nope\": 1}").is_err());
    }

    #[test]
    fn test_argument_coercions() {
        assert_eq!(Argument::Int(3).as_f64(), Some(3.0));
        assert_eq!(Argument::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(Argument::Str("x".into()).as_f64(), None);
        assert_eq!(Argument::Int(-1).as_u64(), None);
        assert_eq!(Argument::Int(7).as_u64(), Some(7));
    }
}
