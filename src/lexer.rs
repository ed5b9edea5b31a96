//! A module implementing lexical analysis (tokenization) of a command line.
//!
//! Splitting follows the usual shell rules: unquoted whitespace separates words,
//! single quotes keep everything literally, double quotes keep everything except
//! `\"` and `\\`, and an unquoted backslash escapes the next character. Quotes
//! are removed from the resulting words.
//!
//! `;`, `&&`, `||` and `|` are only special as standalone, completely unquoted
//! words: `a;b`, `';'` and `\;` are all plain words.

use thiserror::Error;

/// Control operator joining two segments of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `;`, run the next segment unconditionally.
    Sequence,
    /// `&&`, run the next segment only after success.
    And,
    /// `||`, run the next segment only after failure.
    Or,
}

impl Operator {
    /// The operator's shell syntax.
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Sequence => ";",
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }
}

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A word with quotes and escapes already removed.
    Word(String),
    /// The pipe operator, `|`.
    Pipe,
    /// One of `;`, `&&`, `||`.
    Control(Operator),
}

/// Errors that can occur during the lexical analysis process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexingError {
    /// A closing quote (single or double) was not found.
    #[error("unterminated {0} quote")]
    UnfinishedQuote(char),
    /// The line ends with a backslash that has nothing to escape.
    #[error("no character after trailing backslash")]
    UnfinishedEscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexingState {
    Start,
    ReadingWord,
    ReadingSingleQuote,
    ReadingDoubleQuote,
}

struct LexingFSM {
    input: Vec<char>,
    pos: usize,
    state: LexingState,
    buffer: String,
    /// Whether any part of the current word was quoted or escaped.
    quoted: bool,
}

impl LexingFSM {
    fn new(line: &str) -> Self {
        LexingFSM {
            input: line.chars().collect(),
            pos: 0,
            state: LexingState::Start,
            buffer: String::new(),
            quoted: false,
        }
    }

    /// Runs the state machine over the whole input.
    ///
    /// Fails if the line ends inside a quote or right after a backslash.
    fn make_tokens(&mut self) -> Result<Vec<Token>, LexingError> {
        let mut out = Vec::new();

        while let Some(ch) = self.read_char() {
            match self.state {
                LexingState::Start => self.handle_start(ch)?,
                LexingState::ReadingWord => self.handle_word(ch, &mut out)?,
                LexingState::ReadingSingleQuote => self.handle_single_quote(ch),
                LexingState::ReadingDoubleQuote => self.handle_double_quote(ch),
            }
        }

        match self.state {
            LexingState::ReadingSingleQuote => return Err(LexingError::UnfinishedQuote('\'')),
            LexingState::ReadingDoubleQuote => return Err(LexingError::UnfinishedQuote('"')),
            LexingState::ReadingWord => self.finish_word(&mut out),
            LexingState::Start => {}
        }

        Ok(out)
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn peek_char(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn handle_start(&mut self, ch: char) -> Result<(), LexingError> {
        match ch {
            c if c.is_whitespace() => {}
            '\'' => {
                self.quoted = true;
                self.state = LexingState::ReadingSingleQuote;
            }
            '"' => {
                self.quoted = true;
                self.state = LexingState::ReadingDoubleQuote;
            }
            '\\' => {
                self.escape_next()?;
                self.state = LexingState::ReadingWord;
            }
            c => {
                self.buffer.push(c);
                self.state = LexingState::ReadingWord;
            }
        }
        Ok(())
    }

    fn handle_word(&mut self, ch: char, out: &mut Vec<Token>) -> Result<(), LexingError> {
        match ch {
            c if c.is_whitespace() => {
                self.finish_word(out);
                self.state = LexingState::Start;
            }
            '\'' => {
                self.quoted = true;
                self.state = LexingState::ReadingSingleQuote;
            }
            '"' => {
                self.quoted = true;
                self.state = LexingState::ReadingDoubleQuote;
            }
            '\\' => self.escape_next()?,
            c => self.buffer.push(c),
        }
        Ok(())
    }

    fn handle_single_quote(&mut self, ch: char) {
        match ch {
            '\'' => self.state = LexingState::ReadingWord,
            c => self.buffer.push(c),
        }
    }

    fn handle_double_quote(&mut self, ch: char) {
        match ch {
            '"' => self.state = LexingState::ReadingWord,
            '\\' if matches!(self.peek_char(), Some('"' | '\\')) => {
                if let Some(escaped) = self.read_char() {
                    self.buffer.push(escaped);
                }
            }
            c => self.buffer.push(c),
        }
    }

    /// Takes the character after an unquoted backslash literally.
    fn escape_next(&mut self) -> Result<(), LexingError> {
        let escaped = self.read_char().ok_or(LexingError::UnfinishedEscape)?;
        self.buffer.push(escaped);
        self.quoted = true;
        Ok(())
    }

    /// Turns the buffered word into a token.
    fn finish_word(&mut self, out: &mut Vec<Token>) {
        let text = std::mem::take(&mut self.buffer);
        let token = if std::mem::take(&mut self.quoted) {
            Token::Word(text)
        } else {
            match text.as_str() {
                ";" => Token::Control(Operator::Sequence),
                "&&" => Token::Control(Operator::And),
                "||" => Token::Control(Operator::Or),
                "|" => Token::Pipe,
                _ => Token::Word(text),
            }
        };
        out.push(token);
    }
}

/// The main entry point function to perform lexical analysis.
///
/// Returns the tokens of `line` in order, or a [`LexingError`] if quoting is
/// left open.
pub fn split_into_tokens(line: &str) -> Result<Vec<Token>, LexingError> {
    let mut lexer = LexingFSM::new(line);
    lexer.make_tokens()
}
