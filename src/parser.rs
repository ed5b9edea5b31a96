use crate::lexer::{self, LexingError, Operator, Token};

/// One command's worth of words between control operators.
///
/// A segment is made of one or more pipeline stages, each a list of words.
/// Segments are built once per line and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    stages: Vec<Vec<String>>,
}

impl Segment {
    fn new() -> Self {
        Segment {
            stages: vec![Vec::new()],
        }
    }

    /// Stages in pipe order. Always at least one.
    pub fn stages(&self) -> &[Vec<String>] {
        &self.stages
    }

    /// Words of the first stage, i.e. the whole command when there is no pipe.
    pub fn words(&self) -> &[String] {
        &self.stages[0]
    }

    /// Whether the segment contains an unquoted `|`.
    pub fn is_pipeline(&self) -> bool {
        self.stages.len() > 1
    }

    /// A segment with no words at all, as left by `;;` or a leading `&&`.
    pub fn is_empty(&self) -> bool {
        !self.is_pipeline() && self.stages[0].is_empty()
    }
}

/// A parsed line: segments interleaved with the operators joining them.
///
/// `operators[i]` sits between `segments[i]` and `segments[i + 1]`, so there is
/// always one operator fewer than segments. A blank line has neither.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub segments: Vec<Segment>,
    pub operators: Vec<Operator>,
}

struct SegmentBuilder {
    tokens: Vec<Token>,
    pos: usize,
}

impl SegmentBuilder {
    fn from(tokens: Vec<Token>) -> Self {
        SegmentBuilder { tokens, pos: 0 }
    }

    fn build(mut self) -> CommandLine {
        let mut line = CommandLine::default();
        if self.tokens.is_empty() {
            return line;
        }

        line.segments.push(self.parse_segment());
        while let Some(Token::Control(op)) = self.consume() {
            line.operators.push(op);
            line.segments.push(self.parse_segment());
        }
        line
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn consume(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Parse a segment: stage ('|' stage)*, stopping before a control operator.
    fn parse_segment(&mut self) -> Segment {
        let mut segment = Segment::new();
        while let Some(token) = self.peek() {
            match token {
                Token::Control(_) => break,
                Token::Pipe => segment.stages.push(Vec::new()),
                Token::Word(word) => {
                    let word = word.clone();
                    if let Some(stage) = segment.stages.last_mut() {
                        stage.push(word);
                    }
                }
            }
            self.pos += 1;
        }
        segment
    }
}

/// Group tokens into segments separated by control operators.
///
/// Never fails: empty segments are kept and left for the evaluator to skip.
pub fn construct_command_line(tokens: Vec<Token>) -> CommandLine {
    SegmentBuilder::from(tokens).build()
}

/// Tokenize and segment `line` in one step.
pub fn parse_line(line: &str) -> Result<CommandLine, LexingError> {
    let tokens = lexer::split_into_tokens(line)?;
    log::trace!("tokens: {:?}", tokens);
    let parsed = construct_command_line(tokens);
    log::debug!(
        "{} segment(s), operators {:?}",
        parsed.segments.len(),
        parsed.operators
    );
    Ok(parsed)
}
