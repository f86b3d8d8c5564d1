//! Lexer and recursive-descent parser for executable GraphQL documents

use crate::classifier::graphql::document::{
    Definition, Document, Field, Fragment, Operation, OperationKind, Selection, Value,
    VariableDefinition,
};
use crate::error::ClassificationError;

/// Maximum nesting of selection sets and input values
const MAX_NESTING: usize = 64;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Punct(char),
    Spread,
    Name(String),
    Int(String),
    Float(String),
    Str(String),
}

fn malformed(detail: impl std::fmt::Display) -> ClassificationError {
    ClassificationError::new(format!("malformed GraphQL document: {}", detail))
}

fn tokenize(src: &str) -> Result<Vec<Token>, ClassificationError> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\u{feff}' | ' ' | '\t' | '\n' | '\r' | ',' => i += 1,
            '#' => {
                while i < chars.len() && chars[i] != '\n' && chars[i] != '\r' {
                    i += 1;
                }
            }
            '!' | '$' | '&' | '(' | ')' | ':' | '=' | '@' | '[' | ']' | '{' | '|' | '}' => {
                tokens.push(Token::Punct(c));
                i += 1;
            }
            '.' => {
                if chars.get(i + 1) == Some(&'.') && chars.get(i + 2) == Some(&'.') {
                    tokens.push(Token::Spread);
                    i += 3;
                } else {
                    return Err(malformed("unexpected '.'"));
                }
            }
            '"' => {
                let (value, next) = if chars.get(i + 1) == Some(&'"') && chars.get(i + 2) == Some(&'"')
                {
                    lex_block_string(&chars, i + 3)?
                } else {
                    lex_string(&chars, i + 1)?
                };
                tokens.push(Token::Str(value));
                i = next;
            }
            c if c == '-' || c.is_ascii_digit() => {
                let (token, next) = lex_number(&chars, i)?;
                tokens.push(token);
                i = next;
            }
            c if c == '_' || c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len() && (chars[i] == '_' || chars[i].is_ascii_alphanumeric()) {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            other => return Err(malformed(format!("unexpected character '{}'", other))),
        }
    }

    Ok(tokens)
}

fn lex_string(chars: &[char], mut i: usize) -> Result<(String, usize), ClassificationError> {
    let mut out = String::new();
    loop {
        match chars.get(i) {
            None | Some('\n') | Some('\r') => return Err(malformed("unterminated string")),
            Some('"') => return Ok((out, i + 1)),
            Some('\\') => {
                let escaped = chars.get(i + 1).ok_or_else(|| malformed("unterminated string"))?;
                match escaped {
                    '"' => out.push('"'),
                    '\\' => out.push('\\'),
                    '/' => out.push('/'),
                    'b' => out.push('\u{8}'),
                    'f' => out.push('\u{c}'),
                    'n' => out.push('\n'),
                    'r' => out.push('\r'),
                    't' => out.push('\t'),
                    'u' => {
                        let hex: String = chars
                            .get(i + 2..i + 6)
                            .ok_or_else(|| malformed("truncated unicode escape"))?
                            .iter()
                            .collect();
                        let code = u32::from_str_radix(&hex, 16)
                            .map_err(|_| malformed("invalid unicode escape"))?;
                        out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                        i += 4;
                    }
                    other => return Err(malformed(format!("invalid escape '\\{}'", other))),
                }
                i += 2;
            }
            Some(&c) => {
                out.push(c);
                i += 1;
            }
        }
    }
}

fn lex_block_string(chars: &[char], mut i: usize) -> Result<(String, usize), ClassificationError> {
    let mut out = String::new();
    loop {
        if i >= chars.len() {
            return Err(malformed("unterminated block string"));
        }
        if chars[i..].starts_with(&['"', '"', '"']) {
            return Ok((out, i + 3));
        }
        if chars[i..].starts_with(&['\\', '"', '"', '"']) {
            out.push_str("\"\"\"");
            i += 4;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize), ClassificationError> {
    let mut i = start;
    let mut float = false;
    if chars[i] == '-' {
        i += 1;
    }
    let digits = |i: &mut usize| {
        let from = *i;
        while *i < chars.len() && chars[*i].is_ascii_digit() {
            *i += 1;
        }
        *i > from
    };
    if !digits(&mut i) {
        return Err(malformed("invalid number"));
    }
    if chars.get(i) == Some(&'.') {
        float = true;
        i += 1;
        if !digits(&mut i) {
            return Err(malformed("invalid number"));
        }
    }
    if matches!(chars.get(i), Some('e') | Some('E')) {
        float = true;
        i += 1;
        if matches!(chars.get(i), Some('+') | Some('-')) {
            i += 1;
        }
        if !digits(&mut i) {
            return Err(malformed("invalid number"));
        }
    }
    let text: String = chars[start..i].iter().collect();
    Ok((if float { Token::Float(text) } else { Token::Int(text) }, i))
}

/// Parse an executable document
pub fn parse(src: &str) -> Result<Document, ClassificationError> {
    let mut parser = Parser {
        tokens: tokenize(src)?,
        pos: 0,
        depth: 0,
    };

    let mut definitions = Vec::new();
    while parser.peek().is_some() {
        definitions.push(parser.definition()?);
    }

    if definitions.is_empty() {
        return Err(malformed("empty document"));
    }

    Ok(Document { definitions })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_is(&self, c: char) -> bool {
        self.peek() == Some(&Token::Punct(c))
    }

    fn next(&mut self) -> Result<Token, ClassificationError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| malformed("unexpected end of document"))?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek_is(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<(), ClassificationError> {
        match self.next()? {
            Token::Punct(p) if p == c => Ok(()),
            other => Err(malformed(format!("expected '{}', found {:?}", c, other))),
        }
    }

    fn name(&mut self) -> Result<String, ClassificationError> {
        match self.next()? {
            Token::Name(name) => Ok(name),
            other => Err(malformed(format!("expected a name, found {:?}", other))),
        }
    }

    fn enter(&mut self) -> Result<(), ClassificationError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(malformed("nesting too deep"));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn definition(&mut self) -> Result<Definition, ClassificationError> {
        if self.peek_is('{') {
            return Ok(Definition::Operation(Operation {
                kind: OperationKind::Query,
                name: None,
                variables: Vec::new(),
                selection_set: self.selection_set()?,
            }));
        }

        let keyword = self.name()?;
        let kind = match keyword.as_str() {
            "query" => OperationKind::Query,
            "mutation" => OperationKind::Mutation,
            "subscription" => OperationKind::Subscription,
            "fragment" => return self.fragment().map(Definition::Fragment),
            other => return Err(malformed(format!("unexpected definition '{}'", other))),
        };

        let name = match self.peek() {
            Some(Token::Name(_)) => Some(self.name()?),
            _ => None,
        };
        let variables = if self.peek_is('(') {
            self.variable_definitions()?
        } else {
            Vec::new()
        };
        self.directives()?;

        Ok(Definition::Operation(Operation {
            kind,
            name,
            variables,
            selection_set: self.selection_set()?,
        }))
    }

    fn fragment(&mut self) -> Result<Fragment, ClassificationError> {
        let name = self.name()?;
        if name == "on" {
            return Err(malformed("fragment cannot be named 'on'"));
        }
        if self.name()? != "on" {
            return Err(malformed("expected 'on' after fragment name"));
        }
        let type_condition = self.name()?;
        self.directives()?;
        Ok(Fragment {
            name,
            type_condition,
            selection_set: self.selection_set()?,
        })
    }

    fn variable_definitions(&mut self) -> Result<Vec<VariableDefinition>, ClassificationError> {
        self.expect('(')?;
        let mut variables = Vec::new();
        while !self.eat(')') {
            self.expect('$')?;
            let name = self.name()?;
            self.expect(':')?;
            self.type_reference()?;
            let default = if self.eat('=') {
                Some(self.value()?)
            } else {
                None
            };
            self.directives()?;
            variables.push(VariableDefinition { name, default });
        }
        Ok(variables)
    }

    fn type_reference(&mut self) -> Result<(), ClassificationError> {
        if self.eat('[') {
            self.enter()?;
            self.type_reference()?;
            self.expect(']')?;
            self.leave();
        } else {
            self.name()?;
        }
        self.eat('!');
        Ok(())
    }

    fn directives(&mut self) -> Result<(), ClassificationError> {
        while self.eat('@') {
            self.name()?;
            if self.peek_is('(') {
                self.arguments()?;
            }
        }
        Ok(())
    }

    fn selection_set(&mut self) -> Result<Vec<Selection>, ClassificationError> {
        self.expect('{')?;
        self.enter()?;
        let mut selections = Vec::new();
        while !self.eat('}') {
            selections.push(self.selection()?);
        }
        self.leave();
        if selections.is_empty() {
            return Err(malformed("empty selection set"));
        }
        Ok(selections)
    }

    fn selection(&mut self) -> Result<Selection, ClassificationError> {
        if self.peek() == Some(&Token::Spread) {
            self.pos += 1;
            return match self.peek() {
                Some(Token::Name(name)) if name != "on" => {
                    let name = self.name()?;
                    self.directives()?;
                    Ok(Selection::FragmentSpread(name))
                }
                Some(Token::Name(_)) => {
                    self.pos += 1;
                    let type_condition = Some(self.name()?);
                    self.directives()?;
                    Ok(Selection::InlineFragment {
                        type_condition,
                        selection_set: self.selection_set()?,
                    })
                }
                _ => {
                    self.directives()?;
                    Ok(Selection::InlineFragment {
                        type_condition: None,
                        selection_set: self.selection_set()?,
                    })
                }
            };
        }

        let first = self.name()?;
        let (alias, name) = if self.eat(':') {
            (Some(first), self.name()?)
        } else {
            (None, first)
        };
        let arguments = if self.peek_is('(') {
            self.arguments()?
        } else {
            Vec::new()
        };
        self.directives()?;
        let selection_set = if self.peek_is('{') {
            self.selection_set()?
        } else {
            Vec::new()
        };

        Ok(Selection::Field(Field {
            alias,
            name,
            arguments,
            selection_set,
        }))
    }

    fn arguments(&mut self) -> Result<Vec<(String, Value)>, ClassificationError> {
        self.expect('(')?;
        let mut arguments = Vec::new();
        while !self.eat(')') {
            let name = self.name()?;
            self.expect(':')?;
            arguments.push((name, self.value()?));
        }
        if arguments.is_empty() {
            return Err(malformed("empty argument list"));
        }
        Ok(arguments)
    }

    fn value(&mut self) -> Result<Value, ClassificationError> {
        let value = match self.next()? {
            Token::Punct('$') => Value::Variable(self.name()?),
            Token::Int(n) => Value::Int(n),
            Token::Float(n) => Value::Float(n),
            Token::Str(s) => Value::String(s),
            Token::Name(name) => match name.as_str() {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                "null" => Value::Null,
                _ => Value::Enum(name),
            },
            Token::Punct('[') => {
                self.enter()?;
                let mut items = Vec::new();
                while !self.eat(']') {
                    items.push(self.value()?);
                }
                self.leave();
                Value::List(items)
            }
            Token::Punct('{') => {
                self.enter()?;
                let mut fields = Vec::new();
                while !self.eat('}') {
                    let name = self.name()?;
                    self.expect(':')?;
                    fields.push((name, self.value()?));
                }
                self.leave();
                Value::Object(fields)
            }
            other => return Err(malformed(format!("unexpected {:?} in value", other))),
        };
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(selection: &Selection) -> &Field {
        match selection {
            Selection::Field(f) => f,
            other => panic!("expected field, got {:?}", other),
        }
    }

    #[test]
    fn test_anonymous_query() {
        let doc = parse("{ repository(owner: \"o\", name: \"r\") { id } }").unwrap();
        let op = doc.operations().next().unwrap();
        assert_eq!(op.kind, OperationKind::Query);
        assert!(op.name.is_none());
        let repo = field(&op.selection_set[0]);
        assert_eq!(repo.name, "repository");
        assert_eq!(repo.argument("owner"), Some(&Value::String("o".into())));
    }

    #[test]
    fn test_mutation_with_variables_and_alias() {
        let doc = parse(
            r#"
            # merge it
            mutation Merge($id: ID!, $method: PullRequestMergeMethod = SQUASH) {
              done: mergePullRequest(input: {pullRequestId: $id, mergeMethod: $method}) @skip(if: false) {
                pullRequest { merged }
              }
            }
            "#,
        )
        .unwrap();
        let op = doc.operations().next().unwrap();
        assert_eq!(op.kind, OperationKind::Mutation);
        assert_eq!(op.name.as_deref(), Some("Merge"));
        assert_eq!(
            op.variable_default("method"),
            Some(&Value::Enum("SQUASH".into()))
        );

        let merge = field(&op.selection_set[0]);
        assert_eq!(merge.alias.as_deref(), Some("done"));
        assert_eq!(merge.name, "mergePullRequest");
        assert_eq!(
            merge.argument("input"),
            Some(&Value::Object(vec![
                ("pullRequestId".into(), Value::Variable("id".into())),
                ("mergeMethod".into(), Value::Variable("method".into())),
            ]))
        );
    }

    #[test]
    fn test_fragments_and_inline_fragments() {
        let doc = parse(
            r#"
            query { repository(owner: "o", name: "r") { ...Meta ... on Repository { url } } }
            fragment Meta on Repository { name }
            "#,
        )
        .unwrap();
        assert_eq!(doc.fragments().count(), 1);
        let repo = field(&doc.operations().next().unwrap().selection_set[0]);
        assert_eq!(repo.selection_set[0], Selection::FragmentSpread("Meta".into()));
        assert!(matches!(
            repo.selection_set[1],
            Selection::InlineFragment { type_condition: Some(ref t), .. } if t == "Repository"
        ));
    }

    #[test]
    fn test_strings_and_numbers() {
        let doc = parse(
            r#"mutation { addComment(input: {body: "a \"quoted\"\nline A", n: -1.5e3, k: 42, s: """block "x" """}) { clientMutationId } }"#,
        )
        .unwrap();
        let op = doc.operations().next().unwrap();
        let Some(Value::Object(fields)) = field(&op.selection_set[0]).argument("input") else {
            panic!("expected object input");
        };
        assert_eq!(fields[0].1, Value::String("a \"quoted\"\nline A".into()));
        assert_eq!(fields[1].1, Value::Float("-1.5e3".into()));
        assert_eq!(fields[2].1, Value::Int("42".into()));
        assert_eq!(fields[3].1, Value::String("block \"x\" ".into()));
    }

    #[test]
    fn test_malformed_documents() {
        for src in [
            "",
            "{",
            "{ }",
            "query { a(b:) }",
            "mutation { x(input: \"unterminated) { id } }",
            "frobnicate { a }",
            "{ a } }",
            "{ a(b: 1.) }",
        ] {
            assert!(parse(src).is_err(), "{src:?} should not parse");
        }
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}{}", "{ a ".repeat(MAX_NESTING + 1), "}".repeat(MAX_NESTING + 1));
        assert!(parse(&deep).is_err());
    }
}
