//! Scanner and recursive-descent parser for the rule-and-declaration and
//! interface-definition file flavors. Drives [`ParseBuilder`] with one call
//! per recognized statement.

use crate::{
    error::{Error, Result},
    parse::builder::ParseBuilder,
    strings::StringList,
    tree::{AvRuleKind, DeclKind, TransitionKind},
};

#[derive(Clone, Debug, PartialEq, Eq)]
enum Tok {
    Ident(String),
    Str(String),
    Comment(String),
    Punct(char),
    OpenQuote,
    CloseQuote,
}

#[derive(Clone, Debug)]
struct Token {
    tok: Tok,
    line: u32,
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '-' | '~' | '*' | '.' | '/')
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c)
}

fn lex(source: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut line: u32 = 1;
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                line += 1;
                chars.next();
            }
            c if c.is_whitespace() => {
                chars.next();
            }
            '#' => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    text.push(c);
                    chars.next();
                }
                tokens.push(Token {
                    tok: Tok::Comment(text),
                    line,
                });
            }
            '"' => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\n') | None => {
                            return Err(Error::parse(format!(
                                "unterminated string literal on line {line}"
                            )));
                        }
                        Some(c) => text.push(c),
                    }
                }
                tokens.push(Token {
                    tok: Tok::Str(text),
                    line,
                });
            }
            '`' => {
                chars.next();
                tokens.push(Token {
                    tok: Tok::OpenQuote,
                    line,
                });
            }
            '\'' => {
                chars.next();
                tokens.push(Token {
                    tok: Tok::CloseQuote,
                    line,
                });
            }
            '{' | '}' | '(' | ')' | ',' | ';' | ':' => {
                chars.next();
                tokens.push(Token {
                    tok: Tok::Punct(c),
                    line,
                });
            }
            c if is_ident_start(c) => {
                let mut text = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_ident_char(c) {
                        break;
                    }
                    text.push(c);
                    chars.next();
                }
                tokens.push(Token {
                    tok: Tok::Ident(text),
                    line,
                });
            }
            other => {
                return Err(Error::parse(format!(
                    "unexpected character '{other}' on line {line}"
                )));
            }
        }
    }

    Ok(tokens)
}

/// Parse a whole `.te`/`.if` source into the builder.
pub fn parse_policy(source: &str, builder: &mut ParseBuilder<'_>) -> Result<()> {
    let tokens = lex(source)?;
    let mut parser = Parser { tokens, pos: 0 };
    parser.statements(builder, Terminator::Eof)?;
    Ok(())
}

#[derive(Copy, Clone, PartialEq, Eq)]
enum Terminator {
    Eof,
    CloseQuote,
    CloseBrace,
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.pos.min(self.tokens.len().saturating_sub(1)))
            .map_or(1, |token| token.line)
    }

    fn expect_punct(&mut self, expected: char) -> Result<u32> {
        match self.next() {
            Some(Token {
                tok: Tok::Punct(c),
                line,
            }) if c == expected => Ok(line),
            Some(token) => Err(Error::parse(format!(
                "expected '{expected}' on line {}, found {:?}",
                token.line, token.tok
            ))),
            None => Err(Error::parse(format!("expected '{expected}', found end of file"))),
        }
    }

    fn expect_ident(&mut self) -> Result<(String, u32)> {
        match self.next() {
            Some(Token {
                tok: Tok::Ident(name),
                line,
            }) => Ok((name, line)),
            Some(token) => Err(Error::parse(format!(
                "expected identifier on line {}, found {:?}",
                token.line, token.tok
            ))),
            None => Err(Error::parse("expected identifier, found end of file")),
        }
    }

    fn eat_punct(&mut self, expected: char) -> bool {
        if matches!(self.peek(), Some(Token { tok: Tok::Punct(c), .. }) if *c == expected) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn eat_open_quote(&mut self) -> bool {
        if matches!(self.peek(), Some(Token { tok: Tok::OpenQuote, .. })) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect_open_quote(&mut self) -> Result<()> {
        if self.eat_open_quote() {
            Ok(())
        } else {
            Err(Error::parse(format!(
                "expected m4 open quote on line {}",
                self.line()
            )))
        }
    }

    fn expect_close_quote(&mut self) -> Result<()> {
        match self.next() {
            Some(Token {
                tok: Tok::CloseQuote,
                ..
            }) => Ok(()),
            Some(token) => Err(Error::parse(format!(
                "expected m4 close quote on line {}, found {:?}",
                token.line, token.tok
            ))),
            None => Err(Error::parse("expected m4 close quote, found end of file")),
        }
    }

    /// An identifier set: a bare identifier or a `{ ... }` group.
    fn ident_list(&mut self) -> Result<StringList> {
        let mut list = StringList::new();
        if self.eat_punct('{') {
            loop {
                match self.next() {
                    Some(Token {
                        tok: Tok::Punct('}'),
                        ..
                    }) => break,
                    Some(Token {
                        tok: Tok::Ident(name),
                        ..
                    }) => list.push(name),
                    Some(token) => {
                        return Err(Error::parse(format!(
                            "unexpected {:?} in identifier set on line {}",
                            token.tok, token.line
                        )));
                    }
                    None => {
                        return Err(Error::parse("unterminated identifier set"));
                    }
                }
            }
        } else {
            let (name, _) = self.expect_ident()?;
            list.push(name);
        }
        Ok(list)
    }

    /// Identifiers up to (but not consuming) `;`.
    fn ident_list_until_semicolon(&mut self) -> Result<StringList> {
        let mut list = StringList::new();
        loop {
            match self.peek() {
                Some(Token {
                    tok: Tok::Punct(';'),
                    ..
                })
                | None => break,
                _ => {
                    let sub = self.ident_list()?;
                    for name in sub {
                        list.push(name);
                    }
                    self.eat_punct(',');
                }
            }
        }
        Ok(list)
    }

    /// Comma-separated identifiers up to (but not consuming) `;`.
    fn comma_idents_until_semicolon(&mut self) -> Result<StringList> {
        let mut list = StringList::new();
        loop {
            let (name, _) = self.expect_ident()?;
            list.push(name);
            if !self.eat_punct(',') {
                break;
            }
        }
        Ok(list)
    }

    /// One m4 macro argument, flattened to a single string. Arguments are
    /// backtick-quoted (`` `foo' ``), bare identifiers, or brace sets.
    fn macro_arg(&mut self) -> Result<String> {
        if self.eat_open_quote() {
            let mut parts: Vec<String> = Vec::new();
            loop {
                match self.next() {
                    Some(Token {
                        tok: Tok::CloseQuote,
                        ..
                    }) => break,
                    Some(Token {
                        tok: Tok::Ident(name) | Tok::Str(name),
                        ..
                    }) => parts.push(name),
                    Some(Token {
                        tok: Tok::Punct(c), ..
                    }) if c == '{' || c == '}' => parts.push(c.to_string()),
                    Some(token) => {
                        return Err(Error::parse(format!(
                            "unexpected {:?} in macro argument on line {}",
                            token.tok, token.line
                        )));
                    }
                    None => return Err(Error::parse("unterminated macro argument")),
                }
            }
            Ok(parts.join(" "))
        } else if self.eat_punct('{') {
            let mut parts: Vec<String> = Vec::new();
            loop {
                match self.next() {
                    Some(Token {
                        tok: Tok::Punct('}'),
                        ..
                    }) => break,
                    Some(Token {
                        tok: Tok::Ident(name),
                        ..
                    }) => parts.push(name),
                    Some(token) => {
                        return Err(Error::parse(format!(
                            "unexpected {:?} in brace set on line {}",
                            token.tok, token.line
                        )));
                    }
                    None => return Err(Error::parse("unterminated brace set")),
                }
            }
            Ok(format!("{{ {} }}", parts.join(" ")))
        } else {
            match self.next() {
                Some(Token {
                    tok: Tok::Ident(name) | Tok::Str(name),
                    ..
                }) => Ok(name),
                Some(token) => Err(Error::parse(format!(
                    "expected macro argument on line {}, found {:?}",
                    token.line, token.tok
                ))),
                None => Err(Error::parse("expected macro argument, found end of file")),
            }
        }
    }

    fn statements(&mut self, builder: &mut ParseBuilder<'_>, terminator: Terminator) -> Result<()> {
        loop {
            match self.peek() {
                None => {
                    if terminator == Terminator::Eof {
                        return Ok(());
                    }
                    return Err(Error::parse("unexpected end of file inside a block"));
                }
                Some(Token {
                    tok: Tok::CloseQuote,
                    ..
                }) if terminator == Terminator::CloseQuote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(Token {
                    tok: Tok::Punct('}'),
                    ..
                }) if terminator == Terminator::CloseBrace => {
                    self.pos += 1;
                    return Ok(());
                }
                _ => self.statement(builder)?,
            }
        }
    }

    fn statement(&mut self, builder: &mut ParseBuilder<'_>) -> Result<()> {
        let token = self.next().expect("peeked before dispatch");
        let line = token.line;
        match token.tok {
            Tok::Comment(text) => {
                builder.insert_comment(line)?;
                let trimmed = text.trim_start_matches(|c: char| c == '#' || c.is_whitespace());
                if trimmed.starts_with("selint-") {
                    builder.save_command(&text)?;
                }
                Ok(())
            }
            Tok::Punct(';') => builder.insert_semicolon(line),
            Tok::Ident(keyword) => self.keyword_statement(builder, &keyword, line),
            other => Err(Error::parse(format!(
                "unexpected {other:?} on line {line}"
            ))),
        }
    }

    fn keyword_statement(
        &mut self,
        builder: &mut ParseBuilder<'_>,
        keyword: &str,
        line: u32,
    ) -> Result<()> {
        match keyword {
            "type" => self.type_declaration(builder, line),
            "attribute" | "attribute_role" => {
                let (name, _) = self.expect_ident()?;
                self.expect_punct(';')?;
                builder.insert_declaration(DeclKind::Attribute, &name, None, line)
            }
            "role" => self.role_declaration(builder, line),
            "user" => self.user_declaration(builder, line),
            "bool" => {
                let (name, _) = self.expect_ident()?;
                // default value
                let _ = self.expect_ident()?;
                self.expect_punct(';')?;
                builder.insert_declaration(DeclKind::Bool, &name, None, line)
            }
            "class" => {
                let (name, _) = self.expect_ident()?;
                let _perms = self.ident_list_until_semicolon()?;
                self.expect_punct(';')?;
                builder.insert_declaration(DeclKind::Class, &name, None, line)
            }
            "allow" => self.allow_rule(builder, line),
            "auditallow" => self.av_rule(builder, AvRuleKind::AuditAllow, line),
            "dontaudit" => self.av_rule(builder, AvRuleKind::DontAudit, line),
            "neverallow" => self.av_rule(builder, AvRuleKind::NeverAllow, line),
            "type_transition" | "type_change" | "type_member" => {
                self.type_transition(builder, TransitionKind::Type, line)
            }
            "role_transition" => self.role_transition(builder, line),
            "typeattribute" => {
                let (type_name, _) = self.expect_ident()?;
                let attrs = self.comma_idents_until_semicolon()?;
                self.expect_punct(';')?;
                builder.insert_type_attribute(&type_name, attrs, line)
            }
            "typealias" => {
                let (type_name, _) = self.expect_ident()?;
                let (alias_kw, alias_line) = self.expect_ident()?;
                if alias_kw != "alias" {
                    return Err(Error::parse(format!(
                        "expected 'alias' on line {alias_line}"
                    )));
                }
                let aliases = self.ident_list()?;
                self.expect_punct(';')?;
                builder.insert_type_alias(&type_name, line)?;
                builder.insert_aliases(aliases, DeclKind::Type, line)
            }
            "permissive" => {
                let (domain, _) = self.expect_ident()?;
                self.expect_punct(';')?;
                builder.insert_permissive(&domain, line)
            }
            "require" => {
                self.expect_punct('{')?;
                builder.begin_require(line)?;
                self.statements(builder, Terminator::CloseBrace)?;
                builder.end_require()?;
                self.eat_punct(';');
                Ok(())
            }
            "gen_require" => {
                self.expect_punct('(')?;
                self.expect_open_quote()?;
                builder.begin_gen_require(line)?;
                self.statements(builder, Terminator::CloseQuote)?;
                builder.end_gen_require()?;
                self.expect_punct(')')?;
                Ok(())
            }
            "optional_policy" => self.optional_policy(builder, line),
            "tunable_policy" => self.tunable_policy(builder, line),
            "ifdef" | "ifndef" => self.ifdef(builder, line),
            "interface" => self.interface_def(builder, false, line),
            "template" => self.interface_def(builder, true, line),
            _ => self.interface_call(builder, keyword, line),
        }
    }

    fn type_declaration(&mut self, builder: &mut ParseBuilder<'_>, line: u32) -> Result<()> {
        let (name, _) = self.expect_ident()?;

        let mut aliases = None;
        if matches!(self.peek(), Some(Token { tok: Tok::Ident(kw), .. }) if kw == "alias") {
            self.pos += 1;
            aliases = Some(self.ident_list()?);
        }

        let mut attrs = None;
        if self.eat_punct(',') {
            attrs = Some(self.comma_idents_until_semicolon()?);
        }
        self.expect_punct(';')?;

        builder.insert_declaration(DeclKind::Type, &name, attrs, line)?;
        if let Some(aliases) = aliases {
            builder.insert_aliases(aliases, DeclKind::Type, line)?;
        }
        Ok(())
    }

    fn role_declaration(&mut self, builder: &mut ParseBuilder<'_>, line: u32) -> Result<()> {
        let (name, _) = self.expect_ident()?;

        let mut attrs = None;
        if matches!(self.peek(), Some(Token { tok: Tok::Ident(kw), .. }) if kw == "types") {
            self.pos += 1;
            attrs = Some(self.ident_list_until_semicolon()?);
        }
        self.expect_punct(';')?;
        builder.insert_declaration(DeclKind::Role, &name, attrs, line)
    }

    fn user_declaration(&mut self, builder: &mut ParseBuilder<'_>, line: u32) -> Result<()> {
        let (name, _) = self.expect_ident()?;
        // swallow the roles/level clauses
        while !matches!(
            self.peek(),
            Some(Token {
                tok: Tok::Punct(';'),
                ..
            }) | None
        ) {
            self.pos += 1;
        }
        self.expect_punct(';')?;
        builder.insert_declaration(DeclKind::User, &name, None, line)
    }

    /// `allow` opens either an access-vector rule or a role-allow; the
    /// colon before the object classes is what tells them apart.
    fn allow_rule(&mut self, builder: &mut ParseBuilder<'_>, line: u32) -> Result<()> {
        let sources = self.ident_list()?;
        let targets = self.ident_list()?;
        if self.eat_punct(':') {
            let object_classes = self.ident_list()?;
            let perms = self.ident_list_until_semicolon()?;
            self.expect_punct(';')?;
            return builder.insert_av_rule(
                AvRuleKind::Allow,
                sources,
                targets,
                object_classes,
                perms,
                line,
            );
        }
        self.expect_punct(';')?;
        let from_role = sources
            .get(0)
            .ok_or_else(|| Error::parse(format!("missing role on line {line}")))?
            .to_owned();
        let to_role = targets
            .get(0)
            .ok_or_else(|| Error::parse(format!("missing role on line {line}")))?
            .to_owned();
        builder.insert_role_allow(&from_role, &to_role, line)
    }

    fn av_rule(
        &mut self,
        builder: &mut ParseBuilder<'_>,
        kind: AvRuleKind,
        line: u32,
    ) -> Result<()> {
        let sources = self.ident_list()?;
        let targets = self.ident_list()?;
        self.expect_punct(':')?;
        let object_classes = self.ident_list()?;
        let perms = self.ident_list_until_semicolon()?;
        self.expect_punct(';')?;
        builder.insert_av_rule(kind, sources, targets, object_classes, perms, line)
    }

    fn type_transition(
        &mut self,
        builder: &mut ParseBuilder<'_>,
        kind: TransitionKind,
        line: u32,
    ) -> Result<()> {
        let sources = self.ident_list()?;
        let targets = self.ident_list()?;
        self.expect_punct(':')?;
        let object_classes = self.ident_list()?;
        let (default_type, _) = self.expect_ident()?;

        let mut filename = None;
        if let Some(Token { tok: Tok::Str(name), .. }) = self.peek() {
            filename = Some(name.clone());
            self.pos += 1;
        }
        self.expect_punct(';')?;
        builder.insert_type_transition(
            kind,
            sources,
            targets,
            object_classes,
            &default_type,
            filename.as_deref(),
            line,
        )
    }

    fn role_transition(&mut self, builder: &mut ParseBuilder<'_>, line: u32) -> Result<()> {
        let sources = self.ident_list()?;
        let targets = self.ident_list()?;
        if self.eat_punct(':') {
            let _object_classes = self.ident_list()?;
        }
        let (default_role, _) = self.expect_ident()?;
        self.expect_punct(';')?;
        builder.insert_role_transition(sources, targets, &default_role, line)
    }

    fn optional_policy(&mut self, builder: &mut ParseBuilder<'_>, line: u32) -> Result<()> {
        self.expect_punct('(')?;
        self.expect_open_quote()?;
        builder.begin_optional_policy(line)?;
        self.statements(builder, Terminator::CloseQuote)?;
        builder.end_optional_policy()?;
        if self.eat_punct(',') {
            let else_line = self.line();
            self.expect_open_quote()?;
            builder.begin_optional_else(else_line)?;
            self.statements(builder, Terminator::CloseQuote)?;
            builder.end_optional_else()?;
        }
        self.expect_punct(')')?;
        Ok(())
    }

    fn tunable_policy(&mut self, builder: &mut ParseBuilder<'_>, line: u32) -> Result<()> {
        self.expect_punct('(')?;
        // condition expression, not modelled in the tree
        let _condition = self.macro_arg()?;
        self.expect_punct(',')?;
        self.expect_open_quote()?;
        builder.begin_tunable_policy(line)?;
        self.statements(builder, Terminator::CloseQuote)?;
        builder.end_tunable_policy()?;
        if self.eat_punct(',') {
            self.expect_open_quote()?;
            builder.begin_tunable_policy(self.line())?;
            self.statements(builder, Terminator::CloseQuote)?;
            builder.end_tunable_policy()?;
        }
        self.expect_punct(')')?;
        Ok(())
    }

    fn ifdef(&mut self, builder: &mut ParseBuilder<'_>, line: u32) -> Result<()> {
        self.expect_punct('(')?;
        let _condition = self.macro_arg()?;
        self.expect_punct(',')?;
        self.expect_open_quote()?;
        builder.begin_ifdef(line)?;
        self.statements(builder, Terminator::CloseQuote)?;
        builder.end_ifdef()?;
        if self.eat_punct(',') {
            self.expect_open_quote()?;
            builder.begin_ifdef(self.line())?;
            self.statements(builder, Terminator::CloseQuote)?;
            builder.end_ifdef()?;
        }
        self.expect_punct(')')?;
        Ok(())
    }

    fn interface_def(
        &mut self,
        builder: &mut ParseBuilder<'_>,
        is_template: bool,
        line: u32,
    ) -> Result<()> {
        self.expect_punct('(')?;
        self.expect_open_quote()?;
        let (name, _) = self.expect_ident()?;
        self.expect_close_quote()?;
        self.expect_punct(',')?;
        self.expect_open_quote()?;
        builder.begin_interface_def(is_template, &name, line)?;
        self.statements(builder, Terminator::CloseQuote)?;
        builder.end_interface_def()?;
        self.expect_punct(')')?;
        Ok(())
    }

    fn interface_call(
        &mut self,
        builder: &mut ParseBuilder<'_>,
        name: &str,
        line: u32,
    ) -> Result<()> {
        self.expect_punct('(')?;
        let mut args = StringList::new();
        if !matches!(self.peek(), Some(Token { tok: Tok::Punct(')'), .. })) {
            loop {
                args.push(self.macro_arg()?);
                if !self.eat_punct(',') {
                    break;
                }
            }
        }
        self.expect_punct(')')?;
        self.eat_punct(';');
        builder.insert_interface_call(name, args, line)
    }
}
