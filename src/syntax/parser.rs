//! Source reader for macro client code.
//!
//! Converts source text into syntax nodes with byte spans. The reader is
//! purely syntactic: it knows nothing about which names are macros.

use crate::errors::{SigilError, SourceContext};
use crate::syntax::{
    AccessorKind, Argument, BindingKeyword, CastKind, Node, Span, StringSegment, Syntax,
};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use pest_derive::Parser;
use serde::Serialize;

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct SourceParser;

/// A parsed source file: its top-level statements plus the text they came from.
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    #[serde(skip)]
    pub source: SourceContext,
    pub items: Vec<Node>,
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Parse a whole source file.
pub fn parse_source(name: &str, text: &str) -> Result<SourceFile, SigilError> {
    let source = SourceContext::from_file(name, text);
    let builder = Builder { source: &source };
    let file = builder.entry(Rule::source_file, text)?;
    let items = file
        .into_inner()
        .filter(|p| !matches!(p.as_rule(), Rule::EOI | Rule::import_decl))
        .map(|p| builder.statement(p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SourceFile { source, items })
}

/// Parse a single expression, e.g. a synthesized replacement fragment.
pub fn parse_expression(text: &str) -> Result<Node, SigilError> {
    let source = SourceContext::from_file("<expression>", text);
    let builder = Builder { source: &source };
    let entry = builder.entry(Rule::expression_entry, text)?;
    let mut inner = entry.into_inner();
    builder.expr(builder.expect(&mut inner, "expression")?)
}

/// Parse a single `get { ... }` / `set { ... }` accessor.
pub fn parse_accessor(text: &str) -> Result<Node, SigilError> {
    let source = SourceContext::from_file("<accessor>", text);
    let builder = Builder { source: &source };
    let entry = builder.entry(Rule::accessor_entry, text)?;
    let mut inner = entry.into_inner();
    builder.accessor(builder.expect(&mut inner, "accessor")?)
}

/// Parse a type such as `String?` or `Optional<Int>`.
pub fn parse_type(text: &str) -> Result<Node, SigilError> {
    let source = SourceContext::from_file("<type>", text);
    let builder = Builder { source: &source };
    let entry = builder.entry(Rule::type_entry, text)?;
    let mut inner = entry.into_inner();
    builder.type_expr(builder.expect(&mut inner, "type")?)
}

// ============================================================================
// NODE BUILDERS
// ============================================================================

struct Builder<'s> {
    source: &'s SourceContext,
}

impl<'s> Builder<'s> {
    fn entry<'i>(&self, rule: Rule, text: &'i str) -> Result<Pair<'i, Rule>, SigilError> {
        let mut pairs = SourceParser::parse(rule, text).map_err(|e| self.convert_error(e))?;
        pairs
            .next()
            .ok_or_else(|| self.malformed("input", Span::new(0, text.len())))
    }

    fn statement(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        match pair.as_rule() {
            Rule::variable_decl => self.variable_decl(pair),
            Rule::function_decl => self.function_decl(pair),
            Rule::expr => self.expr(pair),
            rule => Err(self.malformed(&format!("statement ({:?})", rule), span_of(&pair))),
        }
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    fn variable_decl(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let span = span_of(&pair);
        let mut attributes = Vec::new();
        let mut modifiers = Vec::new();
        let mut keyword = BindingKeyword::Var;
        let mut bindings = Vec::new();

        for item in pair.into_inner() {
            match item.as_rule() {
                Rule::attribute => attributes.push(self.attribute(item)?),
                Rule::modifier => modifiers.push(item.as_str().to_string()),
                Rule::binding_keyword => {
                    keyword = if item.as_str() == "let" {
                        BindingKeyword::Let
                    } else {
                        BindingKeyword::Var
                    }
                }
                Rule::pattern_binding => bindings.push(self.pattern_binding(item)?),
                _ => return Err(self.malformed("variable declaration", span_of(&item))),
            }
        }

        Ok(Node::new(
            Syntax::VariableDecl {
                attributes,
                modifiers,
                keyword,
                bindings,
            },
            span,
        ))
    }

    fn function_decl(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let span = span_of(&pair);
        let mut attributes = Vec::new();
        let mut modifiers = Vec::new();
        let mut name = None;
        let mut body = Vec::new();

        for item in pair.into_inner() {
            match item.as_rule() {
                Rule::attribute => attributes.push(self.attribute(item)?),
                Rule::modifier => modifiers.push(item.as_str().to_string()),
                Rule::identifier if name.is_none() => name = Some(item.as_str().to_string()),
                Rule::import_decl => {}
                _ => body.push(self.statement(item)?),
            }
        }

        let name = name.ok_or_else(|| self.malformed("function name", span))?;
        Ok(Node::new(
            Syntax::FunctionDecl {
                attributes,
                modifiers,
                name,
                body,
            },
            span,
        ))
    }

    fn attribute(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let name = self.expect(&mut inner, "attribute name")?.as_str().to_string();
        let mut generic_arguments = Vec::new();
        let mut arguments = Vec::new();
        for item in inner {
            match item.as_rule() {
                Rule::generic_clause => generic_arguments = self.generic_clause(item)?,
                Rule::argument_clause => arguments = self.argument_clause(item)?,
                _ => return Err(self.malformed("attribute", span_of(&item))),
            }
        }
        Ok(Node::new(
            Syntax::Attribute {
                name,
                generic_arguments,
                arguments,
            },
            span,
        ))
    }

    fn pattern_binding(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let pattern = self.pattern(self.expect(&mut inner, "pattern")?)?;
        let mut annotation = None;
        let mut initializer = None;
        let mut accessors = Vec::new();

        for item in inner {
            match item.as_rule() {
                Rule::type_annotation => {
                    let mut parts = item.into_inner();
                    annotation = Some(self.type_expr(self.expect(&mut parts, "type")?)?);
                }
                Rule::initializer => {
                    let mut parts = item.into_inner();
                    initializer = Some(self.expr(self.expect(&mut parts, "initial value")?)?);
                }
                Rule::accessor => accessors.push(self.accessor(item)?),
                _ => return Err(self.malformed("pattern binding", span_of(&item))),
            }
        }

        Ok(Node::new(
            Syntax::PatternBinding {
                pattern,
                annotation,
                initializer,
                accessors,
            },
            span,
        ))
    }

    fn pattern(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let span = span_of(&pair);
        match pair.as_rule() {
            Rule::identifier_pattern => Ok(Node::new(
                Syntax::IdentifierPattern(pair.as_str().trim().to_string()),
                span,
            )),
            Rule::wildcard_pattern => Ok(Node::new(Syntax::WildcardPattern, span)),
            Rule::tuple_pattern => {
                let elements = pair
                    .into_inner()
                    .map(|p| self.pattern(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Node::new(Syntax::TuplePattern(elements), span))
            }
            _ => Err(self.malformed("pattern", span)),
        }
    }

    fn accessor(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let kind = match self.expect(&mut inner, "accessor kind")?.as_str() {
            "get" => AccessorKind::Get,
            _ => AccessorKind::Set,
        };
        let body = inner
            .filter(|p| p.as_rule() != Rule::import_decl)
            .map(|p| self.statement(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Node::new(Syntax::Accessor { kind, body }, span))
    }

    // ------------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------------

    fn type_expr(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let mut inner = pair.into_inner();
        let mut node = self.type_reference(self.expect(&mut inner, "type name")?)?;
        for mark in inner {
            let span = node.span.to(span_of(&mark));
            node = Node::new(Syntax::OptionalType(node), span);
        }
        Ok(node)
    }

    fn type_reference(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let name = self.expect(&mut inner, "type name")?.as_str().to_string();
        let generic_arguments = match inner.next() {
            Some(clause) => self.generic_clause(clause)?,
            None => Vec::new(),
        };
        Ok(Node::new(
            Syntax::TypeReference {
                name,
                generic_arguments,
            },
            span,
        ))
    }

    fn generic_clause(&self, pair: Pair<Rule>) -> Result<Vec<Node>, SigilError> {
        pair.into_inner().map(|p| self.type_expr(p)).collect()
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn expr(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let mut inner = pair.into_inner();
        let mut lhs = self.prefix_expr(self.expect(&mut inner, "operand")?)?;

        for tail in inner {
            let tail_span = span_of(&tail);
            let rule = tail.as_rule();
            let mut parts = tail.into_inner();
            let operator = self.expect(&mut parts, "operator")?;
            let operand = self.expect(&mut parts, "operand")?;
            let span = lhs.span.to(tail_span);
            lhs = match rule {
                Rule::cast_tail => {
                    let kind = match operator.as_str() {
                        "as?" => CastKind::Conditional,
                        "as!" => CastKind::Forced,
                        _ => CastKind::Plain,
                    };
                    let target = self.type_expr(operand)?;
                    Node::new(
                        Syntax::Cast {
                            value: lhs,
                            kind,
                            target,
                        },
                        span,
                    )
                }
                _ => {
                    let rhs = self.prefix_expr(operand)?;
                    Node::new(
                        Syntax::Infix {
                            lhs,
                            operator: operator.as_str().to_string(),
                            rhs,
                        },
                        span,
                    )
                }
            };
        }
        Ok(lhs)
    }

    fn prefix_expr(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let span = span_of(&pair);
        let mut inner = pair.into_inner();
        let first = self.expect(&mut inner, "expression")?;
        if first.as_rule() != Rule::prefix_operator {
            return self.postfix_expr(first);
        }
        let operand = self.postfix_expr(self.expect(&mut inner, "operand")?)?;
        Ok(Node::new(
            Syntax::Prefix {
                operator: first.as_str().to_string(),
                operand,
            },
            span,
        ))
    }

    fn postfix_expr(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let mut inner = pair.into_inner();
        let mut node = self.primary(self.expect(&mut inner, "expression")?)?;

        for suffix in inner {
            let span = node.span.to(span_of(&suffix));
            node = match suffix.as_rule() {
                Rule::argument_clause => {
                    let arguments = self.argument_clause(suffix)?;
                    Node::new(
                        Syntax::Call {
                            callee: node,
                            arguments,
                        },
                        span,
                    )
                }
                Rule::member_suffix => {
                    let mut parts = suffix.into_inner();
                    let member = self.expect(&mut parts, "member name")?.as_str().to_string();
                    Node::new(
                        Syntax::MemberAccess {
                            base: Some(node),
                            member,
                        },
                        span,
                    )
                }
                Rule::force_unwrap => Node::new(Syntax::ForceUnwrap(node), span),
                _ => return Err(self.malformed("postfix expression", span_of(&suffix))),
            };
        }
        Ok(node)
    }

    fn primary(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let span = span_of(&pair);
        match pair.as_rule() {
            Rule::string_literal => self.string_literal(pair),
            Rule::integer_literal => Ok(Node::new(
                Syntax::IntegerLiteral(pair.as_str().to_string()),
                span,
            )),
            Rule::float_literal => Ok(Node::new(
                Syntax::FloatLiteral(pair.as_str().to_string()),
                span,
            )),
            Rule::boolean_literal => Ok(Node::new(
                Syntax::BooleanLiteral(pair.as_str() == "true"),
                span,
            )),
            Rule::nil_literal => Ok(Node::new(Syntax::NilLiteral, span)),
            Rule::identifier => Ok(Node::new(
                Syntax::Identifier(pair.as_str().to_string()),
                span,
            )),
            Rule::implicit_member => {
                let mut inner = pair.into_inner();
                let member = self.expect(&mut inner, "member name")?.as_str().to_string();
                Ok(Node::new(Syntax::MemberAccess { base: None, member }, span))
            }
            Rule::tuple_expr => {
                let elements = self.arguments(pair.into_inner())?;
                Ok(Node::new(Syntax::Tuple(elements), span))
            }
            Rule::macro_expansion => {
                let mut inner = pair.into_inner();
                let name = self.expect(&mut inner, "macro name")?.as_str().to_string();
                let mut generic_arguments = Vec::new();
                let mut arguments = Vec::new();
                for item in inner {
                    match item.as_rule() {
                        Rule::generic_clause => generic_arguments = self.generic_clause(item)?,
                        Rule::argument_clause => arguments = self.argument_clause(item)?,
                        _ => return Err(self.malformed("macro expansion", span_of(&item))),
                    }
                }
                Ok(Node::new(
                    Syntax::MacroExpansion {
                        name,
                        generic_arguments,
                        arguments,
                    },
                    span,
                ))
            }
            rule => Err(self.malformed(&format!("expression ({:?})", rule), span)),
        }
    }

    fn string_literal(&self, pair: Pair<Rule>) -> Result<Node, SigilError> {
        let span = span_of(&pair);
        let mut segments = Vec::new();
        for part in pair.into_inner() {
            match part.as_rule() {
                Rule::string_text => {
                    let text = unescape(part.as_str())
                        .ok_or_else(|| self.malformed("escape sequence", span_of(&part)))?;
                    segments.push(StringSegment::Text(text));
                }
                Rule::interpolation => {
                    let mut inner = part.into_inner();
                    let expr = self.expr(self.expect(&mut inner, "interpolated expression")?)?;
                    segments.push(StringSegment::Interpolation(expr));
                }
                _ => return Err(self.malformed("string literal", span_of(&part))),
            }
        }
        // `""` is one empty static segment, not zero segments.
        if segments.is_empty() {
            segments.push(StringSegment::Text(String::new()));
        }
        Ok(Node::new(Syntax::StringLiteral(segments), span))
    }

    fn argument_clause(&self, pair: Pair<Rule>) -> Result<Vec<Argument>, SigilError> {
        self.arguments(pair.into_inner())
    }

    fn arguments(&self, pairs: Pairs<Rule>) -> Result<Vec<Argument>, SigilError> {
        pairs
            .map(|argument| -> Result<Argument, SigilError> {
                let mut label = None;
                let mut expression = None;
                for part in argument.into_inner() {
                    match part.as_rule() {
                        Rule::argument_label => label = Some(part.as_str().to_string()),
                        _ => expression = Some(self.expr(part)?),
                    }
                }
                let expression =
                    expression.ok_or_else(|| self.malformed("argument", Span::default()))?;
                Ok(Argument { label, expression })
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Error helpers
    // ------------------------------------------------------------------------

    fn expect<'i>(&self, pairs: &mut Pairs<'i, Rule>, what: &str) -> Result<Pair<'i, Rule>, SigilError> {
        pairs
            .next()
            .ok_or_else(|| self.malformed(what, Span::default()))
    }

    fn malformed(&self, construct: &str, span: Span) -> SigilError {
        SigilError::parse(format!("malformed {}", construct), self.source, span)
    }

    fn convert_error(&self, error: pest::error::Error<Rule>) -> SigilError {
        let span = match error.location {
            pest::error::InputLocation::Pos(pos) => Span::new(pos, pos),
            pest::error::InputLocation::Span((start, end)) => Span::new(start, end),
        };
        let error = error.renamed_rules(describe_rule);
        SigilError::parse(error.variant.message().into_owned(), self.source, span)
    }
}

fn span_of(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    Span::new(span.start(), span.end())
}

fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::EOI => "end of input".into(),
        Rule::identifier | Rule::argument_label => "identifier".into(),
        Rule::expr | Rule::prefix_expr | Rule::postfix_expr => "expression".into(),
        Rule::type_expr | Rule::type_reference => "type".into(),
        Rule::infix_operator => "operator".into(),
        Rule::cast_operator => "`as`".into(),
        Rule::argument_clause => "argument list".into(),
        Rule::generic_clause => "generic argument list".into(),
        Rule::pattern_binding => "binding pattern".into(),
        Rule::accessor => "accessor".into(),
        other => format!("{:?}", other),
    }
}

/// Resolve escape sequences in the body of a string literal.
fn unescape(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            '0' => out.push('\0'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            'u' => {
                if chars.next()? != '{' {
                    return None;
                }
                let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }
    Some(out)
}
