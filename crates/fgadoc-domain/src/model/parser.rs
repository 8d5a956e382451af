//! DSL parser for OpenFGA authorization models.
//!
//! Parses the OpenFGA DSL format into AuthorizationModel structures.
//!
//! Example DSL:
//! ```text
//! model
//!   schema 1.1
//!
//! type user
//!
//! type document
//!   relations
//!     define owner: [user]
//!     define editor: [user, user with non_expired] or owner
//!     define viewer: [user:*] or editor or viewer from parent
//!     define parent: [folder]
//!
//! condition non_expired(expires_at: timestamp, now: timestamp) {
//!   now < expires_at
//! }
//! ```
//!
//! Module files (see [`parse_module`]) replace the `model` header with
//! `module <name>` and may add relations to types declared elsewhere through
//! `extend type <name>`.

use std::collections::HashMap;

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, line_ending, multispace1, satisfy, space0, space1},
    combinator::{all_consuming, cut, eof, map, not, opt, peek, value},
    error::{context, ContextError, ErrorKind, ParseError},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use super::{
    AuthorizationModel, Condition, ConditionParamTypeRef, Metadata, RelationMetadata,
    RelationReference, TypeDefinition, TypeName, Userset,
};

/// Parser error type with context for better error messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub message: String,
    pub position: Option<usize>,
}

impl ParserError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    pub fn with_position(message: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            position: Some(position),
        }
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(pos) = self.position {
            write!(f, "{} at position {}", self.message, pos)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ParserError {}

/// Result type for parser operations.
pub type ParserResult<T> = Result<T, ParserError>;

/// A parsed module file: one contribution to a modular model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDocument {
    /// Name declared by the `module` header.
    pub module: String,
    /// Type blocks in file order.
    pub types: Vec<ModuleTypeDefinition>,
    /// Conditions in file order.
    pub conditions: Vec<Condition>,
}

/// A `type` or `extend type` block of a module file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleTypeDefinition {
    /// True for `extend type` blocks.
    pub extends: bool,
    pub definition: TypeDefinition,
}

// ============ Syntax Tree ============

/// Relation expression as written, before lowering into a [`Userset`].
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Direct(Vec<RelationReference>),
    Computed(String),
    TupleToUserset { computed: String, tupleset: String },
    Union(Vec<Expr>),
    Intersection(Vec<Expr>),
    Difference(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone)]
enum Tail {
    Or(Vec<Expr>),
    And(Vec<Expr>),
    ButNot(Expr),
}

#[derive(Debug, Clone)]
enum RefSuffix<'a> {
    Wildcard,
    Relation(&'a str),
}

#[derive(Debug, Clone)]
struct ParamTypeExpr<'a> {
    name: &'a str,
    generic: Option<Box<ParamTypeExpr<'a>>>,
}

#[derive(Debug, Clone)]
struct TypeBlock<'a> {
    extends: bool,
    name: &'a str,
    relations: Vec<(&'a str, Expr)>,
}

#[derive(Debug, Clone)]
struct ConditionBlock<'a> {
    name: &'a str,
    parameters: Vec<(&'a str, ParamTypeExpr<'a>)>,
    body: &'a str,
}

#[derive(Debug, Clone)]
enum Statement<'a> {
    Type(TypeBlock<'a>),
    Condition(ConditionBlock<'a>),
}

#[derive(Debug, Clone)]
enum Header<'a> {
    Model { schema_version: &'a str },
    Module { name: &'a str },
}

#[derive(Debug, Clone)]
struct Document<'a> {
    header: Header<'a>,
    statements: Vec<Statement<'a>>,
}

// ============ Helper Parsers ============

/// Parse a comment (# to end of line)
fn comment<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value((), pair(char('#'), take_while(|c| c != '\n' && c != '\r')))(input)
}

/// Parse whitespace including comments
fn ws<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    value((), many0(alt((value((), multispace1), comment))))(input)
}

/// Reserved keywords that cannot be used as identifiers
const RESERVED_KEYWORDS: &[&str] = &[
    "model",
    "schema",
    "module",
    "extend",
    "type",
    "relations",
    "define",
    "condition",
    "or",
    "and",
    "but",
    "not",
    "from",
    "with",
];

/// Check if a string is a reserved keyword
fn is_reserved(s: &str) -> bool {
    RESERVED_KEYWORDS.contains(&s)
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

/// Parse an identifier (alphanumeric, underscore and dash, not a reserved keyword)
fn identifier<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (rest, id) = take_while1(is_identifier_char)(input)?;

    if is_reserved(id) {
        return Err(nom::Err::Error(E::from_error_kind(input, ErrorKind::Tag)));
    }

    Ok((rest, id))
}

/// Parse a keyword that is not immediately followed by an identifier character
fn keyword<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    word: &'static str,
) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str, E> {
    move |input| terminated(tag(word), not(satisfy(is_identifier_char)))(input)
}

/// Succeeds without consuming when the rest of the line is blank or a comment
fn end_of_line<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (), E> {
    peek(alt((
        value((), line_ending),
        value((), eof),
        value((), char('#')),
    )))(input)
}

// ============ Header Parsers ============

fn schema_version<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    take_while1(|c: char| c.is_ascii_digit() || c == '.')(input)
}

/// Parse "model" followed by "schema <version>"
fn model_header<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Header<'a>, E> {
    context(
        "model header",
        map(
            preceded(
                tuple((keyword("model"), ws, keyword("schema"), space1)),
                schema_version,
            ),
            |schema_version| Header::Model { schema_version },
        ),
    )(input)
}

/// Parse "module <name>"
fn module_header<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Header<'a>, E> {
    context(
        "module header",
        map(preceded(pair(keyword("module"), space1), identifier), |name| {
            Header::Module { name }
        }),
    )(input)
}

// ============ Type Restriction Parsers ============

/// Parse a single restriction like `user`, `user:*`, `group#member` or
/// `user with condition`
fn relation_reference<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, RelationReference, E> {
    let (rest, type_name) = identifier(input)?;
    let (rest, suffix) = opt(alt((
        value(RefSuffix::Wildcard, tag(":*")),
        map(preceded(char('#'), identifier), RefSuffix::Relation),
    )))(rest)?;
    let (rest, condition) =
        opt(preceded(tuple((space1, keyword("with"), space1)), identifier))(rest)?;

    let mut reference = match suffix {
        None => RelationReference::direct(type_name),
        Some(RefSuffix::Wildcard) => RelationReference::wildcard(type_name),
        Some(RefSuffix::Relation(relation)) => RelationReference::userset(type_name, relation),
    };
    if let Some(condition) = condition {
        reference = reference.with_condition(condition);
    }
    Ok((rest, reference))
}

/// Parse a type restriction like [user] or [user, group#member]
fn direct_assignment<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Expr, E> {
    context(
        "type restriction",
        map(
            delimited(
                pair(char('['), space0),
                separated_list1(tuple((space0, char(','), space0)), relation_reference),
                pair(space0, char(']')),
            ),
            Expr::Direct,
        ),
    )(input)
}

// ============ Relation Expression Parsers ============

/// Parse a parenthesized sub-expression
fn grouping<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Expr, E> {
    delimited(
        pair(char('('), space0),
        expression,
        pair(space0, char(')')),
    )(input)
}

/// Parse "relation from tupleset" (tuple to userset)
fn tuple_to_userset<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Expr, E> {
    context(
        "tuple to userset",
        map(
            tuple((identifier, space1, keyword("from"), space1, identifier)),
            |(computed, _, _, _, tupleset): (&str, _, _, _, &str)| Expr::TupleToUserset {
                computed: computed.to_string(),
                tupleset: tupleset.to_string(),
            },
        ),
    )(input)
}

/// Parse a direct relation reference (just a relation name)
fn computed_userset<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Expr, E> {
    map(identifier, |name: &str| Expr::Computed(name.to_string()))(input)
}

/// Parse a single operand of an operator chain
fn operand<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Expr, E> {
    alt((direct_assignment, grouping, tuple_to_userset, computed_userset))(input)
}

/// Parse an operand optionally followed by a chain of one operator kind.
///
/// `or` and `and` chains may be arbitrarily long; `but not` takes exactly one
/// subtrahend. Operators of different kinds on the same level must be
/// separated by parentheses.
fn expression<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Expr, E> {
    let (rest, first) = operand(input)?;

    let (rest, tail) = opt(alt((
        map(
            many1(preceded(tuple((space1, keyword("or"), space1)), operand)),
            Tail::Or,
        ),
        map(
            many1(preceded(tuple((space1, keyword("and"), space1)), operand)),
            Tail::And,
        ),
        map(
            preceded(
                tuple((space1, keyword("but"), space1, keyword("not"), space1)),
                operand,
            ),
            Tail::ButNot,
        ),
    )))(rest)?;

    let expr = match tail {
        None => first,
        Some(Tail::Or(operands)) => {
            let mut children = vec![first];
            children.extend(operands);
            Expr::Union(children)
        }
        Some(Tail::And(operands)) => {
            let mut children = vec![first];
            children.extend(operands);
            Expr::Intersection(children)
        }
        Some(Tail::ButNot(subtract)) => Expr::Difference(Box::new(first), Box::new(subtract)),
    };
    Ok((rest, expr))
}

// ============ Relation Definition Parser ============

/// Parse a relation definition like "define viewer: [user] or editor"
fn relation_definition<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (&'a str, Expr), E> {
    context(
        "relation definition",
        map(
            tuple((
                keyword("define"),
                space1,
                identifier,
                space0,
                char(':'),
                space0,
                expression,
                space0,
                cut(context(
                    "end of relation definition (mixing 'or', 'and' and 'but not' requires parentheses)",
                    end_of_line,
                )),
            )),
            |(_, _, name, _, _, _, expr, _, _)| (name, expr),
        ),
    )(input)
}

// ============ Type Definition Parser ============

/// Parse a type definition with optional relations
fn type_block<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, TypeBlock<'a>, E> {
    context(
        "type definition",
        map(
            tuple((
                opt(terminated(keyword("extend"), space1)),
                keyword("type"),
                space1,
                identifier,
                ws,
                opt(preceded(
                    pair(keyword("relations"), ws),
                    many0(terminated(relation_definition, ws)),
                )),
            )),
            |(extends, _, _, name, _, relations)| TypeBlock {
                extends: extends.is_some(),
                name,
                relations: relations.unwrap_or_default(),
            },
        ),
    )(input)
}

// ============ Condition Parsers ============

/// Parse a parameter type like `int`, `list<string>` or `map<list<int>>`
fn param_type<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, ParamTypeExpr<'a>, E> {
    let (rest, name) = take_while1(|c: char| c.is_ascii_alphanumeric())(input)?;
    let (rest, generic) = opt(delimited(
        pair(char('<'), space0),
        param_type,
        pair(space0, char('>')),
    ))(rest)?;
    Ok((
        rest,
        ParamTypeExpr {
            name,
            generic: generic.map(Box::new),
        },
    ))
}

/// Parse `name: type`
fn condition_parameter<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, (&'a str, ParamTypeExpr<'a>), E> {
    context(
        "condition parameter",
        map(
            tuple((identifier, space0, char(':'), space0, param_type)),
            |(name, _, _, _, param_type)| (name, param_type),
        ),
    )(input)
}

/// Parse a brace-delimited condition body, returning the text between the
/// outermost braces. Braces inside string literals do not count.
fn condition_body<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, &'a str, E> {
    let (body, _) = char('{')(input)?;

    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&body[idx + 1..], &body[..idx]));
                }
            }
            _ => {}
        }
    }

    Err(nom::Err::Error(E::add_context(
        input,
        "unterminated condition body",
        E::from_error_kind(input, ErrorKind::Char),
    )))
}

/// Parse "condition name(a: int, b: list<string>) { expression }"
fn condition_block<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, ConditionBlock<'a>, E> {
    context(
        "condition",
        map(
            tuple((
                keyword("condition"),
                space1,
                identifier,
                space0,
                delimited(
                    pair(char('('), ws),
                    separated_list1(tuple((ws, char(','), ws)), condition_parameter),
                    pair(ws, char(')')),
                ),
                ws,
                condition_body,
            )),
            |(_, _, name, _, parameters, _, body)| ConditionBlock {
                name,
                parameters,
                body,
            },
        ),
    )(input)
}

// ============ Document Parser ============

fn statement<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Statement<'a>, E> {
    alt((
        map(type_block, Statement::Type),
        map(condition_block, Statement::Condition),
    ))(input)
}

/// Parse a complete model or module file
fn document<'a, E: ParseError<&'a str> + ContextError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Document<'a>, E> {
    context(
        "authorization model",
        map(
            tuple((
                ws,
                alt((model_header, module_header)),
                ws,
                many0(terminated(statement, ws)),
            )),
            |(_, header, _, statements)| Document { header, statements },
        ),
    )(input)
}

fn parse_document(input: &str) -> ParserResult<Document<'_>> {
    match all_consuming(document::<nom::error::VerboseError<&str>>)(input) {
        Ok((_, document)) => Ok(document),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = e.errors.first().map(|(rest, _)| input.len() - rest.len());
            let message = format!("Parse error: {}", nom::error::convert_error(input, e));
            Err(match position {
                Some(position) => ParserError::with_position(message, position),
                None => ParserError::new(message),
            })
        }
        Err(nom::Err::Incomplete(_)) => Err(ParserError::new("Incomplete input")),
    }
}

// ============ Lowering ============

/// Lowers a relation expression into a userset, collecting the single
/// permitted type restriction into `direct`.
fn lower_expression(
    expr: Expr,
    direct: &mut Option<Vec<RelationReference>>,
) -> Result<Userset, String> {
    Ok(match expr {
        Expr::Direct(references) => {
            if direct.is_some() {
                return Err("a relation may declare at most one type restriction".to_string());
            }
            *direct = Some(references);
            Userset::This
        }
        Expr::Computed(relation) => Userset::computed(relation),
        Expr::TupleToUserset { computed, tupleset } => {
            Userset::tuple_to_userset(tupleset, computed)
        }
        Expr::Union(children) => Userset::Union {
            children: children
                .into_iter()
                .map(|child| lower_expression(child, direct))
                .collect::<Result<_, _>>()?,
        },
        Expr::Intersection(children) => Userset::Intersection {
            children: children
                .into_iter()
                .map(|child| lower_expression(child, direct))
                .collect::<Result<_, _>>()?,
        },
        Expr::Difference(base, subtract) => Userset::difference(
            lower_expression(*base, direct)?,
            lower_expression(*subtract, direct)?,
        ),
    })
}

fn build_type_definition(block: TypeBlock<'_>) -> ParserResult<TypeDefinition> {
    if block.relations.is_empty() {
        return Ok(TypeDefinition::new(block.name));
    }

    let mut relations = HashMap::with_capacity(block.relations.len());
    let mut relation_metadata = HashMap::with_capacity(block.relations.len());
    for (name, expr) in block.relations {
        if relations.contains_key(name) {
            return Err(ParserError::new(format!(
                "relation '{}' is defined more than once on type '{}'",
                name, block.name
            )));
        }

        let mut direct = None;
        let rewrite = lower_expression(expr, &mut direct)
            .map_err(|e| ParserError::new(format!("{}#{}: {}", block.name, name, e)))?;

        relation_metadata.insert(
            name.to_string(),
            RelationMetadata {
                directly_related_user_types: Some(direct.unwrap_or_default()),
                ..Default::default()
            },
        );
        relations.insert(name.to_string(), rewrite);
    }

    Ok(TypeDefinition {
        type_name: block.name.to_string(),
        relations: Some(relations),
        metadata: Some(Metadata {
            relations: Some(relation_metadata),
            ..Default::default()
        }),
    })
}

fn build_param_type(expr: &ParamTypeExpr<'_>) -> ParserResult<ConditionParamTypeRef> {
    let type_name = TypeName::from_dsl_keyword(expr.name)
        .ok_or_else(|| ParserError::new(format!("unknown parameter type '{}'", expr.name)))?;

    match (&expr.generic, type_name.is_generic()) {
        (Some(generic), true) => Ok(ConditionParamTypeRef::generic(
            type_name,
            vec![build_param_type(generic)?],
        )),
        (None, false) => Ok(ConditionParamTypeRef::scalar(type_name)),
        (None, true) => Err(ParserError::new(format!(
            "parameter type '{}' requires a generic type, e.g. {}<string>",
            expr.name, expr.name
        ))),
        (Some(_), false) => Err(ParserError::new(format!(
            "parameter type '{}' does not take a generic type",
            expr.name
        ))),
    }
}

fn build_condition(block: ConditionBlock<'_>) -> ParserResult<Condition> {
    let mut parameters = HashMap::with_capacity(block.parameters.len());
    for (name, param_type) in &block.parameters {
        if parameters
            .insert(name.to_string(), build_param_type(param_type)?)
            .is_some()
        {
            return Err(ParserError::new(format!(
                "parameter '{}' is declared more than once in condition '{}'",
                name, block.name
            )));
        }
    }

    Ok(Condition {
        name: block.name.to_string(),
        expression: block.body.trim().to_string(),
        parameters: Some(parameters),
        metadata: None,
    })
}

// ============ Public API ============

/// Parse a DSL string into an AuthorizationModel.
///
/// # Example
///
/// ```ignore
/// let dsl = r#"
/// model
///   schema 1.1
///
/// type user
///
/// type document
///   relations
///     define owner: [user]
///     define viewer: [user] or owner
/// "#;
///
/// let model = parse(dsl)?;
/// ```
pub fn parse(input: &str) -> ParserResult<AuthorizationModel> {
    let document = parse_document(input)?;

    let schema_version = match document.header {
        Header::Model { schema_version } => schema_version,
        Header::Module { name } => {
            return Err(ParserError::new(format!(
                "found module header 'module {name}'; module files must be compiled through an fga.mod descriptor"
            )))
        }
    };

    let mut model = AuthorizationModel::new(schema_version);
    let mut conditions = HashMap::new();
    for statement in document.statements {
        match statement {
            Statement::Type(block) => {
                if block.extends {
                    return Err(ParserError::new(format!(
                        "'extend type {}' is only allowed in module files",
                        block.name
                    )));
                }
                model.type_definitions.push(build_type_definition(block)?);
            }
            Statement::Condition(block) => {
                let condition = build_condition(block)?;
                if conditions.contains_key(&condition.name) {
                    return Err(ParserError::new(format!(
                        "condition '{}' is defined more than once",
                        condition.name
                    )));
                }
                conditions.insert(condition.name.clone(), condition);
            }
        }
    }

    if !conditions.is_empty() {
        model.conditions = Some(conditions);
    }
    Ok(model)
}

/// Parse a module file (`module <name>` header, optional `extend type`
/// blocks).
pub fn parse_module(input: &str) -> ParserResult<ModuleDocument> {
    let document = parse_document(input)?;

    let module = match document.header {
        Header::Module { name } => name.to_string(),
        Header::Model { .. } => {
            return Err(ParserError::new(
                "module files must start with a 'module <name>' declaration",
            ))
        }
    };

    let mut types = Vec::new();
    let mut conditions = Vec::new();
    for statement in document.statements {
        match statement {
            Statement::Type(block) => {
                let extends = block.extends;
                types.push(ModuleTypeDefinition {
                    extends,
                    definition: build_type_definition(block)?,
                });
            }
            Statement::Condition(block) => conditions.push(build_condition(block)?),
        }
    }

    Ok(ModuleDocument {
        module,
        types,
        conditions,
    })
}
