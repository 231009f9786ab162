//! The recursive descent grammar for behavior tree source text.
//!
//! All parsers take the remaining input and yield `(rest, value)` pairs
//! through [`IResult`]; [`VerboseError`] carries the contextual messages
//! that [`parse_source`] renders into a [`ParseError`] for the host.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, alphanumeric1, char, multispace0},
    combinator::{cut, opt, recognize, verify},
    error::{context, convert_error, VerboseError, VerboseErrorKind},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult,
};
use std::fmt::{self, Display, Formatter};

use crate::{error::ParseError, PortType};

type PResult<'src, O> = IResult<&'src str, O, VerboseError<&'src str>>;

/// A node invocation in a tree body, possibly with port bindings and
/// nested children. `if/else` forms and `var` initializers are already
/// desugared into this representation by the parser.
#[derive(Debug, PartialEq, Eq)]
pub struct TreeDef<'src> {
    pub(crate) name: &'src str,
    pub(crate) port_maps: Vec<PortMap<'src>>,
    pub(crate) children: Vec<TreeDef<'src>>,
    pub(crate) vars: Vec<VarDef<'src>>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum BlackboardValue<'src> {
    /// The raw inner slice of the quotes; escape sequences are not a
    /// thing in this grammar.
    Literal(&'src str),
    Ref(&'src str),
}

#[derive(Debug, PartialEq, Eq)]
pub struct PortMap<'src> {
    pub(crate) ty: PortType,
    pub(crate) node_port: &'src str,
    pub(crate) blackboard_value: BlackboardValue<'src>,
}

/// A formal port on a subtree signature, e.g. `in param`.
#[derive(Debug, PartialEq, Eq)]
pub struct PortDef<'src> {
    pub(crate) direction: PortType,
    pub(crate) name: &'src str,
}

/// A `var` declaration inside a tree body. The initializer, when
/// present, is the verbatim keyword `true` or `false`.
#[derive(Debug, PartialEq, Eq)]
pub struct VarDef<'src> {
    pub(crate) name: &'src str,
    pub(crate) init: Option<&'src str>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum TreeElem<'src> {
    Node(TreeDef<'src>),
    Var(VarDef<'src>),
}

/// A top-level `tree` form. The one named `main` is the entry point;
/// any other is callable as a subtree, with `ports` as its signature.
#[derive(Debug, PartialEq, Eq)]
pub struct TreeRootDef<'src> {
    pub(crate) name: &'src str,
    pub(crate) root: TreeDef<'src>,
    pub(crate) ports: Vec<PortDef<'src>>,
}

#[derive(Debug, PartialEq, Eq, Default)]
pub struct TreeSource<'src> {
    pub(crate) tree_defs: Vec<TreeRootDef<'src>>,
}

impl<'src> TreeDef<'src> {
    fn from_elems(
        name: &'src str,
        port_maps: Vec<PortMap<'src>>,
        elems: Vec<TreeElem<'src>>,
    ) -> Self {
        let mut children = vec![];
        let mut vars = vec![];
        for elem in elems {
            match elem {
                TreeElem::Node(node) => children.push(node),
                TreeElem::Var(var) => {
                    if let Some(init) = var.init {
                        children.push(Self::var_initializer(var.name, init));
                    }
                    vars.push(var);
                }
            }
        }
        TreeDef {
            name,
            port_maps,
            children,
            vars,
        }
    }

    /// The `SetBool` invocation a `var x = true` declaration stands for.
    fn var_initializer(name: &'src str, init: &'src str) -> Self {
        TreeDef {
            name: "SetBool",
            port_maps: vec![
                PortMap {
                    ty: PortType::Input,
                    node_port: "value",
                    blackboard_value: BlackboardValue::Literal(init),
                },
                PortMap {
                    ty: PortType::Output,
                    node_port: "output",
                    blackboard_value: BlackboardValue::Ref(name),
                },
            ],
            children: vec![],
            vars: vec![],
        }
    }
}

fn identifier(i: &str) -> PResult<&str> {
    preceded(
        multispace0,
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        )),
    )(i)
}

/// Matches `word` as a whole identifier, so that e.g. `else` does not
/// match the head of `elsewhere`.
fn keyword<'src>(word: &'static str) -> impl FnMut(&'src str) -> PResult<'src, &'src str> {
    verify(identifier, move |id: &str| id == word)
}

fn str_literal(i: &str) -> PResult<BlackboardValue> {
    let (r, value) = preceded(
        multispace0,
        delimited(char('"'), take_while(|c| c != '"'), char('"')),
    )(i)?;
    Ok((r, BlackboardValue::Literal(value)))
}

fn bb_ref(i: &str) -> PResult<BlackboardValue> {
    let (r, name) = identifier(i)?;
    Ok((r, BlackboardValue::Ref(name)))
}

fn port_map(i: &str) -> PResult<PortMap> {
    let (r, node_port) = identifier(i)?;

    let (r, arrow) = context(
        r#"Expected "<-", "->" or "<->""#,
        cut(preceded(multispace0, alt((tag("<->"), tag("<-"), tag("->"))))),
    )(r)?;
    let ty = match arrow {
        "<-" => PortType::Input,
        "->" => PortType::Output,
        _ => PortType::InOut,
    };

    let (r, blackboard_value) = context(
        "Expected a string literal or a variable name",
        cut(alt((str_literal, bb_ref))),
    )(r)?;

    Ok((
        r,
        PortMap {
            ty,
            node_port,
            blackboard_value,
        },
    ))
}

fn port_maps(i: &str) -> PResult<Vec<PortMap>> {
    let (r, maps) = separated_list0(preceded(multispace0, char(',')), port_map)(i)?;
    let (r, _) = opt(preceded(multispace0, char(',')))(r)?;
    Ok((r, maps))
}

fn port_maps_parens(i: &str) -> PResult<Vec<PortMap>> {
    delimited(
        preceded(multispace0, char('(')),
        port_maps,
        preceded(multispace0, char(')')),
    )(i)
}

fn port_direction(i: &str) -> PResult<PortType> {
    let (r, word) = identifier(i)?;
    let direction = match word {
        "in" => PortType::Input,
        "out" => PortType::Output,
        "inout" => PortType::InOut,
        _ => {
            return Err(nom::Err::Error(VerboseError {
                errors: vec![(
                    i,
                    VerboseErrorKind::Context("Expected \"in\", \"out\" or \"inout\""),
                )],
            }))
        }
    };
    Ok((r, direction))
}

fn port_def(i: &str) -> PResult<PortDef> {
    let (r, direction) = port_direction(i)?;
    let (r, name) = identifier(r)?;
    Ok((r, PortDef { direction, name }))
}

fn subtree_ports_def(i: &str) -> PResult<Vec<PortDef>> {
    let (r, _) = preceded(multispace0, char('('))(i)?;
    let (r, ports) = separated_list0(preceded(multispace0, char(',')), port_def)(r)?;
    let (r, _) = opt(preceded(multispace0, char(',')))(r)?;
    let (r, _) = preceded(multispace0, char(')'))(r)?;
    Ok((r, ports))
}

fn tree_children_block(i: &str) -> PResult<Vec<TreeElem>> {
    delimited(
        preceded(multispace0, char('{')),
        many0(parse_tree_child),
        preceded(multispace0, char('}')),
    )(i)
}

fn parse_tree_node(i: &str) -> PResult<TreeDef> {
    let (r, name) = identifier(i)?;
    let (r, port_maps) = opt(port_maps_parens)(r)?;
    let (r, elems) = opt(tree_children_block)(r)?;
    Ok((
        r,
        TreeDef::from_elems(
            name,
            port_maps.unwrap_or_default(),
            elems.unwrap_or_default(),
        ),
    ))
}

/// The rest of an `if (condition) { ... } else { ... }` form, after the
/// `if` keyword. Desugars into a node named `if` with the condition, the
/// then branch and the optional else branch as children; each branch is
/// wrapped into a `Sequence` node of its own.
fn parse_condition_node(i: &str) -> PResult<TreeDef> {
    let (r, _) = preceded(multispace0, char('('))(i)?;
    let (r, condition) = parse_tree_node(r)?;
    let (r, _) = preceded(multispace0, char(')'))(r)?;
    let (r, true_elems) = tree_children_block(r)?;
    let mut children = vec![
        condition,
        TreeDef::from_elems("Sequence", vec![], true_elems),
    ];
    let (r, else_keyword) = opt(keyword("else"))(r)?;
    let r = if else_keyword.is_some() {
        let (r, false_elems) = tree_children_block(r)?;
        children.push(TreeDef::from_elems("Sequence", vec![], false_elems));
        r
    } else {
        r
    };
    Ok((
        r,
        TreeDef {
            name: "if",
            port_maps: vec![],
            children,
            vars: vec![],
        },
    ))
}

/// The rest of a `var x` or `var x = true|false` declaration, after the
/// `var` keyword.
fn var_decl(i: &str) -> PResult<VarDef> {
    let (r, name) = identifier(i)?;
    let (r, init) = opt(preceded(
        preceded(multispace0, char('=')),
        context(
            "true or false expected as the initializer",
            cut(verify(identifier, |id: &str| id == "true" || id == "false")),
        ),
    ))(r)?;
    Ok((r, VarDef { name, init }))
}

fn parse_tree_child(i: &str) -> PResult<TreeElem> {
    let (r, id) = identifier(i)?;
    match id {
        "if" => {
            let (r, node) = cut(parse_condition_node)(r)?;
            Ok((r, TreeElem::Node(node)))
        }
        "var" => {
            let (r, var) = cut(var_decl)(r)?;
            Ok((r, TreeElem::Var(var)))
        }
        _ => {
            let (r, node) = parse_tree_node(i)?;
            Ok((r, TreeElem::Node(node)))
        }
    }
}

fn parse_tree(i: &str) -> PResult<TreeRootDef> {
    let (r, _) = context("The first identifier must be \"tree\"", keyword("tree"))(i)?;
    let (r, name) = context("Missing tree name", cut(identifier))(r)?;
    let (r, ports) = opt(subtree_ports_def)(r)?;
    let (r, _) = context(
        "Tree name should be followed by an equal (=)",
        cut(preceded(multispace0, char('='))),
    )(r)?;
    let (r, root) = cut(parse_tree_child)(r)?;
    let root = match root {
        TreeElem::Node(root) => root,
        TreeElem::Var(_) => {
            return Err(nom::Err::Failure(VerboseError {
                errors: vec![(
                    r,
                    VerboseErrorKind::Context("Tree root cannot be a variable definition"),
                )],
            }))
        }
    };
    // Eat extra newlines after the last node
    let (r, _) = multispace0(r)?;
    Ok((
        r,
        TreeRootDef {
            name,
            root,
            ports: ports.unwrap_or_default(),
        },
    ))
}

/// Parse a whole source text into the list of its tree definitions.
/// The entire input has to be consumed; the first grammar violation is
/// reported as a [`ParseError`].
pub fn parse_source(input: &str) -> Result<TreeSource, ParseError> {
    let mut i = input;
    let mut tree_defs = Vec::new();
    loop {
        i = i.trim_start_matches(|c: char| c.is_ascii_whitespace());
        if i.is_empty() {
            break;
        }
        match parse_tree(i) {
            Ok((rest, tree)) => {
                tree_defs.push(tree);
                i = rest;
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                return Err(ParseError::new(convert_error(input, e)))
            }
            Err(nom::Err::Incomplete(_)) => {
                return Err(ParseError::new("Unexpected end of input".to_string()))
            }
        }
    }
    Ok(TreeSource { tree_defs })
}

fn write_indent(f: &mut Formatter, level: usize) -> fmt::Result {
    for _ in 0..level {
        f.write_str("    ")?;
    }
    Ok(())
}

impl Display for BlackboardValue<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "\"{}\"", value),
            Self::Ref(name) => f.write_str(name),
        }
    }
}

impl Display for PortMap<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let arrow = match self.ty {
            PortType::Input => "<-",
            PortType::Output => "->",
            PortType::InOut => "<->",
        };
        write!(f, "{} {} {}", self.node_port, arrow, self.blackboard_value)
    }
}

impl Display for PortDef<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let direction = match self.direction {
            PortType::Input => "in",
            PortType::Output => "out",
            PortType::InOut => "inout",
        };
        write!(f, "{} {}", direction, self.name)
    }
}

impl<'src> TreeDef<'src> {
    fn fmt_with_indent(&self, f: &mut Formatter, level: usize) -> fmt::Result {
        if self.name == "if" {
            return self.fmt_condition(f, level);
        }
        f.write_str(self.name)?;
        if !self.port_maps.is_empty() {
            f.write_str("(")?;
            for (i, port_map) in self.port_maps.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", port_map)?;
            }
            f.write_str(")")?;
        }
        if !self.children.is_empty() || !self.vars.is_empty() {
            f.write_str(" {\n")?;
            self.fmt_block(f, level + 1)?;
            write_indent(f, level)?;
            f.write_str("}")?;
        }
        Ok(())
    }

    /// The contents of a `{ ... }` block: variable declarations and the
    /// children, with synthesized initializers folded back into their
    /// `var x = true` surface form.
    fn fmt_block(&self, f: &mut Formatter, level: usize) -> fmt::Result {
        for var in self.vars.iter().filter(|var| var.init.is_none()) {
            write_indent(f, level)?;
            writeln!(f, "var {}", var.name)?;
        }
        for child in &self.children {
            write_indent(f, level)?;
            if let Some((name, init)) = child.as_var_initializer(&self.vars) {
                writeln!(f, "var {} = {}", name, init)?;
            } else {
                child.fmt_with_indent(f, level)?;
                f.write_str("\n")?;
            }
        }
        Ok(())
    }

    fn fmt_condition(&self, f: &mut Formatter, level: usize) -> fmt::Result {
        f.write_str("if (")?;
        if let Some(condition) = self.children.first() {
            condition.fmt_with_indent(f, level)?;
        }
        f.write_str(") {\n")?;
        if let Some(branch) = self.children.get(1) {
            branch.fmt_block(f, level + 1)?;
        }
        write_indent(f, level)?;
        f.write_str("}")?;
        if let Some(branch) = self.children.get(2) {
            f.write_str(" else {\n")?;
            branch.fmt_block(f, level + 1)?;
            write_indent(f, level)?;
            f.write_str("}")?;
        }
        Ok(())
    }

    /// Recognize a child synthesized from `var x = true|false` so the
    /// printer can fold it back into the declaration syntax.
    fn as_var_initializer(&self, vars: &[VarDef<'src>]) -> Option<(&'src str, &'src str)> {
        if self.name != "SetBool" || !self.children.is_empty() || self.port_maps.len() != 2 {
            return None;
        }
        let (value, output) = match (&self.port_maps[0], &self.port_maps[1]) {
            (
                PortMap {
                    ty: PortType::Input,
                    node_port: "value",
                    blackboard_value: BlackboardValue::Literal(value),
                },
                PortMap {
                    ty: PortType::Output,
                    node_port: "output",
                    blackboard_value: BlackboardValue::Ref(output),
                },
            ) => (*value, *output),
            _ => return None,
        };
        vars.iter()
            .find(|var| var.name == output && var.init == Some(value))
            .map(|_| (output, value))
    }
}

impl Display for TreeRootDef<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "tree {}", self.name)?;
        if !self.ports.is_empty() {
            f.write_str("(")?;
            for (i, port) in self.ports.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", port)?;
            }
            f.write_str(")")?;
        }
        f.write_str(" = ")?;
        self.root.fmt_with_indent(f, 0)
    }
}

impl Display for TreeSource<'_> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (i, tree) in self.tree_defs.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            writeln!(f, "{}", tree)?;
        }
        Ok(())
    }
}
