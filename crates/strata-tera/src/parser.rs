//! Directive parser.
//!
//! Template files are Tera source interleaved with inheritance directives
//! delimited by `{@ … @}`:
//!
//! ```text
//! {@ extends "layouts/base" title="Home" items=items @}
//! {@ block content @} … {@ endblock @}
//! {@ slot sidebar @}
//! {@ render "partials/nav" active=page.name @}
//! {@ if user.admin @} … {@ else @} … {@ endif @}
//! ```
//!
//! Text between directives is left untouched and compiled by Tera. A directive
//! that stands alone on its line takes the whole line with it, indentation and
//! line ending included, so block structure does not leak blank lines.

use std::sync::Arc;

use serde_json::Value;

/// A parsed template body.
#[derive(Debug)]
pub(crate) struct Parsed {
    pub nodes: Vec<Node>,
    /// Raw Tera sources keyed by the names the text nodes refer to.
    pub texts: Vec<(String, String)>,
}

#[derive(Debug)]
pub(crate) enum Node {
    Text {
        name: String,
    },
    Extends {
        path: String,
        args: Vec<Arg>,
    },
    Block {
        name: String,
        body: Arc<[Node]>,
    },
    Slot {
        name: String,
    },
    Render {
        path: String,
        args: Vec<Arg>,
    },
    If {
        condition: Condition,
        then_branch: Arc<[Node]>,
        else_branch: Arc<[Node]>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Arg {
    pub key: String,
    pub value: ArgValue,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ArgValue {
    Literal(Value),
    /// Dotted name resolved against locals, then the scope.
    Name(String),
}

/// `if [not] name`: a dotted name tested for truthiness.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Condition {
    pub name: String,
    pub negate: bool,
}

const OPEN: &str = "{@";
const CLOSE: &str = "@}";

enum Opened {
    Block(String),
    If {
        condition: Condition,
        /// Set once `else` is seen; the open nodes then hold the else branch.
        then_branch: Option<Vec<Node>>,
    },
}

impl Opened {
    fn describe(&self) -> String {
        match self {
            Opened::Block(name) => format!("block '{name}'"),
            Opened::If { condition, .. } => format!("'if {}'", condition.name),
        }
    }
}

struct Open {
    opened: Opened,
    line: usize,
    nodes: Vec<Node>,
}

/// Parse `source`, naming text runs `{prefix}#{n}`.
pub(crate) fn parse(prefix: &str, source: &str) -> Result<Parsed, String> {
    let mut texts = Vec::new();
    let mut root = Vec::new();
    let mut open: Vec<Open> = Vec::new();
    let mut rest = source;
    let mut offset = 0usize;
    let mut at_line_start = true;

    loop {
        let Some(start) = rest.find(OPEN) else {
            push_text(prefix, rest, &mut texts, current_nodes(&mut root, &mut open));
            break;
        };

        let line = line_of(source, offset + start);
        let after_open = &rest[start + OPEN.len()..];
        let end = find_close(after_open)
            .ok_or_else(|| format!("line {line}: unterminated directive"))?;
        let directive = after_open[..end].trim();
        let close = start + OPEN.len() + end + CLOSE.len();

        let before = &rest[..start];
        let indent_start = before.rfind('\n').map_or(0, |i| i + 1);
        let owns_line = (at_line_start || indent_start > 0)
            && before[indent_start..].chars().all(|c| c == ' ' || c == '\t');

        let (text, consumed) = match line_rest(&rest[close..]) {
            Some(len) if owns_line => (&before[..indent_start], close + len),
            _ => (before, close),
        };
        push_text(prefix, text, &mut texts, current_nodes(&mut root, &mut open));

        apply_directive(directive, line, &mut root, &mut open)
            .map_err(|message| format!("line {line}: {message}"))?;

        at_line_start = consumed > close;
        offset += consumed;
        rest = &rest[consumed..];
    }

    if let Some(unclosed) = open.pop() {
        return Err(format!(
            "line {}: {} is never closed",
            unclosed.line,
            unclosed.opened.describe()
        ));
    }

    Ok(Parsed { nodes: root, texts })
}

fn current_nodes<'a>(root: &'a mut Vec<Node>, open: &'a mut [Open]) -> &'a mut Vec<Node> {
    match open.last_mut() {
        Some(block) => &mut block.nodes,
        None => root,
    }
}

fn push_text(prefix: &str, text: &str, texts: &mut Vec<(String, String)>, nodes: &mut Vec<Node>) {
    if text.is_empty() {
        return;
    }
    let name = format!("{prefix}#{}", texts.len());
    texts.push((name.clone(), text.to_string()));
    nodes.push(Node::Text { name });
}

/// Offset of the first `@}` outside a double-quoted run.
fn find_close(text: &str) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
        } else if c == '"' {
            in_string = true;
        } else if text[i..].starts_with(CLOSE) {
            return Some(i);
        }
    }
    None
}

/// Length of the trailing blanks and line ending at the start of `text`, if
/// nothing else follows on the line.
fn line_rest(text: &str) -> Option<usize> {
    let trimmed = text.trim_start_matches([' ', '\t']);
    let blanks = text.len() - trimmed.len();
    if trimmed.starts_with("\r\n") {
        Some(blanks + 2)
    } else if trimmed.starts_with('\n') {
        Some(blanks + 1)
    } else if trimmed.is_empty() {
        Some(blanks)
    } else {
        None
    }
}

fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

fn apply_directive(
    directive: &str,
    line: usize,
    root: &mut Vec<Node>,
    open: &mut Vec<Open>,
) -> Result<(), String> {
    let tokens = tokenize(directive)?;
    let Some((keyword, operands)) = tokens.split_first() else {
        return Err("empty directive".to_string());
    };

    match keyword.as_str() {
        "extends" | "render" => {
            let (path, args) = operands
                .split_first()
                .ok_or_else(|| format!("'{keyword}' requires a template path"))?;
            let path = parse_path(path)?;
            let args: Vec<Arg> = args.iter().map(|a| parse_arg(a)).collect::<Result<_, _>>()?;
            let node = if keyword == "extends" {
                Node::Extends { path, args }
            } else {
                Node::Render { path, args }
            };
            current_nodes(root, open).push(node);
        }
        "block" => {
            let name = single_name(keyword, operands)?;
            open.push(Open {
                opened: Opened::Block(name),
                line,
                nodes: Vec::new(),
            });
        }
        "endblock" => {
            let (name, nodes) = match open.pop() {
                Some(Open {
                    opened: Opened::Block(name),
                    nodes,
                    ..
                }) => (name, nodes),
                Some(other) => {
                    return Err(format!(
                        "'endblock' closes {} opened on line {}",
                        other.opened.describe(),
                        other.line
                    ))
                }
                None => return Err("'endblock' without an open block".to_string()),
            };
            if let Some(label) = operands.first() {
                if *label != name {
                    return Err(format!("'endblock {label}' closes block '{name}'"));
                }
            }
            if operands.len() > 1 {
                return Err("'endblock' takes at most one name".to_string());
            }
            current_nodes(root, open).push(Node::Block {
                name,
                body: nodes.into(),
            });
        }
        "slot" => {
            let name = single_name(keyword, operands)?;
            current_nodes(root, open).push(Node::Slot { name });
        }
        "if" => {
            let condition = parse_condition(operands)?;
            open.push(Open {
                opened: Opened::If {
                    condition,
                    then_branch: None,
                },
                line,
                nodes: Vec::new(),
            });
        }
        "else" => {
            if !operands.is_empty() {
                return Err("'else' takes no operands".to_string());
            }
            match open.last_mut() {
                Some(Open {
                    opened: Opened::If { then_branch, .. },
                    nodes,
                    ..
                }) if then_branch.is_none() => {
                    *then_branch = Some(std::mem::take(nodes));
                }
                _ => return Err("'else' without an open 'if'".to_string()),
            }
        }
        "endif" => {
            if !operands.is_empty() {
                return Err("'endif' takes no operands".to_string());
            }
            let node = match open.pop() {
                Some(Open {
                    opened:
                        Opened::If {
                            condition,
                            then_branch,
                        },
                    nodes,
                    ..
                }) => match then_branch {
                    Some(then_branch) => Node::If {
                        condition,
                        then_branch: then_branch.into(),
                        else_branch: nodes.into(),
                    },
                    None => Node::If {
                        condition,
                        then_branch: nodes.into(),
                        else_branch: Arc::from(Vec::new()),
                    },
                },
                Some(other) => {
                    return Err(format!(
                        "'endif' closes {} opened on line {}",
                        other.opened.describe(),
                        other.line
                    ))
                }
                None => return Err("'endif' without an open 'if'".to_string()),
            };
            current_nodes(root, open).push(node);
        }
        other => return Err(format!("unknown directive '{other}'")),
    }
    Ok(())
}

/// Split on whitespace, keeping double-quoted runs (with `\"` escapes) intact.
fn tokenize(directive: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut chars = directive.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                current.push(c);
                let mut closed = false;
                while let Some(q) = chars.next() {
                    current.push(q);
                    if q == '\\' {
                        if let Some(escaped) = chars.next() {
                            current.push(escaped);
                        }
                    } else if q == '"' {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err("unterminated string".to_string());
                }
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn is_name(token: &str) -> bool {
    !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_dotted_name(token: &str) -> bool {
    token.split('.').all(|segment| {
        !segment.is_empty() && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

fn single_name(keyword: &str, operands: &[String]) -> Result<String, String> {
    match operands {
        [name] if is_name(name) => Ok(name.clone()),
        [name] => Err(format!("invalid block name '{name}'")),
        _ => Err(format!("'{keyword}' takes exactly one block name")),
    }
}

fn parse_condition(operands: &[String]) -> Result<Condition, String> {
    let (negate, name) = match operands {
        [not, name] if not == "not" => (true, name),
        [name] => (false, name),
        _ => return Err("'if' takes a name, optionally preceded by 'not'".to_string()),
    };
    if !is_dotted_name(name) {
        return Err(format!("invalid condition '{name}'"));
    }
    Ok(Condition {
        name: name.clone(),
        negate,
    })
}

fn parse_path(token: &str) -> Result<String, String> {
    if !token.starts_with('"') {
        return Err(format!("template path must be a quoted string, got '{token}'"));
    }
    let path: String =
        serde_json::from_str(token).map_err(|e| format!("invalid template path {token}: {e}"))?;
    if path.is_empty() {
        return Err("template path is empty".to_string());
    }
    Ok(path)
}

fn parse_arg(token: &str) -> Result<Arg, String> {
    let (key, raw) = token
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{token}'"))?;
    if !is_name(key) {
        return Err(format!("invalid argument name '{key}'"));
    }

    let value = if raw.starts_with('"') {
        let text: String =
            serde_json::from_str(raw).map_err(|e| format!("invalid string {raw}: {e}"))?;
        ArgValue::Literal(Value::String(text))
    } else if let Ok(literal) = serde_json::from_str::<Value>(raw) {
        ArgValue::Literal(literal)
    } else if is_dotted_name(raw) {
        ArgValue::Name(raw.to_string())
    } else {
        return Err(format!("invalid value for '{key}': '{raw}'"));
    };

    Ok(Arg {
        key: key.to_string(),
        value,
    })
}
