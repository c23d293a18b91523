//! Tera-backed template compiler.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;
use strata_core::{
    BlockProvider, CompiledTemplate, Locals, RenderError, RenderResult, TemplateCompiler,
    TemplateContext, TemplateOptions,
};
use tera::Tera;

use crate::filters;
use crate::loader::read_template;
use crate::parser::{self, Arg, ArgValue, Node};

/// Engine option enabling HTML auto-escaping of `{{ … }}` output.
pub const ESCAPE_HTML: &str = "escape_html";

/// Compiles template files into [`TeraTemplate`]s.
///
/// Directives drive inheritance; everything between them is Tera source with
/// the locals and scope bindings in its context.
#[derive(Debug, Default, Clone, Copy)]
pub struct TeraCompiler;

impl TeraCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile template source that did not come from a file. `path` names it in errors.
    pub fn compile_str(
        &self,
        path: &Path,
        source: &str,
        options: &TemplateOptions,
    ) -> RenderResult<TeraTemplate> {
        let prefix = path.display().to_string();
        let parsed = parser::parse(&prefix, source).map_err(|m| RenderError::syntax(path, m))?;

        let mut tera = Tera::default();
        if options.engine_flag(ESCAPE_HTML) {
            tera.autoescape_on(vec![""]);
        } else {
            tera.autoescape_on(Vec::new());
        }
        filters::register(&mut tera);
        tera.add_raw_templates(parsed.texts)
            .map_err(|e| RenderError::compile(path, e))?;

        Ok(TeraTemplate {
            unit: Arc::new(Unit {
                path: path.to_path_buf(),
                tera,
                nodes: parsed.nodes.into(),
            }),
        })
    }
}

impl TemplateCompiler for TeraCompiler {
    fn compile(
        &self,
        path: &Path,
        options: &TemplateOptions,
    ) -> RenderResult<Arc<dyn CompiledTemplate>> {
        let source = read_template(path, &options.default_encoding)?;
        let template = self.compile_str(path, &source, options)?;
        Ok(Arc::new(template))
    }
}

struct Unit {
    path: PathBuf,
    tera: Tera,
    nodes: Arc<[Node]>,
}

/// A compiled template file.
pub struct TeraTemplate {
    unit: Arc<Unit>,
}

impl fmt::Debug for TeraTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeraTemplate")
            .field("path", &self.unit.path)
            .field("nodes", &self.unit.nodes.len())
            .finish()
    }
}

impl CompiledTemplate for TeraTemplate {
    fn render(&self, ctx: &mut TemplateContext<'_>, locals: &Locals) -> RenderResult<String> {
        render_nodes(&self.unit, &self.unit.nodes, ctx, locals)
    }
}

fn render_nodes(
    unit: &Arc<Unit>,
    nodes: &[Node],
    ctx: &mut TemplateContext<'_>,
    locals: &Locals,
) -> RenderResult<String> {
    let mut output = String::new();
    let mut text_context: Option<tera::Context> = None;

    for node in nodes {
        match node {
            Node::Text { name } => {
                let context = text_context.get_or_insert_with(|| tera_context(ctx, locals));
                let text = unit
                    .tera
                    .render(name, context)
                    .map_err(|e| RenderError::render(&unit.path, e))?;
                output.push_str(&text);
            }
            Node::Extends { path, args } => {
                let parent_locals = resolve_args(args, ctx, locals);
                ctx.extends(path.clone(), parent_locals);
            }
            Node::Block { name, body } => {
                let unit = Arc::clone(unit);
                let body = Arc::clone(body);
                let block_locals = locals.clone();
                let provider: BlockProvider = Rc::new(move |ctx: &mut TemplateContext<'_>| {
                    render_nodes(&unit, &body, ctx, &block_locals)
                });
                output.push_str(&ctx.block(name, Some(provider))?);
            }
            Node::Slot { name } => {
                output.push_str(&ctx.block(name, None)?);
            }
            Node::Render { path, args } => {
                let sub_locals = resolve_args(args, ctx, locals);
                output.push_str(&ctx.render(path, &sub_locals)?);
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let value = resolve_name(&condition.name, ctx, locals);
                let branch = if is_truthy(value.as_ref()) != condition.negate {
                    then_branch
                } else {
                    else_branch
                };
                output.push_str(&render_nodes(unit, branch, ctx, locals)?);
            }
        }
    }

    Ok(output)
}

/// Scope bindings first, then locals, so locals shadow scope members.
fn tera_context(ctx: &TemplateContext<'_>, locals: &Locals) -> tera::Context {
    let mut context = tera::Context::new();
    for name in ctx.scope().names() {
        if let Some(value) = ctx.lookup(&name) {
            context.insert(name, &value);
        }
    }
    for (key, value) in locals {
        context.insert(key.as_str(), value);
    }
    context
}

fn resolve_args(args: &[Arg], ctx: &TemplateContext<'_>, locals: &Locals) -> Locals {
    args.iter()
        .map(|arg| {
            let value = match &arg.value {
                ArgValue::Literal(value) => value.clone(),
                ArgValue::Name(name) => resolve_name(name, ctx, locals).unwrap_or(Value::Null),
            };
            (arg.key.clone(), value)
        })
        .collect()
}

fn resolve_name(name: &str, ctx: &TemplateContext<'_>, locals: &Locals) -> Option<Value> {
    let mut segments = name.split('.');
    let head = segments.next()?;
    let mut value = match locals.get(head) {
        Some(value) => value.clone(),
        None => ctx.lookup(head)?,
    };
    for segment in segments {
        value = match value {
            Value::Object(mut map) => map.remove(segment)?,
            Value::Array(mut items) => {
                let index: usize = segment.parse().ok()?;
                if index >= items.len() {
                    return None;
                }
                items.swap_remove(index)
            }
            _ => return None,
        };
    }
    Some(value)
}

/// Falsy values: missing names, `null`, `false`, zero, and empty strings, arrays or objects.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}
