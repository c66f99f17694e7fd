//! `cuint bind` - show what a header binds to.

use crate::output::{self, StyledOutput};
use anyhow::Context;
use cuint_engine::binding::runtime_name;
use cuint_engine::{Catalog, DeclCollector, FunctionDeclaration, ReturnKind};
use cuint_runtime::HarnessConfig;
use std::path::PathBuf;

/// Arguments for the bind command.
pub struct BindArgs {
    pub header: PathBuf,
    pub include: Vec<PathBuf>,
    pub json: bool,
    pub color: String,
}

pub fn execute(args: BindArgs) -> anyhow::Result<()> {
    let config = HarnessConfig::from_env()?;
    let preprocessor = args
        .include
        .iter()
        .fold(config.preprocessor(), |pre, dir| pre.include(dir.clone()));

    let source = preprocessor
        .run(&args.header)
        .with_context(|| format!("preprocessing {}", args.header.display()))?;
    let catalog = DeclCollector::collect(&source)
        .with_context(|| format!("parsing {}", args.header.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    let mut out = StyledOutput::new(output::resolve_color_choice(Some(&args.color)));
    print_catalog(&mut out, &catalog);
    out.flush();
    Ok(())
}

fn print_catalog(out: &mut StyledOutput, catalog: &Catalog) {
    if catalog.is_empty() {
        out.warning("Nothing to bind.");
        out.newline();
        return;
    }

    for ty in &catalog.types {
        out.bold(&format!("type {}", runtime_name(&ty.name)));
        out.dim(&format!(" ({})", ty.typedef_name));
        out.newline();
        if !ty.fields.is_empty() {
            out.dim(&format!("  fields: {}", ty.fields.join(", ")));
            out.newline();
        }
        if let Some(constructor) = &ty.constructor {
            out.plain("  new");
            out.info(&signature(constructor));
            out.newline();
        }
        for method in &ty.methods {
            // the handle is prepended implicitly
            out.plain(&format!("  .{}", method.name));
            out.info(&signature_without_self(&method.function));
            out.newline();
        }
    }

    if !catalog.functions.is_empty() {
        out.bold("functions");
        out.newline();
        for function in &catalog.functions {
            out.plain(&format!("  {}", function.name));
            out.info(&signature(function));
            out.newline();
        }
    }
}

fn signature(function: &FunctionDeclaration) -> String {
    render(&function.params, function.variadic, function.returns)
}

fn signature_without_self(function: &FunctionDeclaration) -> String {
    let params = function.params.get(1..).unwrap_or_default();
    render(params, function.variadic, function.returns)
}

fn render(params: &[Option<String>], variadic: bool, returns: ReturnKind) -> String {
    let mut names: Vec<&str> = params
        .iter()
        .map(|param| param.as_deref().unwrap_or("_"))
        .collect();
    if variadic {
        names.push("...");
    }
    let returns = match returns {
        ReturnKind::Int => "int",
        ReturnKind::Word => "word",
        ReturnKind::CString => "str",
        ReturnKind::Void => "void",
    };
    format!("({}) -> {}", names.join(", "), returns)
}
