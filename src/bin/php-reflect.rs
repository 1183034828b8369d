use anyhow::{Context, Result};
use clap::Parser;
use php_reflect::reflect::model::HintKind;
use php_reflect::{ParseConfig, Registry};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "php-reflect")]
#[command(about = "Dump static reflection data for PHP sources", long_about = None)]
struct Cli {
    /// Source files to reflect over
    #[arg(name = "FILE", required = true)]
    files: Vec<PathBuf>,

    /// Emit machine-readable JSON instead of a text listing
    #[arg(long)]
    json: bool,

    /// Capture default-value definitions only, without evaluating them
    #[arg(long)]
    no_values: bool,
}

#[derive(Serialize)]
struct Dump<'a> {
    functions: &'a [php_reflect::reflect::model::FunctionDescriptor],
    classes: &'a [php_reflect::reflect::model::ClassDescriptor],
    constants: &'a [php_reflect::reflect::model::ConstantDescriptor],
}

fn main() -> ExitCode {
    match try_main() {
        Ok(clean) => {
            if clean {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main() -> Result<bool> {
    let cli = Cli::parse();
    let mut registry =
        Registry::with_config(ParseConfig::with_value_definitions(!cli.no_values));

    let mut clean = true;
    for path in &cli.files {
        let source = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let report = registry.parse_source(&path.to_string_lossy(), &source);
        for error in &report.errors {
            clean = false;
            eprintln!(
                "{}",
                error.to_human_readable_with_path(&source, Some(&path.to_string_lossy()))
            );
        }
    }

    if cli.json {
        let dump = Dump {
            functions: registry.function_descriptors(),
            classes: registry.class_descriptors(),
            constants: registry.constants(),
        };
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(clean);
    }

    for function in registry.functions() {
        println!("function {}{}", function.name(), signature(&function));
    }
    for class in registry.classes() {
        if class.is_internal() {
            continue;
        }
        println!("{} {}", keyword(&class), class.name());
        for method in class.methods() {
            println!("    method {}{}", method.short_name(), signature(&method));
        }
    }
    for constant in registry.constants() {
        println!(
            "const {} = {}",
            constant.qualified_name(),
            constant.default.definition
        );
    }

    Ok(clean)
}

fn keyword(class: &php_reflect::ReflectionClass<'_>) -> &'static str {
    use php_reflect::reflect::model::ClassKind;
    match class.kind() {
        ClassKind::Class => "class",
        ClassKind::Interface => "interface",
        ClassKind::Trait => "trait",
        ClassKind::Enum => "enum",
    }
}

fn signature(function: &php_reflect::ReflectionFunction<'_>) -> String {
    let mut parts = Vec::new();
    for parameter in function.parameters() {
        let mut out = String::new();
        if let Some(hint) = parameter.type_hint() {
            if hint.nullable {
                out.push('?');
            }
            match &hint.kind {
                HintKind::Array => out.push_str("array "),
                HintKind::Named { qualified, .. } => {
                    out.push_str(qualified);
                    out.push(' ');
                }
            }
        }
        if parameter.is_passed_by_reference() {
            out.push('&');
        }
        if parameter.is_variadic() {
            out.push_str("...");
        }
        out.push('$');
        out.push_str(parameter.name());
        if let Some(definition) = parameter.default_value_definition() {
            out.push_str(" = ");
            out.push_str(definition);
        }
        parts.push(out);
    }
    format!("({})", parts.join(", "))
}
