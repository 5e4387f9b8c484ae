use std::fmt::Write;

use {
    anyhow::Result,
    playbook_registry::{Collection, Document, InvocationMode, Registry, prompt_gen},
    serde_json::json,
};

pub fn handle_list(registry: &Registry, collection: Option<&str>, json: bool) -> Result<()> {
    let out = match (collection, json) {
        (None, false) => render_collections(registry),
        (None, true) => serde_json::to_string_pretty(&collections_json(registry))?,
        (Some(name), false) => render_documents(registry, name)?,
        (Some(name), true) => serde_json::to_string_pretty(&registry.list(name)?)?,
    };
    print!("{out}");
    if json {
        println!();
    }
    Ok(())
}

pub fn handle_show(
    registry: &Registry,
    reference: &str,
    name: Option<&str>,
    json: bool,
) -> Result<()> {
    let (collection, doc) = match name {
        Some(name) => {
            let doc = registry.find(reference, name)?;
            (reference.to_string(), doc)
        },
        None => {
            let (collection, doc) = registry.resolve(reference)?;
            (collection.name.clone(), doc)
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(doc)?);
    } else {
        print!("{}", render_document(&collection, doc));
    }
    Ok(())
}

pub fn handle_prompt(registry: &Registry) {
    print!("{}", prompt_gen::generate_skills_prompt(registry));
}

fn render_collections(registry: &Registry) -> String {
    if registry.is_empty() {
        return "No collections found.\n".to_string();
    }
    let mut out = String::new();
    for c in registry.collections() {
        let _ = write!(
            out,
            "  {} ({} commands, {} skills)",
            c.name,
            c.count(InvocationMode::ExplicitCommand),
            c.count(InvocationMode::ModelInvokedSkill)
        );
        if let Some(description) = &c.description {
            let _ = write!(out, " — {description}");
        }
        out.push('\n');
    }
    out
}

fn collections_json(registry: &Registry) -> serde_json::Value {
    let rows: Vec<_> = registry.collections().map(collection_json).collect();
    serde_json::Value::Array(rows)
}

fn collection_json(c: &Collection) -> serde_json::Value {
    json!({
        "name": c.name,
        "description": c.description,
        "version": c.version,
        "author": c.author,
        "path": c.path,
        "commands": c.count(InvocationMode::ExplicitCommand),
        "skills": c.count(InvocationMode::ModelInvokedSkill),
    })
}

fn render_documents(registry: &Registry, collection: &str) -> Result<String> {
    let listing = registry.list(collection)?;
    let mut out = String::new();
    for row in &listing {
        let _ = writeln!(
            out,
            "  {} [{}] — {}",
            row.name, row.invocation_mode, row.description
        );
    }
    Ok(out)
}

fn render_document(collection: &str, doc: &Document) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Name:        {}", doc.name);
    let _ = writeln!(out, "Collection:  {collection}");
    let _ = writeln!(out, "Kind:        {}", doc.invocation_mode);
    let _ = writeln!(out, "Description: {}", doc.description);
    if let Some(hint) = &doc.argument_hint {
        let _ = writeln!(out, "Arguments:   {hint}");
    }
    if let Some(license) = &doc.license {
        let _ = writeln!(out, "License:     {license}");
    }
    if !doc.allowed_tools.is_empty() {
        let _ = writeln!(out, "Tools:       {}", doc.allowed_tools.join(", "));
    }
    let _ = writeln!(out, "Path:        {}", doc.path.display());
    let _ = writeln!(out, "\n{}", doc.body);
    out
}
