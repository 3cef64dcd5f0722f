//! Canonical schema text. Output re-parses to an equal [`Schema`].

use crate::schema::{DefinitionKind, Field, Schema};

pub fn pretty_print(schema: &Schema) -> String {
    let mut text = String::new();
    if let Some(package) = &schema.package {
        text.push_str(&format!("package {};\n", package));
    }
    for (i, d) in schema.definitions.iter().enumerate() {
        if i > 0 || schema.package.is_some() {
            text.push('\n');
        }
        match d.kind {
            DefinitionKind::Union => {
                let members: Vec<&str> = d.fields.iter().map(|f| f.name.as_str()).collect();
                text.push_str(&format!("union {} = {}", d.name, members.join(" | ")));
                match &d.discriminator {
                    Some(tag) => text.push_str(&format!(" {{\n  {};\n}}\n", tag)),
                    None => text.push_str(";\n"),
                }
            }
            DefinitionKind::Alias => {
                let target = d.fields.first().map(|f| f.name.as_str()).unwrap_or_default();
                text.push_str(&format!("alias {} = {};\n", d.name, target));
            }
            kind => {
                text.push_str(&format!("{} {} {{\n", kind.keyword(), d.name));
                for f in &d.fields {
                    text.push_str("  ");
                    text.push_str(&field_line(kind, f));
                    text.push('\n');
                }
                text.push_str("}\n");
            }
        }
    }
    text
}

fn field_line(kind: DefinitionKind, f: &Field) -> String {
    let mut line = String::new();
    if let Some(t) = &f.type_name {
        line.push_str(t);
        if f.is_array {
            line.push_str("[]");
        }
        line.push(' ');
    }
    line.push_str(&f.name);
    if kind != DefinitionKind::Struct {
        line.push_str(&format!(" = {}", f.value));
    }
    let attrs: Vec<&str> = [(f.is_deprecated, "deprecated"), (f.is_required, "required")]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, name)| *name)
        .collect();
    if !attrs.is_empty() {
        line.push_str(&format!(" [{}]", attrs.join(", ")));
    }
    line.push(';');
    line
}
