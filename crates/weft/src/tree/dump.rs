use std::fmt::{self, Write};

use super::{Arena, Node, Table, Tree};

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_table(f, &self.top, &self.manifolds, 0)
    }
}

fn write_table(f: &mut fmt::Formatter<'_>, table: &Table, arena: &Arena, depth: usize) -> fmt::Result {
    for entry in table {
        let indent = depth * 2;
        write!(f, "{:indent$}", "")?;
        match &entry.node {
            Node::Path { name, composons } => {
                writeln!(f, "path {name}")?;
                write_composons(f, composons, arena, depth + 1)?;
            }
            Node::Group { composons } => {
                writeln!(f, "group")?;
                write_composons(f, composons, arena, depth + 1)?;
            }
            Node::Manifold { label, id } => {
                let mut line = format!("manifold {label} [{id}]");
                if let Some(manifold) = arena.get(*id) {
                    if let Some(function) = &manifold.function {
                        if function != label {
                            write!(line, " = {function}")?;
                        }
                    }
                    if !manifold.inputs.is_empty() {
                        let inputs: Vec<_> = manifold.inputs.iter().map(ToString::to_string).collect();
                        write!(line, " <- {}", inputs.join(" "))?;
                    }
                } else {
                    line.push_str(" (dangling)");
                }
                writeln!(f, "{line}")?;
            }
            Node::GroupReference { name } => writeln!(f, "ref {name}")?,
            Node::Selection(selection) => writeln!(f, "selection {selection}")?,
            Node::Couplet(couplet) => writeln!(
                f,
                "couplet {} {} :: {}",
                couplet.kind, couplet.selection, couplet.payload
            )?,
            Node::Modifier(modifier) => writeln!(
                f,
                "modifier {} {} :: {}",
                modifier.kind, modifier.key, modifier.payload
            )?,
            Node::Payload(payload) => writeln!(f, "{payload}")?,
        }
    }
    Ok(())
}

fn write_composons(f: &mut fmt::Formatter<'_>, composons: &[Table], arena: &Arena, depth: usize) -> fmt::Result {
    for (index, composon) in composons.iter().enumerate() {
        let indent = depth * 2;
        writeln!(f, "{:indent$}composon {index}", "")?;
        write_table(f, composon, arena, depth + 1)?;
    }
    Ok(())
}
