//! Print the discovered control tree.

use anyhow::Result;
use colored::Colorize;
use odin_core::{Attribute, ControlNode};

use crate::config::Config;

pub async fn execute(config: &Config) -> Result<()> {
    let root = super::discover(config).await?;

    println!("{}", root.api_prefix().cyan().bold());
    print_node(&root, 1);
    Ok(())
}

fn print_node(node: &ControlNode, depth: usize) {
    let indent = "  ".repeat(depth);
    for (_, attribute) in node.attributes() {
        println!("{}{}", indent, describe(attribute));
    }
    for (name, child) in node.children() {
        println!("{}{}", indent, name.green().bold());
        print_node(child, depth + 1);
    }
}

/// One-line summary: name, access, type, group and address
fn describe(attribute: &Attribute) -> String {
    let mut line = format!(
        "{} [{} {}]",
        attribute.name(),
        attribute.access(),
        attribute.datatype()
    );
    if let Some(group) = attribute.group() {
        line.push_str(&format!(" ({})", group));
    }
    match attribute.address() {
        Some(address) => line.push_str(&format!(" -> {}", address)),
        None => line.push_str(" <derived>"),
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use odin_core::{AccessMode, DataType};

    #[test]
    fn test_describe_derived() {
        let attribute = Attribute::new("frames_written", DataType::Int, AccessMode::Read);
        assert_eq!(describe(&attribute), "frames_written [R int] <derived>");
    }

    #[test]
    fn test_describe_grouped() {
        let attribute = Attribute::new("hdf_frames", DataType::Float, AccessMode::ReadWrite)
            .with_group(Some("Hdf".to_string()));
        assert_eq!(describe(&attribute), "hdf_frames [RW float] (Hdf) <derived>");
    }
}
