//! Create direct attributes from a node's residual parameters.

use tracing::warn;

use super::{AccessMode, Attribute, ParamTreeHandler};
use crate::builder::BuildContext;
use crate::parameter::Parameter;

/// Create one attribute per parameter, addressed at `api_prefix/<uri>`.
///
/// Parameters with an unsupported type are skipped with a warning.
pub fn synthesize(
    parameters: &[Parameter],
    api_prefix: &str,
    ctx: &BuildContext,
) -> Vec<Attribute> {
    parameters
        .iter()
        .filter_map(|parameter| synthesize_one(parameter, api_prefix, ctx))
        .collect()
}

fn synthesize_one(
    parameter: &Parameter,
    api_prefix: &str,
    ctx: &BuildContext,
) -> Option<Attribute> {
    let Some(datatype) = parameter.metadata.datatype() else {
        warn!(
            path = %parameter.uri().join("/"),
            type_name = %parameter.metadata.type_name,
            "Could not handle parameter type"
        );
        return None;
    };

    let access = if parameter.metadata.writeable {
        AccessMode::ReadWrite
    } else {
        AccessMode::Read
    };

    let handler =
        ParamTreeHandler::new(address(api_prefix, parameter.uri()), ctx.connection.clone())
            .with_update_period(ctx.update_period);

    Some(
        Attribute::remote(parameter.name().replace('.', ""), datatype, access, handler)
            .with_group(group_name(parameter.path()))
            .with_allowed_values(parameter.metadata.allowed_values.clone())
            .with_initial_value(&parameter.metadata.value),
    )
}

fn address(api_prefix: &str, uri: &[String]) -> String {
    if api_prefix.is_empty() {
        uri.join("/")
    } else {
        format!("{}/{}", api_prefix, uri.join("/"))
    }
}

/// Display group for a reduced path: its first segment in PascalCase, when
/// the path has at least two segments.
pub fn group_name(path: &[String]) -> Option<String> {
    if path.len() < 2 {
        return None;
    }
    Some(snake_to_pascal(&path[0]))
}

fn snake_to_pascal(name: &str) -> String {
    name.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}
