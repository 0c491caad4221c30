use std::io::Write;

use rep::{BlockMut, Template};

use crate::data::{Entry, Fields};
use crate::error::{DriveError, Warning, WarningKind};

const ROOT: &str = "root";

/// Write `template` to `sink` in one complete pass, taking variable values
/// and block repetitions from `data`.
///
/// For every child block, in document order:
/// - a table writes the block once, an array of tables once per element;
/// - `true` writes it once with the values it already has;
/// - a missing key, an empty array or `false` skips it.
///
/// Keys that do not fit the template are reported as warnings. Variable
/// values stay assigned after the pass, as with manual rendering.
pub fn render<W: Write>(
    template: &mut Template<W>,
    data: &Fields,
    sink: W,
) -> Result<Vec<Warning>, DriveError> {
    let mut warnings = Vec::new();
    let mut root = template.root_mut();

    assign_variables(&mut root, data, ROOT, &mut warnings)?;
    root.start_with(sink)
        .map_err(|e| DriveError::render(ROOT, e))?;
    fill_children(&mut root, data, ROOT, &mut warnings)?;
    root.end().map_err(|e| DriveError::render(ROOT, e))?;

    tracing::debug!(warnings = warnings.len(), "rendered template from data");
    Ok(warnings)
}

/// Write one pass of a nested block: its variables, its text and its children.
fn write_block<W: Write>(
    block: &mut BlockMut<'_, W>,
    fields: &Fields,
    path: &str,
    warnings: &mut Vec<Warning>,
) -> Result<(), DriveError> {
    assign_variables(block, fields, path, warnings)?;
    block.start().map_err(|e| DriveError::render(path, e))?;
    fill_children(block, fields, path, warnings)
}

/// Start or skip every child of an active block, moving past each with `next`.
fn fill_children<W: Write>(
    block: &mut BlockMut<'_, W>,
    fields: &Fields,
    path: &str,
    warnings: &mut Vec<Warning>,
) -> Result<(), DriveError> {
    let names: Vec<String> = block
        .block()
        .block_names()
        .into_iter()
        .map(String::from)
        .collect();

    for name in names {
        let child_path = if path == ROOT {
            name.clone()
        } else {
            format!("{}.{}", path, name)
        };
        let Some(mut child) = block.child(&name) else {
            continue;
        };

        match fields.get(&name) {
            Some(Entry::Once(inner)) => write_block(&mut child, inner, &child_path, warnings)?,
            Some(Entry::Repeat(items)) if !items.is_empty() => {
                for item in items {
                    write_block(&mut child, item, &child_path, warnings)?;
                }
            }
            Some(Entry::Bool(true)) => {
                write_block(&mut child, &Fields::new(), &child_path, warnings)?
            }
            _ => child
                .skip()
                .map_err(|e| DriveError::render(&child_path, e))?,
        }

        block.next().map_err(|e| DriveError::render(path, e))?;
    }
    Ok(())
}

/// Assign the scalar fields naming variables of `block`, and note every
/// field that fits neither a variable nor a child.
fn assign_variables<W: Write>(
    block: &mut BlockMut<'_, W>,
    fields: &Fields,
    path: &str,
    warnings: &mut Vec<Warning>,
) -> Result<(), DriveError> {
    for (key, entry) in fields {
        let is_variable = block.block().variables().index_of(key).is_some();
        let is_block = block.block().blk(key).is_some();

        let kind = match (entry.as_text(), is_variable, is_block) {
            (Some(value), true, _) => {
                block
                    .set_var(key, value)
                    .map_err(|e| DriveError::render(path, e))?;
                None
            }
            (_, false, false) => Some(WarningKind::UnknownField),
            (None, true, false) => Some(WarningKind::TableForVariable),
            (Some(_), false, true) if !matches!(entry, Entry::Bool(_)) => {
                Some(WarningKind::ScalarForBlock)
            }
            _ => None,
        };

        if let Some(kind) = kind {
            let warning = Warning {
                block: path.to_string(),
                field: key.clone(),
                kind,
            };
            tracing::warn!(value = entry.type_name(), "{}", warning);
            warnings.push(warning);
        }
    }
    Ok(())
}
