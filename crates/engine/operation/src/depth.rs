use async_graphql_parser::types::{Selection, SelectionSet};

use crate::ParsedOperation;

/// Nesting depth of the selected operation's selection sets, fragments
/// expanded in place (spreading a fragment adds no depth of its own).
/// Recursive spreads are skipped; validation already rejects them.
pub(crate) fn operation_depth(operation: &ParsedOperation) -> usize {
    let mut stack = Vec::new();
    selection_set_depth(operation, &operation.definition().node.selection_set.node, &mut stack)
}

fn selection_set_depth<'doc>(
    operation: &'doc ParsedOperation,
    selection_set: &'doc SelectionSet,
    fragment_stack: &mut Vec<&'doc str>,
) -> usize {
    selection_set
        .items
        .iter()
        .map(|item| match &item.node {
            Selection::Field(field) => {
                1 + selection_set_depth(operation, &field.node.selection_set.node, fragment_stack)
            }
            Selection::InlineFragment(inline) => {
                selection_set_depth(operation, &inline.node.selection_set.node, fragment_stack)
            }
            Selection::FragmentSpread(spread) => {
                let name = spread.node.fragment_name.node.as_str();
                if fragment_stack.contains(&name) {
                    return 0;
                }
                let Some(fragment) = operation
                    .fragments()
                    .iter()
                    .find_map(|(key, fragment)| (key.as_str() == name).then_some(fragment))
                else {
                    return 0;
                };
                fragment_stack.push(name);
                let depth = selection_set_depth(operation, &fragment.node.selection_set.node, fragment_stack);
                fragment_stack.pop();
                depth
            }
        })
        .max()
        .unwrap_or(0)
}
