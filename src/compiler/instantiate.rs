//! Template → object tree.
//!
//! Components expand recursively: the component's own declaration is
//! instantiated first, then the use site overrides its id and props and
//! appends its children.

use super::document::NodeDecl;
use super::engine::Engine;
use super::object::{Builtin, Object};

/// Instantiate one declaration and everything below it.
pub(super) fn instantiate(engine: &Engine, decl: &NodeDecl) -> Result<Object, String> {
    let mut expanding = Vec::new();
    expand(engine, decl, &mut expanding)
}

fn expand(engine: &Engine, decl: &NodeDecl, expanding: &mut Vec<String>) -> Result<Object, String> {
    let mut object = match Builtin::from_name(&decl.kind) {
        Some(builtin) => Object::new(builtin),
        None => {
            let Some(component) = engine.component(&decl.kind) else {
                return Err(format!("unknown type `{}`", decl.kind));
            };
            if expanding.iter().any(|name| name == &decl.kind) {
                return Err(format!(
                    "component `{}` instantiates itself ({} → {})",
                    decl.kind,
                    expanding.join(" → "),
                    decl.kind
                ));
            }

            expanding.push(decl.kind.clone());
            let mut object = expand(engine, &component.decl, expanding)?;
            expanding.pop();

            object.type_name = decl.kind.clone();
            object
        }
    };

    if decl.id.is_some() {
        object.id = decl.id.clone();
    }
    for (key, value) in &decl.props {
        object.props.insert(key.clone(), value.clone());
    }
    for child in &decl.children {
        object.children.push(expand(engine, child, expanding)?);
    }

    Ok(object)
}
