//! Finalization of an instantiated tree.
//!
//! - ids must be unique across the tree
//! - string props of the form `"@id.prop"` are deferred bindings, replaced by
//!   the referenced prop's value once that value is itself resolved

use rustc_hash::FxHashSet;

use super::Diagnostic;
use super::object::Object;

/// Location of a binding: child indices from the root, then the prop key.
type Site = (Vec<usize>, String);

/// Resolve every binding in the tree, or report the first one that cannot be.
pub(super) fn finalize(root: &mut Object) -> Result<(), Diagnostic> {
    check_unique_ids(root)?;

    loop {
        let mut sites = Vec::new();
        collect_sites(root, &mut Vec::new(), &mut sites);
        if sites.is_empty() {
            return Ok(());
        }

        let mut progressed = false;
        let mut blocked = None;

        for (path, key) in sites {
            let Some(binding) = object_at(root, &path)
                .and_then(|object| object.props.get(&key))
                .and_then(|value| value.as_str())
                .and_then(parse_binding)
                .map(|(id, prop)| (id.to_string(), prop.to_string()))
            else {
                continue;
            };

            match lookup(root, &binding.0, &binding.1) {
                Lookup::Value(value) => {
                    if let Some(object) = object_at_mut(root, &path) {
                        object.props.insert(key, value);
                        progressed = true;
                    }
                }
                Lookup::Pending => {
                    blocked.get_or_insert(binding);
                }
                Lookup::Missing(message) => return Err(Diagnostic::new(message)),
            }
        }

        if !progressed {
            let (id, prop) = blocked.unwrap_or_default();
            return Err(Diagnostic::new(format!(
                "binding `@{id}.{prop}` is part of a binding cycle"
            )));
        }
    }
}

/// Split `"@id.prop"` into `("id", "prop")`.
pub(super) fn parse_binding(value: &str) -> Option<(&str, &str)> {
    let (id, prop) = value.strip_prefix('@')?.split_once('.')?;
    let valid = |s: &str| {
        !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    };
    (valid(id) && valid(prop)).then_some((id, prop))
}

fn check_unique_ids(root: &Object) -> Result<(), Diagnostic> {
    let mut seen = FxHashSet::default();
    let mut duplicate = None;
    root.walk(&mut |object| {
        if let Some(id) = object.id.as_deref()
            && !seen.insert(id)
            && duplicate.is_none()
        {
            duplicate = Some(id.to_string());
        }
    });

    match duplicate {
        Some(id) => Err(Diagnostic::new(format!("duplicate id `{id}`"))),
        None => Ok(()),
    }
}

fn collect_sites(object: &Object, path: &mut Vec<usize>, sites: &mut Vec<Site>) {
    for (key, value) in &object.props {
        if value.as_str().and_then(parse_binding).is_some() {
            sites.push((path.clone(), key.clone()));
        }
    }
    for (index, child) in object.children.iter().enumerate() {
        path.push(index);
        collect_sites(child, path, sites);
        path.pop();
    }
}

enum Lookup {
    Value(toml::Value),
    /// Target is itself an unresolved binding.
    Pending,
    Missing(String),
}

fn lookup(root: &Object, id: &str, prop: &str) -> Lookup {
    let Some(target) = root.find(id) else {
        return Lookup::Missing(format!("binding `@{id}.{prop}` refers to unknown id `{id}`"));
    };
    let Some(value) = target.props.get(prop) else {
        return Lookup::Missing(format!(
            "binding `@{id}.{prop}`: `{id}` has no property `{prop}`"
        ));
    };
    if value.as_str().and_then(parse_binding).is_some() {
        return Lookup::Pending;
    }
    Lookup::Value(value.clone())
}

fn object_at<'a>(root: &'a Object, path: &[usize]) -> Option<&'a Object> {
    path.iter()
        .try_fold(root, |object, &index| object.children.get(index))
}

fn object_at_mut<'a>(root: &'a mut Object, path: &[usize]) -> Option<&'a mut Object> {
    path.iter()
        .try_fold(root, |object, &index| object.children.get_mut(index))
}
