//! Expansion site discovery.

use crate::macros::{ExpansionSite, MacroRegistry};
use crate::syntax::{Node, SourceFile};

/// Every expansion site in `file`, in pre-order.
///
/// Only names the registry knows become sites: `#function`, `#selector` and
/// the other built-in `#` forms are left alone, as are ordinary attributes.
/// An attribute is a site only when the registry knows it as an attached
/// macro.
pub fn collect_sites(file: &SourceFile, registry: &MacroRegistry) -> Vec<ExpansionSite> {
    let mut sites = Vec::new();
    for item in &file.items {
        visit(item, file, registry, &mut sites);
    }
    sites
}

fn visit(node: &Node, file: &SourceFile, registry: &MacroRegistry, sites: &mut Vec<ExpansionSite>) {
    if node.kind().is_declaration() {
        for attribute in node.attributes() {
            let attached = attribute
                .as_attribute()
                .is_some_and(|a| registry.is_attached(a.name));
            if !attached {
                continue;
            }
            if let Some(site) =
                ExpansionSite::attached(attribute.clone(), node.clone(), file.source.clone())
            {
                sites.push(site);
            }
        }
    }

    if let Some(site) = ExpansionSite::freestanding(node.clone(), file.source.clone()) {
        if registry.contains(&site.macro_name) {
            sites.push(site);
        }
    }

    for child in node.children() {
        visit(child, file, registry, sites);
    }
}
