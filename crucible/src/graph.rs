//! Binding-graph dump utilities, for visual debugging of a compiled
//! [`Injector`]. Grounded on the teacher's `utils::graphviz`/`utils::plantuml`
//! renderers, generalised from the old builder/interface model to keys and
//! bindings.

use std::fmt::Write;

use crate::binding::BindingKind;
use crate::injector::Injector;

fn short_name(full: &str) -> &str {
    let angle = full.find('<').unwrap_or(full.len());
    full[..angle].rsplit("::").next().unwrap_or(&full[..angle])
}

/// Renders the compiled bindings of `injector` as a Graphviz `digraph`: one
/// node per bound key, one edge per linked/exposed redirection.
pub fn render_graphviz(injector: &Injector) -> String {
    let mut s = String::new();
    writeln!(
        s,
        "digraph Injector {{\n    rankdir=LR;\n    fontsize=8;\n    fontname=\"Roboto\";\n\n    node [\n        shape=box,\n        style=filled,\n        fillcolor=white,\n        fontname=\"Roboto\",\n        fontsize=8\n    ];\n\n    edge [\n        fontname=\"Roboto\",\n        fontsize=8\n    ];"
    )
    .unwrap();

    let mut bindings: Vec<_> = injector.all_bindings().collect();
    bindings.sort_by_key(|b| b.key.type_literal().name());

    for binding in &bindings {
        let from = short_name(binding.key.type_literal().name());
        writeln!(s, "    \"{from}\" [label=\"{from}\\n{:?}\"]", binding.scoping).unwrap();
        match &binding.kind {
            BindingKind::Linked(target) => {
                writeln!(s, "    \"{from}\" -> \"{}\" [style=dashed]", short_name(target.type_literal().name())).unwrap();
            }
            BindingKind::Exposed(_, target) => {
                writeln!(
                    s,
                    "    \"{from}\" -> \"{}\" [style=dotted, label=\"exposed\"]",
                    short_name(target.type_literal().name())
                )
                .unwrap();
            }
            BindingKind::Direct(_) => {}
        }
    }

    writeln!(s, "}}").unwrap();
    s
}

/// Renders the same graph as a PlantUML component diagram.
pub fn render_plantuml(injector: &Injector) -> String {
    let mut s = String::new();
    writeln!(s, "@startuml").unwrap();

    let mut bindings: Vec<_> = injector.all_bindings().collect();
    bindings.sort_by_key(|b| b.key.type_literal().name());

    for binding in &bindings {
        let from = short_name(binding.key.type_literal().name());
        writeln!(s, "component [{from}]").unwrap();
        match &binding.kind {
            BindingKind::Linked(target) => {
                writeln!(s, "[{from}] ..> [{}]", short_name(target.type_literal().name())).unwrap();
            }
            BindingKind::Exposed(_, target) => {
                writeln!(s, "[{from}] ..> [{}] : exposed", short_name(target.type_literal().name())).unwrap();
            }
            BindingKind::Direct(_) => {}
        }
    }

    writeln!(s, "@enduml").unwrap();
    s
}
