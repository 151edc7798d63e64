//! The `node-types.json` description of every node the parser can produce.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::prepare::{PreparedGrammar, Production, Symbol, VariableKind};

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeTypeJson {
    #[serde(rename = "type")]
    pub kind: String,
    pub named: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldInfoJson {
    pub multiple: bool,
    pub required: bool,
    pub types: Vec<NodeTypeJson>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeInfoJson {
    #[serde(rename = "type")]
    pub kind: String,
    pub named: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub root: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub extra: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, FieldInfoJson>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<FieldInfoJson>,
}

impl NodeInfoJson {
    fn is_leaf(&self) -> bool {
        self.children.is_none() && self.fields.as_ref().map_or(true, BTreeMap::is_empty)
    }
}

/// How often something occurs among a node's children.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Quantity {
    exists: bool,
    required: bool,
    multiple: bool,
}

impl Quantity {
    const ONE: Quantity = Quantity {
        exists: true,
        required: true,
        multiple: false,
    };

    /// Both occur, one after the other.
    fn append(self, other: Quantity) -> Quantity {
        Quantity {
            exists: self.exists || other.exists,
            required: self.required || other.required,
            multiple: self.multiple || other.multiple || (self.exists && other.exists),
        }
    }

    /// Either one occurs, depending on the production.
    fn union(self, other: Quantity) -> Quantity {
        Quantity {
            exists: self.exists || other.exists,
            required: self.required && other.required,
            multiple: self.multiple || other.multiple,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct ChildSummary {
    quantity: Quantity,
    types: BTreeSet<NodeTypeJson>,
}

impl ChildSummary {
    fn append(&mut self, quantity: Quantity, types: impl IntoIterator<Item = NodeTypeJson>) {
        self.quantity = self.quantity.append(quantity);
        self.types.extend(types);
    }

    fn union(&mut self, other: &ChildSummary) {
        self.quantity = self.quantity.union(other.quantity);
        self.types.extend(other.types.iter().cloned());
    }

    fn to_json(&self) -> FieldInfoJson {
        FieldInfoJson {
            multiple: self.quantity.multiple,
            required: self.quantity.required,
            types: self.types.iter().cloned().collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct VariableSummary {
    fields: BTreeMap<String, ChildSummary>,
    /// Named children outside of any field.
    children: ChildSummary,
    /// Every visible node that can appear directly under the node, used
    /// when a field points at a hidden rule.
    top_level_types: BTreeSet<NodeTypeJson>,
}

impl VariableSummary {
    fn union(&mut self, other: &VariableSummary) {
        let names: BTreeSet<String> = self.fields.keys().chain(other.fields.keys()).cloned().collect();
        for name in names {
            let missing = ChildSummary::default();
            let theirs = other.fields.get(&name).unwrap_or(&missing);
            self.fields.entry(name).or_default().union(theirs);
        }
        self.children.union(&other.children);
        self.top_level_types
            .extend(other.top_level_types.iter().cloned());
    }
}

fn node_type(grammar: &PreparedGrammar, symbol: Symbol) -> NodeTypeJson {
    NodeTypeJson {
        kind: grammar.symbol_name(symbol).to_string(),
        named: grammar.symbol_kind(symbol).is_named(),
    }
}

fn summarize_production(
    grammar: &PreparedGrammar,
    production: &Production,
    summaries: &[VariableSummary],
) -> VariableSummary {
    let mut result = VariableSummary::default();
    for step in &production.steps {
        let child = step.symbol;
        let kind = grammar.symbol_kind(child);
        let hidden = (child.is_non_terminal() && !kind.is_visible()).then(|| &summaries[child.index]);

        let child_types: BTreeSet<NodeTypeJson> = match hidden {
            Some(summary) => summary.top_level_types.clone(),
            None if kind.is_visible() => std::iter::once(node_type(grammar, child)).collect(),
            None => BTreeSet::new(),
        };
        result.top_level_types.extend(child_types.iter().cloned());

        if let Some(summary) = hidden {
            for (name, field) in &summary.fields {
                result
                    .fields
                    .entry(name.clone())
                    .or_default()
                    .append(field.quantity, field.types.iter().cloned());
            }
        }

        if let Some(name) = &step.field_name {
            if !child_types.is_empty() {
                result
                    .fields
                    .entry(name.clone())
                    .or_default()
                    .append(Quantity::ONE, child_types);
            }
        } else if let Some(summary) = hidden {
            result
                .children
                .append(summary.children.quantity, summary.children.types.iter().cloned());
        } else if kind == VariableKind::Named {
            result
                .children
                .append(Quantity::ONE, std::iter::once(node_type(grammar, child)));
        }
    }
    result
}

fn summarize_variables(grammar: &PreparedGrammar) -> Vec<VariableSummary> {
    let mut summaries = vec![VariableSummary::default(); grammar.variables.len()];
    let mut changed = true;
    while changed {
        changed = false;
        for (index, variable) in grammar.variables.iter().enumerate() {
            let mut productions = variable
                .productions
                .iter()
                .map(|p| summarize_production(grammar, p, &summaries));
            let Some(mut summary) = productions.next() else {
                continue;
            };
            for other in productions {
                summary.union(&other);
            }
            if summary != summaries[index] {
                summaries[index] = summary;
                changed = true;
            }
        }
    }
    summaries
}

/// Symbols that can occur in a tree: everything the start rule reaches,
/// plus the extras.
fn reachable_symbols(grammar: &PreparedGrammar) -> BTreeSet<Symbol> {
    let mut reached: BTreeSet<Symbol> = grammar.extra_symbols.iter().copied().collect();
    let mut stack = vec![grammar.start_symbol()];
    while let Some(symbol) = stack.pop() {
        if !reached.insert(symbol) || !symbol.is_non_terminal() {
            continue;
        }
        for step in grammar.variables[symbol.index]
            .productions
            .iter()
            .flat_map(|p| &p.steps)
        {
            if !reached.contains(&step.symbol) {
                stack.push(step.symbol);
            }
        }
    }
    reached
}

pub fn generate_node_types(grammar: &PreparedGrammar) -> Vec<NodeInfoJson> {
    let summaries = summarize_variables(grammar);
    let reachable = reachable_symbols(grammar);
    let mut nodes = Vec::new();

    for (index, variable) in grammar.variables.iter().enumerate() {
        if variable.kind != VariableKind::Named
            || !reachable.contains(&Symbol::non_terminal(index))
        {
            continue;
        }
        let summary = &summaries[index];
        let children = (!summary.children.types.is_empty()).then(|| summary.children.to_json());
        nodes.push(NodeInfoJson {
            kind: variable.name.clone(),
            named: true,
            root: Symbol::non_terminal(index) == grammar.start_symbol(),
            extra: false,
            fields: Some(
                summary
                    .fields
                    .iter()
                    .map(|(name, field)| (name.clone(), field.to_json()))
                    .collect(),
            ),
            children,
        });
    }

    let mut seen = BTreeSet::new();
    for (index, token) in grammar.tokens.iter().enumerate() {
        if !token.kind.is_visible()
            || !reachable.contains(&Symbol::terminal(index))
            || !seen.insert((token.name.clone(), token.kind.is_named()))
        {
            continue;
        }
        nodes.push(NodeInfoJson {
            kind: token.name.clone(),
            named: token.kind.is_named(),
            root: false,
            extra: grammar.is_extra(Symbol::terminal(index)),
            fields: None,
            children: None,
        });
    }

    nodes.sort_by(|a, b| {
        a.is_leaf()
            .cmp(&b.is_leaf())
            .then_with(|| a.kind.cmp(&b.kind))
            .then_with(|| b.named.cmp(&a.named))
    });
    nodes
}
