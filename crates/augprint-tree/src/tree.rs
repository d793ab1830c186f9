use std::collections::HashSet;

use augprint_core::Directive;
use indexmap::IndexMap;

use crate::error::TreeError;
use crate::grammar::{GrammarRegistry, Parsed, TreeNode};
use crate::pathx::{self, escape_label, Axis, Expr, Func, NameTest, Step};
use crate::TreeProvider;

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
struct Node {
    label: String,
    value: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed configuration tree.
///
/// Files are mounted under `/files/<path components>`. Replacing a file only
/// unlinks its old children; the arena never shrinks.
#[derive(Debug)]
pub struct MemTree {
    nodes: Vec<Node>,
    grammars: GrammarRegistry,
    /// filename → grammar name, in load order.
    files: IndexMap<String, String>,
    normalized: bool,
}

impl Default for MemTree {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
enum Value {
    Nodes(Vec<NodeId>),
    Str(String),
    Num(i64),
    Bool(bool),
}

#[derive(Debug, Clone, Copy)]
struct Context {
    node: NodeId,
    position: usize,
    size: usize,
}

impl MemTree {
    pub fn new() -> Self {
        Self::with_grammars(GrammarRegistry::builtin())
    }

    pub fn with_grammars(grammars: GrammarRegistry) -> Self {
        Self {
            nodes: vec![Node {
                label: String::new(),
                value: None,
                parent: None,
                children: Vec::new(),
            }],
            grammars,
            files: IndexMap::new(),
            normalized: false,
        }
    }

    /// Name of the grammar `filename` was loaded with.
    pub fn grammar_of(&self, filename: &str) -> Option<&str> {
        self.files.get(filename).map(String::as_str)
    }

    /// Parses `text` with the named grammar (or the detected one) and mounts
    /// the result, replacing whatever was loaded for `filename` before.
    /// Returns the name of the grammar used.
    pub fn load_text(
        &mut self,
        filename: &str,
        grammar: Option<&str>,
        text: &str,
    ) -> Result<String, TreeError> {
        let (name, parsed) = {
            let grammar = self.resolve_grammar(filename, grammar)?;
            let parsed = grammar
                .parse(filename, text)
                .map_err(|source| TreeError::Parse {
                    filename: filename.to_string(),
                    grammar: grammar.name().to_string(),
                    source,
                })?;
            (grammar.name(), parsed)
        };
        self.mount(filename, name, parsed);
        Ok(name.to_string())
    }

    fn resolve_grammar(
        &self,
        filename: &str,
        hint: Option<&str>,
    ) -> Result<&dyn crate::grammar::Grammar, TreeError> {
        match hint {
            Some(name) => self
                .grammars
                .lookup(name)
                .ok_or_else(|| TreeError::GrammarNotFound {
                    name: name.to_string(),
                }),
            None => self
                .grammars
                .detect(filename)
                .ok_or_else(|| TreeError::NoGrammar {
                    filename: filename.to_string(),
                }),
        }
    }

    fn mount(&mut self, filename: &str, grammar: &str, parsed: Parsed) {
        let mut file = self.ensure_child(ROOT, "files");
        for component in filename.split('/').filter(|c| !c.is_empty()) {
            file = self.ensure_child(file, component);
        }
        self.nodes[file].children.clear();
        for node in parsed.nodes {
            self.attach(file, node);
        }

        self.normalized |= parsed.normalized;
        self.files.insert(filename.to_string(), grammar.to_string());
        tracing::debug!(filename, grammar, nodes = self.nodes.len(), "mounted file");
    }

    fn attach(&mut self, parent: NodeId, node: TreeNode) {
        let id = self.add_child(parent, &node.label);
        self.nodes[id].value = node.value;
        for child in node.children {
            self.attach(id, child);
        }
    }

    fn add_child(&mut self, parent: NodeId, label: &str) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            label: label.to_string(),
            value: None,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn ensure_child(&mut self, parent: NodeId, label: &str) -> NodeId {
        let existing = self.nodes[parent]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c].label == label);
        existing.unwrap_or_else(|| self.add_child(parent, label))
    }

    /// Canonical path of a node: `label[k]` only where the label repeats.
    fn path_of(&self, id: NodeId) -> String {
        let mut steps = Vec::new();
        let mut current = id;
        while let Some(parent) = self.nodes[current].parent {
            let label = &self.nodes[current].label;
            let same: Vec<NodeId> = self.nodes[parent]
                .children
                .iter()
                .copied()
                .filter(|&c| &self.nodes[c].label == label)
                .collect();
            let mut step = escape_label(label);
            if same.len() > 1 {
                let rank = same.iter().position(|&c| c == current).unwrap_or(0) + 1;
                step.push_str(&format!("[{rank}]"));
            }
            steps.push(step);
            current = parent;
        }
        steps.reverse();
        format!("/{}", steps.join("/"))
    }

    fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.nodes[next].children.iter().rev().copied());
        }
        out
    }

    fn select(&self, expr: &str) -> Result<Vec<NodeId>, TreeError> {
        let path = pathx::parse(expr)?;
        Ok(self.eval_steps(vec![ROOT], &path.steps))
    }

    fn eval_steps(&self, start: Vec<NodeId>, steps: &[Step]) -> Vec<NodeId> {
        steps
            .iter()
            .fold(start, |nodes, step| self.eval_step(&nodes, step))
    }

    fn eval_step(&self, nodes: &[NodeId], step: &Step) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for &node in nodes {
            let mut candidates: Vec<NodeId> = match (&step.test, step.axis) {
                (NameTest::SelfNode, _) => vec![node],
                (NameTest::Parent, _) => self.nodes[node].parent.into_iter().collect(),
                (test, Axis::Child) => self.nodes[node]
                    .children
                    .iter()
                    .copied()
                    .filter(|&c| self.name_matches(c, test))
                    .collect(),
                (test, Axis::Descendant) => self
                    .descendants(node)
                    .into_iter()
                    .filter(|&c| self.name_matches(c, test))
                    .collect(),
            };

            for predicate in &step.predicates {
                let size = candidates.len();
                candidates = candidates
                    .into_iter()
                    .enumerate()
                    .filter(|&(i, candidate)| {
                        let ctx = Context {
                            node: candidate,
                            position: i + 1,
                            size,
                        };
                        match self.eval(predicate, ctx) {
                            Value::Num(n) => usize::try_from(n).is_ok_and(|n| n == ctx.position),
                            other => self.truthy(&other),
                        }
                    })
                    .map(|(_, candidate)| candidate)
                    .collect();
            }

            out.extend(candidates.into_iter().filter(|&c| seen.insert(c)));
        }
        out
    }

    fn name_matches(&self, id: NodeId, test: &NameTest) -> bool {
        let label = &self.nodes[id].label;
        match test {
            NameTest::Label(name) => label == name,
            NameTest::Any => true,
            NameTest::Seq => !label.is_empty() && label.bytes().all(|b| b.is_ascii_digit()),
            NameTest::SelfNode | NameTest::Parent => false,
        }
    }

    fn eval(&self, expr: &Expr, ctx: Context) -> Value {
        match expr {
            Expr::Or(left, right) => Value::Bool(
                self.truthy(&self.eval(left, ctx)) || self.truthy(&self.eval(right, ctx)),
            ),
            Expr::And(left, right) => Value::Bool(
                self.truthy(&self.eval(left, ctx)) && self.truthy(&self.eval(right, ctx)),
            ),
            Expr::Compare {
                left,
                right,
                negated,
            } => Value::Bool(self.compare(&self.eval(left, ctx), &self.eval(right, ctx), *negated)),
            Expr::Path(path) => {
                let start = if path.absolute { ROOT } else { ctx.node };
                Value::Nodes(self.eval_steps(vec![start], &path.steps))
            }
            Expr::Literal(text) => Value::Str(text.clone()),
            Expr::Number(n) => Value::Num(*n),
            Expr::Call(Func::Position, _) => Value::Num(ctx.position as i64),
            Expr::Call(Func::Last, _) => Value::Num(ctx.size as i64),
            Expr::Call(Func::Label, _) => Value::Str(self.nodes[ctx.node].label.clone()),
            Expr::Call(Func::Count, args) => {
                let count = match args.first().map(|arg| self.eval(arg, ctx)) {
                    Some(Value::Nodes(nodes)) => nodes.len(),
                    _ => 0,
                };
                Value::Num(count as i64)
            }
        }
    }

    fn truthy(&self, value: &Value) -> bool {
        match value {
            Value::Nodes(nodes) => !nodes.is_empty(),
            Value::Str(text) => !text.is_empty(),
            Value::Num(n) => *n != 0,
            Value::Bool(b) => *b,
        }
    }

    /// Node-sets compare by any member value; a node without a value compares
    /// as the empty string.
    fn atoms<'a>(&'a self, value: &'a Value) -> Vec<std::borrow::Cow<'a, str>> {
        match value {
            Value::Nodes(nodes) => nodes
                .iter()
                .map(|&n| {
                    std::borrow::Cow::Borrowed(self.nodes[n].value.as_deref().unwrap_or_default())
                })
                .collect(),
            Value::Str(text) => vec![std::borrow::Cow::Borrowed(text.as_str())],
            Value::Num(n) => vec![std::borrow::Cow::Owned(n.to_string())],
            Value::Bool(b) => vec![std::borrow::Cow::Owned(b.to_string())],
        }
    }

    fn compare(&self, left: &Value, right: &Value, negated: bool) -> bool {
        match (left, right) {
            (Value::Bool(_), _) | (_, Value::Bool(_)) => {
                (self.truthy(left) == self.truthy(right)) != negated
            }
            (Value::Num(n), other) | (other, Value::Num(n)) => self
                .atoms(other)
                .iter()
                .any(|atom| (atom.trim().parse::<i64>().ok() == Some(*n)) != negated),
            _ => {
                let right = self.atoms(right);
                self.atoms(left)
                    .iter()
                    .any(|l| right.iter().any(|r| (l == r) != negated))
            }
        }
    }

    /// Sets the value of the single node `expr` addresses, creating it when
    /// nothing matches. Returns whether the tree changed.
    pub fn set(&mut self, expr: &str, value: &str) -> Result<bool, TreeError> {
        let path = pathx::parse(expr)?;
        let matches = self.eval_steps(vec![ROOT], &path.steps);
        let node = match matches.as_slice() {
            [node] => *node,
            [] => self.create(expr, &path.steps)?,
            many => {
                return Err(TreeError::TooManyMatches {
                    expr: expr.to_string(),
                    count: many.len(),
                })
            }
        };
        let changed = self.nodes[node].value.as_deref() != Some(value);
        if changed {
            self.nodes[node].value = Some(value.to_string());
        }
        Ok(changed)
    }

    /// Creates the missing tail of `steps` below the deepest prefix that
    /// matches exactly one node. Predicates on created steps are not enforced.
    fn create(&mut self, expr: &str, steps: &[Step]) -> Result<NodeId, TreeError> {
        let mut base = ROOT;
        let mut depth = 0;
        for k in (0..steps.len()).rev() {
            let found = self.eval_steps(vec![ROOT], &steps[..k]);
            match found.as_slice() {
                [] => continue,
                [node] => {
                    base = *node;
                    depth = k;
                    break;
                }
                many => {
                    return Err(TreeError::TooManyMatches {
                        expr: expr.to_string(),
                        count: many.len(),
                    })
                }
            }
        }

        let not_creatable = |reason: &str| TreeError::NotCreatable {
            expr: expr.to_string(),
            reason: reason.to_string(),
        };
        for step in &steps[depth..] {
            if step.axis == Axis::Descendant {
                return Err(not_creatable("descendant steps are not creatable"));
            }
            base = match &step.test {
                NameTest::Label(label) => self.add_child(base, label),
                NameTest::Seq => {
                    let next = self.nodes[base]
                        .children
                        .iter()
                        .filter_map(|&c| self.nodes[c].label.parse::<u64>().ok())
                        .max()
                        .unwrap_or(0)
                        + 1;
                    self.add_child(base, &next.to_string())
                }
                NameTest::SelfNode => base,
                NameTest::Any => return Err(not_creatable("`*` does not name a label")),
                NameTest::Parent => return Err(not_creatable("`..` cannot be created")),
            };
        }
        tracing::trace!(expr, path = %self.path_of(base), "created node");
        Ok(base)
    }

    /// Replays directives in order. Returns how many changed the tree.
    pub fn apply(&mut self, directives: &[Directive]) -> Result<usize, TreeError> {
        let mut changes = 0;
        for directive in directives {
            if self.set(&directive.path, &directive.value)? {
                changes += 1;
            }
        }
        tracing::debug!(directives = directives.len(), changes, "replayed directives");
        Ok(changes)
    }
}

impl TreeProvider for MemTree {
    fn load_file(&mut self, filename: &str, grammar: Option<&str>) -> Result<String, TreeError> {
        let text = std::fs::read_to_string(filename).map_err(|source| TreeError::Io {
            filename: filename.to_string(),
            source,
        })?;
        self.load_text(filename, grammar, &text)
    }

    fn match_paths(&self, expr: &str) -> Result<Vec<String>, TreeError> {
        Ok(self
            .select(expr)?
            .into_iter()
            .map(|id| self.path_of(id))
            .collect())
    }

    fn get(&self, expr: &str) -> Result<Option<String>, TreeError> {
        match self.select(expr)?.as_slice() {
            [] => Ok(None),
            [node] => Ok(self.nodes[*node].value.clone()),
            many => Err(TreeError::TooManyMatches {
                expr: expr.to_string(),
                count: many.len(),
            }),
        }
    }

    fn modified_by_normalization(&self) -> bool {
        self.normalized
    }
}
