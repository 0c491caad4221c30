use std::ops::Range;

/// A variable declared with `<!--rep var=NAME place=PLACEHOLDER-->`.
#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    /// Literal text replaced by the variable's value in the owning block.
    pub placeholder: String,
    /// Current value. Starts out equal to the placeholder.
    pub value: String,
    /// Byte span of the declaring tag, for diagnostics.
    pub span: Range<usize>,
}

/// The variables of a single block, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    vars: Vec<Variable>,
}

impl VariableTable {
    pub fn new() -> Self {
        VariableTable { vars: Vec::new() }
    }

    /// Declare a new variable and return its index. The name must not be
    /// declared yet; see [`VariableTable::index_of`].
    pub fn declare(&mut self, name: &str, placeholder: &str, span: Range<usize>) -> usize {
        debug_assert!(self.index_of(name).is_none(), "variable {name} declared twice");
        self.vars.push(Variable {
            name: name.to_string(),
            placeholder: placeholder.to_string(),
            value: placeholder.to_string(),
            span,
        });
        self.vars.len() - 1
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.vars.iter().position(|v| v.name == name)
    }

    /// Current value of the variable at `index`, or "" if out of range.
    pub fn value(&self, index: usize) -> &str {
        self.vars.get(index).map(|v| v.value.as_str()).unwrap_or("")
    }

    /// Assign a value by name. Returns false if no such variable exists.
    pub fn assign(&mut self, name: &str, value: impl Into<String>) -> bool {
        match self.vars.iter_mut().find(|v| v.name == name) {
            Some(var) => {
                var.value = value.into();
                true
            }
            None => false,
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.vars.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
