//! Building blocks of a query: criteria, sorts, portals and script hooks

/// One field pattern inside a criteria group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriterion {
    pub field: String,
    pub pattern: String,
    pub omit: bool,
}

/// A set of criteria AND'd together by the server.
///
/// Groups in the same descriptor are OR'd against each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriteriaGroup {
    criteria: Vec<SearchCriterion>,
}

impl CriteriaGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field pattern. Server wildcards are passed through unchanged.
    pub fn matching(mut self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.push(field, pattern, false);
        self
    }

    /// Add a field pattern whose matches are omitted from the found set
    pub fn omitting(mut self, field: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.push(field, pattern, true);
        self
    }

    fn push(&mut self, field: impl Into<String>, pattern: impl Into<String>, omit: bool) {
        let field = field.into();
        let pattern = pattern.into();
        // A field appears once per group; the latest pattern wins.
        if let Some(existing) = self.criteria.iter_mut().find(|c| c.field == field) {
            existing.pattern = pattern;
            existing.omit = omit;
        } else {
            self.criteria.push(SearchCriterion {
                field,
                pattern,
                omit,
            });
        }
    }

    pub fn criteria(&self) -> &[SearchCriterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Returns true if any criterion in the group is an omit request
    pub fn is_omit(&self) -> bool {
        self.criteria.iter().any(|c| c.omit)
    }
}

/// Sort order for one sort instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortOrder {
    Ascend,
    Descend,
    /// Custom order defined by a named value list
    ValueList(String),
}

impl SortOrder {
    /// Wire representation of the order
    pub fn as_wire(&self) -> &str {
        match self {
            SortOrder::Ascend => "ascend",
            SortOrder::Descend => "descend",
            SortOrder::ValueList(name) => name,
        }
    }
}

/// Sort on one field; position in the descriptor gives its precedence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortInstruction {
    pub field: String,
    pub order: SortOrder,
}

/// Request to include a portal's related records, optionally windowed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRequest {
    /// Relationship name or portal object name on the layout
    pub name: String,
    pub limit: Option<u32>,
    /// 1-based
    pub offset: Option<u32>,
}

impl PortalRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            limit: None,
            offset: None,
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }
}

/// Point in request processing at which a script hook runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScriptStage {
    /// Before the request is processed
    PreRequest,
    /// After the request, before sorting
    PreSort,
    /// After the request and sort
    PostRequest,
}

impl ScriptStage {
    /// Key carrying the script name
    pub fn name_key(&self) -> &'static str {
        match self {
            ScriptStage::PreRequest => "script.prerequest",
            ScriptStage::PreSort => "script.presort",
            ScriptStage::PostRequest => "script",
        }
    }

    /// Key carrying the script parameter
    pub fn param_key(&self) -> &'static str {
        match self {
            ScriptStage::PreRequest => "script.prerequest.param",
            ScriptStage::PreSort => "script.presort.param",
            ScriptStage::PostRequest => "script.param",
        }
    }
}

/// A script to run at one stage of the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptHook {
    pub stage: ScriptStage,
    pub name: String,
    /// None omits the parameter key entirely
    pub parameter: Option<String>,
}

impl ScriptHook {
    pub fn new(stage: ScriptStage, name: impl Into<String>) -> Self {
        Self {
            stage,
            name: name.into(),
            parameter: None,
        }
    }

    pub fn with_parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = Some(parameter.into());
        self
    }

    /// Key/value pairs to emit for this hook
    pub fn wire_pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = vec![(self.stage.name_key(), self.name.as_str())];
        if let Some(param) = &self.parameter {
            pairs.push((self.stage.param_key(), param.as_str()));
        }
        pairs
    }
}
