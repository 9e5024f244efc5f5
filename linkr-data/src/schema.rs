//! Declarative description of the exposed entities.
//!
//! Entities are declared with [`EntityDef`] and validated once by
//! [`SchemaRegistry::register`]. After startup the registry is shared behind an
//! `Arc` and never mutated again.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::DataError;
use crate::row::Row;

/// Names that envelopes use for their own purposes.
pub const RESERVED_NAMES: &[&str] = &["_links", "_embedded", "links"];

/// Primitive type of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Integer,
    Float,
    Text,
    Bool,
    /// Time of day, `HH:MM` or `HH:MM:SS`, carried as text.
    Time,
}

impl ValueKind {
    /// Parse a raw query-string value into a typed JSON value.
    ///
    /// Text is taken verbatim, so a text identifier has exactly one spelling.
    /// Surrounding whitespace is ignored for every other kind.
    pub fn coerce(self, raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        match self {
            ValueKind::Integer => trimmed.parse::<i64>().ok().map(Value::from),
            ValueKind::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Value::from),
            ValueKind::Text => Some(Value::from(raw)),
            ValueKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            ValueKind::Time => is_time_of_day(trimmed).then(|| Value::from(trimmed)),
        }
    }

    /// JSON schema type name, used by documentation.
    pub fn json_type(self) -> &'static str {
        match self {
            ValueKind::Integer => "integer",
            ValueKind::Float => "number",
            ValueKind::Text | ValueKind::Time => "string",
            ValueKind::Bool => "boolean",
        }
    }
}

fn is_time_of_day(raw: &str) -> bool {
    let parts: Vec<&str> = raw.split(':').collect();
    let limits: &[u32] = match parts.len() {
        2 => &[23, 59],
        3 => &[23, 59, 59],
        _ => return false,
    };
    parts.iter().zip(limits).all(|(part, max)| {
        part.len() == 2 && part.parse::<u32>().map(|v| v <= *max).unwrap_or(false)
    })
}

type ComputeFn = dyn Fn(&Row) -> Value + Send + Sync;

/// A field value derived from other columns of the same row.
///
/// The function sees only the fetched row, so it can never cause another fetch.
#[derive(Clone)]
pub struct Computed {
    sources: Vec<String>,
    compute: Arc<ComputeFn>,
}

impl Computed {
    pub fn new(sources: &[&str], compute: impl Fn(&Row) -> Value + Send + Sync + 'static) -> Self {
        Self {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            compute: Arc::new(compute),
        }
    }

    /// `value_column` when `flag_column` is truthy, otherwise `null`.
    pub fn when_flag(value_column: &str, flag_column: &str) -> Self {
        let value_col = value_column.to_string();
        let flag_col = flag_column.to_string();
        Self::new(&[value_column, flag_column], move |row| {
            if row.get(&flag_col).is_some_and(is_truthy) {
                row.get(&value_col).cloned().unwrap_or(Value::Null)
            } else {
                Value::Null
            }
        })
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn evaluate(&self, row: &Row) -> Value {
        (self.compute)(row)
    }
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computed")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

/// SQL-ish truthiness: `true`, non-zero numbers, and `"1"`/`"true"` strings.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.as_str(), "1" | "true" | "t" | "yes"),
        _ => false,
    }
}

#[derive(Debug, Clone)]
pub enum FieldSource {
    Column(String),
    Computed(Computed),
}

/// One exposed attribute of an entity.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    kind: ValueKind,
    source: FieldSource,
    filterable: bool,
    sortable: bool,
    nullable: bool,
    description: Option<String>,
}

impl Field {
    /// A field read from the column of the same name.
    pub fn new(name: &str, kind: ValueKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            source: FieldSource::Column(name.to_string()),
            filterable: false,
            sortable: false,
            nullable: false,
            description: None,
        }
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, ValueKind::Integer)
    }

    pub fn float(name: &str) -> Self {
        Self::new(name, ValueKind::Float)
    }

    pub fn text(name: &str) -> Self {
        Self::new(name, ValueKind::Text)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, ValueKind::Bool)
    }

    pub fn time(name: &str) -> Self {
        Self::new(name, ValueKind::Time)
    }

    /// Read the value from a differently named source column.
    pub fn column(mut self, column: &str) -> Self {
        self.source = FieldSource::Column(column.to_string());
        self
    }

    /// Derive the value instead of reading one column. Computed fields are nullable.
    pub fn computed(mut self, computed: Computed) -> Self {
        self.source = FieldSource::Computed(computed);
        self.nullable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn source(&self) -> &FieldSource {
        &self.source
    }

    /// The backing column, or `None` for computed fields.
    pub fn source_column(&self) -> Option<&str> {
        match &self.source {
            FieldSource::Column(c) => Some(c),
            FieldSource::Computed(_) => None,
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self.source, FieldSource::Computed(_))
    }

    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// A to-one reference from one entity to another.
///
/// `column` holds the foreign key on the source row; a null there means no
/// related resource. When the target is identified by a natural key, that key
/// must travel with the source row in `natural_key_column` (a join or view
/// column), since link building never fetches.
#[derive(Debug, Clone)]
pub struct Relationship {
    name: String,
    target: String,
    column: String,
    natural_key_column: Option<String>,
    description: Option<String>,
}

impl Relationship {
    pub fn to_one(name: &str, target: &str, column: &str) -> Self {
        Self {
            name: name.to_string(),
            target: target.to_string(),
            column: column.to_string(),
            natural_key_column: None,
            description: None,
        }
    }

    pub fn via_natural_key(mut self, column: &str) -> Self {
        self.natural_key_column = Some(column.to_string());
        self
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn natural_key_column(&self) -> Option<&str> {
        self.natural_key_column.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// How instances of an entity are identified in URLs.
///
/// Exactly one strategy is in effect per registered entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierStrategy {
    Surrogate { column: String, kind: ValueKind },
    Natural { field: String, column: String, kind: ValueKind },
}

impl IdentifierStrategy {
    /// Source column holding the identifier on the entity's own rows.
    pub fn column(&self) -> &str {
        match self {
            IdentifierStrategy::Surrogate { column, .. } | IdentifierStrategy::Natural { column, .. } => column,
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            IdentifierStrategy::Surrogate { kind, .. } | IdentifierStrategy::Natural { kind, .. } => *kind,
        }
    }

    pub fn is_natural(&self) -> bool {
        matches!(self, IdentifierStrategy::Natural { .. })
    }
}

/// Unvalidated entity declaration.
#[derive(Debug, Clone)]
pub struct EntityDef {
    name: String,
    source: Option<String>,
    route: Option<String>,
    description: Option<String>,
    fields: Vec<Field>,
    surrogate: Option<String>,
    natural: Vec<String>,
    hidden: Vec<String>,
    relations: Vec<Relationship>,
}

impl EntityDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: None,
            route: None,
            description: None,
            fields: Vec::new(),
            surrogate: None,
            natural: Vec::new(),
            hidden: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Table or view the rows come from. Defaults to the entity name.
    pub fn source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// URL path segment. Defaults to the entity name.
    pub fn route(mut self, route: &str) -> Self {
        self.route = Some(route.to_string());
        self
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Designate the surrogate key column.
    pub fn surrogate_id(mut self, column: &str) -> Self {
        self.surrogate = Some(column.to_string());
        self
    }

    /// Designate an exposed field as the natural identifier.
    ///
    /// When present it is the identifier used in every link to this entity.
    pub fn natural_id(mut self, field: &str) -> Self {
        self.natural.push(field.to_string());
        self
    }

    /// Declare a private source column that must never be exposed.
    pub fn hidden(mut self, column: &str) -> Self {
        self.hidden.push(column.to_string());
        self
    }

    pub fn relation(mut self, relation: Relationship) -> Self {
        self.relations.push(relation);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A validated, registered entity.
#[derive(Debug, Clone)]
pub struct Entity {
    name: String,
    source: String,
    route: String,
    description: Option<String>,
    fields: Vec<Field>,
    identifier: IdentifierStrategy,
    surrogate_column: Option<String>,
    hidden: Vec<String>,
    relations: Vec<Relationship>,
}

impl Entity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn identifier(&self) -> &IdentifierStrategy {
        &self.identifier
    }

    pub fn surrogate_column(&self) -> Option<&str> {
        self.surrogate_column.as_deref()
    }

    pub fn hidden_columns(&self) -> &[String] {
        &self.hidden
    }

    pub fn relations(&self) -> &[Relationship] {
        &self.relations
    }

    pub fn relation(&self, name: &str) -> Option<&Relationship> {
        self.relations.iter().find(|r| r.name == name)
    }

    /// Every source column a gateway must return for rows of this entity.
    pub fn projection(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        let mut push = |c: &str| {
            if seen.insert(c.to_string()) {
                columns.push(c.to_string());
            }
        };

        push(self.identifier.column());
        if let Some(surrogate) = &self.surrogate_column {
            push(surrogate);
        }
        for field in &self.fields {
            match &field.source {
                FieldSource::Column(c) => push(c),
                FieldSource::Computed(computed) => computed.sources.iter().for_each(|c| push(c)),
            }
        }
        for relation in &self.relations {
            push(&relation.column);
            if let Some(natural) = &relation.natural_key_column {
                push(natural);
            }
        }
        columns
    }
}

/// The set of registered entities, keyed by name, in registration order.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entities: IndexMap<String, Entity>,
    routes: HashMap<String, String>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add an entity.
    ///
    /// Relationship targets must already be registered (or be the entity itself).
    ///
    /// # Errors
    ///
    /// `DataError::Config` on any misdeclaration, including re-registration.
    pub fn register(&mut self, def: EntityDef) -> Result<&Entity, DataError> {
        let entity = self.validate(def)?;
        tracing::debug!(
            entity = %entity.name,
            route = %entity.route,
            natural = entity.identifier.is_natural(),
            "registered entity"
        );
        self.routes.insert(entity.route.clone(), entity.name.clone());
        let name = entity.name.clone();
        Ok(self.entities.entry(name).or_insert(entity))
    }

    /// Look up an entity by name.
    pub fn resolve(&self, name: &str) -> Result<&Entity, DataError> {
        self.entities
            .get(name)
            .ok_or_else(|| DataError::NotFound(format!("Unknown entity '{name}'")))
    }

    /// Look up an entity by its URL segment.
    pub fn resolve_route(&self, route: &str) -> Result<&Entity, DataError> {
        self.routes
            .get(route)
            .and_then(|name| self.entities.get(name))
            .ok_or_else(|| DataError::NotFound(format!("Unknown resource '{route}'")))
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    fn validate(&self, def: EntityDef) -> Result<Entity, DataError> {
        let name = def.name.trim().to_string();
        if name.is_empty() {
            return Err(DataError::config("Entity name must not be empty"));
        }
        if self.entities.contains_key(&name) {
            return Err(DataError::config(format!("Entity '{name}' is already registered")));
        }
        let err = |msg: String| DataError::config(format!("Entity '{name}': {msg}"));

        let route = def.route.clone().unwrap_or_else(|| name.clone());
        if route.is_empty() || route.contains('/') {
            return Err(err(format!("invalid route segment '{route}'")));
        }
        if let Some(owner) = self.routes.get(&route) {
            return Err(err(format!("route '{route}' is already used by '{owner}'")));
        }

        let hidden: HashSet<&str> = def.hidden.iter().map(String::as_str).collect();
        let relation_names: HashSet<&str> = def.relations.iter().map(|r| r.name.as_str()).collect();
        if relation_names.len() != def.relations.len() {
            return Err(err("duplicate relationship name".into()));
        }

        let mut exposed = HashSet::new();
        let mut columns = HashSet::new();
        for field in &def.fields {
            let fname = field.name.as_str();
            if fname.is_empty() {
                return Err(err("field name must not be empty".into()));
            }
            if RESERVED_NAMES.contains(&fname) {
                return Err(err(format!("field name '{fname}' is reserved")));
            }
            if !exposed.insert(fname) {
                return Err(err(format!("exposed name '{fname}' is declared twice")));
            }
            if hidden.contains(fname) {
                return Err(err(format!("exposed name '{fname}' collides with a hidden column")));
            }
            if relation_names.contains(fname) {
                return Err(err(format!("exposed name '{fname}' collides with a relationship")));
            }
            match &field.source {
                FieldSource::Column(column) => {
                    if !columns.insert(column.as_str()) {
                        return Err(err(format!("column '{column}' is exposed under two names")));
                    }
                    if hidden.contains(column.as_str()) {
                        return Err(err(format!("column '{column}' is both hidden and exposed")));
                    }
                }
                FieldSource::Computed(computed) => {
                    if field.filterable || field.sortable {
                        return Err(err(format!(
                            "computed field '{fname}' cannot be filterable or sortable"
                        )));
                    }
                    if computed.sources.is_empty() {
                        return Err(err(format!("computed field '{fname}' declares no source columns")));
                    }
                }
            }
        }
        for relation in &def.relations {
            if RESERVED_NAMES.contains(&relation.name.as_str()) || relation.name == "self" {
                return Err(err(format!("relationship name '{}' is reserved", relation.name)));
            }
        }

        let identifier = self.identifier_strategy(&name, &def, &err)?;
        for relation in &def.relations {
            let target_strategy = if relation.target == name {
                &identifier
            } else {
                self.entities
                    .get(&relation.target)
                    .map(|t| &t.identifier)
                    .ok_or_else(|| {
                        err(format!(
                            "relationship '{}' targets unregistered entity '{}'",
                            relation.name, relation.target
                        ))
                    })?
            };
            match (target_strategy.is_natural(), &relation.natural_key_column) {
                (true, None) => {
                    return Err(err(format!(
                        "relationship '{}' targets '{}', which uses a natural identifier, but declares no natural-key column",
                        relation.name, relation.target
                    )))
                }
                (false, Some(_)) => {
                    return Err(err(format!(
                        "relationship '{}' declares a natural-key column but '{}' uses a surrogate identifier",
                        relation.name, relation.target
                    )))
                }
                _ => {}
            }
        }

        Ok(Entity {
            source: def.source.unwrap_or_else(|| name.clone()),
            route,
            description: def.description,
            fields: def.fields,
            identifier,
            surrogate_column: def.surrogate,
            hidden: def.hidden,
            relations: def.relations,
            name,
        })
    }

    fn identifier_strategy(
        &self,
        name: &str,
        def: &EntityDef,
        err: &dyn Fn(String) -> DataError,
    ) -> Result<IdentifierStrategy, DataError> {
        match def.natural.as_slice() {
            [] => {
                let column = def.surrogate.clone().ok_or_else(|| {
                    err(format!("entity '{name}' declares neither a surrogate nor a natural identifier"))
                })?;
                let kind = def
                    .fields
                    .iter()
                    .find(|f| f.source_column() == Some(column.as_str()))
                    .map(|f| f.kind)
                    .unwrap_or(ValueKind::Integer);
                Ok(IdentifierStrategy::Surrogate { column, kind })
            }
            [field_name] => {
                let field = def
                    .fields
                    .iter()
                    .find(|f| &f.name == field_name)
                    .ok_or_else(|| err(format!("natural identifier '{field_name}' is not a declared field")))?;
                if field.nullable {
                    return Err(err(format!("natural identifier '{field_name}' must not be nullable")));
                }
                let column = field
                    .source_column()
                    .ok_or_else(|| err(format!("natural identifier '{field_name}' cannot be computed")))?;
                Ok(IdentifierStrategy::Natural {
                    field: field_name.clone(),
                    column: column.to_string(),
                    kind: field.kind,
                })
            }
            _ => Err(err("more than one natural identifier designated".into())),
        }
    }
}
