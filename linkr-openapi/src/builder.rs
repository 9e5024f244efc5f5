use linkr_data::{Entity, Field, SchemaRegistry};
use serde_json::{json, Map, Value};

/// Configuration for the generated OpenAPI document.
#[derive(Debug, Clone)]
pub struct OpenApiConfig {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    /// Media types the API can produce, default first.
    pub media_types: Vec<String>,
}

impl OpenApiConfig {
    pub fn new(title: &str, version: &str) -> Self {
        Self {
            title: title.to_string(),
            version: version.to_string(),
            description: None,
            media_types: vec!["application/hal+json".into(), "application/json".into()],
        }
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }

    pub fn with_media_types(mut self, media_types: Vec<String>) -> Self {
        self.media_types = media_types;
        self
    }
}

/// Build an OpenAPI 3.1.0 document describing every registered entity.
///
/// Each entity gets a collection path and an instance path. Query parameters
/// list exactly the filters and sort keys the planner accepts.
pub fn build_spec(config: &OpenApiConfig, registry: &SchemaRegistry) -> Value {
    let mut paths: Map<String, Value> = Map::new();
    let mut schemas: Map<String, Value> = Map::new();

    paths.insert(
        "/".into(),
        json!({
            "get": {
                "operationId": "index",
                "summary": "Entry point linking every collection",
                "responses": { "200": { "description": "Successful response" } }
            }
        }),
    );

    for entity in registry.entities() {
        let schema_name = schema_name(entity);
        schemas.insert(schema_name.clone(), entity_schema(entity));
        let reference = format!("#/components/schemas/{schema_name}");

        let mut list = Map::new();
        list.insert("operationId".into(), json!(format!("list_{}", entity.name())));
        list.insert("tags".into(), json!([entity.name()]));
        if let Some(desc) = entity.description() {
            list.insert("description".into(), json!(desc));
        }
        list.insert("parameters".into(), Value::Array(collection_params(entity)));
        list.insert(
            "responses".into(),
            responses(config, json!({ "type": "array", "items": { "$ref": reference } }), true),
        );
        paths.insert(format!("/{}/", entity.route()), json!({ "get": list }));

        let id_kind = entity.identifier().kind();
        let retrieve = json!({
            "operationId": format!("get_{}", entity.name()),
            "tags": [entity.name()],
            "parameters": [{
                "name": "id",
                "in": "path",
                "required": true,
                "schema": { "type": id_kind.json_type() }
            }],
            "responses": responses(config, json!({ "$ref": reference }), false),
        });
        paths.insert(format!("/{}/{{id}}", entity.route()), json!({ "get": retrieve }));
    }

    let mut info: Map<String, Value> = Map::new();
    info.insert("title".into(), json!(config.title));
    info.insert("version".into(), json!(config.version));
    if let Some(ref desc) = config.description {
        info.insert("description".into(), json!(desc));
    }

    let mut components: Map<String, Value> = Map::new();
    components.insert(
        "securitySchemes".into(),
        json!({
            "bearerAuth": {
                "type": "http",
                "scheme": "bearer"
            }
        }),
    );
    if !schemas.is_empty() {
        components.insert("schemas".into(), Value::Object(schemas));
    }

    json!({
        "openapi": "3.1.0",
        "info": info,
        "paths": paths,
        "components": components,
        "security": [{}, { "bearerAuth": [] }]
    })
}

fn schema_name(entity: &Entity) -> String {
    let mut chars = entity.name().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn entity_schema(entity: &Entity) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for field in entity.fields() {
        properties.insert(field.name().to_string(), field_schema(field));
        required.push(json!(field.name()));
    }
    let mut schema = json!({
        "type": "object",
        "properties": properties,
        "required": required,
    });
    if let (Some(desc), Some(obj)) = (entity.description(), schema.as_object_mut()) {
        obj.insert("description".into(), json!(desc));
    }
    schema
}

fn field_schema(field: &Field) -> Value {
    let ty = field.kind().json_type();
    let mut schema = Map::new();
    if field.is_nullable() {
        schema.insert("type".into(), json!([ty, "null"]));
    } else {
        schema.insert("type".into(), json!(ty));
    }
    if field.kind() == linkr_data::ValueKind::Time {
        schema.insert("format".into(), json!("time"));
    }
    if field.is_computed() {
        schema.insert("readOnly".into(), json!(true));
    }
    if let Some(desc) = field.description() {
        schema.insert("description".into(), json!(desc));
    }
    Value::Object(schema)
}

fn collection_params(entity: &Entity) -> Vec<Value> {
    let mut params: Vec<Value> = entity
        .fields()
        .iter()
        .filter(|f| f.is_filterable())
        .map(|f| {
            json!({
                "name": format!("filter[{}]", f.name()),
                "in": "query",
                "required": false,
                "schema": { "type": f.kind().json_type() }
            })
        })
        .collect();

    let sort_keys: Vec<String> = entity
        .fields()
        .iter()
        .filter(|f| f.is_sortable())
        .flat_map(|f| [f.name().to_string(), format!("-{}", f.name())])
        .collect();
    if !sort_keys.is_empty() {
        params.push(json!({
            "name": "sort",
            "in": "query",
            "required": false,
            "schema": { "type": "string", "enum": sort_keys }
        }));
    }

    for (name, minimum) in [("page", 1), ("offset", 0), ("limit", 1)] {
        params.push(json!({
            "name": name,
            "in": "query",
            "required": false,
            "schema": { "type": "integer", "minimum": minimum }
        }));
    }
    params
}

fn responses(config: &OpenApiConfig, body: Value, collection: bool) -> Value {
    let content: Map<String, Value> = config
        .media_types
        .iter()
        .map(|m| (m.clone(), json!({ "schema": body })))
        .collect();

    let mut responses = Map::new();
    responses.insert(
        "200".into(),
        json!({ "description": "Successful response", "content": content }),
    );
    if collection {
        responses.insert("400".into(), json!({ "description": "Rejected query parameter" }));
    }
    responses.insert("401".into(), json!({ "description": "Unauthorized" }));
    responses.insert("403".into(), json!({ "description": "Forbidden" }));
    responses.insert("404".into(), json!({ "description": "Not found" }));
    responses.insert("406".into(), json!({ "description": "Not acceptable" }));
    responses.insert("503".into(), json!({ "description": "Backend unavailable" }));
    Value::Object(responses)
}
