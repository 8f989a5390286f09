use anyhow::Context as _;
use serde_json::{Value, json};
use specbridge_http_tools::registry::ToolRegistry;
use specbridge_http_tools::tool::BodyShape;
use specbridge_openapi_tools::adapter::SpecFormat;
use specbridge_openapi_tools::config::ToolOverridePolicy;
use specbridge_openapi_tools::loader::parse_document;
use specbridge_openapi_tools::{compile, compile_into};
use std::collections::HashSet;

const PETSTORE_V3: &str = include_str!("fixtures/petstore_v3.yaml");
const PETSTORE_V2: &str = include_str!("fixtures/petstore_v2.json");

fn v3() -> anyhow::Result<Value> {
    parse_document(PETSTORE_V3, "petstore_v3.yaml").context("parse v3 fixture")
}

fn v2() -> anyhow::Result<Value> {
    parse_document(PETSTORE_V2, "petstore_v2.json").context("parse v2 fixture")
}

fn policy(yaml: &str) -> anyhow::Result<ToolOverridePolicy> {
    serde_yaml::from_str(yaml).context("parse override policy")
}

#[test]
fn compiles_v3_petstore() -> anyhow::Result<()> {
    let compiled = compile(&v3()?, &ToolOverridePolicy::default())?;
    assert_eq!(compiled.format, SpecFormat::OpenApiV3);
    assert_eq!(compiled.title.as_deref(), Some("Petstore"));
    assert_eq!(compiled.default_base_url.as_deref(), Some("/api/v3"));

    let names: Vec<&str> = compiled.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "listPets",
            "createPet",
            "showPetById",
            "deletePet",
            "getStoresPetsByStoreId",
            "listPets_1",
        ]
    );

    let show = &compiled.tools[2];
    assert_eq!(show.title.as_deref(), Some("Info for a specific pet"));
    assert_eq!(show.description.as_deref(), Some("Returns a single pet."));
    assert_eq!(
        show.input_schema.to_json(),
        json!({
            "type": "object",
            "properties": {
                "petId": {"type": "string", "description": "The id of the pet"},
                "X-Request-Id": {"type": "string"}
            },
            "required": ["petId"]
        })
    );
    assert!(show.meta.header_params.contains_key("X-Request-Id"));
    assert_eq!(show.meta.security.len(), 1);

    let output = show.output_schema.as_ref().context("output schema")?.to_json();
    assert_eq!(output["type"], json!(["object", "null"]));
    assert_eq!(output["properties"]["id"]["format"], "int64");
    // Self reference is cut, not expanded forever.
    assert_eq!(output["properties"]["parent"]["type"], json!(["object", "null"]));

    let create = &compiled.tools[1];
    assert_eq!(create.meta.body, Some(BodyShape::Fields));
    assert_eq!(create.input_schema.required, vec!["name"]);

    let delete = &compiled.tools[3];
    assert!(delete.meta.security.is_empty());
    assert!(delete.output_schema.is_none());
    Ok(())
}

#[test]
fn compiles_v2_petstore() -> anyhow::Result<()> {
    let compiled = compile(&v2()?, &ToolOverridePolicy::default())?;
    assert_eq!(compiled.format, SpecFormat::SwaggerV2);
    assert_eq!(
        compiled.default_base_url.as_deref(),
        Some("https://petstore.example.com/v2")
    );

    let names: Vec<&str> = compiled.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["addPet", "findPetsByStatus", "getPetById", "updatePetWithForm"]
    );

    let add = &compiled.tools[0];
    let keys: Vec<&String> = add.input_schema.properties.keys().collect();
    assert_eq!(keys, vec!["id", "name", "status"]);
    assert_eq!(add.input_schema.required, vec!["name"]);

    let find = &compiled.tools[1];
    assert_eq!(
        find.input_schema.properties["status"].to_json(),
        json!({
            "type": "array",
            "items": {"type": "string", "enum": ["available", "pending", "sold"]}
        })
    );

    // formData parameters are not modeled; the tool keeps its path argument only.
    let form = &compiled.tools[3];
    let keys: Vec<&String> = form.input_schema.properties.keys().collect();
    assert_eq!(keys, vec!["petId"]);
    Ok(())
}

#[test]
fn compilation_is_deterministic() -> anyhow::Result<()> {
    let doc = v3()?;
    let policy = policy("exclude: [deletePet]\ntools:\n  listPets:\n    title: Pets\n")?;
    let first = compile(&doc, &policy)?;
    let second = compile(&doc, &policy)?;
    assert_eq!(first.tools, second.tools);
    Ok(())
}

#[test]
fn names_are_unique_and_argument_routes_disjoint() -> anyhow::Result<()> {
    for doc in [v3()?, v2()?] {
        let compiled = compile(&doc, &ToolOverridePolicy::default())?;
        let mut seen = HashSet::new();
        for tool in &compiled.tools {
            assert!(seen.insert(tool.name.clone()), "duplicate {}", tool.name);

            let meta = &tool.meta;
            for name in meta.path_params.keys() {
                assert!(!meta.query_params.contains_key(name), "{name} in path and query");
            }
            for name in meta
                .path_params
                .keys()
                .chain(meta.query_params.keys())
                .chain(meta.header_params.keys())
            {
                assert!(
                    tool.input_schema.properties.contains_key(name),
                    "{name} missing from {} input schema",
                    tool.name
                );
            }
        }
    }
    Ok(())
}

#[test]
fn override_description_wins_verbatim() -> anyhow::Result<()> {
    let policy = policy(
        "tools:\n  showPetById:\n    description: \"  Operator text, kept as-is.  \"\n",
    )?;
    let compiled = compile(&v3()?, &policy)?;
    let tool = compiled
        .tools
        .iter()
        .find(|t| t.name == "showPetById")
        .context("tool")?;
    assert_eq!(
        tool.description.as_deref(),
        Some("  Operator text, kept as-is.  ")
    );
    assert_eq!(tool.title.as_deref(), Some("Info for a specific pet"));
    Ok(())
}

#[test]
fn exclude_wins_after_include() -> anyhow::Result<()> {
    let policy = policy("includeOnly: [listPets, createPet]\nexclude: [listPets]\n")?;
    let compiled = compile(&v3()?, &policy)?;
    let names: Vec<&str> = compiled.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["createPet"]);
    Ok(())
}

#[test]
fn unsupported_document_registers_nothing() -> anyhow::Result<()> {
    let registry = ToolRegistry::new();
    let doc = json!({"info": {"title": "Not an API"}, "paths": {"/a": {"get": {}}}});
    let err = compile_into(&registry, &doc, &ToolOverridePolicy::default())
        .err()
        .context("expected failure")?;
    assert_eq!(err.kind().as_str(), "UnsupportedSpecification");
    assert!(registry.is_empty());
    Ok(())
}

#[test]
fn missing_paths_registers_nothing() -> anyhow::Result<()> {
    let registry = ToolRegistry::new();
    let doc = parse_document("openapi: 3.1.0\ninfo: {title: Empty, version: '0'}\n", "inline")?;
    let err = compile_into(&registry, &doc, &ToolOverridePolicy::default())
        .err()
        .context("expected failure")?;
    assert_eq!(err.kind().as_str(), "MissingPathsError");
    assert!(registry.is_empty());
    Ok(())
}

#[test]
fn recompilation_replaces_the_whole_set() -> anyhow::Result<()> {
    let registry = ToolRegistry::new();
    compile_into(&registry, &v3()?, &ToolOverridePolicy::default())?;
    assert!(registry.get("showPetById").is_some());

    compile_into(&registry, &v2()?, &ToolOverridePolicy::default())?;
    assert!(registry.get("showPetById").is_none());
    assert!(registry.get("getPetById").is_some());
    assert_eq!(registry.len(), 4);
    Ok(())
}

#[test]
fn openapi_3_1_operations_compile() -> anyhow::Result<()> {
    let doc = parse_document(
        r#"
openapi: 3.1.0
info: {title: Things, version: "1"}
paths:
  /items:
    get:
      operationId: listItems
      parameters:
        - {name: cursor, in: query, schema: {type: [string, "null"]}}
        - {name: raw, in: query, schema: {}}
  /things:
    post:
      operationId: createThing
      requestBody:
        required: true
        content:
          application/json:
            schema:
              type: object
              required: [note]
              properties:
                note: {type: [string, "null"]}
  /limits:
    get:
      operationId: getLimits
      parameters:
        - {name: max, in: query, schema: {type: integer, exclusiveMinimum: 0}}
"#,
        "things.yaml",
    )?;
    let compiled = compile(&doc, &ToolOverridePolicy::default())?;
    let names: Vec<&str> = compiled.tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["listItems", "createThing", "getLimits"]);

    let list = &compiled.tools[0];
    assert_eq!(list.meta.query_params["cursor"].to_json(), json!({"type": "string"}));
    // An untyped parameter is not advertised as an object.
    assert_eq!(list.meta.query_params["raw"].to_json(), json!({"type": "string"}));

    let create = &compiled.tools[1];
    assert_eq!(create.meta.body, Some(BodyShape::Fields));
    assert_eq!(create.input_schema.required, vec!["note"]);
    assert_eq!(
        create.input_schema.properties["note"].to_json(),
        json!({"type": "string"})
    );

    let limits = &compiled.tools[2];
    assert_eq!(
        limits.input_schema.properties["max"].to_json(),
        json!({"type": "integer"})
    );
    Ok(())
}
