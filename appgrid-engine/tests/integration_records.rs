//! End-to-end record behaviour against a real on-disk root

use appgrid_engine::{
    category::AddCategory,
    directory::CreateDirectory,
    field::{CreateField, DeleteField, UpdateField},
    record::{CreateRecord, GetRecord, ListRecords, UpdateRecord},
    relation::ResolveRelation,
    EngineContext, EngineError, Execute, CATEGORY_KEY,
};
use appgrid_fields::FieldDef;
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};
use tempfile::TempDir;

async fn run<O: Execute<EngineContext, EngineError>>(ctx: &EngineContext, op: O) -> Value {
    op.execute(ctx).await.into_result().unwrap()
}

async fn directory(ctx: &EngineContext, name: &str) -> String {
    run(ctx, CreateDirectory::new("app", "module", name)).await["id"]
        .as_str()
        .unwrap()
        .to_string()
}

fn props(value: Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

async fn create(ctx: &EngineContext, dir: &str, value: Value) -> String {
    run(ctx, CreateRecord::new(dir, props(value))).await["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[test_log::test(tokio::test)]
async fn test_required_field_missing_is_reported_by_key() {
    let temp = TempDir::new().unwrap();
    let ctx = EngineContext::new(temp.path());
    let dir = directory(&ctx, "People").await;
    run(&ctx, CreateField::new(dir.as_str(), FieldDef::new("email", "email").required())).await;
    run(&ctx, CreateField::new(dir.as_str(), FieldDef::new("name", "text"))).await;

    let err = CreateRecord::new(dir.as_str(), props(json!({"name": "Alice"})))
        .execute(&ctx)
        .await
        .into_result()
        .unwrap_err();

    let errors = err.field_errors().expect("validation error");
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["email"]);
}

#[test_log::test(tokio::test)]
async fn test_exactly_one_concurrent_update_wins() {
    let temp = TempDir::new().unwrap();
    let ctx = EngineContext::new(temp.path());
    let dir = directory(&ctx, "Counters").await;
    run(&ctx, CreateField::new(dir.as_str(), FieldDef::new("count", "number"))).await;
    let id = create(&ctx, &dir, json!({"count": 0})).await;

    let first = UpdateRecord::new(dir.as_str(), id.as_str(), 1).with_prop("count", 1);
    let second = UpdateRecord::new(dir.as_str(), id.as_str(), 1).with_prop("count", 2);
    let (a, b) = tokio::join!(first.execute(&ctx), second.execute(&ctx));
    let results = [a.into_result(), b.into_result()];

    let winners: Vec<&Value> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0]["version"], 2);

    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert!(matches!(
        loser,
        EngineError::Conflict {
            expected: 1,
            actual: 2,
            ..
        }
    ));

    // Refetch and retry succeeds
    let current = run(&ctx, GetRecord::new(dir.as_str(), id.as_str())).await;
    let version = current["version"].as_u64().unwrap();
    let retried = run(
        &ctx,
        UpdateRecord::new(dir.as_str(), id.as_str(), version).with_prop("count", 3),
    )
    .await;
    assert_eq!(retried["version"], 3);
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_one_winner_across_engines_sharing_a_root() {
    let temp = TempDir::new().unwrap();
    let ctx = EngineContext::new(temp.path());
    let dir = directory(&ctx, "Counters").await;
    run(&ctx, CreateField::new(dir.as_str(), FieldDef::new("count", "number"))).await;
    let id = create(&ctx, &dir, json!({"count": 0})).await;

    // Each task opens its own engine on the root, as separate processes would
    let tasks: Vec<_> = (0..8)
        .map(|n| {
            let root = temp.path().to_path_buf();
            let (dir, id) = (dir.clone(), id.clone());
            tokio::spawn(async move {
                let engine = EngineContext::new(root);
                UpdateRecord::new(dir.as_str(), id.as_str(), 1)
                    .with_prop("count", n)
                    .execute(&engine)
                    .await
                    .into_result()
            })
        })
        .collect();

    let (mut wins, mut conflicts) = (0, 0);
    for task in tasks {
        match task.await.unwrap() {
            Ok(record) => {
                assert_eq!(record["version"], 2);
                wins += 1;
            }
            Err(EngineError::Conflict { expected: 1, actual: 2, .. }) => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!((wins, conflicts), (1, 7));

    let current = run(&ctx, GetRecord::new(dir.as_str(), id.as_str())).await;
    assert_eq!(current["version"], 2);
}

#[test_log::test(tokio::test)]
async fn test_delete_field_strips_every_record() {
    let temp = TempDir::new().unwrap();
    let ctx = EngineContext::new(temp.path());
    let dir = directory(&ctx, "People").await;
    run(&ctx, CreateField::new(dir.as_str(), FieldDef::new("name", "text"))).await;
    run(&ctx, CreateField::new(dir.as_str(), FieldDef::new("age", "number"))).await;

    let mut ids = Vec::new();
    for (name, age) in [("a", 1), ("b", 2), ("c", 3)] {
        ids.push(create(&ctx, &dir, json!({"name": name, "age": age})).await);
    }

    let result = run(&ctx, DeleteField::new(dir.as_str(), "age")).await;
    assert_eq!(result["removedFromRecords"], 3);

    for id in ids {
        let record = run(&ctx, GetRecord::new(dir.as_str(), id.as_str())).await;
        assert!(record["props"].get("age").is_none());
        assert!(record["props"].get("name").is_some());
    }
}

#[test_log::test(tokio::test)]
async fn test_rename_field_moves_value() {
    let temp = TempDir::new().unwrap();
    let ctx = EngineContext::new(temp.path());
    let dir = directory(&ctx, "Items").await;
    run(&ctx, CreateField::new(dir.as_str(), FieldDef::new("oldKey", "text"))).await;
    let id = create(&ctx, &dir, json!({"oldKey": "x"})).await;

    run(&ctx, UpdateField::new(dir.as_str(), "oldKey").with_key("newKey")).await;

    let record = run(&ctx, GetRecord::new(dir.as_str(), id.as_str())).await;
    assert_eq!(record["props"], json!({"newKey": "x"}));

    // New writes use the new key; the old one is gone from the schema
    let err = UpdateRecord::new(dir.as_str(), id.as_str(), 2)
        .with_prop("oldKey", "y")
        .execute(&ctx)
        .await
        .into_result()
        .unwrap_err();
    assert!(err.field_errors().unwrap().contains_key("oldKey"));
}

#[test_log::test(tokio::test)]
async fn test_relation_many_keeps_stored_order() {
    let temp = TempDir::new().unwrap();
    let ctx = EngineContext::new(temp.path());
    let skills = directory(&ctx, "Skills").await;
    let people = directory(&ctx, "People").await;
    run(&ctx, CreateField::new(skills.as_str(), FieldDef::new("label", "text"))).await;
    run(
        &ctx,
        CreateField::new(
            people.as_str(),
            FieldDef::new("skills", "relation_many").with_relation(skills.as_str()),
        ),
    )
    .await;

    let a = create(&ctx, &skills, json!({"label": "a"})).await;
    let b = create(&ctx, &skills, json!({"label": "b"})).await;
    let c = create(&ctx, &skills, json!({"label": "c"})).await;
    let person = create(&ctx, &people, json!({"skills": [&b, &a, &c]})).await;

    let resolved = run(
        &ctx,
        ResolveRelation::new(people.as_str(), "skills", json!([&b, &a, &c])),
    )
    .await;
    let order: Vec<&str> = resolved
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(order, vec![b.as_str(), a.as_str(), c.as_str()]);

    let expanded = run(&ctx, GetRecord::new(people.as_str(), person.as_str()).expanded()).await;
    let labels: Vec<&str> = expanded["expanded"]["skills"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["props"]["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["b", "a", "c"]);

    // Dangling ids are refused on write
    let err = CreateRecord::new(people.as_str(), props(json!({"skills": ["missing"]})))
        .execute(&ctx)
        .await
        .into_result()
        .unwrap_err();
    assert!(err.field_errors().unwrap().contains_key("skills"));
}

#[test_log::test(tokio::test)]
async fn test_lookup_follows_relation_on_expand() {
    let temp = TempDir::new().unwrap();
    let ctx = EngineContext::new(temp.path());
    let companies = directory(&ctx, "Companies").await;
    let people = directory(&ctx, "People").await;
    run(&ctx, CreateField::new(companies.as_str(), FieldDef::new("city", "text"))).await;
    run(
        &ctx,
        CreateField::new(
            people.as_str(),
            FieldDef::new("employer", "relation_one").with_relation(companies.as_str()),
        ),
    )
    .await;
    run(
        &ctx,
        CreateField::new(
            people.as_str(),
            FieldDef::new("employerCity", "lookup").with_lookup("employer.city"),
        ),
    )
    .await;

    let acme = create(&ctx, &companies, json!({"city": "Oslo"})).await;
    let person = create(&ctx, &people, json!({"employer": &acme})).await;

    let record = run(&ctx, GetRecord::new(people.as_str(), person.as_str()).expanded()).await;
    assert_eq!(record["expanded"]["employerCity"], "Oslo");
    assert!(record["props"].get("employerCity").is_none());

    let err = UpdateRecord::new(people.as_str(), person.as_str(), 1)
        .with_prop("employerCity", "Bergen")
        .execute(&ctx)
        .await
        .into_result()
        .unwrap_err();
    assert!(err.field_errors().unwrap().contains_key("employerCity"));
}

#[test_log::test(tokio::test)]
async fn test_experience_items_validated_and_pruned() {
    let temp = TempDir::new().unwrap();
    let ctx = EngineContext::new(temp.path());
    let dir = directory(&ctx, "Candidates").await;
    run(&ctx, CreateField::new(dir.as_str(), FieldDef::new("experience", "experience"))).await;

    let entry = |title: &str| {
        json!({
            "id": "e1",
            "type": "work",
            "title": title,
            "organization": "Acme",
            "startDate": "2020-01-01",
        })
    };

    let err = CreateRecord::new(dir.as_str(), props(json!({"experience": [entry("Engineer"), entry("")]})))
        .execute(&ctx)
        .await
        .into_result()
        .unwrap_err();
    let field_error = &err.field_errors().unwrap()["experience"];
    assert_eq!(field_error.item(1), Some("missing title"));
    assert_eq!(field_error.item(0), None);

    let mut good = entry("Engineer");
    good["skills"] = json!(["x", "", null]);
    let id = create(&ctx, &dir, json!({"experience": [good]})).await;
    let record = run(&ctx, GetRecord::new(dir.as_str(), id.as_str())).await;
    assert_eq!(record["props"]["experience"][0]["skills"], json!(["x"]));
}

#[test_log::test(tokio::test)]
async fn test_category_assignment_requires_leaf() {
    let temp = TempDir::new().unwrap();
    let ctx = EngineContext::new(temp.path());
    let dir = run(&ctx, CreateDirectory::new("app", "module", "Docs").with_categories()).await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let work = run(&ctx, AddCategory::new(dir.as_str(), "Work")).await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let dev = run(&ctx, AddCategory::new(dir.as_str(), "Dev").with_parent(work.as_str())).await["id"]
        .as_str()
        .unwrap()
        .to_string();

    let err = CreateRecord::new(dir.as_str(), props(json!({CATEGORY_KEY: "Work"})))
        .execute(&ctx)
        .await
        .into_result()
        .unwrap_err();
    assert!(err.field_errors().unwrap().contains_key(CATEGORY_KEY));

    let err = CreateRecord::new(dir.as_str(), props(json!({CATEGORY_KEY: "Work/Nope"})))
        .execute(&ctx)
        .await
        .into_result()
        .unwrap_err();
    assert!(err.field_errors().unwrap().contains_key(CATEGORY_KEY));

    let id = create(&ctx, &dir, json!({CATEGORY_KEY: ["work", "dev"]})).await;
    let record = run(&ctx, GetRecord::new(dir.as_str(), id.as_str())).await;
    assert_eq!(record["props"][CATEGORY_KEY], json!([work, dev]));

    let listed = run(&ctx, ListRecords::new(dir.as_str()).with_category_path([work.as_str()])).await;
    assert_eq!(listed["pagination"]["total"], 1);
}
