// Importer scenarios against a recording store

use super::*;
use config::BatchConfig;
use error::{ImportError, StoreError};
use model::MeetingsDocument;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Mutex;
use store::{GraphStore, Row, Statement};
use uuid::Uuid;

/// Records every statement; optionally rejects the N-th one (0-based).
#[derive(Default)]
struct RecordingStore {
    statements: Mutex<Vec<Statement>>,
    fail_at: Option<usize>,
    rows: Vec<Row>,
}

impl RecordingStore {
    fn failing_at(index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Default::default()
        }
    }

    fn returning(rows: Vec<Value>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|v| v.as_object().cloned().unwrap_or_default())
                .collect(),
            ..Default::default()
        }
    }

    fn recorded(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    fn record(&self, statement: Statement) -> Result<(), StoreError> {
        let mut statements = self.statements.lock().unwrap();
        let index = statements.len();
        statements.push(statement);
        if self.fail_at == Some(index) {
            return Err(StoreError::Decode("rejected by test store".to_string()));
        }
        Ok(())
    }
}

impl GraphStore for RecordingStore {
    async fn run(&self, statement: Statement) -> Result<(), StoreError> {
        self.record(statement)
    }

    async fn query(&self, statement: Statement) -> Result<Vec<Row>, StoreError> {
        self.record(statement)?;
        Ok(self.rows.clone())
    }
}

fn meeting(people: &str, agenda: Value) -> Value {
    json!({
        "workgroup": "Governance",
        "workgroup_id": "wg-42",
        "meetingInfo": {
            "name": "Weekly",
            "date": "2024-02-01",
            "host": "Alice",
            "documenter": "Bob",
            "purpose": "Planning",
            "peoplePresent": people,
            "workingDocs": [{ "title": "Agenda", "link": "https://example.org/agenda" }]
        },
        "agendaItems": agenda
    })
}

fn document(value: Value) -> MeetingsDocument {
    serde_json::from_value(value).unwrap()
}

fn statements_matching<'a>(statements: &'a [Statement], needle: &str) -> Vec<&'a Statement> {
    statements.iter().filter(|s| s.text.contains(needle)).collect()
}

fn temp_file(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("meeting-import-{}.json", Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
}

#[tokio::test]
async fn test_import_starts_with_reset() {
    let store = RecordingStore::default();
    let doc = document(json!({ "m-1": [meeting("Alice", json!([]))] }));

    importer::import_document(&store, &doc, BatchConfig::default())
        .await
        .unwrap();

    let statements = store.recorded();
    assert_eq!(statements[0].text, importer::RESET_QUERY);
    assert_eq!(statements[1].text, importer::PERSON_CONSTRAINT_QUERY);
    assert_eq!(statements[2].text, importer::MEETING_UID_INDEX_QUERY);
    assert!(statements[3].text.contains("CREATE (m:Meeting"));
}

#[tokio::test]
async fn test_meeting_uid_index_precedes_uid_lookups() {
    let store = RecordingStore::default();
    let doc = document(json!({ "m-1": [meeting("Alice", json!([{ "discussionPoints": ["x"] }]))] }));

    importer::import_document(&store, &doc, BatchConfig::default())
        .await
        .unwrap();

    let statements = store.recorded();
    let index = statements
        .iter()
        .position(|s| s.text == importer::MEETING_UID_INDEX_QUERY)
        .unwrap();
    let first_lookup = statements
        .iter()
        .position(|s| s.text.contains("MATCH (m:Meeting {uid: $meeting_uid})"))
        .unwrap();
    assert!(index < first_lookup);
    assert!(importer::MEETING_UID_INDEX_QUERY.contains("IF NOT EXISTS"));
}

#[tokio::test]
async fn test_index_fault_aborts_before_meetings() {
    let store = RecordingStore::failing_at(2);
    let doc = document(json!({ "m-1": [meeting("Alice", json!([]))] }));

    let err = importer::import_document(&store, &doc, BatchConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Store { step: "meeting uid index", .. }));
    assert!(statements_matching(&store.recorded(), "CREATE (m:Meeting").is_empty());
}

#[tokio::test]
async fn test_empty_document_only_resets() {
    let store = RecordingStore::default();

    let stats = importer::import_document(&store, &document(json!({})), BatchConfig::default())
        .await
        .unwrap();

    assert_eq!(stats.total_nodes(), 0);
    let texts: Vec<String> = store.recorded().into_iter().map(|s| s.text).collect();
    assert_eq!(
        texts,
        vec![
            importer::RESET_QUERY.to_string(),
            importer::PERSON_CONSTRAINT_QUERY.to_string(),
            importer::MEETING_UID_INDEX_QUERY.to_string()
        ]
    );
}

#[tokio::test]
async fn test_one_meeting_statement_per_record() {
    let store = RecordingStore::default();
    let doc = document(json!({
        "m-1": [meeting("Alice", json!([])), meeting("Bob", json!([]))],
        "m-2": [meeting("Carol", json!([]))],
    }));

    let stats = importer::import_document(&store, &doc, BatchConfig::default())
        .await
        .unwrap();

    let statements = store.recorded();
    let meetings = statements_matching(&statements, "CREATE (m:Meeting");
    assert_eq!(meetings.len(), 3);
    assert_eq!(stats.meetings, 3);

    // Records sharing a key still get distinct handles
    let uids: std::collections::HashSet<&str> = meetings
        .iter()
        .filter_map(|s| s.get("uid").and_then(Value::as_str))
        .collect();
    assert_eq!(uids.len(), 3);
    let ids: Vec<&Value> = meetings.iter().filter_map(|s| s.get("id")).collect();
    assert_eq!(ids, vec![&json!("m-1"), &json!("m-1"), &json!("m-2")]);
}

#[tokio::test]
async fn test_repeated_attendee_merged_once() {
    let store = RecordingStore::default();
    let doc = document(json!({ "m-1": [meeting("Alice, Bob, Alice", json!([]))] }));

    let stats = importer::import_document(&store, &doc, BatchConfig::default())
        .await
        .unwrap();

    let statements = store.recorded();
    let merges = statements_matching(&statements, "MERGE (p:Person");
    assert_eq!(merges.len(), 1);
    assert_eq!(merges[0].get("names"), Some(&json!(["Alice", "Bob"])));
    assert_eq!(stats.people, 2);
    assert_eq!(stats.attended_edges, 2);
}

#[tokio::test]
async fn test_each_agenda_item_is_its_own_statement() {
    let store = RecordingStore::default();
    let doc = document(json!({ "m-1": [meeting("Alice", json!([
        {
            "status": "open",
            "narrative": "budget review",
            "discussionPoints": ["costs", "timeline"],
            "decisionItems": [{ "decision": "approve", "rationale": "fits", "opposing": "", "effect": "funded" }]
        },
        { "discussionPoints": ["misc"] }
    ]))] }));

    importer::import_document(&store, &doc, BatchConfig::default())
        .await
        .unwrap();

    let statements = store.recorded();
    let items = statements_matching(&statements, "AgendaItem");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].get("discussion_points"), Some(&json!(["costs", "timeline"])));
    assert_eq!(items[0].get("decisions").and_then(Value::as_array).map(Vec::len), Some(1));
    assert_eq!(items[1].get("status"), Some(&json!("")));
    assert_eq!(items[1].get("decisions"), Some(&json!([])));
}

#[tokio::test]
async fn test_action_items_without_assignee_never_written() {
    let store = RecordingStore::default();
    let doc = document(json!({ "m-1": [meeting("Alice", json!([
        { "actionItems": [{ "text": "nobody", "status": "open", "dueDate": "2024-02-08" }] }
    ]))] }));

    let stats = importer::import_document(&store, &doc, BatchConfig::default())
        .await
        .unwrap();

    assert!(statements_matching(&store.recorded(), "ActionItem").is_empty());
    assert_eq!(stats.action_items, 0);
}

#[tokio::test]
async fn test_unknown_assignee_is_not_an_error() {
    let store = RecordingStore::default();
    let doc = document(json!({ "m-1": [meeting("Alice", json!([
        { "actionItems": [
            { "text": "known", "status": "open", "dueDate": "", "assignee": "Alice" },
            { "text": "unknown", "status": "open", "dueDate": "", "assignee": "Mallory" }
        ] }
    ]))] }));

    let stats = importer::import_document(&store, &doc, BatchConfig::default())
        .await
        .unwrap();

    let statements = store.recorded();
    let actions = statements_matching(&statements, "ActionItem");
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].get("actions").and_then(Value::as_array).map(Vec::len), Some(2));
    assert_eq!(stats.action_items, 2);
    assert_eq!(stats.assigned_to_edges, 1);
    assert_eq!(stats.unassigned_actions, 1);
}

#[tokio::test]
async fn test_actions_written_after_attendees_and_agenda() {
    let store = RecordingStore::default();
    let doc = document(json!({ "m-1": [meeting("Alice", json!([
        { "actionItems": [{ "text": "t", "assignee": "Alice" }] }
    ]))] }));

    importer::import_document(&store, &doc, BatchConfig::default())
        .await
        .unwrap();

    let statements = store.recorded();
    let position = |needle: &str| statements.iter().position(|s| s.text.contains(needle)).unwrap();
    assert!(position("MERGE (p:Person") < position("ActionItem"));
    assert!(position(":Document") < position("AgendaItem"));
    assert!(position("AgendaItem") < position("ActionItem"));
}

#[tokio::test]
async fn test_reimport_issues_same_statements() {
    let doc = document(json!({
        "m-1": [meeting("Alice, Bob", json!([{ "discussionPoints": ["x"] }]))],
        "m-2": [meeting("Bob", json!([{ "actionItems": [{ "text": "y", "assignee": "Alice" }] }]))],
    }));

    let first = RecordingStore::default();
    let second = RecordingStore::default();
    let stats_a = importer::import_document(&first, &doc, BatchConfig::default()).await.unwrap();
    let stats_b = importer::import_document(&second, &doc, BatchConfig::default()).await.unwrap();

    assert_eq!(stats_a, stats_b);
    let texts = |store: &RecordingStore| -> Vec<String> {
        store.recorded().into_iter().map(|s| s.text).collect()
    };
    assert_eq!(texts(&first), texts(&second));
    assert_eq!(second.recorded()[0].text, importer::RESET_QUERY);
}

#[tokio::test]
async fn test_store_fault_aborts_midway() {
    // reset, constraint, index, meeting 1, attendees 1, document 1, then meeting 2 fails
    let store = RecordingStore::failing_at(6);
    let doc = document(json!({
        "m-1": [meeting("Alice", json!([]))],
        "m-2": [meeting("Bob", json!([]))],
    }));

    let err = importer::import_document(&store, &doc, BatchConfig::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ImportError::Store { step: "create meeting", .. }));
    assert_eq!(store.recorded().len(), 7);
}

#[tokio::test]
async fn test_import_file_reports_success() {
    let path = temp_file(&json!({ "m-1": [meeting("Alice", json!([]))] }).to_string());
    let store = RecordingStore::default();

    let ok = importer::import_file(&store, &path, BatchConfig::default()).await;
    std::fs::remove_file(&path).ok();

    assert!(ok);
    assert!(!store.recorded().is_empty());
}

#[tokio::test]
async fn test_null_optional_fields_import_as_empty() {
    let agenda = json!([{
        "status": null,
        "narrative": null,
        "discussionPoints": ["x"],
        "decisionItems": [{ "decision": "go", "rationale": null, "opposing": null, "effect": null }],
        "actionItems": [{ "text": "t", "status": null, "dueDate": null, "assignee": "Alice" }]
    }]);
    let path = temp_file(&json!({ "m-1": [meeting("Alice", agenda)] }).to_string());
    let store = RecordingStore::default();

    let ok = importer::import_file(&store, &path, BatchConfig::default()).await;
    std::fs::remove_file(&path).ok();

    assert!(ok);
    let statements = store.recorded();
    let items = statements_matching(&statements, "AgendaItem");
    assert_eq!(items[0].get("narrative"), Some(&json!("")));
    assert_eq!(items[0].get("decisions").unwrap()[0]["rationale"], json!(""));
    let actions = statements_matching(&statements, "ActionItem");
    assert_eq!(actions[0].get("actions").unwrap()[0]["due_date"], json!(""));
}

#[tokio::test]
async fn test_empty_file_clears_graph_and_succeeds() {
    let path = temp_file("{}");
    let store = RecordingStore::default();

    let doc = importer::load_document(&path).unwrap();
    let ok = importer::import_file(&store, &path, BatchConfig::default()).await;
    std::fs::remove_file(&path).ok();

    assert!(doc.is_empty());
    assert!(ok);
    assert_eq!(store.recorded()[0].text, importer::RESET_QUERY);
    assert!(statements_matching(&store.recorded(), "CREATE (m:Meeting").is_empty());
}

#[tokio::test]
async fn test_malformed_json_aborts_before_reset() {
    let path = temp_file("{\"m-1\": [");
    let store = RecordingStore::default();

    let ok = importer::import_file(&store, &path, BatchConfig::default()).await;
    std::fs::remove_file(&path).ok();

    assert!(!ok);
    assert!(store.recorded().is_empty());
}

#[tokio::test]
async fn test_missing_required_field_aborts_before_reset() {
    let mut second = meeting("Bob", json!([]));
    second["meetingInfo"].as_object_mut().unwrap().remove("host");
    let path = temp_file(&json!({ "m-1": [meeting("Alice", json!([]))], "m-2": [second] }).to_string());
    let store = RecordingStore::default();

    let ok = importer::import_file(&store, &path, BatchConfig::default()).await;
    std::fs::remove_file(&path).ok();

    assert!(!ok);
    assert!(store.recorded().is_empty());
}

#[tokio::test]
async fn test_missing_file_reports_failure() {
    let path = std::env::temp_dir().join(format!("missing-{}.json", Uuid::new_v4()));
    let store = RecordingStore::default();

    assert!(!importer::import_file(&store, &path, BatchConfig::default()).await);
    assert!(matches!(
        importer::load_document(&path),
        Err(ImportError::Read { .. })
    ));
}

#[tokio::test]
async fn test_connection_check() {
    let healthy = RecordingStore::returning(vec![json!({ "test": 1 })]);
    assert!(store::test_connection(&healthy).await);
    assert_eq!(healthy.recorded()[0].text, "RETURN 1 AS test");

    let wrong = RecordingStore::returning(vec![json!({ "test": 2 })]);
    assert!(!store::test_connection(&wrong).await);

    let broken = RecordingStore::failing_at(0);
    assert!(!store::test_connection(&broken).await);
}

#[tokio::test]
async fn test_graph_counts_propagate_errors() {
    let healthy = RecordingStore::returning(vec![json!({ "count": 7 })]);
    let counts = store::graph_counts(&healthy).await.unwrap();
    assert_eq!(counts.nodes, 7);
    assert_eq!(counts.relationships, 7);

    let broken = RecordingStore::failing_at(1);
    assert!(store::graph_counts(&broken).await.is_err());
}

async fn live_count(store: &store::Neo4jStore, cypher: &str) -> i64 {
    let rows = store.query(Statement::new(cypher)).await.unwrap();
    rows[0]["count"].as_i64().unwrap()
}

/// Runs against a real server only when `NEO4J_URI` is exported. The target
/// database is wiped, so `.env` is deliberately not consulted here.
#[tokio::test]
async fn test_live_reimport_is_stable() {
    if std::env::var("NEO4J_URI").is_err() {
        return;
    }
    let config = Config::from_lookup(|key| std::env::var(key).ok());
    let store = store::Neo4jStore::connect(&config.neo4j).await.unwrap();

    let doc = document(json!({
        "m-1": [meeting("Alice, Bob, Alice", json!([
            { "discussionPoints": ["x"], "actionItems": [
                { "text": "known", "assignee": "Alice" },
                { "text": "unknown", "assignee": "Mallory" }
            ] }
        ]))],
        "m-2": [meeting("Bob", json!([]))],
    }));

    let mut snapshots = Vec::new();
    for _ in 0..2 {
        importer::import_document(&store, &doc, config.batch).await.unwrap();

        let people = live_count(&store, "MATCH (p:Person) RETURN count(p) AS count").await;
        let alice = live_count(&store, "MATCH (p:Person {name: 'Alice'}) RETURN count(p) AS count").await;
        let meetings = live_count(&store, "MATCH (m:Meeting) RETURN count(m) AS count").await;
        let assigned = live_count(&store, "MATCH ()-[r:ASSIGNED_TO]->() RETURN count(r) AS count").await;
        let mallory = live_count(
            &store,
            "MATCH (:ActionItem {assignee: 'Mallory'})-[r:ASSIGNED_TO]->() RETURN count(r) AS count",
        )
        .await;

        assert_eq!(people, 2);
        assert_eq!(alice, 1);
        assert_eq!(meetings, 2);
        assert_eq!(assigned, 1);
        assert_eq!(mallory, 0);

        snapshots.push(store::graph_counts(&store).await.unwrap());
    }

    assert_eq!(snapshots[0], snapshots[1]);
    store.close();
}
