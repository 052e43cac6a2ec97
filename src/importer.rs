//! Meeting Graph Import
//!
//! Wipes the store, then writes each meeting's subgraph one statement at a
//! time. Nothing here is transactional across statements: a fault part way
//! through leaves whatever was already written.

use crate::config::BatchConfig;
use crate::error::ImportError;
use crate::graph_builder::{AgendaItemNode, EdgeType, GraphStats, MeetingGraph, MeetingNode};
use crate::model::MeetingsDocument;
use crate::store::{GraphStore, Statement};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

pub const RESET_QUERY: &str = "MATCH (n) DETACH DELETE n";

pub const PERSON_CONSTRAINT_QUERY: &str =
    "CREATE CONSTRAINT person_name_unique IF NOT EXISTS
     FOR (p:Person) REQUIRE p.name IS UNIQUE";

/// Every per-meeting statement starts by matching the meeting on `uid`.
pub const MEETING_UID_INDEX_QUERY: &str =
    "CREATE INDEX meeting_uid IF NOT EXISTS FOR (m:Meeting) ON (m.uid)";

// ============================================================================
// Entry Points
// ============================================================================

/// Import the document at `path`. Faults are logged and reported as `false`.
pub async fn import_file<S: GraphStore>(store: &S, path: &Path, batch: BatchConfig) -> bool {
    info!("📥 Importing meetings from {:?}", path);

    let result = match load_document(path) {
        Ok(doc) => import_document(store, &doc, batch).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(stats) => {
            info!(
                "✅ Imported {} meetings, {} people, {} agenda items, {} action items ({} nodes, {} edges)",
                stats.meetings,
                stats.people,
                stats.agenda_items,
                stats.action_items,
                stats.total_nodes(),
                stats.total_edges
            );
            info!(
                "   {} attendance links, {} assignments",
                stats.attended_edges, stats.assigned_to_edges
            );
            true
        }
        Err(e) => {
            error!("❌ Import failed: {}", e);
            false
        }
    }
}

/// Read and validate the input. Runs before any store mutation.
pub fn load_document(path: &Path) -> Result<MeetingsDocument, ImportError> {
    let raw = fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let doc = MeetingsDocument::from_json(&raw)?;
    if doc.is_empty() {
        warn!("⚠️  {:?} holds no meetings; the import will only clear the graph", path);
    }
    info!(
        "📄 Loaded {} meeting records under {} keys",
        doc.meeting_count(),
        doc.groups.len()
    );
    Ok(doc)
}

/// Reset the store and write every meeting of `doc`.
pub async fn import_document<S: GraphStore>(
    store: &S,
    doc: &MeetingsDocument,
    batch: BatchConfig,
) -> Result<GraphStats, ImportError> {
    let graph = MeetingGraph::from_document(doc);
    info!(
        "🔗 Built meeting graph: {} meetings, {} distinct people",
        graph.meetings.len(),
        graph.people.len()
    );
    for edge in &graph.edges {
        debug!("   {:?} -[{}]-> {:?}", edge.from, edge.edge_type.as_str(), edge.to);
    }

    reset_graph(store).await?;
    ensure_schema(store).await?;

    for meeting in &graph.meetings {
        store_meeting(store, meeting, batch).await?;
    }

    let stats = graph.stats();
    if stats.unassigned_actions > 0 {
        warn!("⚠️  {} action items were left without an assignee", stats.unassigned_actions);
    }
    Ok(stats)
}

// ============================================================================
// Reset
// ============================================================================

async fn reset_graph<S: GraphStore>(store: &S) -> Result<(), ImportError> {
    store
        .run(Statement::new(RESET_QUERY))
        .await
        .map_err(ImportError::store("reset"))?;
    info!("🧹 Cleared existing graph");
    Ok(())
}

async fn ensure_schema<S: GraphStore>(store: &S) -> Result<(), ImportError> {
    store
        .run(Statement::new(PERSON_CONSTRAINT_QUERY))
        .await
        .map_err(ImportError::store("person constraint"))?;
    store
        .run(Statement::new(MEETING_UID_INDEX_QUERY))
        .await
        .map_err(ImportError::store("meeting uid index"))?;
    info!("📇 Person constraint and meeting index in place");
    Ok(())
}

// ============================================================================
// Per-Meeting Writes
// ============================================================================

async fn store_meeting<S: GraphStore>(
    store: &S,
    meeting: &MeetingNode,
    batch: BatchConfig,
) -> Result<(), ImportError> {
    info!("📝 Importing meeting {} ({})", meeting.meeting_id, meeting.date);

    store
        .run(meeting_statement(meeting))
        .await
        .map_err(ImportError::store("create meeting"))?;

    for statement in attendee_statements(meeting, batch) {
        store
            .run(statement)
            .await
            .map_err(ImportError::store("merge attendees"))?;
    }

    for statement in document_statements(meeting, batch) {
        store
            .run(statement)
            .await
            .map_err(ImportError::store("create documents"))?;
    }

    // One unit of work per agenda item
    for item in &meeting.agenda_items {
        store
            .run(agenda_item_statement(meeting, item))
            .await
            .map_err(ImportError::store("create agenda item"))?;
    }

    for action in meeting.action_items.iter().filter(|a| !a.assigned) {
        warn!(
            "⚠️  Action item {:?} in meeting {} names unknown assignee {:?}; it stays unassigned",
            action.text, meeting.meeting_id, action.assignee
        );
    }

    for statement in action_item_statements(meeting, batch) {
        store
            .run(statement)
            .await
            .map_err(ImportError::store("create action items"))?;
    }

    info!(
        "   {} attendees, {} documents, {} agenda items, {} action items",
        meeting.attendees.len(),
        meeting.documents.len(),
        meeting.agenda_items.len(),
        meeting.action_items.len()
    );
    Ok(())
}

// ============================================================================
// Statement Assembly
// ============================================================================

fn meeting_statement(meeting: &MeetingNode) -> Statement {
    Statement::new(
        "CREATE (m:Meeting {
             uid: $uid,
             id: $id,
             workgroup: $workgroup,
             workgroup_id: $workgroup_id,
             name: $name,
             date: $date,
             host: $host,
             documenter: $documenter,
             purpose: $purpose
         })",
    )
    .param("uid", meeting.uid.to_string())
    .param("id", meeting.meeting_id.as_str())
    .param("workgroup", meeting.workgroup.as_str())
    .param("workgroup_id", meeting.workgroup_id.as_str())
    .param("name", meeting.name.as_str())
    .param("date", meeting.date.as_str())
    .param("host", meeting.host.as_str())
    .param("documenter", meeting.documenter.as_str())
    .param("purpose", meeting.purpose.as_str())
}

fn attendee_statements(meeting: &MeetingNode, batch: BatchConfig) -> Vec<Statement> {
    meeting
        .attendees
        .chunks(batch.batch_size)
        .map(|chunk| {
            Statement::new(format!(
                "MATCH (m:Meeting {{uid: $meeting_uid}})
                 UNWIND $names AS name
                 MERGE (p:Person {{name: name}})
                 MERGE (p)-[:{}]->(m)",
                EdgeType::Attended.as_str()
            ))
            .param("meeting_uid", meeting.uid.to_string())
            .param("names", chunk.to_vec())
        })
        .collect()
}

fn document_statements(meeting: &MeetingNode, batch: BatchConfig) -> Vec<Statement> {
    meeting
        .documents
        .chunks(batch.batch_size)
        .map(|chunk| {
            let docs: Vec<Value> = chunk
                .iter()
                .map(|d| json!({ "title": d.title, "link": d.link }))
                .collect();
            Statement::new(format!(
                "MATCH (m:Meeting {{uid: $meeting_uid}})
                 UNWIND $documents AS doc
                 CREATE (m)-[:{}]->(:Document {{title: doc.title, link: doc.link}})",
                EdgeType::HasDocument.as_str()
            ))
            .param("meeting_uid", meeting.uid.to_string())
            .param("documents", docs)
        })
        .collect()
}

fn agenda_item_statement(meeting: &MeetingNode, item: &AgendaItemNode) -> Statement {
    let decisions: Vec<Value> = item
        .decisions
        .iter()
        .map(|d| {
            json!({
                "decision": d.decision,
                "rationale": d.rationale,
                "opposing": d.opposing,
                "effect": d.effect,
            })
        })
        .collect();

    Statement::new(format!(
        "MATCH (m:Meeting {{uid: $meeting_uid}})
         CREATE (m)-[:{has_item}]->(a:AgendaItem {{uid: $uid, status: $status, narrative: $narrative}})
         FOREACH (point IN $discussion_points |
             CREATE (a)-[:{includes}]->(:DiscussionPoint {{content: point}}))
         FOREACH (d IN $decisions |
             CREATE (a)-[:{made}]->(:Decision {{
                 decision: d.decision,
                 rationale: d.rationale,
                 opposing: d.opposing,
                 effect: d.effect
             }}))",
        has_item = EdgeType::HasAgendaItem.as_str(),
        includes = EdgeType::IncludesDiscussion.as_str(),
        made = EdgeType::MadeDecision.as_str(),
    ))
    .param("meeting_uid", meeting.uid.to_string())
    .param("uid", item.uid.to_string())
    .param("status", item.status.as_str())
    .param("narrative", item.narrative.as_str())
    .param("discussion_points", item.discussion_points.clone())
    .param("decisions", decisions)
}

/// ASSIGNED_TO is only drawn when a Person with that exact name exists;
/// otherwise the action item is left without an assignee edge.
fn action_item_statements(meeting: &MeetingNode, batch: BatchConfig) -> Vec<Statement> {
    meeting
        .action_items
        .chunks(batch.batch_size)
        .map(|chunk| {
            let actions: Vec<Value> = chunk
                .iter()
                .map(|a| {
                    json!({
                        "text": a.text,
                        "status": a.status,
                        "due_date": a.due_date,
                        "assignee": a.assignee,
                    })
                })
                .collect();
            Statement::new(format!(
                "MATCH (m:Meeting {{uid: $meeting_uid}})
                 UNWIND $actions AS action
                 CREATE (m)-[:{has_action}]->(a:ActionItem {{
                     text: action.text,
                     status: action.status,
                     due_date: action.due_date,
                     assignee: action.assignee
                 }})
                 WITH a, action
                 OPTIONAL MATCH (p:Person {{name: action.assignee}})
                 FOREACH (hit IN CASE WHEN p IS NULL THEN [] ELSE [1] END |
                     CREATE (a)-[:{assigned}]->(p))",
                has_action = EdgeType::HasAction.as_str(),
                assigned = EdgeType::AssignedTo.as_str(),
            ))
            .param("meeting_uid", meeting.uid.to_string())
            .param("actions", actions)
        })
        .collect()
}
