//! Meeting Graph Builder
//!
//! Builds the in-memory meeting graph from a validated document: one subgraph
//! per meeting record, with person identity resolved by exact name across the
//! whole import.

use crate::model::{MeetingRecord, MeetingsDocument};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

// ============================================================================
// Node and Edge Types
// ============================================================================

/// Unique identifier for a node in the meeting graph
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    Meeting(Uuid),
    /// Persons are identified by their exact name
    Person(String),
    /// (owning meeting, position in workingDocs)
    Document(Uuid, usize),
    AgendaItem(Uuid),
    /// (owning agenda item, position)
    DiscussionPoint(Uuid, usize),
    /// (owning agenda item, position)
    Decision(Uuid, usize),
    /// (owning meeting, position among action items that name an assignee)
    ActionItem(Uuid, usize),
}

/// Types of relationships between nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeType {
    /// Person attended a meeting
    Attended,
    HasDocument,
    HasAgendaItem,
    IncludesDiscussion,
    MadeDecision,
    HasAction,
    /// Action item is assigned to a person
    AssignedTo,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Attended => "ATTENDED",
            EdgeType::HasDocument => "HAS_DOCUMENT",
            EdgeType::HasAgendaItem => "HAS_AGENDA_ITEM",
            EdgeType::IncludesDiscussion => "INCLUDES_DISCUSSION",
            EdgeType::MadeDecision => "MADE_DECISION",
            EdgeType::HasAction => "HAS_ACTION",
            EdgeType::AssignedTo => "ASSIGNED_TO",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub edge_type: EdgeType,
}

// ============================================================================
// Node Payloads
// ============================================================================

#[derive(Debug, Clone)]
pub struct MeetingNode {
    pub uid: Uuid,
    pub meeting_id: String,
    pub workgroup: String,
    pub workgroup_id: String,
    pub name: String,
    pub date: String,
    pub host: String,
    pub documenter: String,
    pub purpose: String,
    /// Distinct attendee names, first-seen order
    pub attendees: Vec<String>,
    pub documents: Vec<DocumentNode>,
    pub agenda_items: Vec<AgendaItemNode>,
    pub action_items: Vec<ActionItemNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentNode {
    pub title: String,
    pub link: String,
}

#[derive(Debug, Clone)]
pub struct AgendaItemNode {
    pub uid: Uuid,
    pub status: String,
    pub narrative: String,
    pub discussion_points: Vec<String>,
    pub decisions: Vec<DecisionNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionNode {
    pub decision: String,
    pub rationale: String,
    pub opposing: String,
    pub effect: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionItemNode {
    pub text: String,
    pub status: String,
    pub due_date: String,
    pub assignee: String,
    /// Whether a Person with the assignee's name exists when this meeting's
    /// action items are written. Unresolved items keep no ASSIGNED_TO edge.
    pub assigned: bool,
}

// ============================================================================
// Person Index
// ============================================================================

/// name -> position in `people`, shared across every meeting of one import
#[derive(Debug, Default)]
pub struct PersonIndex {
    by_name: HashMap<String, usize>,
    people: Vec<String>,
}

impl PersonIndex {
    /// Returns true when the name was not seen before.
    pub fn upsert(&mut self, name: &str) -> bool {
        if self.by_name.contains_key(name) {
            return false;
        }
        self.by_name.insert(name.to_string(), self.people.len());
        self.people.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    #[cfg(test)]
    pub fn names(&self) -> &[String] {
        &self.people
    }
}

// ============================================================================
// Meeting Graph
// ============================================================================

#[derive(Debug, Default)]
pub struct MeetingGraph {
    pub meetings: Vec<MeetingNode>,
    pub people: PersonIndex,
    pub nodes: Vec<NodeId>,
    pub edges: Vec<Edge>,
}

impl MeetingGraph {
    pub fn from_document(doc: &MeetingsDocument) -> Self {
        let mut graph = MeetingGraph::default();

        for group in &doc.groups {
            for record in &group.meetings {
                graph.add_meeting(&group.meeting_id, record);
            }
        }

        graph
    }

    fn add_meeting(&mut self, meeting_id: &str, record: &MeetingRecord) {
        let info = &record.meeting_info;
        let uid = Uuid::new_v4();
        let meeting = NodeId::Meeting(uid);
        self.nodes.push(meeting.clone());

        // Attendees: a repeated name within one meeting still yields one edge
        let mut seen = HashSet::new();
        let mut attendees = Vec::new();
        for name in info.attendees() {
            if !seen.insert(name) {
                continue;
            }
            if self.people.upsert(name) {
                self.nodes.push(NodeId::Person(name.to_string()));
            }
            self.edges.push(Edge {
                from: NodeId::Person(name.to_string()),
                to: meeting.clone(),
                edge_type: EdgeType::Attended,
            });
            attendees.push(name.to_string());
        }

        let documents: Vec<DocumentNode> = info
            .working_docs
            .iter()
            .map(|doc| DocumentNode {
                title: doc.title.clone(),
                link: doc.link.clone(),
            })
            .collect();
        for idx in 0..documents.len() {
            self.link(&meeting, NodeId::Document(uid, idx), EdgeType::HasDocument);
        }

        let mut agenda_items = Vec::with_capacity(record.agenda_items.len());
        for item in &record.agenda_items {
            let item_uid = Uuid::new_v4();
            let agenda_node = NodeId::AgendaItem(item_uid);
            self.link(&meeting, agenda_node.clone(), EdgeType::HasAgendaItem);

            for idx in 0..item.discussion_points.len() {
                self.link(
                    &agenda_node,
                    NodeId::DiscussionPoint(item_uid, idx),
                    EdgeType::IncludesDiscussion,
                );
            }
            for idx in 0..item.decision_items.len() {
                self.link(&agenda_node, NodeId::Decision(item_uid, idx), EdgeType::MadeDecision);
            }

            agenda_items.push(AgendaItemNode {
                uid: item_uid,
                status: item.status.clone(),
                narrative: item.narrative.clone(),
                discussion_points: item.discussion_points.clone(),
                decisions: item
                    .decision_items
                    .iter()
                    .map(|d| DecisionNode {
                        decision: d.decision.clone(),
                        rationale: d.rationale.clone(),
                        opposing: d.opposing.clone(),
                        effect: d.effect.clone(),
                    })
                    .collect(),
            });
        }

        // Action items hang off the meeting, not the agenda item they came from
        let action_items: Vec<ActionItemNode> = record
            .agenda_items
            .iter()
            .flat_map(|item| item.action_items.iter())
            .filter_map(|action| {
                let assignee = action.assignee.as_ref()?;
                Some(ActionItemNode {
                    text: action.text.clone(),
                    status: action.status.clone(),
                    due_date: action.due_date.clone(),
                    assignee: assignee.clone(),
                    assigned: self.people.contains(assignee),
                })
            })
            .collect();
        for (idx, action) in action_items.iter().enumerate() {
            let action_node = NodeId::ActionItem(uid, idx);
            self.link(&meeting, action_node.clone(), EdgeType::HasAction);
            if action.assigned {
                self.edges.push(Edge {
                    from: action_node,
                    to: NodeId::Person(action.assignee.clone()),
                    edge_type: EdgeType::AssignedTo,
                });
            }
        }

        self.meetings.push(MeetingNode {
            uid,
            meeting_id: meeting_id.to_string(),
            workgroup: record.workgroup.clone(),
            workgroup_id: record.workgroup_id.clone(),
            name: info.name.clone(),
            date: info.date.clone(),
            host: info.host.clone(),
            documenter: info.documenter.clone(),
            purpose: info.purpose.clone(),
            attendees,
            documents,
            agenda_items,
            action_items,
        });
    }

    /// Adds `to` as a fresh node hanging off `from`.
    fn link(&mut self, from: &NodeId, to: NodeId, edge_type: EdgeType) {
        self.nodes.push(to.clone());
        self.edges.push(Edge {
            from: from.clone(),
            to,
            edge_type,
        });
    }

    /// Action items whose assignee had not been seen as an attendee.
    pub fn unassigned_actions(&self) -> impl Iterator<Item = (&MeetingNode, &ActionItemNode)> {
        self.meetings.iter().flat_map(|m| {
            m.action_items
                .iter()
                .filter(|a| !a.assigned)
                .map(move |a| (m, a))
        })
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats::default();
        for node in &self.nodes {
            match node {
                NodeId::Meeting(_) => stats.meetings += 1,
                NodeId::Person(_) => stats.people += 1,
                NodeId::Document(_, _) => stats.documents += 1,
                NodeId::AgendaItem(_) => stats.agenda_items += 1,
                NodeId::DiscussionPoint(_, _) => stats.discussion_points += 1,
                NodeId::Decision(_, _) => stats.decisions += 1,
                NodeId::ActionItem(_, _) => stats.action_items += 1,
            }
        }
        for edge in &self.edges {
            match edge.edge_type {
                EdgeType::Attended => stats.attended_edges += 1,
                EdgeType::AssignedTo => stats.assigned_to_edges += 1,
                _ => {}
            }
        }
        stats.total_edges = self.edges.len();
        stats.unassigned_actions = self.unassigned_actions().count();
        stats
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct GraphStats {
    pub meetings: usize,
    pub people: usize,
    pub documents: usize,
    pub agenda_items: usize,
    pub discussion_points: usize,
    pub decisions: usize,
    pub action_items: usize,
    pub attended_edges: usize,
    pub assigned_to_edges: usize,
    pub total_edges: usize,
    /// Action items left without an ASSIGNED_TO edge
    pub unassigned_actions: usize,
}

impl GraphStats {
    pub fn total_nodes(&self) -> usize {
        self.meetings
            + self.people
            + self.documents
            + self.agenda_items
            + self.discussion_points
            + self.decisions
            + self.action_items
    }
}
