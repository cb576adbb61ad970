//! In-memory stand-in for the Less Annoying CRM endpoint.
//!
//! Accepts the same single-URL JSON POSTs as the real API, checks the
//! `UserCode` / `APIToken` pair, and dispatches on `Function`. Contacts,
//! pipeline items, notes, tasks, and events live in memory. Every accepted
//! body is recorded so tests can inspect exactly what a client sent.

use std::{collections::HashMap, sync::Arc};

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub const RESERVED_FIELDS: [&str; 3] = ["Function", "UserCode", "APIToken"];

pub type Record = Map<String, Value>;

#[derive(Debug, Default)]
pub struct Crm {
    pub user_token: String,
    pub api_token: String,
    pub contacts: HashMap<String, Record>,
    pub pipeline_items: HashMap<String, Record>,
    pub groups: HashMap<String, Vec<String>>,
    pub notes: Vec<Record>,
    pub tasks: Vec<Record>,
    pub events: Vec<Record>,
    /// Every authenticated request body, in arrival order.
    pub requests: Vec<Record>,
}

impl Crm {
    pub fn new(user_token: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            user_token: user_token.into(),
            api_token: api_token.into(),
            ..Self::default()
        }
    }

    pub fn into_db(self) -> Db {
        Arc::new(RwLock::new(self))
    }
}

pub type Db = Arc<RwLock<Crm>>;

/// Pipelines every mock account has, as returned by GetPipelineSettings.
pub fn pipeline_settings() -> Value {
    json!([
        {
            "PipelineId": "lead",
            "Name": "Lead",
            "Statuses": [
                {"StatusId": "new", "Name": "New", "IsClosed": false},
                {"StatusId": "qualified", "Name": "Qualified", "IsClosed": false},
                {"StatusId": "won", "Name": "Won", "IsClosed": true}
            ]
        }
    ])
}

pub fn app(user_token: &str, api_token: &str) -> Router {
    app_with_state(Crm::new(user_token, api_token).into_db())
}

pub fn app_with_state(db: Db) -> Router {
    Router::new().route("/", post(dispatch)).with_state(db)
}

pub async fn run(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(db)).await
}

type Reply = (StatusCode, Json<Value>);

fn ok(extra: Value) -> Reply {
    let mut body = json!({"Success": true});
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    (StatusCode::OK, Json(body))
}

fn failure(status: StatusCode, error: &str) -> Reply {
    (status, Json(json!({"Success": false, "Error": error})))
}

fn text<'a>(body: &'a Record, field: &str) -> Option<&'a str> {
    body.get(field).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Rows to skip and rows to take for the `Page` and `NumRows` arguments.
/// Pages start at 1; oversized values saturate and yield an empty page.
fn page_window(body: &Record) -> (usize, usize) {
    let number = |field: &str, default: u64| {
        let n = body.get(field).and_then(Value::as_u64).unwrap_or(default);
        usize::try_from(n).unwrap_or(usize::MAX)
    };
    let num_rows = number("NumRows", 100);
    let page = number("Page", 1).max(1);
    (page.saturating_sub(1).saturating_mul(num_rows), num_rows)
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// The request body minus the reserved fields.
fn fields(body: &Record) -> Record {
    body.iter()
        .filter(|(k, _)| !RESERVED_FIELDS.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

async fn dispatch(State(db): State<Db>, Json(body): Json<Record>) -> Reply {
    let mut crm = db.write().await;

    let authed = text(&body, "UserCode") == Some(crm.user_token.as_str())
        && text(&body, "APIToken") == Some(crm.api_token.as_str());
    if !authed {
        warn!("rejecting request with bad credentials");
        return failure(StatusCode::OK, "Invalid user code or API token");
    }

    let Some(function) = text(&body, "Function").map(str::to_string) else {
        return failure(StatusCode::BAD_REQUEST, "Missing Function");
    };
    info!(%function, "dispatching");
    crm.requests.push(body.clone());

    match function.as_str() {
        "CreateContact" => create_contact(&mut crm, &body),
        "GetContact" => get_contact(&crm, &body),
        "EditContact" => edit_contact(&mut crm, &body),
        "DeleteContact" => delete_contact(&mut crm, &body),
        "SearchContacts" => search_contacts(&crm, &body),
        "CreateNote" => create_note(&mut crm, &body),
        "CreateTask" => create_task(&mut crm, &body),
        "CreateEvent" => create_event(&mut crm, &body),
        "AddContactToGroup" => add_contact_to_group(&mut crm, &body),
        "CreatePipeline" => create_pipeline(&mut crm, &body),
        "UpdatePipelineItem" => update_pipeline_item(&mut crm, &body),
        "GetPipelineReport" => get_pipeline_report(&crm, &body),
        "GetPipelineItemsAttachedToContact" => pipeline_items_for_contact(&crm, &body),
        "GetPipelineSettings" => ok(json!({"Result": pipeline_settings()})),
        "GetUserInfo" => ok(json!({
            "Result": {"UserId": "1", "Email": "owner@example.com", "Timezone": "America/Denver"}
        })),
        "GetCustomFields" => ok(json!({"Result": []})),
        other => failure(StatusCode::BAD_REQUEST, &format!("Unknown function: {other}")),
    }
}

fn create_contact(crm: &mut Crm, body: &Record) -> Reply {
    let named = ["FullName", "FirstName", "LastName", "CompanyName"]
        .iter()
        .any(|f| text(body, f).is_some());
    if !named {
        return failure(StatusCode::OK, "A contact needs a name or a company name");
    }
    let id = new_id();
    let mut record = fields(body);
    record.insert("ContactId".to_string(), Value::from(id.clone()));
    crm.contacts.insert(id.clone(), record);
    ok(json!({"ContactId": id}))
}

fn get_contact(crm: &Crm, body: &Record) -> Reply {
    match text(body, "ContactId").and_then(|id| crm.contacts.get(id)) {
        Some(contact) => ok(json!({"Contact": contact})),
        None => failure(StatusCode::OK, "Contact not found"),
    }
}

fn edit_contact(crm: &mut Crm, body: &Record) -> Reply {
    let Some(contact) = text(body, "ContactId").and_then(|id| crm.contacts.get_mut(id)) else {
        return failure(StatusCode::OK, "Contact not found");
    };
    contact.extend(fields(body));
    ok(json!({}))
}

fn delete_contact(crm: &mut Crm, body: &Record) -> Reply {
    match text(body, "ContactId").and_then(|id| crm.contacts.remove(id)) {
        // The real API reports a successful delete with a 500.
        Some(_) => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"Success": true}))),
        None => failure(StatusCode::OK, "Contact not found"),
    }
}

fn is_company(contact: &Record) -> bool {
    ["FullName", "FirstName", "LastName"]
        .iter()
        .all(|f| text(contact, f).is_none())
}

fn search_contacts(crm: &Crm, body: &Record) -> Reply {
    let Some(terms) = text(body, "SearchTerms").map(str::to_lowercase) else {
        return failure(StatusCode::OK, "SearchTerms is required");
    };
    let record_type = text(body, "RecordType");
    let (skip, num_rows) = page_window(body);

    let mut matches: Vec<&Record> = crm
        .contacts
        .values()
        .filter(|c| match record_type {
            Some("Contacts") => !is_company(c),
            Some("Companies") => is_company(c),
            _ => true,
        })
        .filter(|c| {
            c.values()
                .filter_map(Value::as_str)
                .any(|v| v.to_lowercase().contains(&terms))
        })
        .collect();
    matches.sort_by(|a, b| text(a, "ContactId").cmp(&text(b, "ContactId")));

    let result: Vec<&Record> = matches
        .into_iter()
        .skip(skip)
        .take(num_rows)
        .collect();
    ok(json!({"Result": result}))
}

fn create_note(crm: &mut Crm, body: &Record) -> Reply {
    if !text(body, "ContactId").is_some_and(|id| crm.contacts.contains_key(id)) {
        return failure(StatusCode::OK, "Contact not found");
    }
    if text(body, "Note").is_none() {
        return failure(StatusCode::OK, "Note is required");
    }
    let id = new_id();
    let mut note = fields(body);
    note.insert("NoteId".to_string(), Value::from(id.clone()));
    crm.notes.push(note);
    ok(json!({"NoteId": id}))
}

fn create_task(crm: &mut Crm, body: &Record) -> Reply {
    if text(body, "DueDate").is_none() || text(body, "Name").is_none() {
        return failure(StatusCode::OK, "DueDate and Name are required");
    }
    let id = new_id();
    let mut task = fields(body);
    task.insert("TaskId".to_string(), Value::from(id.clone()));
    crm.tasks.push(task);
    ok(json!({"TaskId": id}))
}

fn create_event(crm: &mut Crm, body: &Record) -> Reply {
    let complete = ["Date", "Name", "StartTime", "EndTime"]
        .iter()
        .all(|f| text(body, f).is_some());
    if !complete {
        return failure(StatusCode::OK, "Date, Name, StartTime and EndTime are required");
    }
    let id = new_id();
    let mut event = fields(body);
    event.insert("EventId".to_string(), Value::from(id.clone()));
    crm.events.push(event);
    ok(json!({"EventId": id}))
}

fn add_contact_to_group(crm: &mut Crm, body: &Record) -> Reply {
    let contact_id = text(body, "ContactId").filter(|id| crm.contacts.contains_key(*id));
    let Some(contact_id) = contact_id else {
        return failure(StatusCode::OK, "Contact not found");
    };
    let Some(group) = text(body, "GroupName") else {
        return failure(StatusCode::OK, "GroupName is required");
    };
    let members = crm.groups.entry(group.to_string()).or_default();
    if !members.iter().any(|m| m == contact_id) {
        members.push(contact_id.to_string());
    }
    ok(json!({}))
}

fn known_status(pipeline_id: &str, status_id: &str) -> bool {
    pipeline_settings()
        .as_array()
        .into_iter()
        .flatten()
        .filter(|p| p["PipelineId"] == pipeline_id)
        .flat_map(|p| p["Statuses"].as_array().cloned().unwrap_or_default())
        .any(|s| s["StatusId"] == status_id)
}

fn create_pipeline(crm: &mut Crm, body: &Record) -> Reply {
    if !text(body, "ContactId").is_some_and(|id| crm.contacts.contains_key(id)) {
        return failure(StatusCode::OK, "Contact not found");
    }
    let (Some(pipeline_id), Some(status_id)) = (text(body, "PipelineId"), text(body, "StatusId"))
    else {
        return failure(StatusCode::OK, "PipelineId and StatusId are required");
    };
    if !known_status(pipeline_id, status_id) {
        return failure(StatusCode::OK, "Unknown pipeline or status");
    }
    let id = new_id();
    let mut item = fields(body);
    item.insert("PipelineItemId".to_string(), Value::from(id.clone()));
    crm.pipeline_items.insert(id.clone(), item);
    ok(json!({"PipelineItemId": id}))
}

fn update_pipeline_item(crm: &mut Crm, body: &Record) -> Reply {
    let Some(item) = text(body, "PipelineItemId").and_then(|id| crm.pipeline_items.get(id)) else {
        return failure(StatusCode::OK, "Pipeline item not found");
    };
    let pipeline_id = text(item, "PipelineId").unwrap_or_default().to_string();
    if !text(body, "StatusId").is_some_and(|s| known_status(&pipeline_id, s)) {
        return failure(StatusCode::OK, "Unknown status");
    }

    let update = fields(body);
    if let Some(item) = text(body, "PipelineItemId").and_then(|id| crm.pipeline_items.get_mut(id)) {
        for (key, value) in update {
            match key.as_str() {
                // Custom fields merge; the rest overwrite.
                "CustomFields" => {
                    let merged = item
                        .entry("CustomFields")
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let (Some(merged), Value::Object(new)) = (merged.as_object_mut(), value) {
                        merged.extend(new);
                    }
                }
                _ => {
                    item.insert(key, value);
                }
            }
        }
    }
    ok(json!({}))
}

fn get_pipeline_report(crm: &Crm, body: &Record) -> Reply {
    let Some(pipeline_id) = text(body, "PipelineId") else {
        return failure(StatusCode::OK, "PipelineId is required");
    };
    let status_filter = text(body, "StatusFilter");
    let (skip, num_rows) = page_window(body);

    let mut items: Vec<&Record> = crm
        .pipeline_items
        .values()
        .filter(|item| text(item, "PipelineId") == Some(pipeline_id))
        .filter(|item| match status_filter {
            None | Some("all") => true,
            Some(status) => text(item, "StatusId") == Some(status),
        })
        .collect();
    items.sort_by(|a, b| text(a, "PipelineItemId").cmp(&text(b, "PipelineItemId")));
    if text(body, "SortDirection") == Some("DESC") {
        items.reverse();
    }

    let result: Vec<&Record> = items
        .into_iter()
        .skip(skip)
        .take(num_rows)
        .collect();
    ok(json!({"Result": result}))
}

fn pipeline_items_for_contact(crm: &Crm, body: &Record) -> Reply {
    let Some(contact_id) = text(body, "ContactId") else {
        return failure(StatusCode::OK, "ContactId is required");
    };
    let items: Vec<&Record> = crm
        .pipeline_items
        .values()
        .filter(|item| text(item, "ContactId") == Some(contact_id))
        .collect();
    ok(json!({"Result": items}))
}
