// Shared doubles for editor integration tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proforma_common::protocol::api::{UpsertFieldRequest, UpsertTemplateRequest};
use proforma_common::types::{
    FieldAttrs, FieldRecord, TemplateAttrs, TemplateRecord, TemplateSnapshot,
};
use proforma_editor::{Host, Notice, RemoteError, RemoteStore};

// ── Fixtures ────────────────────────────────────────────────────────

pub fn field_record(field_id: &str, index: u32) -> FieldRecord {
    FieldRecord {
        field_id: field_id.into(),
        template_id: Some("t1".into()),
        index,
        attrs: FieldAttrs {
            name: format!("Field {field_id}"),
            prompt: format!("Prompt for {field_id}"),
            ..FieldAttrs::default()
        },
    }
}

pub fn snapshot(fields: Vec<FieldRecord>) -> TemplateSnapshot {
    TemplateSnapshot {
        template: TemplateRecord {
            template_id: "t1".into(),
            guild_id: "g1".into(),
            attrs: TemplateAttrs { name: "Introductions".into(), max_profile_count: 1, ..TemplateAttrs::default() },
        },
        fields,
    }
}

pub fn rejected(message: &str) -> RemoteError {
    RemoteError::Rejected { status: 400, message: message.into() }
}

// ── Scripted store ──────────────────────────────────────────────────

type Queue<T> = Mutex<VecDeque<(Duration, Result<T, RemoteError>)>>;

/// Remote store double that records calls and returns scripted responses.
///
/// Each response may carry a delay so tests running on paused time can
/// control arrival order. Unscripted calls succeed: field saves echo the
/// request with a generated id, everything else returns an empty success.
#[derive(Default)]
pub struct ScriptedStore {
    fetch_responses: Queue<TemplateSnapshot>,
    template_responses: Queue<Option<TemplateRecord>>,
    template_delete_responses: Queue<()>,
    field_responses: Queue<FieldRecord>,
    field_responses_by_id: Mutex<HashMap<String, VecDeque<(Duration, Result<FieldRecord, RemoteError>)>>>,
    field_delete_responses: Queue<()>,
    template_requests: Mutex<Vec<UpsertTemplateRequest>>,
    field_requests: Mutex<Vec<UpsertFieldRequest>>,
    deleted_fields: Mutex<Vec<String>>,
    deleted_templates: Mutex<Vec<String>>,
    fetch_count: AtomicUsize,
    generated_ids: AtomicUsize,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_fetch(&self, result: Result<TemplateSnapshot, RemoteError>) {
        self.fetch_responses.lock().unwrap().push_back((Duration::ZERO, result));
    }

    pub fn push_template_save(&self, result: Result<Option<TemplateRecord>, RemoteError>) {
        self.template_responses.lock().unwrap().push_back((Duration::ZERO, result));
    }

    pub fn push_template_delete(&self, result: Result<(), RemoteError>) {
        self.template_delete_responses.lock().unwrap().push_back((Duration::ZERO, result));
    }

    pub fn push_field_save(&self, result: Result<FieldRecord, RemoteError>) {
        self.push_field_save_after(Duration::ZERO, result);
    }

    pub fn push_field_save_after(&self, delay: Duration, result: Result<FieldRecord, RemoteError>) {
        self.field_responses.lock().unwrap().push_back((delay, result));
    }

    /// Script the response to a save of the field with `field_id`,
    /// regardless of the order requests reach the store.
    pub fn push_field_save_for(
        &self,
        field_id: &str,
        delay: Duration,
        result: Result<FieldRecord, RemoteError>,
    ) {
        self.field_responses_by_id
            .lock()
            .unwrap()
            .entry(field_id.to_string())
            .or_default()
            .push_back((delay, result));
    }

    pub fn push_field_delete(&self, result: Result<(), RemoteError>) {
        self.field_delete_responses.lock().unwrap().push_back((Duration::ZERO, result));
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn template_requests(&self) -> Vec<UpsertTemplateRequest> {
        self.template_requests.lock().unwrap().clone()
    }

    pub fn field_requests(&self) -> Vec<UpsertFieldRequest> {
        self.field_requests.lock().unwrap().clone()
    }

    pub fn deleted_fields(&self) -> Vec<String> {
        self.deleted_fields.lock().unwrap().clone()
    }

    pub fn deleted_templates(&self) -> Vec<String> {
        self.deleted_templates.lock().unwrap().clone()
    }

    /// Total number of requests that reached the store.
    pub fn network_calls(&self) -> usize {
        self.fetch_calls()
            + self.template_requests.lock().unwrap().len()
            + self.field_requests.lock().unwrap().len()
            + self.deleted_fields.lock().unwrap().len()
            + self.deleted_templates.lock().unwrap().len()
    }

    fn next<T>(queue: &Queue<T>) -> Option<(Duration, Result<T, RemoteError>)> {
        queue.lock().unwrap().pop_front()
    }

    async fn respond<T>(scripted: (Duration, Result<T, RemoteError>)) -> Result<T, RemoteError> {
        let (delay, result) = scripted;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        result
    }
}

impl RemoteStore for ScriptedStore {
    async fn fetch_template(&self, _template_id: String) -> Result<TemplateSnapshot, RemoteError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let scripted = Self::next(&self.fetch_responses)
            .unwrap_or((Duration::ZERO, Err(RemoteError::Unavailable("no snapshot scripted".into()))));
        Self::respond(scripted).await
    }

    async fn upsert_template(
        &self,
        request: UpsertTemplateRequest,
    ) -> Result<Option<TemplateRecord>, RemoteError> {
        self.template_requests.lock().unwrap().push(request);
        let scripted = Self::next(&self.template_responses).unwrap_or((Duration::ZERO, Ok(None)));
        Self::respond(scripted).await
    }

    async fn delete_template(&self, template_id: String) -> Result<(), RemoteError> {
        self.deleted_templates.lock().unwrap().push(template_id);
        let scripted = Self::next(&self.template_delete_responses).unwrap_or((Duration::ZERO, Ok(())));
        Self::respond(scripted).await
    }

    async fn upsert_field(&self, request: UpsertFieldRequest) -> Result<FieldRecord, RemoteError> {
        self.field_requests.lock().unwrap().push(request.clone());
        let routed = request.field_id.as_ref().and_then(|id| {
            self.field_responses_by_id.lock().unwrap().get_mut(id).and_then(VecDeque::pop_front)
        });
        let scripted = routed.or_else(|| Self::next(&self.field_responses)).unwrap_or_else(|| {
            let n = self.generated_ids.fetch_add(1, Ordering::SeqCst);
            let record = FieldRecord {
                field_id: request.field_id.clone().unwrap_or_else(|| format!("gen-{n}")),
                template_id: request.template_id.clone(),
                index: 0,
                attrs: request.attrs.clone(),
            };
            (Duration::ZERO, Ok(record))
        });
        Self::respond(scripted).await
    }

    async fn delete_field(&self, field_id: String) -> Result<(), RemoteError> {
        self.deleted_fields.lock().unwrap().push(field_id);
        let scripted = Self::next(&self.field_delete_responses).unwrap_or((Duration::ZERO, Ok(())));
        Self::respond(scripted).await
    }
}

// ── Recording host ──────────────────────────────────────────────────

/// Host double: records notices and prompts, answers confirmations with a
/// fixed value.
pub struct RecordingHost {
    answer: Cell<bool>,
    notices: RefCell<Vec<Notice>>,
    prompts: RefCell<Vec<String>>,
    left: Cell<bool>,
}

impl RecordingHost {
    pub fn confirming() -> Self {
        Self::answering(true)
    }

    pub fn declining() -> Self {
        Self::answering(false)
    }

    fn answering(answer: bool) -> Self {
        Self {
            answer: Cell::new(answer),
            notices: RefCell::new(Vec::new()),
            prompts: RefCell::new(Vec::new()),
            left: Cell::new(false),
        }
    }

    pub fn set_answer(&self, answer: bool) {
        self.answer.set(answer);
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices.borrow().iter().map(Notice::message).collect()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn left_editor(&self) -> bool {
        self.left.get()
    }
}

impl Host for RecordingHost {
    fn notify(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.borrow_mut().push(prompt.to_string());
        self.answer.get()
    }

    fn leave_editor(&self) {
        self.left.set(true);
    }
}
