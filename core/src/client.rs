//! Request builder and sender for the CRM API.
//!
//! # Design
//! `LacrmClient` holds the endpoint, a `ParameterBuilder` carrying the
//! credentials, and a `Transport`. None of it changes after construction.
//! Every operation comes in two forms: `build_*` produces the `HttpRequest`
//! without touching the network, and the plain method builds, sends through
//! the transport, and hands back the raw `HttpResponse`.

use serde::Serialize;
use tracing::{debug, instrument};

use crate::config::{ClientConfig, DEFAULT_BASE_URL};
use crate::credentials::Credentials;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, CONTENT_TYPE_JSON};
use crate::params::{Operation, OperationRequest, ParameterBuilder, SuppressionPolicy};
use crate::transport::{Transport, UreqTransport};
use crate::types::{
    Contact, ContactIdArgs, CreateEvent, CreatePipeline, CreateTask, GroupArgs, NoteArgs,
    PipelineReport, SearchContacts, UpdatePipelineItem,
};

/// Synchronous client for the Less Annoying CRM API.
#[derive(Debug, Clone)]
pub struct LacrmClient<T = UreqTransport> {
    base_url: String,
    params: ParameterBuilder,
    transport: T,
}

impl LacrmClient<UreqTransport> {
    /// Client for the production endpoint.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_base_url(credentials, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(credentials: Credentials, base_url: &str) -> Self {
        Self::with_transport(credentials, base_url, UreqTransport::new())
    }

    /// Load credentials from `config.token_location` and apply the rest of
    /// the settings. Fails if the token file is missing or malformed.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let credentials = Credentials::from_file(&config.token_location)?;
        Ok(Self::with_base_url(credentials, &config.base_url).suppression(config.suppression))
    }
}

impl<T: Transport> LacrmClient<T> {
    pub fn with_transport(credentials: Credentials, base_url: &str, transport: T) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            params: ParameterBuilder::new(credentials),
            transport,
        }
    }

    /// Replace the policy deciding which values suppress-empty operations drop.
    pub fn suppression(mut self, policy: SuppressionPolicy) -> Self {
        self.params = ParameterBuilder::with_policy(self.params.credentials().clone(), policy);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn parameters(&self) -> &ParameterBuilder {
        &self.params
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build the request body for any operation from a serializable record.
    pub fn build_parameters<A: Serialize + ?Sized>(
        &self,
        operation: Operation,
        args: &A,
    ) -> Result<OperationRequest, ApiError> {
        self.params.build_operation(operation, args)
    }

    /// Build the full HTTP request for any operation.
    pub fn build_request<A: Serialize + ?Sized>(
        &self,
        operation: Operation,
        args: &A,
    ) -> Result<HttpRequest, ApiError> {
        let body = self.build_parameters(operation, args)?.to_json()?;
        Ok(HttpRequest {
            url: self.base_url.clone(),
            headers: vec![(CONTENT_TYPE_JSON.0.to_string(), CONTENT_TYPE_JSON.1.to_string())],
            body,
        })
    }

    /// Build and send any operation, returning the response untouched.
    #[instrument(skip(self, args), fields(function = %operation))]
    pub fn call<A: Serialize + ?Sized>(
        &self,
        operation: Operation,
        args: &A,
    ) -> Result<HttpResponse, ApiError> {
        let request = self.build_request(operation, args)?;
        debug!(url = %request.url, "sending CRM request");
        self.transport.send(&request)
    }

    // -----------------------------------------------------------------------
    // Contacts
    // -----------------------------------------------------------------------

    pub fn build_create_contact(&self, contact: &Contact) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::CreateContact, contact)
    }

    /// Add a new contact or company.
    pub fn create_contact(&self, contact: &Contact) -> Result<HttpResponse, ApiError> {
        self.call(Operation::CreateContact, contact)
    }

    pub fn build_get_contact(&self, contact_id: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::GetContact, &ContactIdArgs { contact_id })
    }

    pub fn get_contact(&self, contact_id: &str) -> Result<HttpResponse, ApiError> {
        self.call(Operation::GetContact, &ContactIdArgs { contact_id })
    }

    pub fn build_edit_contact(&self, contact: &Contact) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::EditContact, contact)
    }

    /// Edit an existing contact. `contact.contact_id` must be set.
    pub fn edit_contact(&self, contact: &Contact) -> Result<HttpResponse, ApiError> {
        self.call(Operation::EditContact, contact)
    }

    pub fn build_delete_contact(&self, contact_id: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::DeleteContact, &ContactIdArgs { contact_id })
    }

    /// Remove a contact. The API answers a successful delete with HTTP 500.
    pub fn delete_contact(&self, contact_id: &str) -> Result<HttpResponse, ApiError> {
        self.call(Operation::DeleteContact, &ContactIdArgs { contact_id })
    }

    pub fn build_search_contacts(&self, search: &SearchContacts) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::SearchContacts, search)
    }

    pub fn search_contacts(&self, search: &SearchContacts) -> Result<HttpResponse, ApiError> {
        self.call(Operation::SearchContacts, search)
    }

    pub fn build_create_note(&self, contact_id: &str, note: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::CreateNote, &NoteArgs { contact_id, note })
    }

    /// Add a note to a contact's history.
    pub fn create_note(&self, contact_id: &str, note: &str) -> Result<HttpResponse, ApiError> {
        self.call(Operation::CreateNote, &NoteArgs { contact_id, note })
    }

    pub fn build_add_contact_to_group(
        &self,
        contact_id: &str,
        group_name: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::AddContactToGroup, &GroupArgs { contact_id, group_name })
    }

    /// The group must already exist, with spaces in its name replaced by underscores.
    pub fn add_contact_to_group(
        &self,
        contact_id: &str,
        group_name: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.call(Operation::AddContactToGroup, &GroupArgs { contact_id, group_name })
    }

    // -----------------------------------------------------------------------
    // Tasks and events
    // -----------------------------------------------------------------------

    pub fn build_create_task(&self, task: &CreateTask) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::CreateTask, task)
    }

    pub fn create_task(&self, task: &CreateTask) -> Result<HttpResponse, ApiError> {
        self.call(Operation::CreateTask, task)
    }

    pub fn build_create_event(&self, event: &CreateEvent) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::CreateEvent, event)
    }

    pub fn create_event(&self, event: &CreateEvent) -> Result<HttpResponse, ApiError> {
        self.call(Operation::CreateEvent, event)
    }

    // -----------------------------------------------------------------------
    // Pipelines
    // -----------------------------------------------------------------------

    pub fn build_create_pipeline(
        &self,
        pipeline: &CreatePipeline,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::CreatePipeline, pipeline)
    }

    /// Attach a new pipeline item to a contact or company.
    pub fn create_pipeline(&self, pipeline: &CreatePipeline) -> Result<HttpResponse, ApiError> {
        self.call(Operation::CreatePipeline, pipeline)
    }

    pub fn build_update_pipeline_item(
        &self,
        update: &UpdatePipelineItem,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::UpdatePipelineItem, update)
    }

    pub fn update_pipeline_item(
        &self,
        update: &UpdatePipelineItem,
    ) -> Result<HttpResponse, ApiError> {
        self.call(Operation::UpdatePipelineItem, update)
    }

    pub fn build_get_pipeline_report(
        &self,
        report: &PipelineReport,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::GetPipelineReport, report)
    }

    pub fn get_pipeline_report(&self, report: &PipelineReport) -> Result<HttpResponse, ApiError> {
        self.call(Operation::GetPipelineReport, report)
    }

    pub fn build_get_pipeline_items_attached_to_contact(
        &self,
        contact_id: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request(
            Operation::GetPipelineItemsAttachedToContact,
            &ContactIdArgs { contact_id },
        )
    }

    pub fn get_pipeline_items_attached_to_contact(
        &self,
        contact_id: &str,
    ) -> Result<HttpResponse, ApiError> {
        self.call(
            Operation::GetPipelineItemsAttachedToContact,
            &ContactIdArgs { contact_id },
        )
    }

    pub fn build_get_pipeline_settings(&self) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::GetPipelineSettings, &())
    }

    /// Pipeline types and their statuses, not individual pipeline items.
    pub fn get_pipeline_settings(&self) -> Result<HttpResponse, ApiError> {
        self.call(Operation::GetPipelineSettings, &())
    }

    // -----------------------------------------------------------------------
    // Account
    // -----------------------------------------------------------------------

    pub fn build_get_user_info(&self) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::GetUserInfo, &())
    }

    pub fn get_user_info(&self) -> Result<HttpResponse, ApiError> {
        self.call(Operation::GetUserInfo, &())
    }

    pub fn build_get_custom_fields(&self) -> Result<HttpRequest, ApiError> {
        self.build_request(Operation::GetCustomFields, &())
    }

    pub fn get_custom_fields(&self) -> Result<HttpResponse, ApiError> {
        self.call(Operation::GetCustomFields, &())
    }
}
