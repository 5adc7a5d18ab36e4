//! RequestDispatcher - クライアントリクエストの振り分け
//!
//! # フロー
//! 1. 共通エンベロープをデコード（失敗 → 通知して終了）
//! 2. section ごとに専用の経路でデコード・検証・サニタイズ
//! 3. TaskStore にタスクを登録
//! 4. データベースモジュールへ RoutedMessage を送る
//!
//! どの段階で失敗しても、そのリクエストだけが終了し、クライアントには
//! "task rejected" 通知が届く（通知自体は best effort）。

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::bus::BusHandles;
use crate::domain::{
    DispatchError, ModuleRequest, NewTask, Notification, RequestEnvelope, RoutedMessage, Section,
    TaskId, TaskParameters, UserMessage, ValidationError,
};
use crate::ports::TaskStore;
use crate::stix::{StixRegistry, check_stix_objects, sanitize_stix_objects};
use crate::validation::reference_book::ReferenceBookRequest;
use crate::validation::search::{SearchParameters, SearchRequest};

/// Result of dispatching one request.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Registered and handed to the database module.
    Forwarded(TaskId),
    /// Terminal failure; the client was notified.
    Rejected(DispatchError),
    /// No handling path for the section; nothing was registered or sent.
    Dropped,
}

impl DispatchOutcome {
    pub fn task_id(&self) -> Option<TaskId> {
        match self {
            Self::Forwarded(id) => Some(*id),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct RequestDispatcher {
    store: Arc<dyn TaskStore>,
    stix: Arc<StixRegistry>,
    bus: BusHandles,
    reject_invalid_reference_book: bool,
}

impl RequestDispatcher {
    pub fn new(
        store: Arc<dyn TaskStore>,
        stix: Arc<StixRegistry>,
        bus: BusHandles,
        reject_invalid_reference_book: bool,
    ) -> Self {
        Self {
            store,
            stix,
            bus,
            reject_invalid_reference_book,
        }
    }

    pub async fn dispatch(&self, request: ModuleRequest) -> DispatchOutcome {
        let envelope = match RequestEnvelope::decode(&request.data) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!(
                    func = "RequestEnvelope::decode",
                    client_id = %request.client_id,
                    error = %e
                );
                let err = DispatchError::from(e);
                let message = UserMessage::rejected(client_message(&err));
                self.bus
                    .notify(Notification::danger(&request.client_id, message))
                    .await;
                return DispatchOutcome::Rejected(err);
            }
        };

        let section = envelope.section.clone();
        let parameters = match section {
            Section::StixObject => self.prepare_stix_objects(&envelope),
            Section::SearchRequests => self.prepare_search(&envelope),
            Section::ReferenceBook => self.prepare_reference_book(&envelope),
            Section::Unspecified | Section::Other(_) => {
                warn!(
                    func = "RequestDispatcher::dispatch",
                    client_id = %request.client_id,
                    section = %section,
                    "no handling path for section, request dropped"
                );
                return DispatchOutcome::Dropped;
            }
        };

        let result = match parameters {
            Ok(parameters) => self.register_and_route(&request, &envelope, parameters).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(task_id) => {
                info!(
                    func = "RequestDispatcher::dispatch",
                    client_id = %request.client_id,
                    task_id = %task_id,
                    section = %section,
                    "task forwarded"
                );
                DispatchOutcome::Forwarded(task_id)
            }
            Err(err) => {
                error!(
                    func = "RequestDispatcher::dispatch",
                    client_id = %request.client_id,
                    section = %section,
                    error = %err,
                    "request rejected"
                );
                let message = UserMessage::rejected(client_message(&err)).for_section(&section);
                let notification = Notification::danger(&request.client_id, message)
                    .with_task(&envelope.task_id, section);
                self.bus.notify(notification).await;
                DispatchOutcome::Rejected(err)
            }
        }
    }

    fn prepare_stix_objects(
        &self,
        envelope: &RequestEnvelope,
    ) -> Result<TaskParameters, DispatchError> {
        let elements = self.stix.decode_list(envelope.details()?)?;
        check_stix_objects(&elements)?;

        let clean = sanitize_stix_objects(&elements);
        if clean.len() < elements.len() {
            debug!(
                func = "sanitize_stix_objects",
                dropped = elements.len() - clean.len(),
                "elements without content were dropped"
            );
        }
        Ok(TaskParameters::StixObjects(clean))
    }

    fn prepare_search(&self, envelope: &RequestEnvelope) -> Result<TaskParameters, DispatchError> {
        let request = SearchRequest::decode(envelope.details()?)?;

        // SearchRequest::decode は "stix object" のときだけ専用の形を返す
        let request = match request.search_parameters {
            SearchParameters::StixObject(params) => SearchRequest {
                collection_name: request.collection_name,
                search_parameters: SearchParameters::StixObject(params.check_and_sanitize()?),
            },
            SearchParameters::Opaque(_) if request.collection_name.is_empty() => request,
            SearchParameters::Opaque(_) => {
                return Err(
                    ValidationError::InvalidCollectionName(request.collection_name).into(),
                );
            }
        };

        Ok(TaskParameters::Search(request))
    }

    fn prepare_reference_book(
        &self,
        envelope: &RequestEnvelope,
    ) -> Result<TaskParameters, DispatchError> {
        let request = ReferenceBookRequest::decode(envelope.details()?)?;

        if let Err(e) = request.is_valid() {
            if self.reject_invalid_reference_book {
                return Err(e.into());
            }
            warn!(
                func = "ReferenceBookRequest::is_valid",
                error = %e,
                "invalid reference book request accepted"
            );
        }

        Ok(TaskParameters::ReferenceBook(request.sanitize()))
    }

    async fn register_and_route(
        &self,
        request: &ModuleRequest,
        envelope: &RequestEnvelope,
        parameters: TaskParameters,
    ) -> Result<TaskId, DispatchError> {
        let task_id = self
            .store
            .add_new_task(NewTask {
                task_generator: request.module_generator.clone(),
                client_id: request.client_id.clone(),
                client_name: request.client_name.clone(),
                client_task_id: envelope.task_id.clone(),
                user_name: envelope.user_name_generated_task.clone(),
                section: envelope.section.clone(),
                command: String::new(),
                parameters,
            })
            .await?;

        let message = RoutedMessage::to_database(envelope.section.clone(), task_id);
        if let Err(e) = self.bus.route_to_database(message).await {
            // 転送できなかったタスクはレジストリに残さない
            self.store.deleting_task_by_id(task_id).await;
            return Err(e.into());
        }

        Ok(task_id)
    }
}

/// Client-facing text, naming the STIX type when one is at fault.
fn client_message(err: &DispatchError) -> String {
    let stix_type = match err {
        DispatchError::Decode(e) => e.stix_type(),
        DispatchError::Validation(ValidationError::InvalidStixObject { data_type }) => {
            Some(data_type.as_str())
        }
        _ => None,
    };
    match stix_type {
        Some(t) => format!("{} (STIX object type '{t}')", err.user_message()),
        None => err.user_message().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{ModuleEndpoints, RoutingBus};
    use crate::config::CoreConfig;
    use crate::domain::{NotificationType, RegistryError, RoutingError, TaskRecord};
    use crate::impls::InMemoryTaskStore;
    use crate::stix::samples;
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct Fixture {
        dispatcher: RequestDispatcher,
        store: Arc<InMemoryTaskStore>,
        endpoints: ModuleEndpoints,
    }

    fn wire(
        store: Arc<dyn TaskStore>,
        config: &CoreConfig,
    ) -> (RequestDispatcher, ModuleEndpoints) {
        let (bus, endpoints) = RoutingBus::new(config.channel_capacity);
        let (handles, _requests, _reports) = bus.split(config);
        let dispatcher = RequestDispatcher::new(
            store,
            Arc::new(StixRegistry::with_default_types()),
            handles,
            config.reject_invalid_reference_book,
        );
        (dispatcher, endpoints)
    }

    fn fixture(config: CoreConfig) -> Fixture {
        let store = Arc::new(InMemoryTaskStore::new());
        let (dispatcher, endpoints) = wire(store.clone(), &config);
        Fixture {
            dispatcher,
            store,
            endpoints,
        }
    }

    /// Registry whose storage always fails on insert.
    struct BrokenStore;

    #[async_trait]
    impl TaskStore for BrokenStore {
        async fn add_new_task(&self, _task: NewTask) -> Result<TaskId, RegistryError> {
            Err(RegistryError::Storage("disk on fire".into()))
        }

        async fn get_task_by_id(
            &self,
            task_id: TaskId,
        ) -> Result<(TaskId, TaskRecord), RegistryError> {
            Err(RegistryError::NotFound(task_id))
        }

        async fn get_tasks_by_client_id(&self, _client_id: &str) -> Vec<TaskId> {
            Vec::new()
        }

        async fn change_task_status(
            &self,
            task_id: TaskId,
            _status: &str,
        ) -> Result<(), RegistryError> {
            Err(RegistryError::NotFound(task_id))
        }

        async fn change_removal_required_parameter(
            &self,
            task_id: TaskId,
        ) -> Result<(), RegistryError> {
            Err(RegistryError::NotFound(task_id))
        }

        async fn change_date_task_modification(
            &self,
            task_id: TaskId,
        ) -> Result<(), RegistryError> {
            Err(RegistryError::NotFound(task_id))
        }

        async fn deleting_task_by_id(&self, _task_id: TaskId) {}
    }

    fn stix_envelope(task_id: &str) -> Value {
        json!({
            "section": "handling stix object",
            "task_id": task_id,
            "request_details": [samples::sample("mutex")]
        })
    }

    fn roomy() -> CoreConfig {
        CoreConfig {
            channel_capacity: 8,
            ..CoreConfig::default()
        }
    }

    fn request(envelope: Value) -> ModuleRequest {
        ModuleRequest::new(
            "module api request processing",
            "client-1",
            "analyst",
            envelope.to_string(),
        )
    }

    #[tokio::test]
    async fn stix_objects_are_registered_and_forwarded() {
        let mut fx = fixture(roomy());
        let outcome = fx
            .dispatcher
            .dispatch(request(json!({
                "section": "handling stix object",
                "task_id": "client-task-7",
                "request_details": [samples::sample("malware"), samples::sample("ipv4-addr")]
            })))
            .await;

        let task_id = outcome.task_id().unwrap();
        let routed = fx.endpoints.database.input.recv().await.unwrap();
        assert_eq!(routed.app_task_id, task_id);
        assert_eq!(routed.section, Section::StixObject);

        let (_, record) = fx.store.get_task_by_id(task_id).await.unwrap();
        assert_eq!(record.client_task_id, "client-task-7");
        assert_eq!(record.client_name, "analyst");
        assert_eq!(record.command, "");
        assert!(matches!(record.parameters, TaskParameters::StixObjects(ref l) if l.len() == 2));
        assert!(fx.endpoints.api.input.try_recv().is_err());
    }

    #[tokio::test]
    async fn malformed_envelope_is_rejected_without_task() {
        let mut fx = fixture(roomy());
        let outcome = fx
            .dispatcher
            .dispatch(ModuleRequest::new("api", "client-1", "analyst", "{not json"))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Rejected(DispatchError::Decode(_))));
        let note = fx.endpoints.api.input.recv().await.unwrap();
        assert_eq!(note.client_id, "client-1");
        assert_eq!(note.notification_type, NotificationType::Danger);
        assert_eq!(note.message.final_result, UserMessage::TASK_REJECTED);
        assert_eq!(note.message.message, "error decoding the JSON document");
        assert!(note.task_id.is_none());
        assert!(fx.store.is_empty().await);
    }

    #[tokio::test]
    async fn invalid_stix_element_is_named_in_rejection() {
        let mut fx = fixture(roomy());
        let mut broken = samples::sample("url");
        samples::merge(&mut broken, json!({"value": "no such url"}));

        let outcome = fx
            .dispatcher
            .dispatch(request(json!({
                "section": "handling stix object",
                "task_id": "t1",
                "request_details": [samples::sample("tool"), broken]
            })))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Rejected(DispatchError::Validation(_))));
        let note = fx.endpoints.api.input.recv().await.unwrap();
        assert_eq!(note.task_id.as_deref(), Some("t1"));
        assert_eq!(note.section, Some(Section::StixObject));
        assert!(note.message.message.contains("'url'"));
        assert!(fx.store.is_empty().await);
        assert!(fx.endpoints.database.input.try_recv().is_err());
    }

    #[tokio::test]
    async fn search_with_bad_country_is_rejected() {
        let mut fx = fixture(roomy());
        let outcome = fx
            .dispatcher
            .dispatch(request(json!({
                "section": "handling search requests",
                "task_id": "s1",
                "request_details": {
                    "collection_name": "stix object",
                    "search_parameters": {
                        "specific_search_fields": [{
                            "object_type": "location",
                            "search_fields": {"country": "R1"}
                        }]
                    }
                }
            })))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Rejected(_)));
        let note = fx.endpoints.api.input.recv().await.unwrap();
        assert_eq!(note.message.message, "invalid search parameters");
        assert!(fx.store.is_empty().await);
    }

    #[tokio::test]
    async fn search_with_unknown_collection_is_rejected() {
        let mut fx = fixture(roomy());
        let outcome = fx
            .dispatcher
            .dispatch(request(json!({
                "section": "handling search requests",
                "request_details": {"collection_name": "users"}
            })))
            .await;

        assert!(matches!(
            outcome,
            DispatchOutcome::Rejected(DispatchError::Validation(
                ValidationError::InvalidCollectionName(ref name)
            )) if name == "users"
        ));
        let note = fx.endpoints.api.input.recv().await.unwrap();
        assert_eq!(note.message.message, "invalid collection name");
    }

    #[tokio::test]
    async fn search_without_collection_is_forwarded_as_sent() {
        let mut fx = fixture(roomy());
        let outcome = fx
            .dispatcher
            .dispatch(request(json!({
                "section": "handling search requests",
                "request_details": {"search_parameters": {"anything": 1}}
            })))
            .await;

        let task_id = outcome.task_id().unwrap();
        assert!(fx.endpoints.database.input.recv().await.is_some());
        let (_, record) = fx.store.get_task_by_id(task_id).await.unwrap();
        assert!(matches!(
            record.parameters,
            TaskParameters::Search(SearchRequest {
                search_parameters: SearchParameters::Opaque(Some(_)),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn invalid_reference_book_is_advisory_by_default() {
        let mut fx = fixture(roomy());
        let outcome = fx
            .dispatcher
            .dispatch(request(json!({
                "section": "handling reference book",
                "request_details": {"rbook_parameters": [
                    {"op": "add_element", "name": "bad name", "values": []}
                ]}
            })))
            .await;

        assert!(outcome.task_id().is_some());
        assert!(fx.endpoints.database.input.recv().await.is_some());
    }

    #[tokio::test]
    async fn invalid_reference_book_can_be_made_terminal() {
        let mut fx = fixture(CoreConfig {
            reject_invalid_reference_book: true,
            ..roomy()
        });
        let outcome = fx
            .dispatcher
            .dispatch(request(json!({
                "section": "handling reference book",
                "request_details": {"rbook_parameters": []}
            })))
            .await;

        assert!(matches!(outcome, DispatchOutcome::Rejected(DispatchError::Validation(_))));
        assert!(fx.endpoints.api.input.recv().await.is_some());
        assert!(fx.store.is_empty().await);
    }

    #[tokio::test]
    async fn empty_and_unknown_sections_are_dropped_silently() {
        let mut fx = fixture(roomy());
        for envelope in [json!({"task_id": "x"}), json!({"section": "handling cats"})] {
            let outcome = fx.dispatcher.dispatch(request(envelope)).await;
            assert!(matches!(outcome, DispatchOutcome::Dropped));
        }
        assert!(fx.store.is_empty().await);
        assert!(fx.endpoints.api.input.try_recv().is_err());
        assert!(fx.endpoints.database.input.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn routing_timeout_removes_the_task_and_notifies() {
        let mut fx = fixture(CoreConfig {
            channel_capacity: 1,
            routing_timeout_ms: 100,
            ..CoreConfig::default()
        });
        let envelope = stix_envelope("t1");

        // 1 件目でデータベース側のチャネルが埋まる
        assert!(fx.dispatcher.dispatch(request(envelope.clone())).await.task_id().is_some());
        let outcome = fx.dispatcher.dispatch(request(envelope)).await;

        assert!(matches!(
            outcome,
            DispatchOutcome::Rejected(DispatchError::Routing(RoutingError::Timeout { .. }))
        ));
        assert_eq!(fx.store.len().await, 1);
        let note = fx.endpoints.api.input.recv().await.unwrap();
        assert_eq!(note.message.message, "the request could not be passed on for processing");
    }

    #[tokio::test]
    async fn storage_fault_rejects_without_routing() {
        let config = roomy();
        let (dispatcher, mut endpoints) = wire(Arc::new(BrokenStore), &config);

        let outcome = dispatcher.dispatch(request(stix_envelope("t9"))).await;

        assert!(matches!(
            outcome,
            DispatchOutcome::Rejected(DispatchError::Registration(RegistryError::Storage(_)))
        ));
        let note = endpoints.api.input.recv().await.unwrap();
        assert_eq!(note.notification_type, NotificationType::Danger);
        assert_eq!(note.task_id.as_deref(), Some("t9"));
        assert_eq!(note.message.final_result, UserMessage::TASK_REJECTED);
        assert_eq!(
            note.message.message,
            "unable to save the request parameters in temporary storage"
        );
        assert!(endpoints.database.input.try_recv().is_err());
    }

    #[tokio::test]
    async fn closed_database_channel_removes_the_task() {
        let mut fx = fixture(roomy());
        drop(fx.endpoints.database);

        let outcome = fx.dispatcher.dispatch(request(stix_envelope("t2"))).await;

        assert!(matches!(
            outcome,
            DispatchOutcome::Rejected(DispatchError::Routing(RoutingError::Closed(_)))
        ));
        assert!(fx.store.is_empty().await);
        assert!(fx.store.get_tasks_by_client_id("client-1").await.is_empty());
        let note = fx.endpoints.api.input.recv().await.unwrap();
        assert_eq!(note.task_id.as_deref(), Some("t2"));
        assert_eq!(note.message.message, "the request could not be passed on for processing");
    }
}
