use std::collections::HashSet;
use std::time::Duration;

use serde_json::{Value, json};
use tiroute_core::app::CoreBuilder;
use tiroute_core::config::CoreConfig;
use tiroute_core::domain::message::MODULE_DATABASE;
use tiroute_core::domain::{
    ModuleReport, ModuleRequest, NotificationType, ReportNotification, Section, TaskParameters,
    UserMessage,
};

const UUID: &str = "8e2e2d2b-17d4-4cbf-938f-98ee46b3cd3f";

fn malware(name: &str) -> Value {
    json!({
        "type": "malware",
        "spec_version": "2.1",
        "id": format!("malware--{UUID}"),
        "created": "2024-01-01T00:00:00Z",
        "modified": "2024-01-01T00:00:00Z",
        "name": name,
        "is_family": true
    })
}

fn request(client_id: &str, envelope: Value) -> ModuleRequest {
    ModuleRequest::new(
        "module api request processing",
        client_id,
        "analyst",
        envelope.to_string(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn requests_flow_through_core_and_database_module() {
    let config = CoreConfig {
        channel_capacity: 4,
        ..CoreConfig::default()
    };
    let (core, endpoints) = CoreBuilder::new(config)
        .expect_stix_types(&["malware", "ipv4-addr"])
        .build()
        .unwrap();
    let store = core.store();
    let core_task = tokio::spawn(core.run());

    // データベースモジュール: 受け取ったタスクを確認して完了報告
    let mut database = endpoints.database;
    let db_store = store.clone();
    let db_task = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(routed) = database.input.recv().await {
            let (_, record) = db_store.get_task_by_id(routed.app_task_id).await.unwrap();
            seen.push((routed.section.clone(), record.client_id.clone()));
            if let TaskParameters::StixObjects(objects) = &record.parameters {
                assert_eq!(objects.len(), 2);
            }
            database
                .output
                .send(ModuleReport {
                    generator_module: MODULE_DATABASE.to_string(),
                    app_task_id: routed.app_task_id,
                    status: "completed".to_string(),
                    removal_required: true,
                    notification: Some(ReportNotification {
                        notification_type: NotificationType::Success,
                        final_result: "task completed".to_string(),
                        message: "stored".to_string(),
                    }),
                })
                .await
                .unwrap();
        }
        seen
    });

    let mut api = endpoints.api;
    let requests = vec![
        request(
            "alice",
            json!({
                "section": "handling stix object",
                "task_id": "a-1",
                "request_details": [
                    malware("Poison Ivy"),
                    {
                        "type": "ipv4-addr",
                        "id": format!("ipv4-addr--{UUID}"),
                        "value": "198.51.100.7"
                    }
                ]
            }),
        ),
        request(
            "bob",
            json!({
                "section": "handling search requests",
                "task_id": "b-1",
                "request_details": {
                    "collection_name": "stix object",
                    "search_parameters": {"documents_type": ["malware"]}
                }
            }),
        ),
        request("carol", json!({"section": "handling stix object", "request_details": 17})),
        request("dave", json!({"section": ""})),
    ];
    for req in requests {
        api.output.send(req).await.unwrap();
    }

    let mut notifications = Vec::new();
    while notifications.len() < 3 {
        let note = tokio::time::timeout(Duration::from_secs(5), api.input.recv())
            .await
            .expect("notification in time")
            .expect("core still running");
        notifications.push(note);
    }

    drop(api.output);
    let summary = core_task.await.unwrap();
    let seen = db_task.await.unwrap();

    assert_eq!(summary.forwarded, 2);
    assert_eq!(summary.rejected, 1);
    assert_eq!(summary.dropped, 1);
    assert_eq!(summary.reports, 2);

    let sections: HashSet<_> = seen.iter().map(|(s, _)| s.clone()).collect();
    assert_eq!(
        sections,
        HashSet::from([Section::StixObject, Section::SearchRequests])
    );

    let rejected: Vec<_> = notifications
        .iter()
        .filter(|n| n.notification_type == NotificationType::Danger)
        .collect();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].client_id, "carol");
    assert_eq!(rejected[0].message.final_result, UserMessage::TASK_REJECTED);

    let successes: HashSet<_> = notifications
        .iter()
        .filter(|n| n.notification_type == NotificationType::Success)
        .map(|n| n.client_id.as_str())
        .collect();
    assert_eq!(successes, HashSet::from(["alice", "bob"]));

    // 完了報告で全タスクが取り除かれている
    assert!(store.get_tasks_by_client_id("alice").await.is_empty());
    assert!(store.get_tasks_by_client_id("bob").await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_concurrent_clients_get_distinct_tasks() {
    let config = CoreConfig {
        channel_capacity: 16,
        ..CoreConfig::default()
    };
    let (core, endpoints) = CoreBuilder::new(config).build().unwrap();
    let core_task = tokio::spawn(core.run());

    let mut database = endpoints.database;
    let db_task = tokio::spawn(async move {
        let mut ids = HashSet::new();
        while let Some(routed) = database.input.recv().await {
            ids.insert(routed.app_task_id);
        }
        ids
    });

    let mut api = endpoints.api;
    let sender = api.output.clone();
    let mut producers = Vec::new();
    for n in 0..64 {
        let sender = sender.clone();
        producers.push(tokio::spawn(async move {
            let envelope = json!({
                "section": "handling stix object",
                "task_id": format!("t-{n}"),
                "request_details": [malware(&format!("family-{n}"))]
            });
            sender.send(request(&format!("client-{n}"), envelope)).await.unwrap();
        }));
    }
    for producer in producers {
        producer.await.unwrap();
    }
    drop(sender);
    drop(api.output);

    let summary = core_task.await.unwrap();
    let ids = db_task.await.unwrap();
    assert_eq!(summary.forwarded, 64);
    assert_eq!(ids.len(), 64);
    assert!(api.input.try_recv().is_err());
}
