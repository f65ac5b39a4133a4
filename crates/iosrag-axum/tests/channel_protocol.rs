//! Integration tests for the client channel protocol.
//!
//! Each test registers in-memory clients and feeds text frames through the
//! request router exactly as the WebSocket worker does.

mod common;

use serde_json::{Value, json};

use common::{TestClient, terminal_count, test_app, types, updates};
use iosrag_axum::INVALID_JSON_MESSAGE;
use iosrag_core::services::StageStatus;

fn last(messages: &[Value]) -> &Value {
    messages.last().expect("at least one message")
}

#[tokio::test]
async fn unknown_action_names_the_action_and_keeps_serving() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client.send(&app.ctx, "bogus", json!({})).await;
    let messages = client.drain();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["type"], "error");
    assert!(messages[0]["message"].as_str().unwrap().contains("bogus"));
    assert!(messages[0]["timestamp"].is_string());

    client.send(&app.ctx, "get_pipeline_status", json!({})).await;
    assert_eq!(types(&client.drain()), vec!["pipeline_status"]);
}

#[tokio::test]
async fn invalid_json_is_reported_without_closing() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client.send_raw(&app.ctx, "{not json").await;
    client.send_raw(&app.ctx, r#"{"data": {}}"#).await;
    let messages = client.drain();
    assert_eq!(types(&messages), vec!["error", "error"]);
    assert!(messages.iter().all(|m| m["message"] == INVALID_JSON_MESSAGE));
    assert!(app.ctx.registry.lookup("c1").is_some());
}

#[tokio::test]
async fn discovery_ranks_at_most_max_documents() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(
            &app.ctx,
            "document_discovery",
            json!({"topic": "bgp", "max_documents": 2}),
        )
        .await;
    let messages = client.drain();
    assert_eq!(messages[0]["type"], "discovery_status");
    assert_eq!(messages[0]["status"], "starting");

    let progress: Vec<f64> = updates(&messages)
        .iter()
        .map(|m| m["progress"].as_f64().unwrap())
        .collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "{progress:?}");
    assert_eq!(terminal_count(&messages), 1);

    let done = last(&messages);
    assert_eq!(done["type"], "discovery_update");
    assert_eq!(done["status"], "completed");
    assert_eq!(done["progress"], 100.0);

    let documents = done["documents"].as_array().unwrap();
    assert!(!documents.is_empty() && documents.len() <= 2);
    let ranks: Vec<u64> = documents.iter().map(|d| d["rank"].as_u64().unwrap()).collect();
    assert_eq!(ranks, (1..=documents.len() as u64).collect::<Vec<_>>());
    let relevance: Vec<f64> = documents
        .iter()
        .map(|d| d["relevance"].as_f64().unwrap())
        .collect();
    assert!(relevance.windows(2).all(|w| w[0] >= w[1]));
    for doc in documents {
        assert!(doc["url"].as_str().unwrap().contains("bgp"), "{doc}");
        assert!(doc["discovered_at"].is_string());
    }

    // Every message of the run shares one operation id.
    let ids: Vec<&Value> = updates(&messages).iter().map(|m| &m["operation_id"]).collect();
    assert!(ids.iter().all(|id| *id == ids[0]));
}

#[tokio::test]
async fn discovery_without_topic_is_an_input_error() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client.send(&app.ctx, "document_discovery", json!({})).await;
    let messages = client.drain();
    assert_eq!(types(&messages), vec!["error"]);
    assert!(
        messages[0]["message"]
            .as_str()
            .unwrap()
            .starts_with("Discovery error")
    );
}

#[tokio::test]
async fn activating_a_key_leaves_exactly_one_active() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "admin");
    let mut watcher = TestClient::connect(&app.ctx, "watcher");

    client
        .send(
            &app.ctx,
            "system_config",
            json!({
                "request": "save_api_key",
                "key_data": {"provider": "groq", "name": "A", "value": "gsk_aaaaaaaaaaaa1111", "active": true},
            }),
        )
        .await;
    client
        .send(
            &app.ctx,
            "system_config",
            json!({
                "request": "save_api_key",
                "key_data": {"provider": "groq", "name": "B", "value": "gsk_bbbbbbbbbbbb2222"},
            }),
        )
        .await;
    let saved = client.drain();
    assert_eq!(types(&saved), vec!["config_updated", "config_changed", "config_updated", "config_changed"]);
    let key_b = saved[2]["result"]["key"]["id"].as_str().unwrap().to_string();
    assert_eq!(saved[2]["result"]["key"]["value"], "gsk_****2222");

    client
        .send(
            &app.ctx,
            "system_config",
            json!({"request": "set_active_api_key", "key_id": key_b}),
        )
        .await;
    client
        .send(&app.ctx, "system_config", json!({"request": "get_api_keys"}))
        .await;
    let messages = client.drain();
    let keys = last(&messages)["result"]["api_keys"].as_array().unwrap();
    let active: Vec<&Value> = keys.iter().filter(|k| k["active"] == true).collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["id"], key_b.as_str());

    // Mutations are broadcast; reads are not.
    let seen = watcher.drain();
    assert_eq!(types(&seen), vec!["config_changed"; 3]);

    // Persisted as a whole blob on disk.
    let stored: Value = serde_json::from_str(
        &std::fs::read_to_string(app.dir.path().join("config.json")).unwrap(),
    )
    .unwrap();
    let stored_active = stored["api_key_list"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|k| k["active"] == true)
        .count();
    assert_eq!(stored_active, 1);
}

#[tokio::test]
async fn unknown_key_id_is_a_config_error() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(
            &app.ctx,
            "system_config",
            json!({"request": "delete_api_key", "key_id": "missing"}),
        )
        .await;
    client
        .send(&app.ctx, "system_config", json!({"request": "set_active_api_key"}))
        .await;
    let messages = client.drain();
    assert_eq!(types(&messages), vec!["error", "error"]);
    assert!(messages[0]["message"].as_str().unwrap().starts_with("Config error"));
    assert!(messages[1]["message"].as_str().unwrap().contains("key_id"));
}

#[tokio::test]
async fn config_update_is_validated() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(
            &app.ctx,
            "system_config",
            json!({"request": "update_config", "llm_config": {"ollama_config": {"endpoint": "localhost:11434"}}}),
        )
        .await;
    client
        .send(
            &app.ctx,
            "system_config",
            json!({"operation_mode": "offline"}),
        )
        .await;
    let messages = client.drain();
    assert_eq!(messages[0]["type"], "error");
    let updated = messages.iter().find(|m| m["type"] == "config_updated").unwrap();
    assert_eq!(updated["result"]["config"]["operation_mode"], "offline");
}

#[tokio::test]
async fn local_files_skip_broken_inputs() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("r1.cfg");
    let notes = dir.path().join("notes.md");
    let broken = dir.path().join("broken.pdf");
    std::fs::write(&good, "hostname R1\nrouter ospf 1\n").unwrap();
    std::fs::write(&notes, "# OSPF notes").unwrap();
    std::fs::write(&broken, "not a pdf").unwrap();

    client
        .send(
            &app.ctx,
            "process_local_files",
            json!({"files": [good, {"name": "Notes", "path": notes}, broken]}),
        )
        .await;
    let messages = client.drain();
    assert_eq!(messages[0]["type"], "local_files_status");
    let done = last(&messages);
    assert_eq!(done["type"], "local_files_update");
    assert_eq!(done["status"], "completed");
    assert_eq!(done["count"], 2);
    assert_eq!(done["skipped"].as_array().unwrap().len(), 1);
    assert_eq!(done["skipped"][0]["name"], "broken.pdf");
    assert_eq!(done["files"][1]["name"], "Notes");

    assert_eq!(
        app.ctx.core.repository().local_files().await.unwrap().len(),
        2
    );
}

#[tokio::test]
async fn stage2_without_files_is_rejected() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(&app.ctx, "pipeline_stage2", json!({"pdf_files": []}))
        .await;
    let messages = client.drain();
    assert_eq!(types(&messages), vec!["error"]);
    assert!(
        messages[0]["message"]
            .as_str()
            .unwrap()
            .contains("No PDF files provided for Stage 2")
    );
}

#[tokio::test]
async fn stage2_unknown_phase_falls_back_to_phase_one() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(
            &app.ctx,
            "pipeline_stage2",
            json!({"pdf_files": ["a.pdf", "b.pdf"], "output_phase": 9}),
        )
        .await;
    let messages = client.drain();
    assert_eq!(messages[0]["type"], "pipeline_stage2_status");

    let done = last(&messages);
    assert_eq!(done["type"], "pipeline_stage2_update");
    assert_eq!(done["status"], "completed");
    assert_eq!(done["output_phase"], 1);
    assert_eq!(done["processed_files"], 2);
    assert_eq!(done["steps"].as_array().unwrap().len(), 20);
    assert!(
        done["steps"][0]["label"]
            .as_str()
            .unwrap()
            .starts_with("[File 1/2: a.pdf]")
    );

    let examples: Vec<u64> = updates(&messages)
        .iter()
        .map(|m| m["synthetic_examples"].as_u64().unwrap())
        .collect();
    assert!(examples.windows(2).all(|w| w[0] <= w[1]));
    assert!(*examples.last().unwrap() > 0);

    client.send(&app.ctx, "get_pipeline_status", json!({})).await;
    let status = client.drain();
    assert_eq!(status[0]["result"]["stage2"]["status"], "completed");

    client.send(&app.ctx, "reset_pipeline", json!({})).await;
    let reset = client.drain();
    assert_eq!(reset[0]["result"]["stage2"]["status"], "idle");
}

#[tokio::test]
async fn stage1_reports_discovered_pdfs() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(&app.ctx, "pipeline_stage1", json!({"topic": "routing"}))
        .await;
    let messages = client.drain();
    let done = last(&messages);
    assert_eq!(done["status"], "completed");
    assert_eq!(done["stage"], 1);
    assert_eq!(done["documents_found"], 4);
    assert_eq!(done["discovered_pdfs"].as_array().unwrap().len(), 4);
    assert_eq!(done["steps"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn download_twice_short_circuits_as_duplicate() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");
    let document = json!({
        "title": "BGP Configuration Guide",
        "source": "cisco.com",
        "url": "https://cisco.com/bgp-configuration-guide.pdf",
        "size": "2.4 MB",
    });

    for _ in 0..2 {
        client
            .send(
                &app.ctx,
                "download_document",
                json!({"document_id": "doc-1", "document": document}),
            )
            .await;
    }
    let messages = client.drain();
    assert!(messages.iter().all(|m| m["type"] == "document_download_update"));

    let terminals: Vec<&Value> = messages
        .iter()
        .filter(|m| m["status"] == "completed")
        .collect();
    assert_eq!(terminals.len(), 2);
    assert_eq!(terminals[0]["duplicate"], false);
    assert_eq!(terminals[0]["download_status"], "completed");
    assert_eq!(terminals[1]["duplicate"], true);
    assert_eq!(terminals[1]["document_id"], "doc-1");
}

#[tokio::test]
async fn download_without_document_fails_on_its_stream() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(&app.ctx, "download_document", json!({"document_id": "doc-1"}))
        .await;
    let messages = client.drain();
    assert_eq!(messages.len(), 1);
    let failed = &messages[0];
    assert_eq!(failed["type"], "document_download_update");
    assert_eq!(failed["status"], "error");
    assert_eq!(failed["download_status"], "failed");
    assert!(failed["error"].is_string());
}

#[tokio::test]
async fn search_results_are_recorded_in_history() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(
            &app.ctx,
            "document_search",
            json!({"query": "BGP", "relevance_threshold": 0, "save_as": "bgp docs"}),
        )
        .await;
    let messages = client.drain();
    assert_eq!(messages[0]["type"], "search_status");
    assert!(messages[1..messages.len() - 1].iter().all(|m| m["type"] == "search_update"));
    let done = last(&messages);
    assert_eq!(done["type"], "search_results");
    assert_eq!(done["status"], "completed");
    assert_eq!(done["query"], "BGP");

    client.send(&app.ctx, "get_search_history", json!({"limit": 5})).await;
    client.send(&app.ctx, "get_saved_searches", json!({})).await;
    let replies = client.drain();
    assert_eq!(types(&replies), vec!["search_history", "saved_searches"]);
    assert_eq!(replies[0]["result"].as_array().unwrap().len(), 1);
    assert_eq!(replies[0]["result"][0]["query"], "BGP");
    assert_eq!(replies[1]["result"][0]["name"], "bgp docs");
}

#[tokio::test]
async fn ai_agent_flags_results_as_new() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(&app.ctx, "ai_agent", json!({"query": "ospf area design"}))
        .await;
    let messages = client.drain();
    assert_eq!(messages[0]["type"], "ai_agent_status");
    let done = last(&messages);
    assert_eq!(done["type"], "ai_agent_update");
    assert_eq!(done["status"], "completed");
    let results = done["results"].as_array().unwrap();
    assert!(!results.is_empty());
    for doc in results {
        assert_eq!(doc["is_new"], true);
        assert_eq!(doc["download_status"], "pending");
    }
}

#[tokio::test]
async fn one_shot_queries() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client.send(&app.ctx, "get_status", json!({})).await;
    client.send(&app.ctx, "test_llm_connection", json!({})).await;
    client.send(&app.ctx, "check_document_updates", json!({})).await;
    client
        .send(&app.ctx, "get_search_suggestions", json!({"query": "BGP"}))
        .await;
    client
        .send(&app.ctx, "get_document_content", json!({"document_id": "1"}))
        .await;
    let messages = client.drain();
    assert_eq!(
        types(&messages),
        vec![
            "system_status",
            "llm_test_results",
            "document_updates_checked",
            "search_suggestions",
            "document_content",
        ]
    );

    assert_eq!(messages[0]["status"]["connections"], 1);
    assert_eq!(messages[1]["provider"], "groq");
    assert_eq!(messages[1]["results"].as_array().unwrap().len(), 4);
    assert_eq!(messages[1]["success_rate"], 1.0);
    assert_eq!(messages[2]["result"]["checked"], 0);
    for suggestion in messages[3]["suggestions"].as_array().unwrap() {
        assert!(suggestion.as_str().unwrap().to_lowercase().contains("bgp"));
    }
    assert!(messages[4]["result"]["content"].is_string());
}

#[tokio::test]
async fn one_shot_input_errors() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(&app.ctx, "get_document_content", json!({"document_id": "999"}))
        .await;
    client.send(&app.ctx, "get_document_content", json!({})).await;
    client
        .send(
            &app.ctx,
            "advanced_search",
            json!({"query": "bgp", "date_range": "last_century"}),
        )
        .await;
    client
        .send(&app.ctx, "get_search_history", json!({"limit": "lots"}))
        .await;
    let messages = client.drain();
    assert_eq!(types(&messages), vec!["error"; 4]);
    assert!(messages[0]["message"].as_str().unwrap().starts_with("Document content error"));
    assert!(messages[1]["message"].as_str().unwrap().contains("document_id"));
    assert!(messages[2]["message"].as_str().unwrap().starts_with("Advanced search error"));
    assert!(messages[3]["message"].as_str().unwrap().contains("Invalid request data"));
}

#[tokio::test]
async fn advanced_search_returns_facets() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(
            &app.ctx,
            "advanced_search",
            json!({"query": "", "facets": {}, "sort_by": "title"}),
        )
        .await;
    let messages = client.drain();
    assert_eq!(types(&messages), vec!["advanced_search_results"]);
    let result = &messages[0]["result"];
    assert_eq!(result["total"], 4);
    assert_eq!(result["sort_by"], "title");
    assert!(result["facets"].is_object());
}

#[tokio::test]
async fn operations_stop_when_the_client_goes_away() {
    let app = test_app().await;
    let client = TestClient::connect(&app.ctx, "c1");

    app.ctx.registry.unregister("c1");
    client
        .send(&app.ctx, "pipeline_stage1", json!({"topic": "bgp"}))
        .await;

    // Cancelled before the first step, so the stage never finishes.
    let stage1 = app.ctx.core.pipeline().snapshot().stage1;
    assert_ne!(stage1.status, StageStatus::Completed);
    assert_eq!(stage1.documents_found, 0);
}

#[tokio::test]
async fn out_of_range_inputs_complete_and_keep_serving() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    for phase in [json!(-3), json!(i64::MAX)] {
        client
            .send(
                &app.ctx,
                "pipeline_stage2",
                json!({"pdf_files": ["a.pdf"], "output_phase": phase}),
            )
            .await;
        let messages = client.drain();
        let done = last(&messages);
        assert_eq!(done["status"], "completed");
        assert_eq!(done["output_phase"], 1);
        assert_eq!(done["steps"].as_array().unwrap().len(), 10);
    }

    client
        .send(&app.ctx, "ai_agent", json!({"query": "qos", "max_documents": u64::MAX}))
        .await;
    let messages = client.drain();
    let done = last(&messages);
    assert_eq!(done["type"], "ai_agent_update");
    assert_eq!(done["status"], "completed");
    assert!(done["results"].as_array().unwrap().len() <= 12);

    client
        .send(
            &app.ctx,
            "document_discovery",
            json!({"topic": "vpn", "max_documents": u64::MAX}),
        )
        .await;
    let messages = client.drain();
    assert_eq!(last(&messages)["status"], "completed");

    client.send(&app.ctx, "get_pipeline_status", json!({})).await;
    assert_eq!(types(&client.drain()), vec!["pipeline_status"]);
}

#[tokio::test]
async fn unrecognized_config_request_applies_as_update() {
    let app = test_app().await;
    let mut client = TestClient::connect(&app.ctx, "c1");

    client
        .send(
            &app.ctx,
            "system_config",
            json!({"request": "get_confg", "operation_mode": "offline"}),
        )
        .await;
    let messages = client.drain();
    assert_eq!(types(&messages), vec!["config_updated", "config_changed"]);
    assert_eq!(messages[0]["result"]["config"]["operation_mode"], "offline");
}

#[tokio::test]
async fn replaced_session_does_not_answer_its_successor() {
    let app = test_app().await;
    let mut stale = TestClient::connect(&app.ctx, "c1");
    let mut current = TestClient::connect(&app.ctx, "c1");

    stale.send(&app.ctx, "get_pipeline_status", json!({})).await;
    stale.send(&app.ctx, "bogus_action", json!({})).await;
    assert!(current.drain().is_empty());
    assert!(stale.drain().is_empty());

    current.send(&app.ctx, "get_pipeline_status", json!({})).await;
    assert_eq!(types(&current.drain()), vec!["pipeline_status"]);
}
