use std::sync::{Arc, Mutex};

use bidwriter::application::{
    ApiError, AuthSession, ClientEvent, CompareChapterVersions, CompareChapterVersionsHandler,
    ContentGenerationPort, DraftCache, EventSinkPort, GenerateChapterContentsCommand,
    GenerateChapterContentsHandler, KeyValueStorePort, StreamEvent, TokenPair,
};
use bidwriter::application::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use bidwriter::domain::{Outline, OutlineItem};
use bidwriter::infrastructure::http::dto::{ChapterStatus, MemberRole};
use bidwriter::infrastructure::http::CHAPTER_STREAM_PATH;
use bidwriter::infrastructure::{ApiClient, ApiClientConfig, InMemoryKeyValueStore};
use futures_util::StreamExt;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, header_regex, method, path, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<ClientEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<ClientEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSinkPort for TestSink {
    fn publish(&self, event: ClientEvent) {
        self.events.lock().unwrap().push(event);
    }
}

struct Harness {
    client: Arc<ApiClient>,
    session: Arc<AuthSession>,
    store: Arc<InMemoryKeyValueStore>,
    sink: Arc<TestSink>,
}

fn harness(server: &MockServer, logged_in: bool) -> Harness {
    let store = InMemoryKeyValueStore::new().arc();
    let sink = Arc::new(TestSink::default());
    let session = AuthSession::restore(store.clone(), sink.clone()).arc();
    if logged_in {
        session.login(TokenPair::new("old", "r1"), None).unwrap();
    }
    let client = ApiClient::new(ApiClientConfig::new(server.uri()), session.clone())
        .unwrap()
        .arc();
    Harness {
        client,
        session,
        store,
        sink,
    }
}

fn user_json() -> serde_json::Value {
    json!({
        "id": "6f1c2d4e-8a3b-4c5d-9e7f-0a1b2c3d4e5f",
        "username": "张三",
        "email": "zhangsan@example.com",
        "role": "editor",
        "is_active": true,
        "created_at": "2024-05-01T08:00:00Z",
        "updated_at": "2024-05-01T08:00:00Z"
    })
}

fn sse(lines: &[&str]) -> ResponseTemplate {
    let body: String = lines.iter().map(|l| format!("data: {}\n\n", l)).collect();
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

fn login_required_count(events: &[ClientEvent]) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, ClientEvent::LoginRequired))
        .count()
}

#[tokio::test]
async fn login_stores_tokens_and_profile() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_partial_json(json!({"username": "zhangsan"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "a1",
            "refresh_token": "r1",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/auth/me"))
        .and(header("Authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, false);
    let user = h.client.login(" zhangsan ", "password123").await.unwrap();

    assert_eq!(user.username, "张三");
    assert!(h.session.is_authenticated());
    assert_eq!(h.session.user().map(|u| u.email), Some("zhangsan@example.com".to_string()));
    assert_eq!(h.store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("a1"));
    assert_eq!(h.store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r1"));
}

#[tokio::test]
async fn register_validates_before_request() {
    let server = MockServer::start().await;
    let h = harness(&server, false);

    let err = h
        .client
        .register("张三", "zhangsan@example.com", "short")
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn request_without_credentials_is_not_sent() {
    let server = MockServer::start().await;
    let h = harness(&server, false);

    let err = h.client.list_projects().await.unwrap_err();
    assert_eq!(err, ApiError::NotAuthenticated);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unauthorized_refreshes_once_and_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .and(header("Authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "令牌已过期"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .and(header("Authorization", "Bearer new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_partial_json(json!({"refresh_token": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new",
            "refresh_token": "r2",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let projects = h.client.list_projects().await.unwrap();

    assert!(projects.is_empty());
    assert_eq!(h.session.access_token().as_deref(), Some("new"));
    assert_eq!(h.store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r2"));
    assert!(h.sink.take().is_empty());
}

#[tokio::test]
async fn failed_refresh_expires_session_with_single_signal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "令牌已过期"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "无效的刷新令牌"})))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let drafts = DraftCache::new(h.store.clone());
    drafts.upsert("1.1", "草稿").unwrap();

    let (a, b) = tokio::join!(h.client.list_projects(), h.client.list_projects());

    assert!(a.unwrap_err().is_unauthorized());
    assert!(b.unwrap_err().is_unauthorized());
    assert!(!h.session.is_authenticated());
    assert!(h.store.get(ACCESS_TOKEN_KEY).unwrap().is_none());
    assert!(drafts.load().is_empty());
    assert_eq!(login_required_count(&h.sink.take()), 1);
}

#[tokio::test]
async fn retry_still_unauthorized_expires_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "无权限"})))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new",
            "refresh_token": "r2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let err = h.client.list_projects().await.unwrap_err();

    assert_eq!(err, ApiError::Unauthorized("无权限".to_string()));
    assert!(!h.session.is_authenticated());
    assert_eq!(login_required_count(&h.sink.take()), 1);
}

#[tokio::test]
async fn http_error_detail_surfaces() {
    let server = MockServer::start().await;
    let chapter_id = Uuid::new_v4();
    Mock::given(method("GET"))
        .and(path(format!("/api/chapters/{}", chapter_id)))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "章节不存在"})))
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let err = h.client.get_chapter(chapter_id).await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Status {
            status: 404,
            message: "章节不存在".to_string()
        }
    );
}

#[tokio::test]
async fn chapter_stream_yields_cumulative_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAPTER_STREAM_PATH))
        .and(header("Authorization", "Bearer old"))
        .and(body_partial_json(json!({
            "chapter": {"id": "1.1"},
            "parent_chapters": [{"id": "1", "title": "技术方案", "description": ""}]
        })))
        .respond_with(sse(&[
            r#"{"status":"streaming","full_content":"Hel"}"#,
            r#"{"status":"streaming","full_content":"Hello"}"#,
            r#"{"status":"completed","content":"Hello world"}"#,
        ]))
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let outline = Outline::new(vec![OutlineItem::new("1", "技术方案")
        .with_children(vec![OutlineItem::new("1.1", "总体设计"), OutlineItem::new("1.2", "实施计划")])])
    .unwrap();
    let leaf = outline.find("1.1").unwrap();

    let request = bidwriter::application::ChapterGenerationRequest {
        chapter: leaf.as_ref_item(),
        context: outline.context_for("1.1").unwrap(),
        project_overview: "智慧园区".to_string(),
    };
    let events: Vec<_> = h
        .client
        .generate_chapter_stream(request)
        .await
        .unwrap()
        .collect()
        .await;

    let events: Vec<_> = events.into_iter().map(Result::unwrap).collect();
    assert_eq!(
        events,
        vec![
            StreamEvent::Partial("Hel".to_string()),
            StreamEvent::Partial("Hello".to_string()),
            StreamEvent::Complete("Hello world".to_string()),
        ]
    );
}

#[tokio::test]
async fn generation_over_http_merges_contents_and_drafts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAPTER_STREAM_PATH))
        .and(body_partial_json(json!({"chapter": {"id": "1.1"}})))
        .respond_with(sse(&[
            r#"{"status":"streaming","full_content":"设计"}"#,
            r#"{"status":"completed","content":"设计正文"}"#,
        ]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CHAPTER_STREAM_PATH))
        .and(body_partial_json(json!({"chapter": {"id": "1.2"}})))
        .respond_with(sse(&[r#"{"status":"error","message":"模型超时"}"#]))
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let drafts = Arc::new(DraftCache::new(h.store.clone()));
    let handler = GenerateChapterContentsHandler::new(h.client.clone(), drafts.clone(), h.sink.clone());

    let outline = Outline::new(vec![OutlineItem::new("1", "技术方案")
        .with_children(vec![OutlineItem::new("1.1", "总体设计"), OutlineItem::new("1.2", "实施计划")])])
    .unwrap();
    let response = handler
        .handle(GenerateChapterContentsCommand {
            outline,
            project_overview: "智慧园区".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.progress.total, 2);
    assert_eq!(response.progress.completed, 2);
    assert_eq!(response.progress.failed, vec!["实施计划".to_string()]);
    assert_eq!(
        response.outline.find("1.1").unwrap().content.as_deref(),
        Some("设计正文")
    );
    assert_eq!(drafts.load().get("1.1").map(String::as_str), Some("设计正文"));
    assert!(!drafts.load().contains_key("1.2"));
}

#[tokio::test]
async fn proofread_stream_returns_result() {
    let server = MockServer::start().await;
    let chapter_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path(format!("/api/chapters/{}/proofread-stream", chapter_id)))
        .respond_with(sse(&[
            r#"{"chunk": "正在校对"}"#,
            r#"{"done": true, "result": {"summary": "发现1个问题", "issues": [{"severity": "warning", "category": "language", "position": "第1段", "issue": "表达不当", "suggestion": "修改表述"}]}}"#,
        ]))
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let events: Vec<_> = h.client.proofread_stream(chapter_id).await.unwrap().collect().await;

    assert_eq!(events.len(), 2);
    match events.last() {
        Some(Ok(StreamEvent::Complete(result))) => {
            assert_eq!(result.issues.len(), 1);
            assert_eq!(result.critical_count(), 0);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn outline_generation_skips_heartbeats() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/outline/generate"))
        .respond_with(sse(&[
            r#"{"chunk": ""}"#,
            r#"{"chunk": "{\"outline\": [{\"id\": \"1\", \"title\": \"技术方案\", "}"#,
            r#"{"chunk": "\"children\": [{\"id\": \"1.1\", \"title\": \"总体设计\"}]}]}"}"#,
            "[DONE]",
        ]))
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let outline = h
        .client
        .generate_outline(&bidwriter::infrastructure::http::dto::OutlineRequest {
            overview: "智慧园区".to_string(),
            requirements: "技术评分".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(outline.collect_leaf_items().len(), 1);
    assert_eq!(outline.find("1.1").unwrap().title, "总体设计");
}

#[tokio::test]
async fn export_returns_document_bytes() {
    let server = MockServer::start().await;
    let docx = vec![0x50, 0x4b, 0x03, 0x04, 0x14];
    Mock::given(method("POST"))
        .and(path("/api/document/export-word"))
        .and(body_partial_json(json!({"project_name": "智慧园区"})))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            docx.clone(),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ))
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let outline = Outline::new(vec![OutlineItem::new("1", "技术方案")]).unwrap();
    let bytes = h.client.export_word("智慧园区", "", &outline).await.unwrap();

    assert_eq!(bytes, docx);
}

#[tokio::test]
async fn compare_versions_over_http() {
    let server = MockServer::start().await;
    let project_id = Uuid::new_v4();
    let (v1, v2) = (Uuid::new_v4(), Uuid::new_v4());
    for (id, number, content) in [(v1, 1, "a\nb\nc"), (v2, 2, "a\nx\nc")] {
        Mock::given(method("GET"))
            .and(path(format!("/api/projects/{}/versions/{}", project_id, id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": id,
                "project_id": project_id,
                "chapter_id": null,
                "version_number": number,
                "change_type": "manual_edit",
                "change_summary": null,
                "snapshot_data": {"chapters": [{"id": "c1", "content": content}]},
                "created_by": null,
                "created_at": "2024-05-01T08:00:00Z"
            })))
            .mount(&server)
            .await;
    }

    let h = harness(&server, true);
    let handler = CompareChapterVersionsHandler::new(h.client.clone());
    let diff = handler
        .handle(CompareChapterVersions {
            project_id,
            old_version_id: v1,
            new_version_id: v2,
            chapter_id: Some("c1".to_string()),
        })
        .await
        .unwrap();

    let rendered: Vec<String> = diff
        .view
        .lines
        .iter()
        .map(|l| format!("{}{}", l.kind.marker(), l.text))
        .collect();
    assert_eq!(rendered, vec![" a", "-b", " c", "+x"]);
}

#[tokio::test]
async fn rollback_sends_snapshot_flag() {
    let server = MockServer::start().await;
    let project_id = Uuid::new_v4();
    let version_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path(format!("/api/projects/{}/versions/{}/rollback", project_id, version_id)))
        .and(query_param("create_snapshot", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "target_version_number": 3,
            "new_version_id": Uuid::new_v4(),
            "new_version_number": 6,
            "pre_snapshot_id": null,
            "restored_chapters": [{"id": "c1", "chapter_number": "1.1", "title": "总体设计"}],
            "error": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let outcome = h.client.rollback_version(project_id, version_id, false).await.unwrap();

    assert_eq!(outcome.new_version_number, Some(6));
    assert_eq!(outcome.restored_chapters.len(), 1);
}

#[tokio::test]
async fn chapter_edit_cycle() {
    let server = MockServer::start().await;
    let chapter_id = Uuid::new_v4();
    let base = format!("/api/chapters/{}", chapter_id);
    let detail = |status: &str| {
        json!({
            "id": chapter_id,
            "chapter_number": "1.1",
            "title": "总体设计",
            "content": "修订后的正文",
            "status": status,
            "locked_by": null,
            "locked_at": null,
            "locked_by_username": "张三",
            "is_locked": true
        })
    };
    let lock = |success: bool| {
        json!({
            "success": success,
            "chapter_id": chapter_id,
            "locked_by": null,
            "locked_at": null,
            "locked_by_username": null
        })
    };
    Mock::given(method("POST"))
        .and(path(format!("{}/lock", base)))
        .respond_with(ResponseTemplate::new(200).set_body_json(lock(true)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/content", base)))
        .and(body_partial_json(json!({"content": "修订后的正文", "change_summary": "补充实施细节"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail("generated")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/status", base)))
        .and(body_partial_json(json!({"status": "reviewing"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail("reviewing")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}/unlock", base)))
        .respond_with(ResponseTemplate::new(200).set_body_json(lock(true)))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, true);
    assert!(h.client.lock_chapter(chapter_id).await.unwrap().success);
    let saved = h
        .client
        .update_chapter_content(
            chapter_id,
            "修订后的正文".to_string(),
            Some("补充实施细节".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(saved.content.as_deref(), Some("修订后的正文"));
    let reviewed = h
        .client
        .update_chapter_status(chapter_id, ChapterStatus::Reviewing)
        .await
        .unwrap();
    assert_eq!(reviewed.status, ChapterStatus::Reviewing);
    assert!(h.client.unlock_chapter(chapter_id).await.unwrap().success);
}

#[tokio::test]
async fn non_streaming_chapter_generation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/content/generate-chapter"))
        .and(body_partial_json(json!({"chapter": {"id": "1"}, "project_overview": "智慧园区"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": "完整正文"})))
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let outline = Outline::new(vec![OutlineItem::new("1", "技术方案")]).unwrap();
    let content = h
        .client
        .generate_chapter(bidwriter::application::ChapterGenerationRequest {
            chapter: outline.find("1").unwrap().as_ref_item(),
            context: outline.context_for("1").unwrap(),
            project_overview: "智慧园区".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(content, "完整正文");
}

#[tokio::test]
async fn project_outline_and_content_streams() {
    let server = MockServer::start().await;
    let project_id = Uuid::new_v4();
    let chapter_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path("/api/outline/generate-project-stream"))
        .and(body_partial_json(json!({"project_id": project_id.to_string()})))
        .respond_with(sse(&[r#"{"chunk": "[{\"id\": \"1\"}]"}"#, "[DONE]"]))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/outline/generate-content-stream"))
        .and(body_partial_json(json!({"chapter_id": chapter_id.to_string()})))
        .respond_with(sse(&[
            r#"{"chunk": "第一段"}"#,
            r#"{"chunk": "第二段"}"#,
            r#"{"chunk": "", "error": true, "message": "额度不足"}"#,
        ]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/api/outline/project-chapters/{}", project_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "project_id": project_id,
            "chapters": [
                {"id": "a", "chapter_number": "1", "title": "技术方案", "parent_id": null, "status": "pending"},
                {"id": "b", "chapter_number": "1.1", "title": "总体设计", "parent_id": "a", "status": "generated"}
            ],
            "total_count": 2
        })))
        .mount(&server)
        .await;

    let h = harness(&server, true);

    let outline_events: Vec<_> = h
        .client
        .generate_project_outline_stream(project_id)
        .await
        .unwrap()
        .collect()
        .await;
    assert_eq!(
        outline_events.last().cloned().unwrap().unwrap(),
        StreamEvent::Complete(r#"[{"id": "1"}]"#.to_string())
    );

    let content_events: Vec<_> = h
        .client
        .generate_project_content_stream(project_id, chapter_id)
        .await
        .unwrap()
        .map(Result::unwrap)
        .collect()
        .await;
    assert_eq!(
        content_events,
        vec![
            StreamEvent::Partial("第一段".to_string()),
            StreamEvent::Partial("第一段第二段".to_string()),
            StreamEvent::Error("额度不足".to_string()),
        ]
    );

    let chapters = h.client.project_chapters(project_id).await.unwrap();
    assert_eq!(chapters.total_count, 2);
    assert_eq!(chapters.chapters[1].parent_id.as_deref(), Some("a"));
}

#[tokio::test]
async fn member_management() {
    let server = MockServer::start().await;
    let project_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    Mock::given(method("POST"))
        .and(path(format!("/api/projects/{}/members", project_id)))
        .and(body_partial_json(json!({"user_id": user_id, "role": "reviewer"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_id": user_id,
            "project_id": project_id,
            "role": "reviewer",
            "joined_at": "2024-05-01T08:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/api/projects/{}/members/{}", project_id, user_id)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let record = h
        .client
        .add_member(project_id, user_id, MemberRole::Reviewer)
        .await
        .unwrap();
    assert_eq!(record.role, MemberRole::Reviewer);
    h.client.remove_member(project_id, user_id).await.unwrap();
}

#[tokio::test]
async fn server_side_version_diff() {
    let server = MockServer::start().await;
    let project_id = Uuid::new_v4();
    let (v1, v2) = (Uuid::new_v4(), Uuid::new_v4());
    Mock::given(method("GET"))
        .and(path(format!("/api/projects/{}/versions/diff", project_id)))
        .and(query_param("v1", v1.to_string()))
        .and(query_param("v2", v2.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "v1": {"id": v1, "version_number": 1, "created_at": "2024-05-01T08:00:00", "change_type": "ai_generate"},
            "v2": {"id": v2, "version_number": 2, "created_at": "2024-05-02T08:00:00", "change_type": "manual_edit"},
            "diff": {"modified": [{"id": "c1"}], "added": [], "deleted": []}
        })))
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let diff = h.client.diff_versions(project_id, v1, v2).await.unwrap();

    assert_eq!(diff.v2.version_number, 2);
    assert_eq!(diff.diff["modified"][0]["id"], "c1");
}

#[tokio::test]
async fn upload_document_sends_multipart_and_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/expand/upload"))
        .and(header("Authorization", "Bearer old"))
        .and(header_regex("content-type", "^multipart/form-data"))
        .and(body_string_contains("filename=\"tender.pdf\""))
        .and(body_string_contains("application/pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "文件 tender.pdf 上传成功",
            "file_content": "项目名称：智慧园区",
            "old_outline": "{\"outline\": []}"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("tender.pdf");
    std::fs::write(&file, b"%PDF-1.7\n1 0 obj\n").unwrap();

    let h = harness(&server, true);
    let uploaded = h.client.upload_document(&file).await.unwrap();

    assert_eq!(uploaded.file_content.as_deref(), Some("项目名称：智慧园区"));
}

#[tokio::test]
async fn upload_rejects_unknown_file_type_before_request() {
    let server = MockServer::start().await;
    let h = harness(&server, true);

    let err = h
        .client
        .upload_document_bytes("notes.txt", b"just text".to_vec())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::Validation(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn upload_failure_in_body_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/expand/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "文件处理失败: 无法解析"
        })))
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let err = h
        .client
        .upload_document_bytes("标书.docx", b"PK\x03\x04\x14\x00".to_vec())
        .await
        .unwrap_err();

    assert_eq!(err, ApiError::Rejected("文件处理失败: 无法解析".to_string()));
}

#[tokio::test]
async fn upload_is_replayed_after_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/expand/upload"))
        .and(header("Authorization", "Bearer old"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "令牌已过期"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/expand/upload"))
        .and(header("Authorization", "Bearer new"))
        .and(body_string_contains("%PDF-"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "ok",
            "file_content": "正文"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "new",
            "refresh_token": "r2"
        })))
        .mount(&server)
        .await;

    let h = harness(&server, true);
    let uploaded = h
        .client
        .upload_document_bytes("a.pdf", b"%PDF-1.4".to_vec())
        .await
        .unwrap();

    assert_eq!(uploaded.file_content.as_deref(), Some("正文"));
}
