pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::countries::handlers as countries;
use crate::feeds::handlers as feeds;
use crate::generation::handlers as generation;
use crate::state::AppState;
use crate::tracking::handlers as tracking;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Country profiles
        .route(
            "/api/v1/countries",
            get(countries::handle_list_countries).post(countries::handle_create_country),
        )
        .route(
            "/api/v1/countries/:id",
            put(countries::handle_update_country),
        )
        .route(
            "/api/v1/countries/:id/embassies",
            get(countries::handle_get_embassies),
        )
        .route(
            "/api/v1/countries/:id/profile",
            get(countries::handle_get_profile),
        )
        .route(
            "/api/v1/countries/:id/sections/:section",
            put(countries::handle_update_section),
        )
        // Section generation
        .route(
            "/api/v1/countries/:id/generations",
            post(generation::handle_start_generation),
        )
        .route(
            "/api/v1/countries/:id/generations/pending",
            get(generation::handle_pending_generations),
        )
        .route(
            "/api/v1/countries/:id/generations/reconcile",
            get(generation::handle_reconcile_generations),
        )
        .route(
            "/api/v1/generations/:job_id",
            get(generation::handle_generation_status),
        )
        // Scraped feeds
        .route(
            "/api/v1/scraper/feeds",
            get(feeds::handle_list_feeds).post(feeds::handle_create_feed),
        )
        .route(
            "/api/v1/scraper/feeds/:feed_id",
            get(feeds::handle_get_feed)
                .put(feeds::handle_update_feed)
                .delete(feeds::handle_delete_feed),
        )
        .route(
            "/api/v1/scraper/feeds/:feed_id/rss",
            get(feeds::handle_feed_rss),
        )
        .route(
            "/api/v1/countries/:id/daily-summary",
            get(feeds::handle_daily_summary),
        )
        // Monitoring lists
        .route(
            "/api/v1/countries/:id/keywords",
            get(tracking::handle_list_keywords).post(tracking::handle_add_keywords),
        )
        .route(
            "/api/v1/countries/:id/keywords/generate",
            post(tracking::handle_generate_keywords),
        )
        .route(
            "/api/v1/countries/:id/keywords/:item_id",
            delete(tracking::handle_delete_keyword),
        )
        .route(
            "/api/v1/countries/:id/news-sources",
            get(tracking::handle_list_news_sources).post(tracking::handle_add_news_source),
        )
        .route(
            "/api/v1/countries/:id/news-sources/generate",
            post(tracking::handle_generate_news_sources),
        )
        .route(
            "/api/v1/countries/:id/news-sources/:item_id",
            delete(tracking::handle_delete_news_source),
        )
        .route(
            "/api/v1/countries/:id/influencers",
            get(tracking::handle_list_influencers).post(tracking::handle_add_influencer),
        )
        .route(
            "/api/v1/countries/:id/influencers/generate",
            post(tracking::handle_generate_influencers),
        )
        .route(
            "/api/v1/countries/:id/influencers/:item_id",
            delete(tracking::handle_delete_influencer),
        )
        .route(
            "/api/v1/countries/:id/government-messaging",
            get(tracking::handle_list_government_entities)
                .post(tracking::handle_add_government_entity),
        )
        .route(
            "/api/v1/countries/:id/government-messaging/generate",
            post(tracking::handle_generate_government_entities),
        )
        .route(
            "/api/v1/countries/:id/government-messaging/:item_id",
            delete(tracking::handle_delete_government_entity),
        )
        .route(
            "/api/v1/countries/:id/leadership-messaging",
            get(tracking::handle_list_leaders).post(tracking::handle_add_leader),
        )
        .route(
            "/api/v1/countries/:id/leadership-messaging/generate",
            post(tracking::handle_generate_leaders),
        )
        .route(
            "/api/v1/countries/:id/leadership-messaging/:item_id",
            delete(tracking::handle_delete_leader),
        )
        .route(
            "/api/v1/countries/:id/emergency-numbers",
            get(tracking::handle_list_emergency_numbers)
                .post(tracking::handle_add_emergency_number),
        )
        .route(
            "/api/v1/countries/:id/emergency-numbers/:item_id",
            delete(tracking::handle_delete_emergency_number),
        )
        .route(
            "/api/v1/countries/:id/presence/:kind",
            get(tracking::handle_get_presence)
                .put(tracking::handle_set_presence)
                .delete(tracking::handle_delete_presence),
        )
        .route(
            "/api/v1/countries/:id/presence/:kind/generate",
            post(tracking::handle_generate_presence),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::feeds::scraper::ScraperRunner;
    use crate::generation::tracker::GenerationTracker;
    use crate::models::country::SectionKey;
    use crate::testing::{MemoryStore, ScriptedCompletion};

    struct Harness {
        store: Arc<MemoryStore>,
        state: AppState,
        _scripts: tempfile::TempDir,
    }

    const SCRAPER_OK: &str = r#"printf '{"channel": {"title": "%s & co", "description": "%s", "items": []}}' "$1" "$2""#;

    fn harness(countries: &[&str], replies: Vec<Result<String, String>>, scraper: &str) -> Harness {
        let store = Arc::new(MemoryStore::with_countries(countries));
        let scripts = tempfile::tempdir().unwrap();
        let script = scripts.path().join("scraper.sh");
        std::fs::File::create(&script)
            .unwrap()
            .write_all(scraper.as_bytes())
            .unwrap();

        let completion = Arc::new(ScriptedCompletion::replying(replies));
        let state = AppState {
            countries: store.clone(),
            feeds: store.clone(),
            tracking: store.clone(),
            completion: completion.clone(),
            tracker: GenerationTracker::new(store.clone(), store.clone(), completion),
            scraper: ScraperRunner::new("sh", &script, &script),
        };
        Harness {
            store,
            state,
            _scripts: scripts,
        }
    }

    async fn send(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = send_raw(state, method, uri, body).await;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn send_raw(
        state: &AppState,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Vec<u8>) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = build_router(state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, bytes.to_vec())
    }

    #[tokio::test]
    async fn test_generation_flow_over_http() {
        let h = harness(&["France"], vec![Ok("```html\n<p>History...</p>\n```".into())], SCRAPER_OK);
        let france = h.store.country("France");

        let (status, body) = send(
            &h.state,
            Method::POST,
            &format!("/api/v1/countries/{}/generations", france.id),
            Some(json!({"section": "history"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let job_id = body["jobId"].as_str().unwrap().to_string();

        let (_, pending) = send(
            &h.state,
            Method::GET,
            &format!("/api/v1/countries/{}/generations/pending", france.id),
            None,
        )
        .await;
        assert_eq!(pending["inProgressCount"], 1);
        assert_eq!(pending["sections"], json!(["history"]));

        h.state.tracker.registry().drain().await;

        let (status, body) = send(&h.state, Method::GET, &format!("/api/v1/generations/{job_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "SAVED", "content": "<p>History...</p>"}));

        let (_, profile) = send(
            &h.state,
            Method::GET,
            &format!("/api/v1/countries/{}/profile?section=history", france.id),
            None,
        )
        .await;
        assert_eq!(profile["content"], "<p>History...</p>");

        // Polling a saved job again is a plain read.
        let (_, again) = send(&h.state, Method::GET, &format!("/api/v1/generations/{job_id}"), None).await;
        assert_eq!(again["status"], "SAVED");
    }

    #[tokio::test]
    async fn test_start_generation_validation() {
        let h = harness(&["France"], vec![], SCRAPER_OK);
        let france = h.store.country("France");
        let uri = format!("/api/v1/countries/{}/generations", france.id);

        let (status, body) = send(&h.state, Method::POST, &uri, Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, _) = send(&h.state, Method::POST, &uri, Some(json!({"section": "weather"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&h.state, Method::POST, &uri, Some(json!({"section": 7}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["message"], "Section must be a string");

        let (status, _) = send(
            &h.state,
            Method::POST,
            &format!("/api/v1/countries/{}/generations", uuid::Uuid::new_v4()),
            Some(json!({"section": "overview"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_job_is_404() {
        let h = harness(&[], vec![], SCRAPER_OK);
        let (status, body) = send(
            &h.state,
            Method::GET,
            &format!("/api/v1/generations/{}", uuid::Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_completed_job_of_deleted_country_stays_readable() {
        let h = harness(&["Mali"], vec![Ok("<p>Mali history</p>".into())], SCRAPER_OK);
        let mali = h.store.country("Mali");

        let (_, body) = send(
            &h.state,
            Method::POST,
            &format!("/api/v1/countries/{}/generations", mali.id),
            Some(json!({"section": "history"})),
        )
        .await;
        let uri = format!("/api/v1/generations/{}", body["jobId"].as_str().unwrap());
        h.state.tracker.registry().drain().await;
        h.store.remove_country("Mali");

        for _ in 0..2 {
            let (status, view) = send(&h.state, Method::GET, &uri, None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(view["status"], "COMPLETED");
        }
    }

    #[tokio::test]
    async fn test_reconcile_reports_saved_sections_once() {
        let h = harness(
            &["Japan"],
            vec![Ok("<p>o</p>".into()), Ok("<p>m</p>".into())],
            SCRAPER_OK,
        );
        let japan = h.store.country("Japan");
        for section in ["overview", "militaryLeadership"] {
            send(
                &h.state,
                Method::POST,
                &format!("/api/v1/countries/{}/generations", japan.id),
                Some(json!({ "section": section })),
            )
            .await;
        }
        h.state.tracker.registry().drain().await;

        let uri = format!("/api/v1/countries/{}/generations/reconcile", japan.id);
        let (_, first) = send(&h.state, Method::GET, &uri, None).await;
        assert_eq!(first["savedCount"], 2);
        assert_eq!(first["savedSections"].as_array().unwrap().len(), 2);

        let (_, second) = send(&h.state, Method::GET, &uri, None).await;
        assert_eq!(second["savedCount"], 0);

        let japan = h.store.country("Japan");
        assert!(japan.section(SectionKey::MilitaryLeadership).is_some());
    }

    #[tokio::test]
    async fn test_failed_generation_reports_error() {
        let h = harness(&["Peru"], vec![Err("rate limited".into())], SCRAPER_OK);
        let peru = h.store.country("Peru");

        let (_, body) = send(
            &h.state,
            Method::POST,
            &format!("/api/v1/countries/{}/generations", peru.id),
            Some(json!({"section": "economy"})),
        )
        .await;
        h.state.tracker.registry().drain().await;

        let (_, status) = send(
            &h.state,
            Method::GET,
            &format!("/api/v1/generations/{}", body["jobId"].as_str().unwrap()),
            None,
        )
        .await;
        assert_eq!(status["status"], "ERROR");
        assert!(status.get("content").is_none());
        assert!(status["error"].as_str().unwrap().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_country_create_and_manual_edit() {
        let h = harness(&[], vec![], SCRAPER_OK);

        let (status, _) =
            send(&h.state, Method::POST, "/api/v1/countries", Some(json!({"name": "  ", "code": "GH"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) =
            send(&h.state, Method::POST, "/api/v1/countries", Some(json!({"name": "Ghana"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Code is required");

        let (status, created) = send(
            &h.state,
            Method::POST,
            "/api/v1/countries",
            Some(json!({"name": "Ghana", "code": "gh"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["code"], "GH");
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &h.state,
            Method::POST,
            "/api/v1/countries",
            Some(json!({"name": "Ghana", "code": "GH"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &h.state,
            Method::PUT,
            &format!("/api/v1/countries/{id}/sections/humanRights"),
            Some(json!({"content": "<p>edited</p>"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, profile) = send(&h.state, Method::GET, &format!("/api/v1/countries/{id}/profile"), None).await;
        assert_eq!(profile["name"], "Ghana");
        assert_eq!(profile["humanRights"], "<p>edited</p>");
    }

    #[tokio::test]
    async fn test_country_details_edit_and_embassies() {
        let h = harness(&["Ghana", "Togo"], vec![], SCRAPER_OK);
        let ghana = h.store.country("Ghana");
        let uri = format!("/api/v1/countries/{}", ghana.id);

        let (status, updated) = send(
            &h.state,
            Method::PUT,
            &uri,
            Some(json!({
                "name": "Ghana",
                "code": "gh",
                "embassyInUsUrl": "https://ghanaembassy.org",
                "usEmbassyUrl": ""
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["code"], "GH");

        let (_, body) = send(&h.state, Method::GET, &format!("{uri}/embassies"), None).await;
        assert_eq!(
            body,
            json!({"embassies": {"embassyInUs": "https://ghanaembassy.org", "usEmbassy": null}})
        );

        let (status, _) = send(&h.state, Method::PUT, &uri, Some(json!({"name": "Ghana", "code": "GHA"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&h.state, Method::PUT, &uri, Some(json!({"name": "Togo", "code": "GH"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &h.state,
            Method::PUT,
            &format!("/api/v1/countries/{}", uuid::Uuid::new_v4()),
            Some(json!({"name": "Benin", "code": "BJ"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scraped_feed_lifecycle_and_rss() {
        let h = harness(&["Iraq"], vec![], SCRAPER_OK);
        let iraq = h.store.country("Iraq");

        let (status, body) = send(
            &h.state,
            Method::POST,
            "/api/v1/scraper/feeds",
            Some(json!({"countryId": iraq.id, "url": "https://news.example/rss"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "All fields are required");

        let (status, feed) = send(
            &h.state,
            Method::POST,
            "/api/v1/scraper/feeds",
            Some(json!({"countryId": iraq.id, "url": "https://news.example/rss", "feedType": "BREAKING_NEWS"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let feed_id = feed["id"].as_i64().unwrap();
        assert_eq!(feed["feedType"], "BREAKING_NEWS");

        let (status, xml) = send_raw(
            &h.state,
            Method::GET,
            &format!("/api/v1/scraper/feeds/{feed_id}/rss"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let xml = String::from_utf8(xml).unwrap();
        assert!(xml.contains("<title>https://news.example/rss &amp; co</title>"));
        assert!(xml.contains("<description>Breaking News</description>"));

        let (status, _) = send(&h.state, Method::DELETE, &format!("/api/v1/scraper/feeds/{feed_id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&h.state, Method::GET, &format!("/api/v1/scraper/feeds/{feed_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_feed_update_rescrapes() {
        let h = harness(&["Iraq", "Iran"], vec![], SCRAPER_OK);
        let iraq = h.store.country("Iraq");
        let iran = h.store.country("Iran");

        let (_, feed) = send(
            &h.state,
            Method::POST,
            "/api/v1/scraper/feeds",
            Some(json!({"countryId": iraq.id, "url": "https://old.example/rss", "feedType": "MAIN_FEED"})),
        )
        .await;
        let uri = format!("/api/v1/scraper/feeds/{}", feed["id"]);

        let (status, updated) = send(
            &h.state,
            Method::PUT,
            &uri,
            Some(json!({"countryId": iran.id, "url": "https://new.example/rss", "feedType": "US_MENTIONS"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["id"], feed["id"]);
        assert_eq!(updated["countryId"], json!(iran.id));
        assert_eq!(updated["feedType"], "US_MENTIONS");
        let content: Value = serde_json::from_str(updated["content"].as_str().unwrap()).unwrap();
        assert_eq!(content["channel"]["title"], "https://new.example/rss & co");
        assert_eq!(content["channel"]["description"], "US Mentions");

        let (status, _) = send(
            &h.state,
            Method::PUT,
            "/api/v1/scraper/feeds/9999",
            Some(json!({"countryId": iran.id, "url": "https://x", "feedType": "MAIN_FEED"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rss_tolerates_null_items_and_scalar_image() {
        let h = harness(
            &["Chad"],
            vec![],
            r#"printf '{"channel": {"title": "t", "image": "logo.png", "items": null}}'"#,
        );
        let chad = h.store.country("Chad");

        let (_, feed) = send(
            &h.state,
            Method::POST,
            "/api/v1/scraper/feeds",
            Some(json!({"countryId": chad.id, "url": "https://x", "feedType": "MAIN_FEED"})),
        )
        .await;
        let (status, xml) = send_raw(
            &h.state,
            Method::GET,
            &format!("/api/v1/scraper/feeds/{}/rss", feed["id"]),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let xml = String::from_utf8(xml).unwrap();
        assert!(xml.contains("<title>t</title>"));
        assert!(!xml.contains("<image>"));
        assert!(!xml.contains("<item>"));
    }

    #[tokio::test]
    async fn test_rss_of_feed_without_content_is_serialization_error() {
        let h = harness(&["Chad"], vec![], SCRAPER_OK);
        let chad = h.store.country("Chad");

        let (_, feed) = send(
            &h.state,
            Method::POST,
            "/api/v1/scraper/feeds",
            Some(json!({"countryId": chad.id, "url": "https://x", "feedType": "MAIN_FEED"})),
        )
        .await;
        let feed_id = feed["id"].as_i64().unwrap();
        h.store.clear_feed_content(feed_id);

        let (status, body) =
            send(&h.state, Method::GET, &format!("/api/v1/scraper/feeds/{feed_id}/rss"), None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "SERIALIZATION_ERROR");
    }

    #[tokio::test]
    async fn test_daily_summary_renders_rss() {
        let h = harness(&["Chad"], vec![], SCRAPER_OK);
        let chad = h.store.country("Chad");

        let (status, xml) = send_raw(
            &h.state,
            Method::GET,
            &format!("/api/v1/countries/{}/daily-summary", chad.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let xml = String::from_utf8(xml).unwrap();
        assert!(xml.contains("<title>--id &amp; co</title>"));
        assert!(xml.contains(&format!("<description>{}</description>", chad.id)));

        let (status, _) = send(
            &h.state,
            Method::GET,
            &format!("/api/v1/countries/{}/daily-summary", uuid::Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_keyword_lists_are_separate() {
        let h = harness(&["Chad"], vec![Ok("Lake Chad\nCotton\n".into())], SCRAPER_OK);
        let base = format!("/api/v1/countries/{}/keywords", h.store.country("Chad").id);

        let (status, _) = send(&h.state, Method::POST, &base, Some(json!({"keyword": " , "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, created) =
            send(&h.state, Method::POST, &base, Some(json!({"keyword": "cotton, Boko Haram"}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created.as_array().unwrap().len(), 2);

        let (status, _) = send(&h.state, Method::POST, &base, Some(json!({"keyword": "Cotton"}))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, generated) = send(
            &h.state,
            Method::POST,
            &format!("{base}/generate?list=usMentions"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let words: Vec<&str> = generated
            .as_array()
            .unwrap()
            .iter()
            .map(|k| k["keyword"].as_str().unwrap())
            .collect();
        assert_eq!(words, ["Lake Chad", "Cotton"]);

        let (_, general) = send(&h.state, Method::GET, &base, None).await;
        assert_eq!(general.as_array().unwrap().len(), 2);

        let item = general[0]["id"].as_str().unwrap().to_string();
        let (status, _) = send(
            &h.state,
            Method::DELETE,
            &format!("{base}/{item}?list=usMentions"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&h.state, Method::DELETE, &format!("{base}/{item}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, general) = send(&h.state, Method::GET, &base, None).await;
        assert_eq!(general.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generated_news_sources_skip_incomplete_and_tracked() {
        let reply = "name: Tchad Infos\nnotes: Independent\nurl: https://tchadinfos.com\n\n\
                     name: No Url\nnotes: dropped\n\n\
                     name: Alwihda\nurl: https://www.alwihdainfo.com";
        let h = harness(&["Chad"], vec![Ok(reply.into())], SCRAPER_OK);
        let base = format!("/api/v1/countries/{}/news-sources", h.store.country("Chad").id);

        let (status, _) = send(
            &h.state,
            Method::POST,
            &base,
            Some(json!({"name": "Alwihda Info", "url": "https://www.alwihdainfo.com/"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (status, body) = send(&h.state, Method::POST, &base, Some(json!({"name": "x"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "URL is required");

        let (status, generated) = send(&h.state, Method::POST, &format!("{base}/generate"), None).await;
        assert_eq!(status, StatusCode::OK);
        // Trailing slash differs, so Alwihda counts as new.
        let names: Vec<&str> = generated
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Tchad Infos", "Alwihda"]);
        assert_eq!(generated[0]["notes"], "Independent");

        let (_, all) = send(&h.state, Method::GET, &base, None).await;
        assert_eq!(all.as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_influencer_and_leader_validation() {
        let h = harness(&["Chad"], vec![], SCRAPER_OK);
        let id = h.store.country("Chad").id;
        let influencers = format!("/api/v1/countries/{id}/influencers");

        let mut form = json!({
            "name": "Jane Doe",
            "handle": "@janedoe",
            "role": "Journalist",
            "politicalLeaning": 4.0,
            "url": "https://x.com/janedoe"
        });
        let (status, body) = send(&h.state, Method::POST, &influencers, Some(form.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Political leaning must be between -3 and 3");

        form["politicalLeaning"] = json!(-2.5);
        let (status, created) = send(&h.state, Method::POST, &influencers, Some(form.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created[0]["politicalLeaning"], -2.5);

        form["handle"] = json!("JaneDoe");
        let (status, _) = send(&h.state, Method::POST, &influencers, Some(form)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let leaders = format!("/api/v1/countries/{id}/leadership-messaging");
        let (status, body) = send(
            &h.state,
            Method::POST,
            &leaders,
            Some(json!({"name": "Mahamat Déby", "handle": "@GouvTchad"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Title is required");
    }

    #[tokio::test]
    async fn test_generated_government_entities_and_leaders() {
        let h = harness(
            &["Chad"],
            vec![
                Ok("name: Ministry of Foreign Affairs\nhandle: @MAEChad\nnotes: Diplomacy".into()),
                Ok("name: Mahamat Déby\ntitle: President\nhandle: @GouvTchad\npolitical_leaning: Unknown".into()),
            ],
            SCRAPER_OK,
        );
        let id = h.store.country("Chad").id;

        let (status, entities) = send(
            &h.state,
            Method::POST,
            &format!("/api/v1/countries/{id}/government-messaging/generate"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(entities[0]["handle"], "@MAEChad");

        let (status, leaders) = send(
            &h.state,
            Method::POST,
            &format!("/api/v1/countries/{id}/leadership-messaging/generate"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(leaders[0]["title"], "President");
        assert_eq!(leaders[0]["politicalLeaning"], "Unknown");
    }

    #[tokio::test]
    async fn test_generate_failure_is_upstream_error() {
        let h = harness(&["Chad"], vec![Err("rate limited".into())], SCRAPER_OK);
        let id = h.store.country("Chad").id;

        let (status, body) = send(
            &h.state,
            Method::POST,
            &format!("/api/v1/countries/{id}/influencers/generate"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");

        let (_, all) = send(&h.state, Method::GET, &format!("/api/v1/countries/{id}/influencers"), None).await;
        assert_eq!(all, json!([]));
    }

    #[tokio::test]
    async fn test_emergency_numbers() {
        let h = harness(&["Chad"], vec![], SCRAPER_OK);
        let base = format!("/api/v1/countries/{}/emergency-numbers", h.store.country("Chad").id);

        let (_, empty) = send(&h.state, Method::GET, &base, None).await;
        assert_eq!(empty, json!({"numbers": []}));

        let (status, _) = send(&h.state, Method::POST, &base, Some(json!({"name": "Police"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        for (name, number) in [("Police", "17"), ("Fire", "18")] {
            let (status, _) =
                send(&h.state, Method::POST, &base, Some(json!({"name": name, "number": number}))).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (_, listed) = send(&h.state, Method::GET, &base, None).await;
        assert_eq!(listed["numbers"][0]["name"], "Police");
        assert_eq!(listed["numbers"][1]["number"], "18");
    }

    #[tokio::test]
    async fn test_presence_generate_replaces_handle() {
        let h = harness(
            &["Chad"],
            vec![Ok("N/A".into()), Ok("@USEmbassyChad".into())],
            SCRAPER_OK,
        );
        let base = format!("/api/v1/countries/{}/presence", h.store.country("Chad").id);

        let (status, _) = send(&h.state, Method::GET, &format!("{base}/consulate"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, set) = send(
            &h.state,
            Method::PUT,
            &format!("{base}/embassy"),
            Some(json!({"handle": "@OldHandle"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(set["kind"], "EMBASSY");

        let (status, body) = send(&h.state, Method::POST, &format!("{base}/embassy/generate"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["message"], "No Twitter handle found for the U.S. Embassy");
        let (_, kept) = send(&h.state, Method::GET, &format!("{base}/embassy"), None).await;
        assert_eq!(kept["handle"], "@OldHandle");

        let (status, replaced) =
            send(&h.state, Method::POST, &format!("{base}/embassy/generate"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(replaced["handle"], "@USEmbassyChad");

        let (status, _) = send(&h.state, Method::GET, &format!("{base}/ambassador"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&h.state, Method::DELETE, &format!("{base}/embassy"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&h.state, Method::GET, &format!("{base}/embassy"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scraper_failure_is_500_and_not_persisted() {
        let h = harness(&["Iraq"], vec![], "echo 'no route to host' >&2; exit 1");
        let iraq = h.store.country("Iraq");

        let (status, body) = send(
            &h.state,
            Method::POST,
            "/api/v1/scraper/feeds",
            Some(json!({"countryId": iraq.id, "url": "https://x", "feedType": "MAIN_FEED"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");

        let (_, feeds) = send(&h.state, Method::GET, "/api/v1/scraper/feeds", None).await;
        assert_eq!(feeds, json!([]));
    }

    #[tokio::test]
    async fn test_health_reports_worker_counters() {
        let h = harness(&[], vec![], SCRAPER_OK);
        let (status, body) = send(&h.state, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["generations"]["inFlight"], 0);
        assert_eq!(body["generations"]["leaked"], 0);
    }
}
