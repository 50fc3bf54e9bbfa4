//! Integration tests for the dashboard HTTP server

#[cfg(feature = "server")]
mod server_tests {
    use retail_emotion_agent::config::{Config, IntervalConfig};
    use retail_emotion_agent::server::{run, ServerConfig};
    use std::time::Duration;

    fn test_config() -> ServerConfig {
        let session = Config {
            seed: Some(99),
            image_delay: Duration::from_millis(50),
            video_delay: Duration::from_millis(100),
            live_interval: IntervalConfig {
                min_ms: 20,
                max_ms: 40,
            },
            ..Default::default()
        };
        ServerConfig::new(0, session)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (addr, shutdown_tx) = run(test_config()).await.expect("Failed to start server");

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());

        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["status"], "ok");
        assert!(body["version"].as_str().is_some());
        assert_eq!(body["recording"], false);
        assert_eq!(body["events"], 0);

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_classify_image_and_reject_text() {
        let (addr, shutdown_tx) = run(test_config()).await.expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .post(format!("http://{}/classify", addr))
            .json(&serde_json::json!({ "name": "shopper.jpg", "mime": "image/jpeg" }))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());

        let event: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(event["location"], "PhotoUpload");
        assert_eq!(event["source"], "upload");
        let confidence = event["confidence"].as_u64().unwrap();
        assert!((70..=100).contains(&confidence));

        let response = client
            .post(format!("http://{}/classify", addr))
            .json(&serde_json::json!({ "name": "notes.txt", "mime": "text/plain" }))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), reqwest::StatusCode::UNSUPPORTED_MEDIA_TYPE);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        assert_eq!(body["code"], "UNSUPPORTED_MEDIA");

        let events: Vec<serde_json::Value> = client
            .get(format!("http://{}/events", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(events.len(), 1);

        let notes: Vec<serde_json::Value> = client
            .get(format!("http://{}/notifications", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        let kinds: Vec<&str> = notes.iter().filter_map(|n| n["type"].as_str()).collect();
        assert_eq!(
            kinds,
            vec!["classification_succeeded", "unsupported_file_rejected"]
        );

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_recording_and_export() {
        let (addr, shutdown_tx) = run(test_config()).await.expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let body: serde_json::Value = client
            .post(format!("http://{}/recording/start", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(body["recording"], true);
        assert_eq!(body["changed"], true);

        // A second start is a no-op
        let body: serde_json::Value = client
            .post(format!("http://{}/recording/start", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(body["changed"], false);

        tokio::time::sleep(Duration::from_millis(500)).await;

        let body: serde_json::Value = client
            .post(format!("http://{}/recording/stop", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(body["recording"], false);
        assert_eq!(body["changed"], true);

        // Stopping an idle session is a no-op too
        let body: serde_json::Value = client
            .post(format!("http://{}/recording/stop", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(body["changed"], false);

        let response = client
            .get(format!("http://{}/export.csv", addr))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
        assert!(response.headers()[reqwest::header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/csv"));

        let csv = response.text().await.expect("Failed to read body");
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Timestamp,Location,Expression,Confidence,Source")
        );
        let rows: Vec<&str> = lines.collect();
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|row| row.ends_with(",live")));

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_views_and_filters() {
        let (addr, shutdown_tx) = run(test_config()).await.expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let histogram: serde_json::Value = client
            .get(format!("http://{}/histogram", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        let buckets = histogram["buckets"].as_array().unwrap();
        assert_eq!(buckets.len(), 8);
        assert_eq!(buckets[0]["category"], "Happy");
        assert_eq!(buckets[0]["count"], 25);

        let stats: serde_json::Value = client
            .get(format!("http://{}/stats", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(stats["total_detections"], 156);
        assert_eq!(stats["active_entities"], 12);

        let response = client
            .get(format!("http://{}/events?category=Bored", addr))
            .send()
            .await
            .expect("Failed to send request");
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let response = client
            .get(format!(
                "http://{}/events?category=happy&min_confidence=80",
                addr
            ))
            .send()
            .await
            .expect("Failed to send request");
        assert!(response.status().is_success());
        let events: Vec<serde_json::Value> = response.json().await.expect("Failed to parse JSON");
        assert!(events.is_empty());

        // Upload classification always lands in the store
        client
            .post(format!("http://{}/classify", addr))
            .json(&serde_json::json!({ "name": "aisle.mp4", "mime": "video/mp4" }))
            .send()
            .await
            .expect("Failed to send request");

        let events: Vec<serde_json::Value> = client
            .get(format!("http://{}/events?search=video", addr))
            .send()
            .await
            .expect("Failed to send request")
            .json()
            .await
            .expect("Failed to parse JSON");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["media_kind"], "video");

        let _ = shutdown_tx.send(());
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let (addr, shutdown_tx) = run(test_config()).await.expect("Failed to start server");
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = reqwest::Client::new();
        let response = client
            .request(reqwest::Method::OPTIONS, format!("http://{}/classify", addr))
            .header("Origin", "http://localhost")
            .header("Access-Control-Request-Method", "POST")
            .send()
            .await
            .expect("Failed to send request");

        assert!(
            response.status().is_success() || response.status() == reqwest::StatusCode::NO_CONTENT,
            "CORS preflight failed: {}",
            response.status()
        );

        let _ = shutdown_tx.send(());
    }
}
