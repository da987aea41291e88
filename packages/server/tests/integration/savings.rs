use crate::common::{TestApp, routes, str_field};

#[tokio::test]
async fn empty_store_reports_zeroes() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::SAVINGS).await;

    assert_eq!(res.status, 200, "{}", res.text);
    let data = res.data();
    assert_eq!(data["actual_space"], 0);
    assert_eq!(data["would_be_space"], 0);
    assert_eq!(data["space_saved"], 0);
    assert_eq!(data["savings_percentage"], 0.0);
    assert_eq!(data["deduplication_ratio"], 0.0);
}

#[tokio::test]
async fn shared_content_is_counted_once() {
    let app = TestApp::spawn().await;
    let a = vec![b'a'; 1000];
    let b = vec![b'b'; 2000];
    for name in ["a1.bin", "a2.bin", "a3.bin"] {
        app.create_entry(name, a.clone(), "application/octet-stream").await;
    }
    app.create_entry("b.bin", b, "application/octet-stream").await;

    let res = app.get(routes::SAVINGS).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["code"], 200);
    let data = res.data();
    assert_eq!(data["actual_space"], 3000);
    assert_eq!(data["would_be_space"], 5000);
    assert_eq!(data["space_saved"], 2000);
    assert_eq!(data["savings_percentage"], 40.0);
    assert_eq!(data["deduplication_ratio"], 2.0);
    assert_eq!(data["total_files"], 2);
    assert_eq!(data["total_entries"], 4);
    assert_eq!(data["display"]["savings_percentage"], "40.0%");
}

#[tokio::test]
async fn unreferenced_content_reports_negative_savings() {
    let app = TestApp::spawn().await;
    let created = app.create_entry("gone.bin", vec![1u8; 500], "application/octet-stream").await;
    app.delete(&routes::entry(str_field(&created, "id"))).await;

    let res = app.get(routes::SAVINGS).await;

    let data = res.data();
    assert_eq!(data["actual_space"], 500);
    assert_eq!(data["would_be_space"], 0);
    assert_eq!(data["space_saved"], -500);
    assert_eq!(data["savings_percentage"], 0.0);
    assert_eq!(data["total_entries"], 0);
    assert_eq!(data["display"]["space_saved"], "-500 B");
}
