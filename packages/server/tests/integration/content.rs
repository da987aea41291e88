use crate::common::{TestApp, routes, str_field};

#[tokio::test]
async fn get_content_reports_reference_count() {
    let app = TestApp::spawn().await;
    let bytes = b"counted".to_vec();
    let first = app.create_entry("c1.txt", bytes.clone(), "text/plain").await;
    app.create_entry("c2.txt", bytes, "text/plain").await;

    let res = app.get(&routes::content(str_field(&first["file"], "id"))).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["reference_count"], 2);
    assert_eq!(res.data()["digest"], first["file"]["digest"]);
}

#[tokio::test]
async fn delete_content_cascades_to_entries() {
    let app = TestApp::spawn().await;
    let bytes = b"doomed".to_vec();
    let first = app.create_entry("d1.txt", bytes.clone(), "text/plain").await;
    let second = app.create_entry("d2.txt", bytes, "text/plain").await;
    let kept = app.create_entry("keep.txt", b"keep".to_vec(), "text/plain").await;
    let content_id = str_field(&first["file"], "id");

    let res = app.delete(&routes::content(content_id)).await;
    assert_eq!(res.status, 204, "{}", res.text);

    assert_eq!(app.get(&routes::content(content_id)).await.status, 404);
    assert_eq!(app.get(&routes::entry(str_field(&first, "id"))).await.status, 404);
    assert_eq!(app.get(&routes::entry(str_field(&second, "id"))).await.status, 404);
    assert_eq!(app.get(&routes::entry(str_field(&kept, "id"))).await.status, 200);

    // Same bytes again start a fresh content row.
    let again = app.create_entry("d3.txt", b"doomed".to_vec(), "text/plain").await;
    assert_ne!(str_field(&again["file"], "id"), content_id);
    let download = app.get(&routes::entry_download(str_field(&again, "id"))).await;
    assert_eq!(download.text, "doomed");
}

#[tokio::test]
async fn delete_unknown_content_returns_404() {
    let app = TestApp::spawn().await;

    let res = app
        .delete(&routes::content("01936f0e-0000-7000-8000-000000000000"))
        .await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["message"], "Content not found");
}
