//! End-to-end tests of the info -> manifest -> download pipeline.
//!
//! These tests stand up a mock game server with wiremock and drive the public
//! client API against it.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use acz_formats::manifest::DEFAULT_HEADER;
use acz_formats::{DownloadResponseBuilder, FileHeader, Manifest, StreamFlags};
use acz_protocol::output::write_atomic;
use acz_protocol::{ClientConfig, ContentClient, ContentError, ErrorKind};
use pretty_assertions::assert_eq;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MANIFEST: &str = "v1\nabc123 Textures/a.png\ndef456 Sound/b.ogg\n";

fn client() -> ContentClient {
    ContentClient::new(ClientConfig {
        accept_zstd: false,
        ..ClientConfig::default()
    })
    .expect("Failed to create content client")
}

/// Mount `/info` (ACZ mode) and `/manifest.txt`
async fn mount_acz_server(server: &MockServer, manifest: &str) {
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"build":{"acz":true,"manifest_url":"","manifest_download_url":""}}"#),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/manifest.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(manifest.to_string()))
        .mount(server)
        .await;
}

async fn mount_download(server: &MockServer, index: u32, body: Vec<u8>) {
    Mock::given(method("POST"))
        .and(path("/download"))
        .and(header("X-Robust-Download-Protocol", "1"))
        .and(body_bytes(index.to_le_bytes().to_vec()))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_uncompressed_file() {
    let server = MockServer::start().await;
    mount_acz_server(&server, MANIFEST).await;

    let mut body = Vec::new();
    body.extend(0u32.to_le_bytes());
    body.extend(5u32.to_le_bytes());
    body.extend(b"hello");
    mount_download(&server, 0, body).await;

    let bytes = client()
        .fetch_file(&server.uri(), "Textures/a.png")
        .await
        .expect("Operation should succeed");

    assert_eq!(bytes, b"hello");
}

#[tokio::test]
async fn test_compressed_file() {
    let server = MockServer::start().await;
    mount_acz_server(&server, MANIFEST).await;

    let packed = zstd::encode_all(&b"hello world"[..], 3).unwrap();
    let mut body = Vec::new();
    body.extend(1u32.to_le_bytes());
    body.extend(11u32.to_le_bytes());
    body.extend((packed.len() as u32).to_le_bytes());
    body.extend(&packed);
    mount_download(&server, 1, body).await;

    let bytes = client()
        .fetch_file(&server.uri(), "Sound/b.ogg")
        .await
        .expect("Operation should succeed");

    assert_eq!(bytes, b"hello world");
}

#[tokio::test]
async fn test_compression_enabled_but_blob_raw() {
    let server = MockServer::start().await;
    mount_acz_server(&server, MANIFEST).await;

    let mut response = DownloadResponseBuilder::new(StreamFlags::PRE_COMPRESSED);
    response.push_raw(
        FileHeader {
            file_length: 5,
            compressed_length: Some(0),
        },
        b"hello",
    );
    mount_download(&server, 0, response.build().to_vec()).await;

    let bytes = client()
        .fetch_file(&server.uri(), "Textures/a.png")
        .await
        .expect("Operation should succeed");

    assert_eq!(bytes, b"hello");
}

#[tokio::test]
async fn test_missing_path_never_hits_download() {
    let server = MockServer::start().await;
    mount_acz_server(&server, MANIFEST).await;

    Mock::given(method("POST"))
        .and(path("/download"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client()
        .fetch_file(&server.uri(), "missing.png")
        .await
        .expect_err("Test operation should fail");

    assert_eq!(err.kind(), ErrorKind::ManifestLookup);
}

#[tokio::test]
async fn test_truncated_download_writes_nothing() {
    let server = MockServer::start().await;
    mount_acz_server(&server, MANIFEST).await;

    let mut body = Vec::new();
    body.extend(0u32.to_le_bytes());
    body.extend(100u32.to_le_bytes());
    body.extend([7u8; 50]);
    mount_download(&server, 0, body).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let dest = dir.path().join("a.png");

    let result = client().fetch_file(&server.uri(), "Textures/a.png").await;
    if let Ok(bytes) = &result {
        write_atomic(&dest, bytes).await.expect("write");
    }

    let err = result.expect_err("Test operation should fail");
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(!dest.exists());
    assert_eq!(std::fs::read_dir(dir.path()).expect("read_dir").count(), 0);
}

#[tokio::test]
async fn test_decompressed_length_mismatch() {
    let server = MockServer::start().await;
    mount_acz_server(&server, MANIFEST).await;

    let packed = zstd::encode_all(&b"0123456789"[..], 3).unwrap();
    let mut response = DownloadResponseBuilder::new(StreamFlags::PRE_COMPRESSED);
    response.push_raw(
        FileHeader {
            file_length: 11,
            compressed_length: Some(packed.len() as u32),
        },
        &packed,
    );
    mount_download(&server, 0, response.build().to_vec()).await;

    let err = client()
        .fetch_file(&server.uri(), "Textures/a.png")
        .await
        .expect_err("Test operation should fail");

    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert!(matches!(err, ContentError::Frame(_)));
}

#[tokio::test]
async fn test_external_hosting() {
    let game = MockServer::start().await;
    let cdn = MockServer::start().await;

    let info = serde_json::json!({
        "build": {
            "acz": false,
            "manifest_url": format!("{}/build/manifest.txt", cdn.uri()),
            "manifest_download_url": format!("{}/build/download", cdn.uri()),
        }
    });
    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(info))
        .mount(&game)
        .await;

    Mock::given(method("GET"))
        .and(path("/build/manifest.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MANIFEST))
        .mount(&cdn)
        .await;

    let mut response = DownloadResponseBuilder::new(StreamFlags::NONE);
    response.push_blob(b"ogg data").expect("push");
    Mock::given(method("POST"))
        .and(path("/build/download"))
        .and(body_bytes(vec![1, 0, 0, 0]))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(response.build().to_vec()))
        .expect(1)
        .mount(&cdn)
        .await;

    let bytes = client()
        .fetch_file(&game.uri(), "Sound/b.ogg")
        .await
        .expect("Operation should succeed");

    assert_eq!(bytes, b"ogg data");
}

#[tokio::test]
async fn test_session_fetch_many() {
    let server = MockServer::start().await;
    let manifest = Manifest::from_entries(
        DEFAULT_HEADER,
        [("AA", "one.txt"), ("BB", "dir/two words.txt"), ("CC", "three.bin")],
    )
    .unwrap();
    mount_acz_server(&server, &manifest.build()).await;

    let three = vec![0xABu8; 4096];
    let mut response = DownloadResponseBuilder::new(StreamFlags::PRE_COMPRESSED);
    response.push_blob(&three).expect("push");
    response.push_blob(b"two").expect("push");
    Mock::given(method("POST"))
        .and(path("/download"))
        .and(body_bytes(vec![2, 0, 0, 0, 1, 0, 0, 0]))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(response.build().to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let session = client().open(&server.uri()).await.expect("open");
    assert!(session.build_info().acz);
    assert_eq!(session.manifest().header(), DEFAULT_HEADER);
    assert_eq!(session.download_url(), format!("{}/download", server.uri()));

    let files = session
        .fetch_many(&["three.bin", "dir/two words.txt"])
        .await
        .expect("Operation should succeed");

    assert_eq!(files, vec![three, b"two".to_vec()]);
}

#[tokio::test]
async fn test_fetch_index_out_of_bounds() {
    let server = MockServer::start().await;
    mount_acz_server(&server, MANIFEST).await;

    let session = client().open(&server.uri()).await.expect("open");
    let err = session
        .fetch_index(2)
        .await
        .expect_err("Test operation should fail");

    assert_eq!(err.kind(), ErrorKind::ManifestLookup);
}

#[tokio::test]
async fn test_probe_before_download() {
    let server = MockServer::start().await;
    mount_acz_server(&server, MANIFEST).await;

    Mock::given(method("OPTIONS"))
        .and(path("/download"))
        .respond_with(
            ResponseTemplate::new(204)
                .insert_header("X-Robust-Download-Min-Protocol", "2")
                .insert_header("X-Robust-Download-Max-Protocol", "2"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = ContentClient::new(ClientConfig {
        probe_protocol: true,
        accept_zstd: false,
        ..ClientConfig::default()
    })
    .unwrap();

    let err = client
        .fetch_file(&server.uri(), "Textures/a.png")
        .await
        .expect_err("Test operation should fail");

    assert!(matches!(err, ContentError::UnsupportedProtocol { .. }));
}

#[tokio::test]
async fn test_info_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/info"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client()
        .fetch_file(&server.uri(), "Textures/a.png")
        .await
        .expect_err("Test operation should fail");

    assert_eq!(err.kind(), ErrorKind::Network);
}

#[tokio::test]
async fn test_concurrent_resolutions() {
    let server = MockServer::start().await;
    mount_acz_server(&server, MANIFEST).await;

    let mut a = DownloadResponseBuilder::new(StreamFlags::NONE);
    a.push_blob(b"png").expect("push");
    mount_download(&server, 0, a.build().to_vec()).await;

    let mut b = DownloadResponseBuilder::new(StreamFlags::NONE);
    b.push_blob(b"ogg").expect("push");
    mount_download(&server, 1, b.build().to_vec()).await;

    let client = client();
    let uri = server.uri();
    let (png, ogg) = tokio::join!(
        client.fetch_file(&uri, "Textures/a.png"),
        client.fetch_file(&uri, "Sound/b.ogg"),
    );

    assert_eq!(png.expect("png"), b"png");
    assert_eq!(ogg.expect("ogg"), b"ogg");
}
