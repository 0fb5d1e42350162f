//! Integration tests for the harvester
//!
//! These tests use wiremock to serve a small site and run full harvests
//! into temporary directories.

use site_harvester::config::Config;
use site_harvester::crawler::{run_harvest, Harvester};
use site_harvester::ResourceCategory;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Configuration pointed at the mock server's `/fr-ca/` section
fn test_config(server: &MockServer, output: &Path, max_depth: u32) -> Config {
    let mut config = Config::for_start_url(format!("{}/fr-ca/", server.uri()));
    config.crawler.max_depth = max_depth;
    config.fetch.max_retries = 0;
    config.fetch.backoff_base_ms = 1;
    config.fetch.backoff_max_ms = 1;
    config.output.directory = output.to_path_buf();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

fn page(title: &str, links: &str) -> String {
    format!(
        r#"<html><head><title>{title}</title></head><body>
            <nav><a href="/fr-ca/">Accueil</a></nav>
            <main>
                <h1>{title}</h1>
                <p>Cette page présente {title} avec suffisamment de texte pour être conservée.</p>
                {links}
            </main>
            <footer>Pied de page</footer>
        </body></html>"#
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(&body))
        .mount(server)
        .await;
}

async fn mount_pdf(server: &MockServer, route: &str, expected_gets: u64) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4 fiche technique".to_vec()),
        )
        .expect(expected_gets)
        .mount(server)
        .await;
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn tracked_urls(output: &Path) -> Vec<String> {
    fs::read_to_string(output.join("logs").join("downloaded_files.txt"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_language_scoped_harvest() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/fr-ca/",
        page(
            "Accueil",
            r#"<a href="/fr-ca/produit">Produit</a>
               <a href="/en-us/produit">Product</a>
               <a href="/fr-ca/fiche.pdf">Fiche</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/fr-ca/produit", page("Produit", "")).await;
    mount_pdf(&server, "/fr-ca/fiche.pdf", 1).await;
    Mock::given(method("GET"))
        .and(path("/en-us/produit"))
        .respond_with(html("<main>English</main>"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let stats = run_harvest(test_config(&server, dir.path(), 1))
        .await
        .unwrap();

    assert_eq!(stats.pages_visited, 2);
    assert_eq!(stats.pages_processed, 2);
    assert_eq!(stats.downloads_for(ResourceCategory::Pdf), 1);
    assert_eq!(tracked_urls(dir.path()), vec![format!("{}/fr-ca/fiche.pdf", base)]);

    let pdfs = files_in(&dir.path().join("PDF"));
    assert_eq!(pdfs.len(), 1);
    assert!(pdfs[0].starts_with("fiche_") && pdfs[0].ends_with(".pdf"));
    assert_eq!(files_in(&dir.path().join("content")).len(), 2);

    let report = fs::read_to_string(dir.path().join("crawler_report.txt")).unwrap();
    assert!(report.contains(&format!("{}/fr-ca/\n", base)));
    assert!(report.contains(&format!("{}/fr-ca/produit\n", base)));
    assert!(!report.contains("/en-us/"));
    assert!(report.contains("Language Pattern: /fr-ca/"));
}

#[tokio::test]
async fn test_depth_bound() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/fr-ca/",
        page("Accueil", r#"<a href="/fr-ca/niveau-1">Niveau 1</a>"#),
    )
    .await;
    mount_page(
        &server,
        "/fr-ca/niveau-1",
        page("Niveau 1", r#"<a href="/fr-ca/niveau-2">Niveau 2</a>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/fr-ca/niveau-2"))
        .respond_with(html(&page("Niveau 2", "")))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let stats = run_harvest(test_config(&server, dir.path(), 1))
        .await
        .unwrap();

    assert_eq!(stats.pages_visited, 2);
    let report = fs::read_to_string(dir.path().join("crawler_report.txt")).unwrap();
    assert!(report.contains("/fr-ca/niveau-1"));
    assert!(!report.contains("/fr-ca/niveau-2"));
}

#[tokio::test]
async fn test_downloads_are_idempotent_across_runs() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/fr-ca/",
        page("Accueil", r#"<a href="/fr-ca/fiche.pdf">Fiche</a>"#),
    )
    .await;
    // One GET over both runs
    mount_pdf(&server, "/fr-ca/fiche.pdf", 1).await;

    let dir = TempDir::new().unwrap();
    for _ in 0..2 {
        run_harvest(test_config(&server, dir.path(), 2))
            .await
            .unwrap();
    }

    assert_eq!(files_in(&dir.path().join("PDF")).len(), 1);
    assert_eq!(tracked_urls(dir.path()), vec![format!("{}/fr-ca/fiche.pdf", base)]);
}

#[tokio::test]
async fn test_existing_file_is_recorded_without_refetch() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/fr-ca/",
        page("Accueil", r#"<a href="/fr-ca/fiche.pdf">Fiche</a>"#),
    )
    .await;
    mount_pdf(&server, "/fr-ca/fiche.pdf", 1).await;

    let dir = TempDir::new().unwrap();
    run_harvest(test_config(&server, dir.path(), 1))
        .await
        .unwrap();

    // Forget the tracking file; the file on disk still prevents a second GET
    fs::remove_file(dir.path().join("logs").join("downloaded_files.txt")).unwrap();
    let stats = run_harvest(test_config(&server, dir.path(), 1))
        .await
        .unwrap();

    assert_eq!(stats.total_downloads(), 0);
    assert_eq!(stats.downloads_skipped, 1);
    assert_eq!(tracked_urls(dir.path()).len(), 1);
}

#[tokio::test]
async fn test_excluded_paths_are_never_fetched() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/fr-ca/",
        page(
            "Accueil",
            r#"<a href="/fr-ca/selecteur-de-produits/etape-1">Sélecteur</a>
               <a href="/fr-ca/selecteur-de-produits/guide.pdf">Guide</a>"#,
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/fr-ca/selecteur-de-produits/etape-1"))
        .respond_with(html(&page("Sélecteur", "")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/fr-ca/selecteur-de-produits/guide.pdf"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let stats = run_harvest(test_config(&server, dir.path(), 2))
        .await
        .unwrap();

    assert_eq!(stats.pages_visited, 1);
    assert_eq!(stats.total_downloads(), 0);
}

#[tokio::test]
async fn test_failing_page_does_not_abort_run() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/fr-ca/",
        page(
            "Accueil",
            r#"<a href="/fr-ca/casse">Cassé</a>
               <a href="/fr-ca/ok">OK</a>"#,
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/fr-ca/casse"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/fr-ca/ok", page("Page valide", "")).await;

    let dir = TempDir::new().unwrap();
    let stats = run_harvest(test_config(&server, dir.path(), 1))
        .await
        .unwrap();

    assert_eq!(stats.pages_visited, 3);
    assert_eq!(stats.pages_processed, 2);
    assert_eq!(stats.pages_failed, 1);

    let summary = fs::read_to_string(dir.path().join("summary.txt")).unwrap();
    assert!(summary.contains("Status: Completed successfully"));
}

#[tokio::test]
async fn test_content_file_has_title_and_source() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/fr-ca/", page("Catalogue", "")).await;

    let dir = TempDir::new().unwrap();
    run_harvest(test_config(&server, dir.path(), 0))
        .await
        .unwrap();

    let content_dir = dir.path().join("content");
    let files = files_in(&content_dir);
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("index_") && files[0].ends_with(".txt"));

    let text = fs::read_to_string(content_dir.join(&files[0])).unwrap();
    assert!(text.starts_with("# Catalogue\n\n"));
    assert!(text.contains(&format!("**Source:** {}/fr-ca/", base)));
    assert!(text.contains("suffisamment de texte"));
    assert!(!text.contains("Pied de page"));
}

#[tokio::test]
async fn test_short_page_is_not_saved() {
    let server = MockServer::start().await;

    mount_page(&server, "/fr-ca/", "<main><p>Court</p></main>".to_string()).await;

    let dir = TempDir::new().unwrap();
    let stats = run_harvest(test_config(&server, dir.path(), 0))
        .await
        .unwrap();

    assert_eq!(stats.pages_without_content, 1);
    assert!(files_in(&dir.path().join("content")).is_empty());
}

#[tokio::test]
async fn test_non_html_page_is_downloaded() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/fr-ca/",
        page("Accueil", r#"<a href="/fr-ca/telecharger">Télécharger</a>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/fr-ca/telecharger"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/pdf")
                .set_body_bytes(b"%PDF-1.4".to_vec()),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let stats = run_harvest(test_config(&server, dir.path(), 1))
        .await
        .unwrap();

    assert_eq!(stats.downloads_for(ResourceCategory::Pdf), 1);
    let pdfs = files_in(&dir.path().join("PDF"));
    assert!(pdfs[0].starts_with("telecharger_") && pdfs[0].ends_with(".pdf"));
}

#[tokio::test]
async fn test_timestamped_run_directory() {
    let server = MockServer::start().await;
    mount_page(&server, "/fr-ca/", page("Accueil", "")).await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(&server, dir.path(), 0);
    config.output.timestamped = true;

    let harvester = Harvester::new(config).with_config_hash("cafe");
    let run_root = harvester.layout().root().to_path_buf();
    harvester.run().await.unwrap();

    assert!(run_root.starts_with(dir.path()));
    assert!(run_root
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("crawler_output_"));
    let report = fs::read_to_string(run_root.join("crawler_report.txt")).unwrap();
    assert!(report.contains("Config Hash: cafe"));
    // Tracking file lives outside the run directory
    assert!(dir.path().join("logs").join("downloaded_files.txt").exists());
}

#[tokio::test]
async fn test_invalid_start_url_still_writes_report() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::for_start_url("not a url");
    config.output.directory = dir.path().to_path_buf();

    assert!(run_harvest(config).await.is_err());

    let summary = fs::read_to_string(dir.path().join("summary.txt")).unwrap();
    assert!(summary.contains("Status: Completed with errors"));
    let report = fs::read_to_string(dir.path().join("crawler_report.txt")).unwrap();
    assert!(report.contains("Errors\n------\n"));
    assert!(report.contains("Start URL: not a url"));
}
