use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::{Matcher, Server, ServerGuard};
use predicates::str::contains;
use std::path::Path;
use tempfile::{TempDir, tempdir};

const DJANGO: &str = r#"{
    "namespace": "python",
    "name": "django",
    "source": "https://github.com/django/django",
    "resource_uri": "/v1/changelogs/1/",
    "latest_version": "1.9",
    "description": "The Web framework for perfectionists with deadlines."
}"#;

/// `amch` against `server`, isolated from the caller's environment and settings.
fn amch(server: &ServerGuard, token: Option<&str>) -> (Command, TempDir) {
    let settings_dir = tempdir().unwrap();
    let settings = settings_dir.path().join("config.toml");
    std::fs::write(&settings, "").unwrap();

    let mut cmd = Command::new(cargo::cargo_bin!("amch"));
    cmd.env_remove("AMCH_TOKEN")
        .env_remove("AMCH_BASE_URL")
        .env_remove("AMCH_DEBUG")
        .env("AMCH_CONFIG", &settings)
        .arg("--base-url")
        .arg(format!("{}/v1", server.url()));
    if let Some(token) = token {
        cmd.arg("--token").arg(token);
    }
    (cmd, settings_dir)
}

fn mock_tracked(server: &mut ServerGuard, body: &str) -> mockito::Mock {
    server
        .mock("GET", "/v1/changelogs/")
        .match_query(Matcher::UrlEncoded("tracked".into(), "True".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}

fn mock_lookup(server: &mut ServerGuard, name: &str, body: &str) -> mockito::Mock {
    server
        .mock("GET", "/v1/changelogs/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("namespace".into(), "python".into()),
            Matcher::UrlEncoded("name".into(), name.into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}

#[test]
fn test_add_creates_and_tracks() {
    let mut server = Server::new();
    let url = server.url();

    let _tracked = mock_tracked(&mut server, "[]");
    let _lookup = mock_lookup(&mut server, "django", r#"{"results": [], "next": null}"#);
    let create = server
        .mock("POST", "/v1/changelogs/")
        .match_header("Authorization", "Bearer secret")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("namespace".into(), "python".into()),
            Matcher::UrlEncoded("name".into(), "django".into()),
            Matcher::UrlEncoded("source".into(), "https://github.com/django/django".into()),
        ]))
        .with_status(201)
        .with_body(DJANGO)
        .create();
    let track = server
        .mock("POST", "/v1/changelogs/1/track/")
        .with_status(200)
        .with_body(r#"{"result": "ok"}"#)
        .create();

    let (mut cmd, _settings) = amch(&server, Some("secret"));
    cmd.arg("add")
        .arg("python/django/https://github.com/django/django")
        .assert()
        .success()
        .stdout(contains(format!(
            "{}/p/python/django/ was created and tracked",
            url
        )));

    create.assert();
    track.assert();
}

#[test]
fn test_add_asks_for_source() {
    let mut server = Server::new();
    let url = server.url();

    let _tracked = mock_tracked(&mut server, "[]");
    let _lookup = mock_lookup(&mut server, "django", "[]");
    let _guess = server
        .mock("GET", "/v1/search-autocomplete/")
        .match_query(Matcher::UrlEncoded("q".into(), "python/django".into()))
        .with_status(200)
        .with_body(r#"[{"source": "https://github.com/django/django"}, {"source": null}]"#)
        .create();
    let create = server
        .mock("POST", "/v1/changelogs/")
        .match_body(Matcher::UrlEncoded(
            "source".into(),
            "https://github.com/django/django".into(),
        ))
        .with_status(201)
        .with_body(DJANGO)
        .create();
    let _track = server
        .mock("POST", "/v1/changelogs/1/track/")
        .with_status(200)
        .create();

    let (mut cmd, _settings) = amch(&server, Some("secret"));
    cmd.arg("add")
        .arg("python/django")
        .write_stdin("5\n1\n")
        .assert()
        .success()
        .stdout(contains("1. https://github.com/django/django"))
        .stdout(contains("0. Enter URL manually"))
        .stdout(contains("Please enter a number from 0 to 1."))
        .stdout(contains(format!(
            "{}/p/python/django/ was created and tracked",
            url
        )));

    create.assert();
}

#[test]
fn test_add_skip_makes_no_changes() {
    let mut server = Server::new();

    let _tracked = mock_tracked(&mut server, "[]");
    let _lookup = mock_lookup(&mut server, "django", "[]");
    let _guess = server
        .mock("GET", "/v1/search-autocomplete/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create();
    let create = server
        .mock("POST", "/v1/changelogs/")
        .expect(0)
        .create();

    let (mut cmd, _settings) = amch(&server, Some("secret"));
    cmd.arg("add")
        .arg("python/django")
        .write_stdin("skip\n")
        .assert()
        .success()
        .stdout(contains("/p/python/django/ was skipped"));

    create.assert();
}

#[test]
fn test_add_requires_token() {
    let mut server = Server::new();
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create();

    let (mut cmd, _settings) = amch(&server, None);
    cmd.arg("add")
        .arg("python/django")
        .assert()
        .failure()
        .stderr(contains("Authentication required"));

    any.assert();
}

#[test]
fn test_tags_requires_token() {
    let mut server = Server::new();
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create();

    let (mut cmd, _settings) = amch(&server, None);
    cmd.arg("tags")
        .assert()
        .failure()
        .stderr(contains("Authentication required"));

    any.assert();
}

#[test]
fn test_add_warns_about_other_source_of_tracked_package() {
    let mut server = Server::new();

    let _tracked = mock_tracked(&mut server, &format!("[{}]", DJANGO));
    let _lookup = mock_lookup(&mut server, "django", &format!("[{}]", DJANGO));
    let track = server
        .mock("POST", "/v1/changelogs/1/track/")
        .expect(0)
        .create();

    let (mut cmd, _settings) = amch(&server, Some("secret"));
    cmd.arg("add")
        .arg("python/django/https://example.com/django")
        .assert()
        .success()
        .stdout(contains(
            "Warning! You already track package python/django, but with url https://github.com/django/django.",
        ));

    track.assert();
}

#[test]
fn test_settings_file_provides_token() {
    let mut server = Server::new();
    let url = server.url();

    let _tracked = mock_tracked(&mut server, "[]");
    let _lookup = mock_lookup(&mut server, "django", &format!("[{}]", DJANGO));
    let track = server
        .mock("POST", "/v1/changelogs/1/track/")
        .match_header("Authorization", "Bearer from-file")
        .with_status(200)
        .create();

    let (mut cmd, settings_dir) = amch(&server, None);
    std::fs::write(
        settings_dir.path().join("config.toml"),
        "token = \"from-file\"\n",
    )
    .unwrap();

    cmd.arg("add")
        .arg("python/django")
        .assert()
        .success()
        .stdout(contains(format!("{}/p/python/django/ was tracked", url)));

    track.assert();
}

#[test]
fn test_tag_version() {
    let mut server = Server::new();

    let _lookup = mock_lookup(&mut server, "django", &format!("[{}]", DJANGO));
    let _versions = server
        .mock("GET", "/v1/versions/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("changelog__namespace".into(), "python".into()),
            Matcher::UrlEncoded("changelog__name".into(), "django".into()),
            Matcher::UrlEncoded("number".into(), "1.8.10".into()),
        ]))
        .with_status(200)
        .with_body(r#"[{"id": 10, "number": "1.8.10"}]"#)
        .create();
    let tag = server
        .mock("POST", "/v1/changelogs/1/tag/")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("name".into(), "allmychanges.com".into()),
            Matcher::UrlEncoded("version".into(), "1.8.10".into()),
        ]))
        .with_status(201)
        .with_body("{}")
        .create();

    let (mut cmd, _settings) = amch(&server, Some("secret"));
    cmd.args(["tag", "python/django", "1.8.10", "allmychanges.com"])
        .assert()
        .success();

    tag.assert();
}

#[test]
fn test_tag_unknown_version_warns() {
    let mut server = Server::new();

    let _lookup = mock_lookup(&mut server, "django", &format!("[{}]", DJANGO));
    let _versions = server
        .mock("GET", "/v1/versions/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create();
    let tag = server
        .mock("POST", "/v1/changelogs/1/tag/")
        .expect(0)
        .create();

    let (mut cmd, _settings) = amch(&server, Some("secret"));
    cmd.args(["tag", "python/django", "1.8.10", "allmychanges.com"])
        .assert()
        .success()
        .stdout(contains(
            "Version 1.8.10 not found. Tag will be bound to the version when it will be discovered.",
        ));

    tag.assert();
}

#[test]
fn test_versions_lists_tags() {
    let mut server = Server::new();

    let _lookup = server
        .mock("GET", "/v1/changelogs/")
        .match_query(Matcher::UrlEncoded("name".into(), "django".into()))
        .with_status(200)
        .with_body(format!("[{}]", DJANGO))
        .create();
    let _versions = server
        .mock("GET", "/v1/versions/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"[{"number": "1.9"}, {"number": "1.8.10"}]"#)
        .create();
    let _tags = server
        .mock("GET", "/v1/tags/")
        .match_query(Matcher::UrlEncoded("project_id".into(), "1".into()))
        .with_status(200)
        .with_body(r#"[{"name": "prod", "changelog": 1, "version_number": "1.8.10"}]"#)
        .create();

    let (mut cmd, _settings) = amch(&server, None);
    cmd.args(["versions", "django"])
        .assert()
        .success()
        .stdout(contains("1.9\n"))
        .stdout(contains("1.8.10: prod\n"));
}

#[test]
fn test_export_to_file() {
    let mut server = Server::new();

    let _tracked = mock_tracked(&mut server, &format!("[{}]", DJANGO));
    let output_dir = tempdir().unwrap();
    let output = output_dir.path().join("packages.yaml");

    let (mut cmd, _settings) = amch(&server, Some("secret"));
    cmd.arg("export")
        .arg("--format")
        .arg("yaml")
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("namespace: python"));
    assert!(content.contains("name: django"));
    assert!(content.contains("https://github.com/django/django"));
}

#[test]
fn test_export_csv_to_stdout() {
    let mut server = Server::new();

    let _tracked = mock_tracked(&mut server, &format!("[{}]", DJANGO));

    let (mut cmd, _settings) = amch(&server, Some("secret"));
    cmd.arg("export")
        .arg("--format")
        .arg("csv")
        .assert()
        .success()
        .stdout(contains(
            "namespace,name,source\npython,django,https://github.com/django/django\n",
        ));
}

fn write_import_file(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("packages.json");
    std::fs::write(
        &path,
        r#"[
            {"namespace": "python", "name": "django", "source": "https://github.com/django/django", "version": "1.8.10", "tag": "prod"},
            {"namespace": "", "name": ""}
        ]"#,
    )
    .unwrap();
    path
}

#[test]
fn test_import_tracks_and_reports_missing_versions() {
    let mut server = Server::new();
    let url = server.url();

    let _tracked = mock_tracked(&mut server, "[]");
    let _lookup = mock_lookup(&mut server, "django", &format!("[{}]", DJANGO));
    let track = server
        .mock("POST", "/v1/changelogs/1/track/")
        .with_status(200)
        .expect(1)
        .create();
    let _versions = server
        .mock("GET", "/v1/versions/")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("[]")
        .create();

    let input_dir = tempdir().unwrap();
    let input = write_import_file(input_dir.path());

    let (mut cmd, _settings) = amch(&server, Some("secret"));
    cmd.arg("import")
        .arg("--input")
        .arg(&input)
        .assert()
        .success()
        .stdout(contains(format!("{}/p/python/django/ was tracked", url)))
        .stdout(contains("python/django\n    Version 1.8.10 not found."));

    track.assert();
}

#[test]
fn test_untrack() {
    let mut server = Server::new();
    let url = server.url();

    let _lookup = mock_lookup(&mut server, "django", &format!("[{}]", DJANGO));
    let untrack = server
        .mock("POST", "/v1/changelogs/1/untrack/")
        .with_status(200)
        .create();

    let (mut cmd, _settings) = amch(&server, Some("secret"));
    cmd.args(["untrack", "python/django"])
        .assert()
        .success()
        .stdout(contains(format!("{}/p/python/django/ was untracked", url)));

    untrack.assert();
}

#[test]
fn test_server_error_mentions_request_id() {
    let mut server = Server::new();

    let _tracked = server
        .mock("GET", "/v1/changelogs/")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_header("x-request-id", "req-42")
        .create();

    let (mut cmd, _settings) = amch(&server, Some("secret"));
    cmd.args(["export"])
        .assert()
        .failure()
        .stderr(contains("support@allmychanges.com"))
        .stderr(contains("req-42"));
}
