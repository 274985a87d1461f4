//! End-to-end tests driving synchronisation, apply, and revert against a
//! mocked GitHub host, a real `SQLite` database, and real directories.

mod support;

use patchtester::persistence::PullFilter;
use patchtester::{PatchError, PullListSynchronizer, PullRepository, SyncSettings, TestRepository};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use support::github::{GithubMock, changed_file, plain_issue, pull_issue};
use support::sandbox::Sandbox;

const PULL_ID: u64 = 12;
const HEAD_SHA: &str = "0f1e2d3c";

async fn mount_pull_twelve(github: &GithubMock) {
    github.mount_pull(PULL_ID, HEAD_SHA, true).await;
    github
        .mount_files(
            PULL_ID,
            json!([
                changed_file("index.php", "modified", None),
                changed_file("media/js/menu.js", "added", None),
                changed_file("obsolete.txt", "removed", None),
                changed_file("src/Menu/Item.php", "renamed", Some("src/Menu/Entry.php")),
                changed_file("tests/Unit/MenuTest.php", "added", None),
            ]),
        )
        .await;
    github.mount_contents("index.php", b"<?php echo 'patched';").await;
    github.mount_contents("media/js/menu.js", b"console.log('menu');").await;
    github
        .mount_contents("src/Menu/Item.php", b"<?php class Item {}")
        .await;
}

fn seed_site(sandbox: &Sandbox) {
    sandbox.write("index.php", b"<?php echo 'original';");
    sandbox.write("obsolete.txt", &[0, 159, 146, 150, 255]);
    sandbox.write("Menu/Entry.php", b"<?php class Entry {}");
}

#[tokio::test]
async fn sync_apply_and_revert_round_trip() {
    let github = GithubMock::start().await;
    github.mount_rate_limit(5000).await;
    github
        .mount_issue_page(
            1,
            json!([
                pull_issue(PULL_ID, "Fix menu rendering", &["RTC", "PR-4.0-dev"]),
                plain_issue(13),
                pull_issue(14, "Improve docs", &[]),
            ]),
        )
        .await;
    github.mount_issue_page(2, json!([])).await;
    mount_pull_twelve(&github).await;

    let sandbox = Sandbox::new();
    seed_site(&sandbox);
    let stores = sandbox.stores();
    let gateway = github.gateway();

    let mut synchronizer = PullListSynchronizer::new(
        &gateway,
        &stores.pulls,
        &stores.tests,
        SyncSettings::default(),
    );
    let pages = synchronizer
        .sync_all(|_, _| {})
        .await
        .expect("sync should succeed");
    assert_eq!(pages, 2);
    assert_eq!(
        stores
            .pulls
            .count(&PullFilter::default())
            .expect("count should succeed"),
        2,
        "plain issues are not mirrored"
    );

    let engine = stores.engine(&gateway);
    let applied = engine.apply(PULL_ID).await.expect("apply should succeed");
    assert!(applied);

    assert_eq!(
        sandbox.read("index.php").as_deref(),
        Some(b"<?php echo 'patched';".as_slice())
    );
    assert_eq!(
        sandbox.read("media/js/menu.js").as_deref(),
        Some(b"console.log('menu');".as_slice())
    );
    assert_eq!(sandbox.read("obsolete.txt"), None);
    assert_eq!(sandbox.read("Menu/Entry.php"), None);
    assert_eq!(
        sandbox.read("Menu/Item.php").as_deref(),
        Some(b"<?php class Item {}".as_slice())
    );
    assert_eq!(sandbox.read("tests/Unit/MenuTest.php"), None);
    assert_eq!(sandbox.backup_count(), 3);

    let pull = stores
        .pulls
        .find(PULL_ID)
        .expect("find should succeed")
        .expect("pull should be mirrored");
    assert_eq!(pull.applied_sha, HEAD_SHA);
    assert!(pull.is_fast_track);
    assert_eq!(pull.branch, "4.0-dev");
    let applied_tests = stores.tests.list_applied().expect("list should succeed");
    assert_eq!(applied_tests.len(), 1);
    let test_id = applied_tests.first().map(|test| test.id).expect("one test");

    let refused = synchronizer
        .sync(1)
        .await
        .expect_err("sync should refuse while a patch is applied");
    assert_eq!(refused, PatchError::AppliedPatchesPresent { count: 1 });

    assert!(engine.revert(test_id).expect("revert should succeed"));

    assert_eq!(
        sandbox.read("index.php").as_deref(),
        Some(b"<?php echo 'original';".as_slice())
    );
    assert_eq!(sandbox.read("media/js/menu.js"), None);
    assert_eq!(
        sandbox.read("obsolete.txt").as_deref(),
        Some([0, 159, 146, 150, 255].as_slice())
    );
    assert_eq!(
        sandbox.read("Menu/Entry.php").as_deref(),
        Some(b"<?php class Entry {}".as_slice())
    );
    assert_eq!(sandbox.read("Menu/Item.php"), None);
    assert_eq!(sandbox.backup_count(), 0);
    assert!(stores.tests.list_applied().expect("list should succeed").is_empty());
    let reverted = stores
        .pulls
        .find(PULL_ID)
        .expect("find should succeed")
        .expect("pull should be mirrored");
    assert_eq!(reverted.applied_sha, "");
}

#[tokio::test]
async fn exhausted_quota_stops_apply_before_any_other_request() {
    let github = GithubMock::start().await;
    github.mount_rate_limit(0).await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/api/v3/repos/{}/{}/pulls/{PULL_ID}",
            support::github::OWNER,
            support::github::REPO
        )))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&github.server)
        .await;

    let sandbox = Sandbox::new();
    seed_site(&sandbox);
    let stores = sandbox.stores();
    let gateway = github.gateway();

    let error = stores
        .engine(&gateway)
        .apply(PULL_ID)
        .await
        .expect_err("apply should be refused");

    assert_eq!(
        error,
        PatchError::RateLimitExceeded {
            resets_at: "2023-11-14 22:13:20 UTC".to_owned()
        }
    );
    assert_eq!(
        sandbox.read("index.php").as_deref(),
        Some(b"<?php echo 'original';".as_slice())
    );
    assert_eq!(sandbox.backup_count(), 0);
}

#[tokio::test]
async fn deleted_fork_reports_repo_gone() {
    let github = GithubMock::start().await;
    github.mount_rate_limit(5000).await;
    github.mount_pull(PULL_ID, HEAD_SHA, false).await;

    let sandbox = Sandbox::new();
    let stores = sandbox.stores();
    let gateway = github.gateway();

    let error = stores
        .engine(&gateway)
        .apply(PULL_ID)
        .await
        .expect_err("apply should fail");

    assert_eq!(error, PatchError::RepoGone { pull_id: PULL_ID });
    assert!(!error.is_unsafe());
}

#[tokio::test]
async fn missing_local_file_aborts_before_mutation() {
    let github = GithubMock::start().await;
    github.mount_rate_limit(5000).await;
    mount_pull_twelve(&github).await;

    let sandbox = Sandbox::new();
    sandbox.write("index.php", b"<?php echo 'original';");
    let stores = sandbox.stores();
    let gateway = github.gateway();

    let error = stores
        .engine(&gateway)
        .apply(PULL_ID)
        .await
        .expect_err("apply should fail");

    assert_eq!(
        error,
        PatchError::MissingLocalFile {
            path: "obsolete.txt".to_owned()
        }
    );
    assert_eq!(sandbox.read("media/js/menu.js"), None);
    assert_eq!(
        sandbox.read("index.php").as_deref(),
        Some(b"<?php echo 'original';".as_slice())
    );
    assert_eq!(sandbox.backup_count(), 0);
}

#[tokio::test]
async fn github_outage_is_reported_as_remote_unavailable() {
    let github = GithubMock::start().await;
    github.mount_rate_limit(5000).await;
    Mock::given(method("GET"))
        .and(path(format!(
            "/api/v3/repos/{}/{}/pulls/{PULL_ID}",
            support::github::OWNER,
            support::github::REPO
        )))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&github.server)
        .await;

    let sandbox = Sandbox::new();
    let stores = sandbox.stores();
    let gateway = github.gateway();

    let error = stores
        .engine(&gateway)
        .apply(PULL_ID)
        .await
        .expect_err("apply should fail");

    assert!(
        matches!(error, PatchError::RemoteUnavailable { .. }),
        "unexpected error: {error:?}"
    );
}
