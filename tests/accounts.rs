use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;

use registrard::client::Client;
use registrard::db::Store;
use registrard::error::OpError;
use registrard::ipc::{self, Ctx, Request};
use registrard::server::Server;
use registrard::store;

fn temp_store(prefix: &str) -> Store {
    let dir = std::env::temp_dir().join(format!(
        "registrard-{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    Store::open(&dir.join("registrar.sqlite3")).expect("open store")
}

#[test]
fn change_password_requires_the_old_one() {
    let store = temp_store("acct-change");
    let conn = store.conn().expect("conn");
    store::create_account(&conn, "alice", "oldpass1", "admin").expect("create");

    let err = store::change_password(&conn, "alice", "wrongpass", "newpass1")
        .expect_err("wrong old password");
    assert!(matches!(err, OpError::NotFound(_)));
    store::authenticate(&conn, "alice", "oldpass1").expect("old password still valid");

    store::change_password(&conn, "alice", "oldpass1", "newpass1").expect("change");
    store::authenticate(&conn, "alice", "newpass1").expect("new password works");
    assert!(store::authenticate(&conn, "alice", "oldpass1").is_err());
}

#[test]
fn reset_password_skips_the_old_one() {
    let store = temp_store("acct-reset");
    let conn = store.conn().expect("conn");
    let user_id = store::create_account(&conn, "bob", "forgotten1", "teacher").expect("create");

    store::reset_password(&conn, user_id, "fresh123").expect("reset");
    store::authenticate(&conn, "bob", "fresh123").expect("login");

    let err = store::reset_password(&conn, user_id + 1000, "fresh123").expect_err("no such user");
    assert!(matches!(err, OpError::NotFound(_)));
}

#[test]
fn inactive_accounts_cannot_log_in() {
    let store = temp_store("acct-status");
    let conn = store.conn().expect("conn");
    let user_id = store::create_account(&conn, "carol", "secret12", "student").expect("create");

    store::set_account_status(&conn, user_id, "inactive").expect("deactivate");
    let err = store::authenticate(&conn, "carol", "secret12").expect_err("must refuse");
    // Indistinguishable from bad credentials on purpose.
    assert_eq!(err.client_message(), "invalid username or password");

    store::set_account_status(&conn, user_id, "active").expect("reactivate");
    store::authenticate(&conn, "carol", "secret12").expect("login again");

    let err = store::set_account_status(&conn, user_id, "suspended").expect_err("bad status");
    assert!(matches!(err, OpError::Validation(_)));
}

#[test]
fn audit_log_records_and_clears() {
    let store = temp_store("acct-log");
    let conn = store.conn().expect("conn");

    store::add_log(&conn, Some("admin"), "login", "user admin logged in").expect("log 1");
    store::add_log(&conn, None, "clear_logs", "logs wiped").expect("log 2");

    let logs = store::list_logs(&conn, 10).expect("list");
    assert_eq!(logs.len(), 2);
    // Newest first.
    assert_eq!(logs[0].action, "clear_logs");
    assert_eq!(logs[0].username, None);
    assert_eq!(logs[1].username.as_deref(), Some("admin"));

    assert_eq!(store::list_logs(&conn, 1).expect("limited").len(), 1);

    store::clear_logs(&conn).expect("clear");
    assert!(store::list_logs(&conn, 10).expect("list").is_empty());
}

#[test]
fn wire_login_leaves_an_audit_trail() {
    let store = temp_store("acct-wire");
    {
        let conn = store.conn().expect("conn");
        store::create_account(&conn, "admin", "admin123", "admin").expect("create");
    }
    let server = Server::bind("127.0.0.1:0", store.clone()).expect("bind");
    let addr = server.local_addr().expect("addr").to_string();
    thread::spawn(move || {
        let _ = server.run();
    });

    let mut client = Client::connect(&addr).expect("connect");
    let resp = client.login("admin", "admin123").expect("login");
    assert!(resp.success, "{resp:?}");
    // Failed attempts must not be logged as logins.
    let resp = client.login("admin", "wrong").expect("bad login");
    assert!(!resp.success);

    let conn = store.conn().expect("conn");
    let logins: Vec<_> = store::list_logs(&conn, 10)
        .expect("list")
        .into_iter()
        .filter(|l| l.action == "login")
        .collect();
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].username.as_deref(), Some("admin"));
}

#[test]
fn admin_mutations_leave_audit_entries() {
    let store = temp_store("acct-audit");
    let server = Server::bind("127.0.0.1:0", store.clone()).expect("bind");
    let addr = server.local_addr().expect("addr").to_string();
    thread::spawn(move || {
        let _ = server.run();
    });

    let mut client = Client::connect(&addr).expect("connect");
    let resp = client
        .call(
            "add_course",
            json!({
                "course_id": "CS101",
                "course_name": "Intro Course",
                "credits": 3.0,
                "hours": 48,
            }),
        )
        .expect("add_course");
    assert!(resp.success, "{resp:?}");
    let resp = client
        .call(
            "add_student",
            json!({
                "student_id": "2021001001",
                "username": "audit_student",
                "password": "student123",
                "name": "Audit Student",
            }),
        )
        .expect("add_student");
    assert!(resp.success, "{resp:?}");
    let resp = client
        .call("delete_course", json!({ "course_id": "CS101" }))
        .expect("delete_course");
    assert!(resp.success, "{resp:?}");

    let conn = store.conn().expect("conn");
    let actions: Vec<String> = store::list_logs(&conn, 10)
        .expect("list")
        .into_iter()
        .map(|l| l.action)
        .collect();
    // Newest first, one row per successful mutation.
    assert_eq!(actions, vec!["delete_course", "add_student", "add_course"]);

    // A rejected mutation leaves no trail.
    let resp = client
        .call("delete_course", json!({ "course_id": "CS101" }))
        .expect("repeat delete");
    assert!(!resp.success);
    assert_eq!(store::list_logs(&conn, 10).expect("list").len(), 3);
}

#[test]
fn login_survives_a_broken_audit_table() {
    let store = temp_store("acct-broken-log");
    let conn = store.conn().expect("conn");
    store::create_account(&conn, "admin", "admin123", "admin").expect("create");
    conn.execute("DROP TABLE logs", []).expect("drop logs");

    let mut ctx = Ctx::new(store.conn().expect("conn"));
    let req = Request {
        operation: "login".to_string(),
        args: json!({ "username": "admin", "password": "admin123" }),
    };
    // The audit write fails; the login itself must not.
    let resp = ipc::handle_request(&mut ctx, &req);
    assert_eq!(resp["success"], true, "{resp}");
    assert_eq!(resp["data"]["user"]["username"], "admin");
}
