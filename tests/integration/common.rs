//! Shared fixtures: configuration, mock endpoints, and a scripted browser

use mp_harvest::config::{Config, DelayConfig, LoginConfig};
use mp_harvest::login::{BrowserError, BrowserLauncher, LoginBrowser};
use mp_harvest::Credentials;
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::Path;
use std::rc::Rc;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN: &str = "4242";

/// Configuration pointing at `server`, with every file under `dir` and no delays
pub fn test_config(server: &MockServer, dir: &Path) -> Config {
    let mut config = Config::default();
    config.http.base_url = server.uri();
    config.paths.cookie_file = dir.join("account_cookie.txt");
    config.paths.qrcode_file = dir.join("qrcode.png");
    config.paths.output_dir = dir.join("out");
    config.delays = DelayConfig::none();
    config.login = LoginConfig {
        cookie_attempts: 3,
        cookie_poll_interval_ms: 10,
        status_poll_interval_ms: 10,
        timeout_secs: 5,
        settle_delay_ms: 0,
        ..LoginConfig::default()
    };
    config
}

pub fn credentials(pairs: &[(&str, &str)]) -> Credentials {
    pairs.iter().copied().collect()
}

/// Cookies the browser holds before the QR code is issued
pub fn prelim_cookies() -> Credentials {
    credentials(&[("ua_id", "ua"), ("uuid", "uu"), ("_clck", "ck")])
}

/// Cookies the browser holds after a confirmed login
pub fn full_cookies() -> Credentials {
    credentials(&[
        ("ua_id", "ua"),
        ("uuid", "uu"),
        ("_clck", "ck"),
        ("slave_sid", "sid"),
        ("slave_user", "gh_1"),
    ])
}

/// Home page that redirects to a URL carrying the token
pub async fn mount_valid_home(server: &MockServer) {
    mount_home_redirect(server, ResponseTemplate::new(200)).await;
}

/// Home page whose redirect target sets `set_cookie`
pub async fn mount_rotating_home(server: &MockServer, set_cookie: &str) {
    mount_home_redirect(
        server,
        ResponseTemplate::new(200).insert_header("set-cookie", set_cookie),
    )
    .await;
}

async fn mount_home_redirect(server: &MockServer, target: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("/cgi-bin/home?t=home/index&token={}", TOKEN).as_str()),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cgi-bin/home"))
        .respond_with(target.set_body_string("<html>home</html>"))
        .mount(server)
        .await;
}

/// Home page that stays on the login screen
pub async fn mount_expired_home(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(server)
        .await;
}

pub async fn mount_search(server: &MockServer, candidates: &[(&str, &str)]) {
    let list: Vec<_> = candidates
        .iter()
        .map(|(name, id)| {
            json!({
                "nickname": name,
                "fakeid": id,
                "verified": 1,
                "signature": format!("{} official", name),
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/cgi-bin/searchbiz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base_resp": { "ret": 0, "err_msg": "ok" },
            "list": list,
        })))
        .mount(server)
        .await;
}

/// Article link for listing entry `n`
pub fn article_link(server: &MockServer, n: usize) -> String {
    format!("{}/s/article-{}", server.uri(), n)
}

/// Listing body with articles `first..first + count`
pub fn listing_body(server: &MockServer, total: u64, first: usize, count: usize) -> serde_json::Value {
    let messages: Vec<_> = (first..first + count)
        .map(|n| json!({ "title": format!("Article {}", n), "link": article_link(server, n) }))
        .collect();
    let info = json!({ "appmsgex": messages }).to_string();
    let page = json!({
        "total_count": total,
        "publish_list": [{ "publish_info": info }],
    })
    .to_string();

    json!({
        "base_resp": { "ret": 0, "err_msg": "ok" },
        "publish_page": page,
    })
}

pub async fn mount_listing(
    server: &MockServer,
    account_id: &str,
    offset: usize,
    response: ResponseTemplate,
) {
    Mock::given(method("GET"))
        .and(path("/cgi-bin/appmsgpublish"))
        .and(query_param("fakeid", account_id))
        .and(query_param("begin", offset.to_string().as_str()))
        .respond_with(response)
        .mount(server)
        .await;
}

/// Serves every article page with a content region naming the article
pub async fn mount_articles(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/s/article-\d+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><div class="rich_media_content"><p>Article body.</p></div></body></html>"#,
        ))
        .mount(server)
        .await;
}

/// `begin` offsets of every listing request received, in order
pub async fn listing_offsets(server: &MockServer) -> Vec<usize> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == "/cgi-bin/appmsgpublish")
        .filter_map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "begin")
                .and_then(|(_, v)| v.parse().ok())
        })
        .collect()
}

/// Rows of a harvested CSV file, header excluded
pub fn read_rows(path: &Path) -> Vec<(String, String, String)> {
    let mut reader = csv::Reader::from_path(path).unwrap();
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        vec!["title", "link", "content"]
    );
    reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[0].to_string(), r[1].to_string(), r[2].to_string())
        })
        .collect()
}

/// Browser whose cookie jar follows a script
///
/// Each `cookies()` call returns the next scripted jar; the last one repeats.
pub struct ScriptedLauncher {
    jars: Vec<Credentials>,
    pub launches: Cell<usize>,
    pub quits: Rc<Cell<usize>>,
    pub visited: Rc<RefCell<Vec<String>>>,
}

impl ScriptedLauncher {
    pub fn new(jars: Vec<Credentials>) -> Self {
        Self {
            jars,
            launches: Cell::new(0),
            quits: Rc::new(Cell::new(0)),
            visited: Rc::new(RefCell::new(Vec::new())),
        }
    }
}

pub struct ScriptedBrowser {
    jars: VecDeque<Credentials>,
    current: Credentials,
    quits: Rc<Cell<usize>>,
    visited: Rc<RefCell<Vec<String>>>,
}

impl BrowserLauncher for ScriptedLauncher {
    type Browser = ScriptedBrowser;

    async fn launch(&self) -> Result<ScriptedBrowser, BrowserError> {
        self.launches.set(self.launches.get() + 1);
        Ok(ScriptedBrowser {
            jars: self.jars.iter().cloned().collect(),
            current: Credentials::new(),
            quits: Rc::clone(&self.quits),
            visited: Rc::clone(&self.visited),
        })
    }
}

impl LoginBrowser for ScriptedBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.visited.borrow_mut().push(url.to_string());
        Ok(())
    }

    async fn refresh(&mut self) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn cookies(&mut self) -> Result<Credentials, BrowserError> {
        if let Some(next) = self.jars.pop_front() {
            self.current = next;
        }
        Ok(self.current.clone())
    }

    async fn quit(self) -> Result<(), BrowserError> {
        self.quits.set(self.quits.get() + 1);
        Ok(())
    }
}
