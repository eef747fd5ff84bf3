//! Shared world for HTTP behaviour suites.
//!
//! Each request builds a fresh service over the same [`InMemoryStore`], so
//! state carries across steps while the app itself stays stateless.

use std::cell::RefCell;
use std::collections::HashMap;

use actix_web::http::Method;
use actix_web::test;
use hardinfinity::test_support::{InMemoryStore, bearer, memory_app};
use serde_json::Value;

pub const OWNER: &str = "user_owner";

/// Status and JSON body of the last response.
#[derive(Debug, Clone)]
pub struct Captured {
    pub status: u16,
    pub body: Value,
}

pub struct HttpWorld {
    runtime: actix_rt::SystemRunner,
    pub store: InMemoryStore,
    caller: RefCell<String>,
    last: RefCell<Option<Captured>>,
    ids: RefCell<HashMap<String, String>>,
}

impl HttpWorld {
    pub fn new() -> Self {
        Self {
            runtime: actix_rt::System::new(),
            store: InMemoryStore::new(),
            caller: RefCell::new(OWNER.to_owned()),
            last: RefCell::new(None),
            ids: RefCell::new(HashMap::new()),
        }
    }

    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    pub fn act_as(&self, user: &str) {
        user.clone_into(&mut self.caller.borrow_mut());
    }

    /// Send a request as the current caller and remember the response.
    pub fn send(&self, method: Method, path: &str, body: Option<Value>) -> Captured {
        let store = self.store.clone();
        let caller = self.caller.borrow().clone();
        let uri = path.to_owned();
        let captured = self.block_on(async move {
            let app = test::init_service(memory_app(&store)).await;
            let mut request = test::TestRequest::default()
                .method(method)
                .uri(&uri)
                .insert_header(bearer(&caller));
            if let Some(body) = body {
                request = request.set_json(body);
            }
            let response = test::call_service(&app, request.to_request()).await;
            let status = response.status().as_u16();
            let bytes = test::read_body(response).await;
            let body = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).expect("json body")
            };
            Captured { status, body }
        });
        self.last.replace(Some(captured.clone()));
        captured
    }

    /// POST `body` and remember the created id under `label`.
    pub fn create(&self, label: &str, path: &str, body: Value) -> String {
        let captured = self.send(Method::POST, path, Some(body));
        assert_eq!(captured.status, 201, "create {label}: {}", captured.body);
        let id = data(&captured.body)
            .get("id")
            .and_then(Value::as_str)
            .expect("created id")
            .to_owned();
        self.ids.borrow_mut().insert(label.to_owned(), id.clone());
        id
    }

    pub fn id(&self, label: &str) -> String {
        self.ids
            .borrow()
            .get(label)
            .cloned()
            .unwrap_or_else(|| panic!("no id remembered for {label}"))
    }

    pub fn last(&self) -> Captured {
        self.last.borrow().clone().expect("a request was sent")
    }
}

/// The `data` member of a success envelope.
pub fn data(body: &Value) -> &Value {
    body.get("data").expect("enveloped data")
}
