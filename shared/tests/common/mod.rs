#![allow(dead_code)]

use car_editor_shared::capabilities::{NavigationOperation, TimerOperation};
use car_editor_shared::{App, Effect, Event, Model, SessionContext};
use crux_core::testing::AppTester;
use crux_core::Request;
use crux_http::protocol::{HttpRequest, HttpResponse, HttpResult};
use serde_json::{json, Value};

pub type Tester = AppTester<App, Effect>;

pub const CAR_URL: &str = "http://localhost:8080/api/cars/42";
pub const BRANCHES_URL: &str = "http://localhost:8080/api/branches";

pub fn car_json() -> Value {
    json!({
        "id": 42,
        "brand": "Toyota",
        "model": "Corolla",
        "year": 2020,
        "description": "Compact sedan",
        "rentalRate": 49.5,
        "status": "",
        "image": "https://cdn.example.com/cars/42.png"
    })
}

pub fn branches_json() -> Value {
    json!([
        { "branchId": "B1", "branchName": "Downtown", "location": "Main St" },
        { "branchId": "B2", "branchName": "Airport", "location": "Terminal 2" }
    ])
}

pub fn http_requests(effects: Vec<Effect>) -> Vec<Request<HttpRequest>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn timer_requests(effects: Vec<Effect>) -> Vec<Request<TimerOperation>> {
    effects
        .into_iter()
        .filter_map(|effect| match effect {
            Effect::Timer(request) => Some(request),
            _ => None,
        })
        .collect()
}

pub fn redirects(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Navigator(request) => match &request.operation {
                NavigationOperation::RedirectTo { path } => Some(path.clone()),
            },
            _ => None,
        })
        .collect()
}

pub fn header<'a>(request: &'a HttpRequest, name: &str) -> Option<&'a str> {
    request
        .headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Resolves an HTTP request and feeds every resulting event back into the app.
/// Returns the effects those events produced.
pub fn respond(
    app: &Tester,
    model: &mut Model,
    request: &mut Request<HttpRequest>,
    response: HttpResponse,
) -> Vec<Effect> {
    let update = app
        .resolve(request, HttpResult::Ok(response))
        .expect("http request should resolve");
    let mut effects = Vec::new();
    for event in update.events {
        effects.extend(app.update(event, model).effects);
    }
    effects
}

pub fn ok_json(value: &Value) -> HttpResponse {
    HttpResponse::ok().json(value).build()
}

/// Opens car 42 for a manager of branch B1 and answers both fetches.
pub fn open_loaded(app: &Tester, model: &mut Model, car: &Value) {
    let update = app.update(
        Event::Open {
            car_id: "42".into(),
            session: SessionContext::with_branch("B1"),
        },
        model,
    );

    for mut request in http_requests(update.effects) {
        let body = if request.operation.url == CAR_URL {
            car.clone()
        } else {
            assert_eq!(request.operation.url, BRANCHES_URL);
            branches_json()
        };
        respond(app, model, &mut request, ok_json(&body));
    }
}
