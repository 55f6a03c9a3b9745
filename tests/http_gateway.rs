use std::sync::{Arc, Mutex};

use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path},
    App, HttpRequest, HttpResponse, HttpServer, Responder,
};
use quotes_client::{
    api::{
        client::HttpGateway,
        gateway::{AccountGateway, QuoteGateway},
    },
    auth::{self, Session},
    error::{ClientError, StoreError},
    schema::api::{Credentials, LoginResponse, Quote, QuoteBody, User},
    store::{LoadState, QuoteStore},
};
use serde_json::json;

const GOOD_TOKEN: &str = "good-token";

struct Mock {
    quotes: Mutex<Vec<Quote>>,
    voted: Mutex<Option<i32>>,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl Mock {
    fn new() -> Data<Mock> {
        Data::new(Mock {
            quotes: Mutex::new(vec![
                quote(1, "Ada", "Numbers are not enough", 0),
                quote(2, "Alan", "Machines can think", 2),
                quote(3, "Grace", "Ask forgiveness", 1),
            ]),
            voted: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn hit(&self, req: &HttpRequest) -> Option<String> {
        let auth = req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
        self.requests.lock().unwrap().push((
            format!("{} {}", req.method(), req.path()),
            auth.clone(),
        ));
        auth.map(|h| h.trim_start_matches("Bearer ").to_string())
    }

    fn requests(&self) -> Vec<(String, Option<String>)> {
        self.requests.lock().unwrap().clone()
    }
}

fn quote(id: i32, author: &str, content: &str, votes: u32) -> Quote {
    Quote {
        id,
        content: content.into(),
        author: author.into(),
        created_at: format!("2024-05-0{id}T10:00:00Z"),
        updated_at: format!("2024-05-0{id}T10:00:00Z"),
        vote_count: votes,
        is_voted_by_user: None,
    }
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().finish()
}

#[get("/quotes/")]
async fn list_quotes(state: Data<Mock>, req: HttpRequest) -> impl Responder {
    match state.hit(&req).as_deref() {
        Some("expired") => HttpResponse::Unauthorized().json(json!({ "error": "token expired" })),
        _ => HttpResponse::Ok().json(state.quotes.lock().unwrap().clone()),
    }
}

#[post("/quotes/")]
async fn create_quote(
    state: Data<Mock>,
    req: HttpRequest,
    body: Json<QuoteBody>,
) -> impl Responder {
    if state.hit(&req).as_deref() != Some(GOOD_TOKEN) {
        return unauthorized();
    }
    if body.content.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "detail": "content required" }));
    }
    let mut quotes = state.quotes.lock().unwrap();
    let created = quote(
        quotes.len() as i32 + 1,
        &body.author,
        &body.content,
        0,
    );
    quotes.push(created.clone());
    HttpResponse::Created().json(created)
}

#[put("/quotes/{id}")]
async fn update_quote(
    state: Data<Mock>,
    req: HttpRequest,
    path: Path<(i32,)>,
    body: Json<QuoteBody>,
) -> impl Responder {
    if state.hit(&req).as_deref() != Some(GOOD_TOKEN) {
        return unauthorized();
    }
    let (id,) = path.into_inner();
    let mut quotes = state.quotes.lock().unwrap();
    match quotes.iter_mut().find(|q| q.id == id) {
        Some(q) => {
            q.content = body.content.clone();
            q.author = body.author.clone();
            HttpResponse::Ok().json(q.clone())
        }
        None => HttpResponse::NotFound().body("nope"),
    }
}

#[delete("/quotes/{id}")]
async fn delete_quote(state: Data<Mock>, req: HttpRequest, path: Path<(i32,)>) -> impl Responder {
    if state.hit(&req).as_deref() != Some(GOOD_TOKEN) {
        return unauthorized();
    }
    let (id,) = path.into_inner();
    state.quotes.lock().unwrap().retain(|q| q.id != id);
    HttpResponse::NoContent().finish()
}

#[post("/quotes/{id}/vote")]
async fn vote_quote(state: Data<Mock>, req: HttpRequest, path: Path<(i32,)>) -> impl Responder {
    if state.hit(&req).as_deref() != Some(GOOD_TOKEN) {
        return unauthorized();
    }
    let (id,) = path.into_inner();
    let mut voted = state.voted.lock().unwrap();
    if voted.is_some() {
        return HttpResponse::BadRequest().json(json!({ "error": "You have already voted" }));
    }
    *voted = Some(id);
    if let Some(q) = state.quotes.lock().unwrap().iter_mut().find(|q| q.id == id) {
        q.vote_count += 1;
    }
    HttpResponse::Ok().json(json!({ "message": "Vote recorded" }))
}

#[get("/quotes/{id}/vote/check")]
async fn check_vote(state: Data<Mock>, req: HttpRequest, path: Path<(i32,)>) -> impl Responder {
    if state.hit(&req).as_deref() != Some(GOOD_TOKEN) {
        return unauthorized();
    }
    let (id,) = path.into_inner();
    if id == 2 {
        return HttpResponse::InternalServerError().finish();
    }
    HttpResponse::Ok().json(json!({ "has_voted": *state.voted.lock().unwrap() == Some(id) }))
}

#[get("/quotes/{id}/vote/count")]
async fn count_votes(state: Data<Mock>, req: HttpRequest, path: Path<(i32,)>) -> impl Responder {
    state.hit(&req);
    let (id,) = path.into_inner();
    match state.quotes.lock().unwrap().iter().find(|q| q.id == id) {
        Some(q) => HttpResponse::Ok().json(json!({ "count": q.vote_count })),
        None => HttpResponse::NotFound().json(json!({ "error": "Quote not found" })),
    }
}

#[post("/login")]
async fn login(
    state: Data<Mock>,
    req: HttpRequest,
    body: Json<serde_json::Value>,
) -> impl Responder {
    state.hit(&req);
    if body["username"] == "ana" && body["password"] == "pw" {
        HttpResponse::Ok().json(LoginResponse {
            token: GOOD_TOKEN.into(),
            user: User {
                id: 1,
                username: "ana".into(),
            },
        })
    } else {
        HttpResponse::Unauthorized().json(json!({ "error": "Invalid credentials" }))
    }
}

#[post("/register")]
async fn register(
    state: Data<Mock>,
    req: HttpRequest,
    body: Json<serde_json::Value>,
) -> impl Responder {
    state.hit(&req);
    if body["username"] == "ana" {
        HttpResponse::BadRequest().json(json!({ "error": "Username taken" }))
    } else {
        HttpResponse::Created().finish()
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_quotes)
        .service(create_quote)
        .service(update_quote)
        .service(delete_quote)
        .service(vote_quote)
        .service(check_vote)
        .service(count_votes)
        .service(login)
        .service(register);
}

async fn spawn(state: Data<Mock>) -> String {
    let server = HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{addr}")
}

fn session_with(token: Option<&str>) -> Session {
    let session = Session::in_memory();
    if let Some(token) = token {
        session
            .begin(&LoginResponse {
                token: token.into(),
                user: User {
                    id: 1,
                    username: "ana".into(),
                },
            })
            .unwrap();
    }
    session
}

#[actix_web::test]
async fn list_attaches_bearer_only_when_held() {
    let mock = Mock::new();
    let base = spawn(mock.clone()).await;

    let anonymous = HttpGateway::new(&base, session_with(None)).unwrap();
    assert_eq!(anonymous.list_quotes().await.unwrap().len(), 3);

    let authed = HttpGateway::new(&base, session_with(Some(GOOD_TOKEN))).unwrap();
    let quotes = authed.list_quotes().await.unwrap();
    assert_eq!(quotes[1].vote_count, 2);

    let requests = mock.requests();
    assert_eq!(requests[0], ("GET /quotes/".to_string(), None));
    assert_eq!(
        requests[1],
        ("GET /quotes/".to_string(), Some(format!("Bearer {GOOD_TOKEN}")))
    );
}

#[actix_web::test]
async fn expired_token_is_classified_unauthorized() {
    let base = spawn(Mock::new()).await;
    let gateway = HttpGateway::new(&base, session_with(Some("expired"))).unwrap();
    assert_eq!(
        gateway.list_quotes().await,
        Err(ClientError::Unauthorized("token expired".into()))
    );
}

#[actix_web::test]
async fn create_update_delete() {
    let mock = Mock::new();
    let base = spawn(mock.clone()).await;
    let gateway = HttpGateway::new(&base, session_with(Some(GOOD_TOKEN))).unwrap();

    let created = gateway
        .create_quote(&QuoteBody {
            content: "Test".into(),
            author: "Ana".into(),
        })
        .await
        .unwrap();
    assert_eq!((created.id, created.author.as_str()), (4, "Ana"));

    assert_eq!(
        gateway
            .create_quote(&QuoteBody {
                content: "".into(),
                author: "Ana".into(),
            })
            .await,
        Err(ClientError::Api {
            status: 400,
            message: "content required".into()
        })
    );

    let mut edited = created.clone();
    edited.content = "Edited".into();
    assert_eq!(gateway.update_quote(&edited).await.unwrap().content, "Edited");

    edited.id = 99;
    assert_eq!(
        gateway.update_quote(&edited).await,
        Err(ClientError::Api {
            status: 404,
            message: "Failed to update quote (status: 404)".into()
        })
    );

    gateway.delete_quote(4).await.unwrap();
    assert_eq!(mock.quotes.lock().unwrap().len(), 3);
}

#[actix_web::test]
async fn rejected_token_on_write_uses_login_hint() {
    let base = spawn(Mock::new()).await;
    let gateway = HttpGateway::new(&base, session_with(Some("stale"))).unwrap();
    assert_eq!(
        gateway.delete_quote(1).await,
        Err(ClientError::Unauthorized("Action requires login.".into()))
    );
}

#[actix_web::test]
async fn vote_once_then_service_refuses() {
    let base = spawn(Mock::new()).await;
    let gateway = HttpGateway::new(&base, session_with(Some(GOOD_TOKEN))).unwrap();

    let receipt = gateway.vote_quote(3).await.unwrap();
    assert_eq!(receipt.count, None);
    assert_eq!(gateway.vote_count(3).await.unwrap(), 2);
    assert_eq!(
        gateway.vote_quote(1).await,
        Err(ClientError::Api {
            status: 400,
            message: "You have already voted".into()
        })
    );
}

#[actix_web::test]
async fn vote_lookup_skips_failed_checks() {
    let mock = Mock::new();
    *mock.voted.lock().unwrap() = Some(3);
    let base = spawn(mock.clone()).await;
    let gateway = HttpGateway::new(&base, session_with(Some(GOOD_TOKEN))).unwrap();
    assert_eq!(gateway.user_voted_quote_id().await, Ok(Some(3)));

    let checks = mock
        .requests()
        .iter()
        .filter(|(line, _)| line.ends_with("/vote/check"))
        .count();
    assert_eq!(checks, 3);
}

#[actix_web::test]
async fn vote_lookup_without_token_makes_no_requests() {
    let mock = Mock::new();
    let base = spawn(mock.clone()).await;
    let gateway = HttpGateway::new(&base, session_with(None)).unwrap();
    assert_eq!(gateway.user_voted_quote_id().await, Ok(None));
    assert!(gateway
        .create_quote(&QuoteBody {
            content: "Test".into(),
            author: "Ana".into(),
        })
        .await
        .unwrap_err()
        .requires_login());
    assert!(mock.requests().is_empty());
}

#[actix_web::test]
async fn unreachable_service_is_a_network_failure() {
    let gateway = HttpGateway::new("http://127.0.0.1:1", session_with(None)).unwrap();
    assert!(matches!(
        gateway.list_quotes().await,
        Err(ClientError::Network(_))
    ));
}

#[actix_web::test]
async fn login_and_register() {
    let base = spawn(Mock::new()).await;
    let session = session_with(None);
    let gateway = HttpGateway::new(&base, session.clone()).unwrap();

    let user = auth::login(&gateway, &session, "ana", "pw").await.unwrap();
    assert_eq!(user.username, "ana");
    assert_eq!(session.token().as_deref(), Some(GOOD_TOKEN));

    let denied = gateway
        .login(&Credentials {
            username: "ana".into(),
            password: "wrong".into(),
        })
        .await;
    assert_eq!(
        denied.unwrap_err(),
        ClientError::Api {
            status: 401,
            message: "Invalid credentials".into()
        }
    );

    auth::register(&gateway, "bo", "pw").await.unwrap();
    let taken = auth::register(&gateway, "ana", "pw").await.unwrap_err();
    assert_eq!(taken.to_string(), "API Error: Username taken");
}

#[actix_web::test]
async fn store_over_http() {
    let base = spawn(Mock::new()).await;
    let session = session_with(Some(GOOD_TOKEN));
    let gateway = Arc::new(HttpGateway::new(&base, session.clone()).unwrap());
    let store = QuoteStore::new(gateway, session);

    store.load().await.unwrap();
    assert_eq!(store.load_state(), LoadState::Ready);
    assert_eq!(store.user_voted_quote_id(), None);

    let created = store.create_quote("Test", "Ana").await.unwrap();
    assert_eq!(store.quotes()[0].id, created.id);

    store.vote_quote(created.id).await.unwrap();
    assert_eq!(store.quote(created.id).unwrap().vote_count, 1);
    assert_eq!(
        store.vote_quote(1).await,
        Err(StoreError::AlreadyVoted(created.id))
    );
    assert!(matches!(
        store.delete_quote(created.id).await,
        Err(StoreError::QuoteLocked { votes: 1, .. })
    ));
}

#[actix_web::test]
async fn store_load_with_stale_token_redirects() {
    let base = spawn(Mock::new()).await;
    let session = session_with(Some("expired"));
    let gateway = Arc::new(HttpGateway::new(&base, session.clone()).unwrap());
    let store = QuoteStore::new(gateway, session);

    assert!(store.load().await.is_err());
    assert_eq!(store.load_state(), LoadState::LoginRequired);
    assert!(store.take_login_redirect());
}
