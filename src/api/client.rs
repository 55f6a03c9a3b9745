use async_trait::async_trait;
use isahc::{
    http::{Method, StatusCode},
    AsyncBody, AsyncReadResponseExt, HttpClient, Request,
};
use log::{log, Level};
use serde::de::DeserializeOwned;

use crate::{
    api::gateway::{AccountGateway, QuoteGateway},
    auth::{account_failure, Session},
    error::ClientError,
    schema::api::{
        Credentials, ErrorBody, LoginResponse, Quote, QuoteBody, QuoteId, VoteCheck, VoteCount,
        VoteReceipt,
    },
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Auth {
    /// Sent when held, not required.
    Optional,
    Required,
    Anonymous,
}

/// Wording used when the service gives no usable error body.
struct Action {
    name: &'static str,
    login_hint: &'static str,
}

const FETCH_QUOTES: Action = Action {
    name: "fetch quotes",
    login_hint: "Please log in to view quotes.",
};
const CREATE_QUOTE: Action = Action {
    name: "create quote",
    login_hint: "Please log in to create a quote.",
};
const UPDATE_QUOTE: Action = Action {
    name: "update quote",
    login_hint: "Action requires login.",
};
const DELETE_QUOTE: Action = Action {
    name: "delete quote",
    login_hint: "Action requires login.",
};
const VOTE_QUOTE: Action = Action {
    name: "vote for quote",
    login_hint: "Action requires login.",
};
const COUNT_VOTES: Action = Action {
    name: "fetch vote count",
    login_hint: "Action requires login.",
};

/// Turns a non-success response into the matching [`ClientError`].
fn classify(status: StatusCode, body: &[u8], action: &Action) -> ClientError {
    let parsed = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message());
    if status == StatusCode::UNAUTHORIZED {
        return ClientError::Unauthorized(parsed.unwrap_or_else(|| action.login_hint.to_string()));
    }
    ClientError::Api {
        status: status.as_u16(),
        message: parsed.unwrap_or_else(|| {
            format!("Failed to {} (status: {})", action.name, status.as_u16())
        }),
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(|e| ClientError::Decode(e.to_string()))
}

/// [`QuoteGateway`] over HTTP, authenticated from the shared [`Session`].
pub struct HttpGateway {
    client: HttpClient,
    base_url: String,
    session: Session,
}

impl HttpGateway {
    pub fn new(base_url: &str, session: Session) -> Result<Self, ClientError> {
        Ok(Self {
            client: HttpClient::new()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn quotes_url(&self, suffix: &str) -> String {
        format!("{}/quotes/{}", self.base_url, suffix)
    }

    /// Sends one request and hands back the status and full body.
    async fn send(
        &self,
        method: Method,
        url: String,
        auth: Auth,
        json: Option<Vec<u8>>,
    ) -> Result<(StatusCode, Vec<u8>), ClientError> {
        let token = match (auth, self.session.token()) {
            (Auth::Required, None) => return Err(ClientError::NotAuthenticated),
            (Auth::Anonymous, _) => None,
            (_, token) => token,
        };

        let mut builder = Request::builder()
            .method(method.clone())
            .uri(url.as_str())
            .header("Accept", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let body = match json {
            Some(bytes) => {
                builder = builder.header("Content-Type", "application/json");
                AsyncBody::from(bytes)
            }
            None => AsyncBody::empty(),
        };
        let request = builder.body(body)?;

        log!(Level::Debug, "{} {}", method, url);
        let mut response = self.client.send_async(request).await.map_err(|e| {
            log!(Level::Warn, "{} {} failed: {}", method, url, e);
            ClientError::from(e)
        })?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        if !status.is_success() {
            log!(Level::Warn, "{} {} returned {}", method, url, status);
        }
        Ok((status, bytes))
    }

    async fn expect_success(
        &self,
        method: Method,
        url: String,
        auth: Auth,
        json: Option<Vec<u8>>,
        action: &Action,
    ) -> Result<Vec<u8>, ClientError> {
        let (status, body) = self.send(method, url, auth, json).await?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(classify(status, &body, action))
        }
    }

    async fn has_voted_for(&self, id: QuoteId) -> Result<bool, ClientError> {
        let (status, body) = self
            .send(
                Method::GET,
                self.quotes_url(&format!("{id}/vote/check")),
                Auth::Required,
                None,
            )
            .await?;
        if !status.is_success() {
            log!(Level::Debug, "Vote check for quote {id} skipped ({status})");
            return Ok(false);
        }
        Ok(decode::<VoteCheck>(&body)?.has_voted)
    }

    async fn post_account(
        &self,
        path: &str,
        creds: &Credentials,
    ) -> Result<(StatusCode, Vec<u8>), ClientError> {
        let json = serde_json::to_vec(creds).map_err(|e| ClientError::Decode(e.to_string()))?;
        self.send(
            Method::POST,
            format!("{}/{}", self.base_url, path),
            Auth::Anonymous,
            Some(json),
        )
        .await
    }
}

fn encode(body: &QuoteBody) -> Result<Vec<u8>, ClientError> {
    serde_json::to_vec(body).map_err(|e| ClientError::Decode(e.to_string()))
}

#[async_trait]
impl QuoteGateway for HttpGateway {
    async fn list_quotes(&self) -> Result<Vec<Quote>, ClientError> {
        let body = self
            .expect_success(
                Method::GET,
                self.quotes_url(""),
                Auth::Optional,
                None,
                &FETCH_QUOTES,
            )
            .await?;
        decode(&body)
    }

    async fn user_voted_quote_id(&self) -> Result<Option<QuoteId>, ClientError> {
        if !self.session.is_authenticated() {
            return Ok(None);
        }
        // One check per quote until a vote turns up.
        for quote in self.list_quotes().await? {
            if self.has_voted_for(quote.id).await? {
                return Ok(Some(quote.id));
            }
        }
        Ok(None)
    }

    async fn create_quote(&self, body: &QuoteBody) -> Result<Quote, ClientError> {
        let body = self
            .expect_success(
                Method::POST,
                self.quotes_url(""),
                Auth::Required,
                Some(encode(body)?),
                &CREATE_QUOTE,
            )
            .await?;
        decode(&body)
    }

    async fn update_quote(&self, quote: &Quote) -> Result<Quote, ClientError> {
        let body = self
            .expect_success(
                Method::PUT,
                self.quotes_url(&quote.id.to_string()),
                Auth::Required,
                Some(encode(&quote.body())?),
                &UPDATE_QUOTE,
            )
            .await?;
        decode(&body)
    }

    async fn delete_quote(&self, id: QuoteId) -> Result<(), ClientError> {
        self.expect_success(
            Method::DELETE,
            self.quotes_url(&id.to_string()),
            Auth::Required,
            None,
            &DELETE_QUOTE,
        )
        .await
        .map(|_| ())
    }

    async fn vote_quote(&self, id: QuoteId) -> Result<VoteReceipt, ClientError> {
        let body = self
            .expect_success(
                Method::POST,
                self.quotes_url(&format!("{id}/vote")),
                Auth::Required,
                None,
                &VOTE_QUOTE,
            )
            .await?;
        Ok(VoteReceipt::from_body(&body))
    }

    async fn vote_count(&self, id: QuoteId) -> Result<u32, ClientError> {
        let body = self
            .expect_success(
                Method::GET,
                self.quotes_url(&format!("{id}/vote/count")),
                Auth::Anonymous,
                None,
                &COUNT_VOTES,
            )
            .await?;
        Ok(decode::<VoteCount>(&body)?.count)
    }
}

#[async_trait]
impl AccountGateway for HttpGateway {
    async fn login(&self, creds: &Credentials) -> Result<LoginResponse, ClientError> {
        let (status, body) = self.post_account("login", creds).await?;
        if !status.is_success() {
            return Err(account_failure(status.as_u16(), &body, "Login failed"));
        }
        decode(&body)
    }

    async fn register(&self, creds: &Credentials) -> Result<(), ClientError> {
        let (status, body) = self.post_account("register", creds).await?;
        if !status.is_success() {
            return Err(account_failure(
                status.as_u16(),
                &body,
                "Registration failed",
            ));
        }
        Ok(())
    }
}
