//! # HTTP 路由
//!
//! 将 HTTP 请求分发到对应的 command，并把结果转换为 HTTP 响应。
//!
//! | 方法 | 路径 | command |
//! |------|------|---------|
//! | GET | `/` | 对比页面 |
//! | GET | `/api/session` | `chat::read_session` |
//! | POST | `/api/submit` | `chat::submit_prompt` |
//! | DELETE | `/api/session` | `chat::end_session` |
//! | GET | `/healthz` | 存活检查 |
//!
//! 会话 ID 通过 `compare_session` cookie 传递。

use std::convert::Infallible;
use std::error::Error as StdError;

use bytes::Bytes;
use http::header::{ALLOW, CONTENT_TYPE, COOKIE, SET_COOKIE};
use http::{HeaderMap, HeaderValue, Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Body;
use serde::Serialize;

use crate::commands::{CommandOutput, chat};
use crate::models::display::{ErrorBody, SubmitRequest};
use crate::state::AppState;

/// 会话 cookie 名称
pub const SESSION_COOKIE: &str = "compare_session";

/// 请求体大小上限（字节）
const MAX_BODY_BYTES: usize = 64 * 1024;

/// 对比页面，编译期嵌入
const INDEX_HTML: &str = include_str!("../../assets/index.html");

/// 处理单个 HTTP 请求
///
/// 对请求体类型泛化，生产环境传入 `hyper::body::Incoming`，测试中可直接传入 `Full<Bytes>`。
pub async fn handle<B>(req: Request<B>, state: &AppState) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    log::debug!("{} {}", method, path);

    let session_id = session_cookie(req.headers());
    let session_id = session_id.as_deref();

    let response = match (path.as_str(), &method) {
        ("/", &Method::GET) => html_response(INDEX_HTML),
        ("/healthz", &Method::GET) => text_response(StatusCode::OK, "ok"),
        ("/api/session", &Method::GET) => {
            let output = chat::read_session(state, session_id).await;
            with_session_cookie(json_response(StatusCode::OK, &output.body), &output)
        }
        ("/api/session", &Method::DELETE) => {
            chat::end_session(state, session_id);
            clear_session_cookie(empty_response(StatusCode::NO_CONTENT))
        }
        ("/api/submit", &Method::POST) => match read_json::<SubmitRequest, B>(req).await {
            Ok(request) => {
                let output = chat::submit_prompt(state, session_id, request).await;
                let response = match &output.body {
                    Ok(body) => json_response(StatusCode::OK, body),
                    Err(body) => json_response(StatusCode::BAD_GATEWAY, body),
                };
                with_session_cookie(response, &output)
            }
            Err((status, message)) => json_response(status, &ErrorBody::new(message)),
        },
        ("/", _) | ("/healthz", _) => method_not_allowed("GET"),
        ("/api/session", _) => method_not_allowed("GET, DELETE"),
        ("/api/submit", _) => method_not_allowed("POST"),
        _ => json_response(StatusCode::NOT_FOUND, &ErrorBody::new("未找到该路径")),
    };

    Ok(response)
}

/// 从 Cookie 请求头中取出会话 ID
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// 读取并解析 JSON 请求体
///
/// # 错误
/// - 超过大小上限：413
/// - 读取失败或 JSON 无效：400
async fn read_json<T, B>(req: Request<B>) -> Result<T, (StatusCode, String)>
where
    T: serde::de::DeserializeOwned,
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES);
    let bytes = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            if e.downcast_ref::<http_body_util::LengthLimitError>().is_some() {
                return Err((StatusCode::PAYLOAD_TOO_LARGE, "请求体过大".to_string()));
            }
            return Err((StatusCode::BAD_REQUEST, format!("读取请求体失败: {}", e)));
        }
    };

    serde_json::from_slice(&bytes)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("解析请求 JSON 失败: {}", e)))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(bytes) => build_response(status, "application/json; charset=utf-8", bytes.into()),
        Err(e) => {
            log::warn!("序列化响应失败: {}", e);
            text_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}

fn html_response(html: &'static str) -> Response<Full<Bytes>> {
    build_response(
        StatusCode::OK,
        "text/html; charset=utf-8",
        Bytes::from_static(html.as_bytes()),
    )
}

fn text_response(status: StatusCode, text: &'static str) -> Response<Full<Bytes>> {
    build_response(
        status,
        "text/plain; charset=utf-8",
        Bytes::from_static(text.as_bytes()),
    )
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = status;
    response
}

fn method_not_allowed(allow: &'static str) -> Response<Full<Bytes>> {
    let mut response = json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorBody::new("不支持的请求方法"),
    );
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}

fn build_response(status: StatusCode, content_type: &'static str, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// 新建会话时下发会话 cookie
fn with_session_cookie<T>(
    mut response: Response<Full<Bytes>>,
    output: &CommandOutput<T>,
) -> Response<Full<Bytes>> {
    if output.session_created {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, output.session_id
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}

fn clear_session_cookie(mut response: Response<Full<Bytes>>) -> Response<Full<Bytes>> {
    let cookie = format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE);
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(SET_COOKIE, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use serde_json::Value;

    use crate::services::orchestrator::tests::{ADAPTER_ID, ScriptedClient, orchestrator};

    fn app_state() -> AppState {
        AppState::new(orchestrator(Arc::new(ScriptedClient::default())))
    }

    fn request(method: Method, path: &str, cookie: Option<&str>, body: &str) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(id) = cookie {
            builder = builder.header(COOKIE, format!("theme=dark; {}={}", SESSION_COOKIE, id));
        }
        builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
    }

    async fn body_json(response: Response<Full<Bytes>>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn set_cookie_id(response: &Response<Full<Bytes>>) -> Option<String> {
        let value = response.headers().get(SET_COOKIE)?.to_str().ok()?;
        let (pair, _) = value.split_once(';')?;
        pair.split_once('=').map(|(_, id)| id.to_string())
    }

    #[test]
    fn test_session_cookie_parsing() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("a=1; compare_session=abc; b=2"));
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc"));

        let mut empty = HeaderMap::new();
        empty.insert(COOKIE, HeaderValue::from_static("compare_session="));
        assert_eq!(session_cookie(&empty), None);
        assert_eq!(session_cookie(&HeaderMap::new()), None);
    }

    #[tokio::test]
    async fn test_index_page_served() {
        let state = app_state();
        let response = handle(request(Method::GET, "/", None, ""), &state).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains("Model Comparison: Trained Adapter vs Default Base"));
    }

    #[tokio::test]
    async fn test_submit_round_trip_with_cookie() {
        let state = app_state();

        let response = handle(
            request(Method::POST, "/api/submit", None, r#"{"prompt":"Hello"}"#),
            &state,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let id = set_cookie_id(&response).expect("新会话应下发 cookie");
        let json = body_json(response).await;
        assert_eq!(json["accepted"], true);
        assert_eq!(json["adapterReply"], "A1");
        assert_eq!(json["base"][1]["role"], "assistant");

        // 携带 cookie 再次读取，不再下发新 cookie
        let response = handle(request(Method::GET, "/api/session", Some(&id), ""), &state)
            .await
            .unwrap();
        assert!(response.headers().get(SET_COOKIE).is_none());
        let json = body_json(response).await;
        assert_eq!(json["sessionId"], id.as_str());
        assert_eq!(json["adapter"].as_array().map(|a| a.len()), Some(2));
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let state = app_state();

        let response = handle(request(Method::POST, "/api/submit", None, "{oops"), &state)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let oversized = format!(r#"{{"prompt":"{}"}}"#, "x".repeat(MAX_BODY_BYTES));
        let response = handle(request(Method::POST, "/api/submit", None, &oversized), &state)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = handle(request(Method::GET, "/api/submit", None, ""), &state)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(ALLOW).unwrap(), "POST");

        let response = handle(request(Method::GET, "/nope", None, ""), &state)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_generation_failure_maps_to_bad_gateway() {
        let client = Arc::new(ScriptedClient::failing(ADAPTER_ID));
        let state = AppState::new(orchestrator(client));

        let response = handle(
            request(Method::POST, "/api/submit", None, r#"{"prompt":"Hello"}"#),
            &state,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let id = set_cookie_id(&response).expect("失败时也应下发会话 cookie");
        let json = body_json(response).await;
        assert!(json["error"].is_string());
        assert_eq!(json["failedTracks"], serde_json::json!(["adapter"]));

        // 会话已建立，两条轨道均未被修改
        let json = body_json(
            handle(request(Method::GET, "/api/session", Some(&id), ""), &state)
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(json["adapter"].as_array().map(|a| a.len()), Some(0));
        assert_eq!(json["base"].as_array().map(|a| a.len()), Some(0));
    }

    #[tokio::test]
    async fn test_delete_session_clears_cookie() {
        let state = app_state();
        let created = chat::read_session(&state, None).await;

        let response = handle(
            request(Method::DELETE, "/api/session", Some(&created.session_id), ""),
            &state,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));
        assert!(state.sessions.is_empty());
    }
}
