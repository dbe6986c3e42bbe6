use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{Local, NaiveDateTime, NaiveTime};
use sqlx::MySqlPool;
use tracing::{debug, warn};

use crate::state::AppState;

pub const VIEW_COOKIE: &str = "view";

/// Row kinds whose `view_count` is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTarget {
    JobPosting,
    BoardContent,
    SeniorProject,
}

impl ViewTarget {
    fn table(&self) -> &'static str {
        match self {
            ViewTarget::JobPosting => "job_posting",
            ViewTarget::BoardContent => "board_content",
            ViewTarget::SeniorProject => "senior_project",
        }
    }

    /// Counter bump that skips soft-deleted rows; senior projects are removed outright
    fn update_sql(&self) -> String {
        let live = match self {
            ViewTarget::SeniorProject => "",
            ViewTarget::JobPosting | ViewTarget::BoardContent => " AND is_deleted = 0",
        };
        format!("UPDATE `{}` SET view_count = view_count + 1 WHERE id = ?{}", self.table(), live)
    }
}

pub async fn job_posting_view(State(state): State<AppState>, jar: CookieJar, request: Request, next: Next) -> Response {
    count_view(ViewTarget::JobPosting, &state.pool, jar, request, next).await
}

pub async fn board_content_view(State(state): State<AppState>, jar: CookieJar, request: Request, next: Next) -> Response {
    count_view(ViewTarget::BoardContent, &state.pool, jar, request, next).await
}

pub async fn senior_project_view(State(state): State<AppState>, jar: CookieJar, request: Request, next: Next) -> Response {
    count_view(ViewTarget::SeniorProject, &state.pool, jar, request, next).await
}

/// Count the first view of `?id=` per browser per day. The handler always runs;
/// the cookie is only extended when the counter was actually bumped.
async fn count_view(target: ViewTarget, pool: &MySqlPool, jar: CookieJar, request: Request, next: Next) -> Response {
    let Some(id) = request.uri().query().and_then(query_id) else {
        return next.run(request).await;
    };

    let mut viewed = viewed_ids(&jar);
    if viewed.contains(&id) {
        return next.run(request).await;
    }

    match sqlx::query(&target.update_sql()).bind(&id).execute(pool).await {
        Ok(result) if result.rows_affected() > 0 => {
            debug!("Counted view of {} {}", target.table(), id);
        }
        Ok(_) => return next.run(request).await,
        Err(e) => {
            warn!("Failed to count view of {} {}: {}", target.table(), id, e);
            return next.run(request).await;
        }
    }

    viewed.push(id);
    let response = next.run(request).await;

    (jar.add(view_cookie(&viewed, Local::now().naive_local())), response).into_response()
}

fn query_id(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .filter(|id| !id.is_empty())
}

/// Ids already counted today; an unreadable cookie counts as empty.
/// The jar percent-decodes values on the way in and encodes them on the way out.
pub fn viewed_ids(jar: &CookieJar) -> Vec<String> {
    jar.get(VIEW_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
        .unwrap_or_default()
}

/// Seconds left until 23:59:59 of the same day, never less than one
pub fn seconds_until_end_of_day(now: NaiveDateTime) -> i64 {
    let end = now.date().and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN));
    (end - now).num_seconds().max(1)
}

pub fn view_cookie(viewed: &[String], now: NaiveDateTime) -> Cookie<'static> {
    let value = serde_json::to_string(viewed).unwrap_or_else(|_| "[]".to_string());
    Cookie::build((VIEW_COOKIE, value))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(seconds_until_end_of_day(now)))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn cookie_expires_at_end_of_day() {
        assert_eq!(seconds_until_end_of_day(at(23, 59, 0)), 59);
        assert_eq!(seconds_until_end_of_day(at(0, 0, 0)), 86_399);
        assert_eq!(seconds_until_end_of_day(at(23, 59, 59)), 1);
    }

    #[test]
    fn cookie_round_trips_through_jar() {
        let viewed = vec!["a1".to_string(), "b2".to_string()];
        let cookie = view_cookie(&viewed, at(12, 0, 0));
        assert_eq!(cookie.name(), VIEW_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(43_199)));

        let jar = CookieJar::new().add(cookie);
        assert_eq!(viewed_ids(&jar), viewed);
    }

    #[test]
    fn cookie_header_is_percent_encoded() {
        let header = view_cookie(&["a1".to_string()], at(23, 59, 59)).encoded().to_string();
        assert!(header.starts_with("view=%5B%22a1%22%5D"), "{}", header);
        assert!(header.contains("Max-Age=1"), "{}", header);
        assert!(header.contains("HttpOnly"), "{}", header);

        let parsed = Cookie::parse_encoded(header).unwrap();
        let jar = CookieJar::new().add(parsed);
        assert_eq!(viewed_ids(&jar), vec!["a1".to_string()]);
    }

    #[test]
    fn plain_json_cookie_is_accepted() {
        let jar = CookieJar::new().add(Cookie::new(VIEW_COOKIE, "[\"x\"]"));
        assert_eq!(viewed_ids(&jar), vec!["x".to_string()]);
    }

    #[test]
    fn garbage_cookie_reads_as_empty() {
        let jar = CookieJar::new().add(Cookie::new(VIEW_COOKIE, "not-json"));
        assert!(viewed_ids(&jar).is_empty());
        assert!(viewed_ids(&CookieJar::new()).is_empty());
    }

    mod routed {
        use super::super::*;
        use axum::{
            body::Body,
            http::{header, Request as HttpRequest, StatusCode},
            middleware::from_fn_with_state,
            routing::get,
            Router,
        };
        use tower::ServiceExt;

        fn counted() -> Router {
            let state = crate::testing::test_state();
            Router::new()
                .route("/", get(|| async { "shown" }))
                .route_layer(from_fn_with_state(state.clone(), board_content_view))
                .with_state(state)
        }

        async fn get_with_cookie(uri: &str, cookie: Option<&str>) -> (StatusCode, Option<String>) {
            let mut request = HttpRequest::builder().uri(uri);
            if let Some(cookie) = cookie {
                request = request.header(header::COOKIE, cookie);
            }
            let response = counted().oneshot(request.body(Body::empty()).unwrap()).await.unwrap();
            let set_cookie = response
                .headers()
                .get(header::SET_COOKIE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            (response.status(), set_cookie)
        }

        #[tokio::test]
        async fn repeat_view_skips_counting_and_keeps_cookie() {
            let (status, set_cookie) = get_with_cookie("/?id=abc", Some("view=%5B%22abc%22%5D")).await;
            assert_eq!(status, StatusCode::OK);
            assert!(set_cookie.is_none());
        }

        #[tokio::test]
        async fn requests_without_id_pass_through() {
            let (status, set_cookie) = get_with_cookie("/", None).await;
            assert_eq!(status, StatusCode::OK);
            assert!(set_cookie.is_none());
        }

        #[tokio::test]
        async fn failed_count_still_serves_the_page() {
            let (status, set_cookie) = get_with_cookie("/?id=fresh", Some("view=%5B%22abc%22%5D")).await;
            assert_eq!(status, StatusCode::OK);
            assert!(set_cookie.is_none());
        }
    }

    #[test]
    fn soft_deleted_rows_are_not_counted() {
        assert!(ViewTarget::BoardContent.update_sql().ends_with("WHERE id = ? AND is_deleted = 0"));
        assert!(ViewTarget::JobPosting.update_sql().starts_with("UPDATE `job_posting`"));
        assert!(ViewTarget::SeniorProject.update_sql().ends_with("WHERE id = ?"));
    }

    #[test]
    fn id_is_read_from_query() {
        assert_eq!(query_id("id=abc&x=1"), Some("abc".to_string()));
        assert_eq!(query_id("x=1"), None);
        assert_eq!(query_id("id="), None);
    }
}
