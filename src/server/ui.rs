use axum::response::Html;

/// The whole front end ships embedded in the binary; there is nothing to
/// deploy next to it.
const INDEX_HTML: &str = include_str!("ui.html");

/// `GET /` — the single-page UI.
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}
