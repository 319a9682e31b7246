use bytes::BufMut;
use futures_util::TryStreamExt;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use warp::http::header::{HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use warp::http::{StatusCode, Uri};
use warp::multipart::FormData;
use warp::reply::Response;
use warp::{Filter, Rejection, Reply};

use crate::commands::{self, UploadedFile, RESULT_FILE_NAME};
use crate::config::AppConfig;
use crate::error::SummaryError;
use crate::render;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Field name of the file input in the upload form.
pub const FILE_FIELD: &str = "file";

/// Pull the "file" part out of a multipart body. `None` when the part is
/// absent or was sent without a file name (empty file input).
async fn read_file_part(form: FormData) -> Result<Option<UploadedFile>, warp::Error> {
    let mut parts = form;
    while let Some(part) = parts.try_next().await? {
        if part.name() != FILE_FIELD {
            continue;
        }
        let filename = part.filename().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Ok(None);
        }
        let bytes = part
            .stream()
            .try_fold(Vec::new(), |mut acc, buf| async move {
                acc.put(buf);
                Ok(acc)
            })
            .await?;
        return Ok(Some(UploadedFile { filename, bytes }));
    }
    Ok(None)
}

fn redirect_home() -> Response {
    warp::redirect::see_other(Uri::from_static("/")).into_response()
}

fn error_page(err: &SummaryError) -> Response {
    let status = if err.is_user_error() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    warp::reply::with_status(
        warp::reply::html(render::upload_page(Some(&err.to_string()))),
        status,
    )
    .into_response()
}

fn bad_request(message: &str) -> Response {
    warp::reply::with_status(
        warp::reply::html(render::upload_page(Some(message))),
        StatusCode::BAD_REQUEST,
    )
    .into_response()
}

async fn receive(form: FormData) -> Result<UploadedFile, Response> {
    match read_file_part(form).await {
        Ok(Some(upload)) => Ok(upload),
        Ok(None) => Err(redirect_home()),
        Err(e) => {
            warn!("multipart read failed: {}", e);
            Err(bad_request("Could not read the uploaded file."))
        }
    }
}

/// Run blocking spreadsheet work off the async executor.
async fn run_blocking<T, F>(f: F) -> Result<T, SummaryError>
where
    F: FnOnce() -> Result<T, SummaryError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        SummaryError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    })?
}

async fn index() -> Result<Response, Rejection> {
    Ok(warp::reply::html(render::upload_page(None)).into_response())
}

async fn health_check() -> Result<Response, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "loket-summary"
    }))
    .into_response())
}

/// `POST /upload`: summary rendered as an HTML page.
async fn upload_html(config: Arc<AppConfig>, form: FormData) -> Result<Response, Rejection> {
    let upload = match receive(form).await {
        Ok(upload) => upload,
        Err(resp) => return Ok(resp),
    };
    let start = Instant::now();
    let filename = upload.filename.clone();
    let result = run_blocking(move || commands::summarize_for_page(&config, &upload)).await;
    match result {
        Ok(table) => {
            info!(
                file = %filename,
                offices = table.offices.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "summary page rendered"
            );
            Ok(warp::reply::html(render::summary_page(&table)).into_response())
        }
        Err(e) => {
            warn!(file = %filename, "summary failed: {}", e);
            Ok(error_page(&e))
        }
    }
}

/// `POST /`: summary delivered as `summaryloket.xlsx`.
async fn upload_download(config: Arc<AppConfig>, form: FormData) -> Result<Response, Rejection> {
    let upload = match receive(form).await {
        Ok(upload) => upload,
        Err(resp) => return Ok(resp),
    };
    let start = Instant::now();
    let filename = upload.filename.clone();
    let result = run_blocking(move || commands::build_download(&config, &upload)).await;
    match result {
        Ok(bytes) => {
            info!(
                file = %filename,
                bytes = bytes.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "summary workbook sent"
            );
            let mut resp = Response::new(bytes.into());
            let headers = resp.headers_mut();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE));
            // RESULT_FILE_NAME is a fixed ASCII name.
            let disposition = format!("attachment; filename=\"{}\"", RESULT_FILE_NAME);
            if let Ok(value) = HeaderValue::from_str(&disposition) {
                headers.insert(CONTENT_DISPOSITION, value);
            }
            Ok(resp)
        }
        Err(e) => {
            warn!(file = %filename, "summary export failed: {}", e);
            Ok(error_page(&e))
        }
    }
}

/// Oversized bodies get the upload form with a message instead of a bare 413.
async fn handle_rejection(err: Rejection) -> Result<Response, Rejection> {
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        warn!("upload rejected: body over the size limit");
        return Ok(warp::reply::with_status(
            warp::reply::html(render::upload_page(Some("File too large."))),
            StatusCode::PAYLOAD_TOO_LARGE,
        )
        .into_response());
    }
    Err(err)
}

/// Body limit for the multipart form: the file limit plus room for framing.
fn form_limit(config: &AppConfig) -> u64 {
    config.max_upload_bytes.saturating_add(64 * 1024)
}

fn with_config(
    config: Arc<AppConfig>,
) -> impl Filter<Extract = (Arc<AppConfig>,), Error = Infallible> + Clone {
    warp::any().map(move || config.clone())
}

/// All routes of the upload service.
pub fn routes(
    config: Arc<AppConfig>,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone {
    let limit = form_limit(&config);

    let home = warp::path::end().and(warp::get()).and_then(index);

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and_then(health_check);

    let upload = warp::path("upload")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_config(config.clone()))
        .and(warp::multipart::form().max_length(limit))
        .and_then(upload_html);

    let download = warp::path::end()
        .and(warp::post())
        .and(with_config(config))
        .and(warp::multipart::form().max_length(limit))
        .and_then(upload_download);

    home.or(health)
        .unify()
        .or(upload)
        .unify()
        .or(download)
        .unify()
        .recover(handle_rejection)
        .unify()
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    config.ensure_dirs()?;
    let addr: std::net::SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        upload_dir = %config.upload_dir.display(),
        result_dir = %config.result_dir.display(),
        "Server starting on http://{}",
        addr
    );
    info!("Upload form: GET http://{}/", addr);
    warp::serve(routes(Arc::new(config))).run(addr).await;
    Ok(())
}
