use crate::service::store::SharedStore;
use crate::workflow::runner::Runner;
use futures::TryStreamExt;
use log::{info, warn};
use mstrcore::model::{AnalysisRequest, FileMetadata, Modality};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use warp::http::StatusCode;
use warp::multipart::{FormData, Part};
use warp::reply::Response;
use warp::{Buf, Filter, Reply};

#[derive(Debug, Deserialize)]
struct DetectionQuery {
    file_id: Option<String>,
}

#[derive(Debug, Default)]
struct UploadForm {
    filename: Option<String>,
    file_type: Option<String>,
    metadata: Option<String>,
    size: usize,
}

/// The `/api` surface consumed by the client, backed by the in-memory store.
pub fn api(
    runner: Runner,
) -> impl Filter<Extract = (Response,), Error = warp::Rejection> + Clone {
    let max_upload = runner.config().max_upload_bytes;
    let store = runner.store();
    let store_filter = warp::any().map(move || store.clone());
    let runner_filter = warp::any().map(move || runner.clone());

    let root = warp::path!("api")
        .and(warp::get())
        .map(|| {
            warp::reply::json(&json!({
                "message": "Multispectral Target Recognition & Tracking API",
                "version": env!("CARGO_PKG_VERSION"),
            }))
            .into_response()
        });

    let files = warp::path!("api" / "files")
        .and(warp::get())
        .and(store_filter.clone())
        .map(|store: SharedStore| match store.read() {
            Ok(store) => warp::reply::json(&store.files()).into_response(),
            Err(_) => poisoned(),
        });

    let jobs = warp::path!("api" / "jobs")
        .and(warp::get())
        .and(store_filter.clone())
        .map(|store: SharedStore| match store.read() {
            Ok(store) => warp::reply::json(&store.jobs()).into_response(),
            Err(_) => poisoned(),
        });

    let job = warp::path!("api" / "jobs" / String)
        .and(warp::get())
        .and(store_filter.clone())
        .map(|job_id: String, store: SharedStore| match store.read() {
            Ok(store) => match store.job(&job_id) {
                Some(job) => warp::reply::json(&job).into_response(),
                None => detail(StatusCode::NOT_FOUND, "Job not found"),
            },
            Err(_) => poisoned(),
        });

    let detections = warp::path!("api" / "detections")
        .and(warp::get())
        .and(warp::query::<DetectionQuery>())
        .and(store_filter.clone())
        .map(|query: DetectionQuery, store: SharedStore| match store.read() {
            Ok(store) => {
                warp::reply::json(&store.detections(query.file_id.as_deref())).into_response()
            }
            Err(_) => poisoned(),
        });

    let upload = warp::path!("api" / "upload")
        .and(warp::post())
        .and(warp::multipart::form().max_length(max_upload))
        .and(store_filter.clone())
        .and_then(handle_upload);

    let analyze = warp::path!("api" / "analyze")
        .and(warp::post())
        .and(warp::body::json())
        .and(runner_filter)
        .map(|request: AnalysisRequest, runner: Runner| {
            if request.file_ids.is_empty() {
                return detail(StatusCode::UNPROCESSABLE_ENTITY, "file_ids must not be empty");
            }
            let job = match runner.store().write() {
                Ok(mut store) => store.create_job(request),
                Err(_) => return poisoned(),
            };
            info!("job {} accepted over {} file(s)", job.id, job.file_ids.len());
            runner.spawn(job.id.clone());
            warp::reply::json(&job).into_response()
        });

    let delete = warp::path!("api" / "files" / String)
        .and(warp::delete())
        .and(store_filter)
        .map(|file_id: String, store: SharedStore| match store.write() {
            Ok(mut store) => {
                if store.delete_file(&file_id) {
                    warp::reply::json(&json!({"message": "File deleted successfully"}))
                        .into_response()
                } else {
                    detail(StatusCode::NOT_FOUND, "File not found")
                }
            }
            Err(_) => poisoned(),
        });

    root.or(files)
        .unify()
        .or(jobs)
        .unify()
        .or(job)
        .unify()
        .or(detections)
        .unify()
        .or(upload)
        .unify()
        .or(analyze)
        .unify()
        .or(delete)
        .unify()
}

async fn handle_upload(form: FormData, store: SharedStore) -> Result<Response, warp::Rejection> {
    let parts: Vec<Part> = match form.try_collect().await {
        Ok(parts) => parts,
        Err(err) => {
            return Ok(detail(
                StatusCode::BAD_REQUEST,
                &format!("malformed form: {err}"),
            ))
        }
    };

    let mut upload = UploadForm::default();
    let mut has_file = false;
    for part in parts {
        let name = part.name().to_string();
        let filename = part.filename().map(str::to_string);
        let bytes = match read_part(part).await {
            Ok(bytes) => bytes,
            Err(err) => {
                return Ok(detail(
                    StatusCode::BAD_REQUEST,
                    &format!("reading part {name}: {err}"),
                ))
            }
        };
        match name.as_str() {
            "file" => {
                has_file = true;
                upload.filename = filename;
                upload.size = bytes.len();
            }
            "file_type" => upload.file_type = Some(String::from_utf8_lossy(&bytes).into_owned()),
            "metadata" => upload.metadata = Some(String::from_utf8_lossy(&bytes).into_owned()),
            _ => {}
        }
    }

    let (true, Some(file_type)) = (has_file, upload.file_type) else {
        return Ok(detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            "fields 'file' and 'file_type' are required",
        ));
    };
    let metadata = match upload.metadata.as_deref().map(serde_json::from_str::<FileMetadata>) {
        None => None,
        Some(Ok(metadata)) => Some(metadata),
        Some(Err(err)) => {
            warn!("rejecting upload with malformed metadata: {err}");
            return Ok(detail(
                StatusCode::UNPROCESSABLE_ENTITY,
                &format!("Upload failed: invalid metadata: {err}"),
            ));
        }
    };

    let filename = upload.filename.unwrap_or_else(|| "unnamed".into());
    let record = match store.write() {
        Ok(mut store) => store.add_file(filename, Modality::from(file_type.as_str()), metadata),
        Err(_) => return Ok(poisoned()),
    };
    info!(
        "stored {} ({} bytes) as {} [{}]",
        record.filename, upload.size, record.id, record.file_type
    );
    Ok(warp::reply::json(&record).into_response())
}

async fn read_part(part: Part) -> Result<Vec<u8>, warp::Error> {
    part.stream()
        .try_fold(Vec::new(), |mut bytes, chunk| async move {
            bytes.extend_from_slice(chunk.chunk());
            Ok::<_, warp::Error>(bytes)
        })
        .await
}

fn detail(status: StatusCode, message: &str) -> Response {
    let mut body = HashMap::new();
    body.insert("detail", message);
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

fn poisoned() -> Response {
    detail(StatusCode::INTERNAL_SERVER_ERROR, "service store poisoned")
}
