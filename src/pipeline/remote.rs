//! Remote OCR orchestration: upload → signed URL → OCR request.
//!
//! The provider will not accept document bytes on the OCR endpoint
//! directly; it wants a signed URL pointing at a previously uploaded file.
//! That forces a fixed three-step sequence, each step depending on the
//! previous one's result, so there is nothing to parallelise within one
//! conversion.
//!
//! Failures here are fatal to the conversion attempt: each non-2xx status
//! maps to a typed [`OcrMdError`] carrying the status and the provider's
//! message, and no retries are attempted. Graceful degradation only starts
//! once a 2xx OCR response is in hand; from there the normalizer takes
//! over and never fails.

use crate::error::OcrMdError;
use crate::http::{HttpBody, HttpCapability, HttpMethod, HttpRequest, HttpResponse};
use crate::output::CanonicalResult;
use crate::pipeline::normalize;
use crate::progress::{ConversionProgress, ConversionStage};
use serde_json::{json, Value};
use tracing::{debug, info};

/// Appended to the provider message on a 500: the provider uses that status
/// for several unrelated conditions, and the raw message alone routinely
/// sends users down the wrong path.
const STATUS_500_HINT: &str = "This status is returned for several distinct causes: \
the file exceeds the 50MB upload limit or the 1,000 page limit, \
the OCR service is experiencing a transient outage, \
requests are being rate limited, \
or the request payload was malformed. \
Try a smaller document or retry in a few minutes.";

/// Drives the three-step OCR protocol against the HTTP capability.
///
/// Constructed per conversion; holds no state beyond its borrows, so
/// concurrent conversions never share anything through it.
pub struct RemoteOcr<'a> {
    pub http: &'a dyn HttpCapability,
    pub progress: &'a dyn ConversionProgress,
    pub upload_base: &'a str,
    pub ocr_endpoint: &'a str,
    pub api_key: &'a str,
    pub model: &'a str,
}

impl<'a> RemoteOcr<'a> {
    /// Run the full sequence and normalize the OCR response.
    pub async fn run(&self, file_name: &str, bytes: Vec<u8>) -> Result<CanonicalResult, OcrMdError> {
        self.progress.on_stage(ConversionStage::Uploading);
        let file_id = self.upload(file_name, bytes).await?;
        info!("Uploaded document as file {file_id}");

        self.progress.on_stage(ConversionStage::FetchingSignedUrl);
        let document_url = self.signed_url(&file_id).await?;
        debug!("Received signed URL for file {file_id}");

        self.progress.on_stage(ConversionStage::RequestingOcr);
        let raw = self.request_ocr(&document_url).await?;

        self.progress.on_stage(ConversionStage::Normalizing);
        Ok(normalize::normalize(&raw))
    }

    /// Step 1: multipart upload with `purpose=ocr`; returns the file id.
    async fn upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, OcrMdError> {
        let response = self
            .send(HttpRequest {
                method: HttpMethod::Post,
                url: format!("{}/files", self.upload_base),
                headers: self.auth_headers(),
                body: HttpBody::Multipart {
                    file_name: file_name.to_string(),
                    bytes,
                    fields: vec![("purpose".to_string(), "ocr".to_string())],
                },
            }, "upload")
            .await?;

        if !response.ok() {
            return Err(OcrMdError::UploadFailed {
                status: response.status,
                body: response.text(),
            });
        }

        response
            .json()
            .ok()
            .and_then(|v| v.get("id").and_then(Value::as_str).map(str::to_string))
            .ok_or_else(|| OcrMdError::MalformedResponse {
                stage: "upload",
                detail: "response body has no `id` field".to_string(),
            })
    }

    /// Step 2: fetch the signed URL for the uploaded file.
    async fn signed_url(&self, file_id: &str) -> Result<String, OcrMdError> {
        let response = self
            .send(HttpRequest {
                method: HttpMethod::Get,
                url: format!("{}/files/{}/url", self.upload_base, file_id),
                headers: self.auth_headers(),
                body: HttpBody::Empty,
            }, "signed URL")
            .await?;

        if !response.ok() {
            return Err(OcrMdError::SignedUrlFailed {
                status: response.status,
                body: response.text(),
            });
        }

        response
            .json()
            .ok()
            .and_then(|v| v.get("url").and_then(Value::as_str).map(str::to_string))
            .ok_or_else(|| OcrMdError::MalformedResponse {
                stage: "signed URL",
                detail: "response body has no `url` field".to_string(),
            })
    }

    /// Step 3: the OCR request itself. Returns the raw provider JSON.
    async fn request_ocr(&self, document_url: &str) -> Result<Value, OcrMdError> {
        let body = json!({
            "model": self.model,
            "document": {
                "type": "document_url",
                "document_url": document_url,
            },
            "include_image_base64": false,
        });

        let response = self
            .send(HttpRequest {
                method: HttpMethod::Post,
                url: self.ocr_endpoint.to_string(),
                headers: self.auth_headers(),
                body: HttpBody::Json(body),
            }, "OCR request")
            .await?;

        if !response.ok() {
            return Err(ocr_api_error(&response));
        }

        // A 2xx body that is not JSON still carries the document text on
        // some gateways; hand it to the normalizer as a bare string.
        Ok(response
            .json()
            .unwrap_or_else(|_| Value::String(response.text())))
    }

    async fn send(
        &self,
        request: HttpRequest,
        stage: &'static str,
    ) -> Result<HttpResponse, OcrMdError> {
        self.http
            .request(request)
            .await
            .map_err(|e| OcrMdError::Transport {
                stage,
                detail: e.to_string(),
            })
    }

    fn auth_headers(&self) -> Vec<(String, String)> {
        vec![(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        )]
    }
}

/// Classify a non-2xx OCR response.
///
/// The provider nests its message under `error.message` when the body is
/// JSON; plain-text bodies are used verbatim.
fn ocr_api_error(response: &HttpResponse) -> OcrMdError {
    let body = response.text();
    let mut message = response
        .json()
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or(body);

    if response.status == 500 {
        message = format!("{message}. {STATUS_500_HINT}");
    }

    OcrMdError::OcrApiFailed {
        status: response.status,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpError;
    use crate::progress::NoopProgress;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted transport: pops one canned response per request and records
    /// everything it was asked to send.
    struct ScriptedHttp {
        responses: Mutex<VecDeque<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedHttp {
        fn new(responses: Vec<HttpResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn recorded(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpCapability for ScriptedHttp {
        async fn request(&self, req: HttpRequest) -> Result<HttpResponse, HttpError> {
            self.requests.lock().unwrap().push(req);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| HttpError("no scripted response left".into()))
        }
    }

    fn json_response(status: u16, body: Value) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    fn orchestrator<'a>(http: &'a ScriptedHttp, progress: &'a NoopProgress) -> RemoteOcr<'a> {
        RemoteOcr {
            http,
            progress,
            upload_base: "https://api.example.test/v1",
            ocr_endpoint: "https://api.example.test/v1/ocr",
            api_key: "sk-test",
            model: "ocr-model",
        }
    }

    #[tokio::test]
    async fn happy_path_issues_three_sequential_requests() {
        let http = ScriptedHttp::new(vec![
            json_response(200, json!({"id": "file-1"})),
            json_response(200, json!({"url": "https://signed.example.test/file-1"})),
            json_response(200, json!({"model": "m", "pages": [{"text": "hello"}]})),
        ]);
        let progress = NoopProgress;
        let result = orchestrator(&http, &progress)
            .run("doc.pdf", b"%PDF".to_vec())
            .await
            .unwrap();

        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].text, "hello");
        assert_eq!(result.document_info.model, "m");

        let requests = http.recorded();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].url, "https://api.example.test/v1/files");
        assert_eq!(
            requests[1].url,
            "https://api.example.test/v1/files/file-1/url"
        );
        assert_eq!(requests[2].url, "https://api.example.test/v1/ocr");
    }

    #[tokio::test]
    async fn upload_sends_multipart_with_ocr_purpose_and_bearer_auth() {
        let http = ScriptedHttp::new(vec![
            json_response(200, json!({"id": "f"})),
            json_response(200, json!({"url": "https://s"})),
            json_response(200, json!({"pages": []})),
        ]);
        let progress = NoopProgress;
        orchestrator(&http, &progress)
            .run("doc.pdf", b"bytes".to_vec())
            .await
            .unwrap();

        let upload = &http.recorded()[0];
        assert_eq!(upload.method, HttpMethod::Post);
        assert!(upload
            .headers
            .iter()
            .any(|(k, v)| k == "Authorization" && v == "Bearer sk-test"));
        match &upload.body {
            HttpBody::Multipart {
                file_name,
                bytes,
                fields,
            } => {
                assert_eq!(file_name, "doc.pdf");
                assert_eq!(bytes, b"bytes");
                assert!(fields.contains(&("purpose".to_string(), "ocr".to_string())));
            }
            other => panic!("expected multipart body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ocr_request_body_follows_the_contract() {
        let http = ScriptedHttp::new(vec![
            json_response(200, json!({"id": "f"})),
            json_response(200, json!({"url": "https://signed.example.test/f"})),
            json_response(200, json!({"pages": []})),
        ]);
        let progress = NoopProgress;
        orchestrator(&http, &progress)
            .run("doc.pdf", vec![])
            .await
            .unwrap();

        let ocr = &http.recorded()[2];
        match &ocr.body {
            HttpBody::Json(body) => {
                assert_eq!(body["model"], "ocr-model");
                assert_eq!(body["document"]["type"], "document_url");
                assert_eq!(
                    body["document"]["document_url"],
                    "https://signed.example.test/f"
                );
                assert_eq!(body["include_image_base64"], false);
            }
            other => panic!("expected JSON body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn upload_failure_carries_status_and_body() {
        let http = ScriptedHttp::new(vec![HttpResponse {
            status: 413,
            body: b"file too large".to_vec(),
        }]);
        let progress = NoopProgress;
        let err = orchestrator(&http, &progress)
            .run("doc.pdf", vec![])
            .await
            .unwrap_err();

        match err {
            OcrMdError::UploadFailed { status, body } => {
                assert_eq!(status, 413);
                assert_eq!(body, "file too large");
            }
            other => panic!("expected UploadFailed, got {other}"),
        }
    }

    #[tokio::test]
    async fn signed_url_failure_is_typed() {
        let http = ScriptedHttp::new(vec![
            json_response(200, json!({"id": "f"})),
            HttpResponse {
                status: 404,
                body: b"not found".to_vec(),
            },
        ]);
        let progress = NoopProgress;
        let err = orchestrator(&http, &progress)
            .run("doc.pdf", vec![])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OcrMdError::SignedUrlFailed { status: 404, .. }
        ));
    }

    #[tokio::test]
    async fn ocr_500_extracts_json_message_and_appends_hint() {
        let http = ScriptedHttp::new(vec![
            json_response(200, json!({"id": "f"})),
            json_response(200, json!({"url": "https://s"})),
            json_response(500, json!({"error": {"message": "Internal Server Error"}})),
        ]);
        let progress = NoopProgress;
        let err = orchestrator(&http, &progress)
            .run("doc.pdf", vec![])
            .await
            .unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("Internal Server Error"), "got: {msg}");
        assert!(msg.contains("50MB"), "got: {msg}");
        assert!(matches!(err, OcrMdError::OcrApiFailed { status: 500, .. }));
    }

    #[tokio::test]
    async fn ocr_error_without_json_body_uses_raw_text() {
        let http = ScriptedHttp::new(vec![
            json_response(200, json!({"id": "f"})),
            json_response(200, json!({"url": "https://s"})),
            HttpResponse {
                status: 429,
                body: b"slow down".to_vec(),
            },
        ]);
        let progress = NoopProgress;
        let err = orchestrator(&http, &progress)
            .run("doc.pdf", vec![])
            .await
            .unwrap_err();

        match err {
            OcrMdError::OcrApiFailed { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "slow down");
            }
            other => panic!("expected OcrApiFailed, got {other}"),
        }
    }

    #[tokio::test]
    async fn non_500_errors_do_not_get_the_hint() {
        let http = ScriptedHttp::new(vec![
            json_response(200, json!({"id": "f"})),
            json_response(200, json!({"url": "https://s"})),
            json_response(422, json!({"error": {"message": "bad document"}})),
        ]);
        let progress = NoopProgress;
        let err = orchestrator(&http, &progress)
            .run("doc.pdf", vec![])
            .await
            .unwrap_err();

        assert!(!err.to_string().contains("50MB"));
    }

    #[tokio::test]
    async fn upload_response_without_id_is_malformed() {
        let http = ScriptedHttp::new(vec![json_response(200, json!({"ok": true}))]);
        let progress = NoopProgress;
        let err = orchestrator(&http, &progress)
            .run("doc.pdf", vec![])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            OcrMdError::MalformedResponse { stage: "upload", .. }
        ));
    }

    #[tokio::test]
    async fn non_json_2xx_ocr_body_is_normalized_as_bare_text() {
        let http = ScriptedHttp::new(vec![
            json_response(200, json!({"id": "f"})),
            json_response(200, json!({"url": "https://s"})),
            HttpResponse {
                status: 200,
                body: b"plain text result".to_vec(),
            },
        ]);
        let progress = NoopProgress;
        let result = orchestrator(&http, &progress)
            .run("doc.pdf", vec![])
            .await
            .unwrap();

        assert_eq!(result.pages.len(), 1);
        assert_eq!(result.pages[0].text, "plain text result");
    }
}
