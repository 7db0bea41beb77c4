use super::error::CompressError;
use super::service::CompressedVideo;
use crate::common::workspace::ScratchWorkspace;
use crate::config::settings::OUTPUT_MEDIA_TYPE;
use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use futures_util::future::BoxFuture;
use futures_util::{ready, Stream};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::info;

/// Body stream that owns the request workspace.
///
/// The workspace is released once the inner stream is exhausted, and the
/// stream only ends after the directory is gone. A body dropped early
/// because the client went away drops the workspace with it.
pub struct WorkspaceStream<S> {
    inner: S,
    workspace: Option<ScratchWorkspace>,
    releasing: Option<BoxFuture<'static, ()>>,
}

impl<S> WorkspaceStream<S> {
    pub fn new(inner: S, workspace: ScratchWorkspace) -> Self {
        Self {
            inner,
            workspace: Some(workspace),
            releasing: None,
        }
    }
}

impl<S> Stream for WorkspaceStream<S>
where
    S: Stream + Unpin,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(release) = this.releasing.as_mut() {
                ready!(release.as_mut().poll(cx));
                this.releasing = None;
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(None) => match this.workspace.take() {
                    Some(workspace) => {
                        info!("[{}] Streamed; releasing workspace", workspace.id());
                        this.releasing = Some(Box::pin(workspace.release()));
                    }
                    None => return Poll::Ready(None),
                },
                other => return other,
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Streams the encoded file back as an attachment download.
pub async fn attachment_response(video: CompressedVideo) -> Result<Response, CompressError> {
    let CompressedVideo {
        workspace,
        output_path,
        download_name,
    } = video;

    let file = File::open(&output_path).await?;
    let length = file.metadata().await?.len();

    let body = Body::from_stream(WorkspaceStream::new(ReaderStream::new(file), workspace));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, OUTPUT_MEDIA_TYPE)
        .header(header::CONTENT_LENGTH, length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", download_name),
        )
        .body(body)
        .map_err(|e| CompressError::Io(e.to_string()))
}
