use std::fmt::Display;

use bytes::Bytes;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use tracing::{error, info};

pub type VwBody = BoxBody<Bytes, hyper::Error>;

#[cfg(test)]
pub(crate) fn vw_body_from_string(str: String) -> VwBody {
    BoxBody::new(Full::new(str.into()).map_err(|err| match err {}))
}

pub(crate) async fn vw_body_to_string(
    mut body: VwBody,
    length: usize,
) -> Result<String, std::io::Error> {
    let mut data: Vec<u8> = vec![];
    while let Some(next) = body.frame().await {
        let frame = next.map_err(|err| {
            std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                format!("Could not pull all frames from body: {err}"),
            )
        })?;
        if let Ok(frame) = frame.into_data() {
            data.append(&mut frame.to_vec())
        }
        if data.len() > length {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Body is longer than expected",
            ));
        }
    }

    String::from_utf8(data).map_err(|_e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Body could not be decoded as utf8",
        )
    })
}

pub(crate) fn incoming_body_into_vw_body(body: Incoming) -> VwBody {
    body.boxed()
}

#[cfg(test)]
pub(crate) fn full_body_into_vw_body(body: Full<Bytes>) -> VwBody {
    BoxBody::new(body.map_err(|err| match err {}))
}

pub(crate) fn incoming_request_into_vw_request(request: Request<Incoming>) -> Request<VwBody> {
    let (parts, body) = request.into_parts();
    Request::from_parts(parts, incoming_body_into_vw_body(body))
}

#[cfg(test)]
pub(crate) fn empty() -> VwBody {
    BoxBody::default()
}

pub(crate) fn text_response(text: String) -> Result<Response<Full<Bytes>>, hyper::Error> {
    Ok(Response::builder()
        .status(StatusCode::OK)
        .body(Full::new(Bytes::from(text)))
        .unwrap())
}

pub(crate) fn bad_request(e: impl Display) -> Result<Response<Full<Bytes>>, hyper::Error> {
    info!("Answering bad request: {e}");
    Ok(Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .body(Full::default())
        .unwrap())
}

pub(crate) fn internal_server(e: impl Display) -> Result<Response<Full<Bytes>>, hyper::Error> {
    error!("Answering internal server error: {e}");
    Ok(Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .body(Full::default())
        .unwrap())
}

pub(crate) fn bad_gateway(e: impl Display) -> Result<Response<Full<Bytes>>, hyper::Error> {
    error!("Answering bad gateway: {e}");
    Ok(Response::builder()
        .status(StatusCode::BAD_GATEWAY)
        .body(Full::default())
        .unwrap())
}

pub(crate) fn method_not_allowed() -> Result<Response<Full<Bytes>>, hyper::Error> {
    Ok(Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .body(Full::default())
        .unwrap())
}
